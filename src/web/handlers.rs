use axum::{
    extract::{Path, State},
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse, AppState, HealthResponse};
use crate::core::{purchase_quantity, Household, PurchaseQuantity};
use crate::models::favorites::split_fruits;
use crate::models::{FavoriteList, FruitPriceReport, ProduceCategory, Recommendation};
use crate::plugins::sources::recommend::render_table;
use crate::scheduler::{watch_favorites, WatchRunSummary, WatchStats};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryPicks {
    pub category: ProduceCategory,
    pub picks: Vec<Recommendation>,
    pub table: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyPicks {
    pub vegetables: CategoryPicks,
    pub fruits: CategoryPicks,
}

pub async fn recommend(State(state): State<AppState>) -> Json<ApiResponse<WeeklyPicks>> {
    let vegetables = category_picks(&state, ProduceCategory::Vegetable).await;
    let fruits = category_picks(&state, ProduceCategory::Fruit).await;

    Json(ApiResponse::success(WeeklyPicks { vegetables, fruits }))
}

// A failing category is reported on its own; the other one still renders.
async fn category_picks(state: &AppState, category: ProduceCategory) -> CategoryPicks {
    match state.recommender.top_picks(category).await {
        Ok(picks) => CategoryPicks {
            category,
            table: Some(render_table(&picks)),
            picks,
            error: None,
        },
        Err(e) => {
            tracing::error!(?category, "Failed to load weekly picks: {}", e);
            CategoryPicks {
                category,
                picks: Vec::new(),
                table: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn convert(
    Json(household): Json<Household>,
) -> Result<Json<ApiResponse<PurchaseQuantity>>, ApiError> {
    let quantity = purchase_quantity(&household)?;
    tracing::debug!(?household, grams = quantity.grams, "Converted purchase quantity");
    Ok(Json(ApiResponse::success(quantity)))
}

pub async fn get_favorites(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<FavoriteList>>>, ApiError> {
    let favorites = state.watch.store.load().await?;
    Ok(Json(ApiResponse::success(favorites)))
}

/// Fruits arrive either as the raw comma separated form text or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FruitsInput {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct FavoritesForm {
    pub email: String,
    pub fruits: FruitsInput,
}

impl FavoritesForm {
    fn into_list(self) -> FavoriteList {
        let fruits = match self.fruits {
            FruitsInput::Text(text) => split_fruits(&text),
            FruitsInput::List(names) => split_fruits(&names.join(",")),
        };
        FavoriteList {
            email: self.email.trim().to_string(),
            fruits,
        }
    }
}

pub async fn save_favorites(
    State(state): State<AppState>,
    Json(form): Json<FavoritesForm>,
) -> Result<Json<ApiResponse<FavoriteList>>, ApiError> {
    let list = form.into_list();
    state.watch.store.save(&list).await?;

    state.session.write().await.saved_favorites = Some(list.clone());
    Ok(Json(ApiResponse::success(list)))
}

pub async fn lookup_fruit(
    State(state): State<AppState>,
    Path(fruit): Path<String>,
) -> Json<ApiResponse<FruitPriceReport>> {
    let report = state.watch.lookup.lookup(&fruit).await;
    Json(ApiResponse::success(report))
}

pub async fn check_favorites(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WatchRunSummary>>, ApiError> {
    let favorites = state
        .session
        .read()
        .await
        .saved_favorites
        .clone()
        .ok_or_else(|| ApiError::conflict("Save a favorites list before checking prices"))?;

    let summary = watch_favorites(&state.watch, &favorites).await;
    let meta = serde_json::json!({
        "checked": summary.reports.len(),
        "cheap": summary.cheap.len(),
    });
    Ok(Json(ApiResponse::success_with_meta(summary, meta)))
}

pub async fn watch_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WatchStats>>, ApiError> {
    let scheduler = state
        .scheduler
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Scheduler is not running".to_string()))?;

    let stats = scheduler.lock().await.stats().await;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Veggie Watcher</title>
    <style>
        body { font-family: sans-serif; margin: 40px; background: #fffdf7; }
        .characters { display: flex; gap: 20px; }
        .card {
            flex: 1; background: #F5F3EA; padding: 20px;
            border-radius: 10px; text-align: center;
        }
        button {
            background: #FF914D; color: white; border: none;
            padding: 8px 16px; border-radius: 6px;
        }
        pre { text-align: left; white-space: pre-wrap; }
    </style>
</head>
<body>
    <h1>Veggie Watcher</h1>
    <div class="characters">
        <div class="card">
            <h4>👴 推薦公</h4>
            <button onclick="call('GET', '/api/v1/recommend', null, 'recommend-out')">
                精選蔬果
            </button>
            <pre id="recommend-out"></pre>
        </div>
        <div class="card">
            <h4>👵 客製嬤</h4>
            <input id="children" type="number" min="0" value="0"> 👶
            <input id="women" type="number" min="0" value="0"> 👩
            <input id="men" type="number" min="0" value="0"> 👨
            <input id="days" type="number" min="1" value="1"> 📅
            <button onclick="call('POST', '/api/v1/convert', {
                children: +v('children'), women: +v('women'), men: +v('men'), days: +v('days')
            }, 'convert-out')">秤斤秤重</button>
            <pre id="convert-out"></pre>
        </div>
        <div class="card">
            <h4>🐶 果價</h4>
            <input id="fruits" placeholder="西瓜-大西瓜, 荔枝-糯米">
            <input id="email" placeholder="Email">
            <button onclick="call('PUT', '/api/v1/favorites', {
                fruits: v('fruits'), email: v('email')
            }, 'watch-out')">儲存喜愛水果清單</button>
            <button onclick="call('POST', '/api/v1/watch/check', null, 'watch-out')">
                查詢並寄信通知
            </button>
            <pre id="watch-out"></pre>
        </div>
    </div>
    <script>
        function v(id) { return document.getElementById(id).value; }
        function call(method, url, body, target) {
            const init = { method, headers: { 'Content-Type': 'application/json' } };
            if (body) { init.body = JSON.stringify(body); }
            fetch(url, init)
                .then(r => r.json())
                .then(data => {
                    document.getElementById(target).textContent = JSON.stringify(data, null, 2);
                })
                .catch(e => { document.getElementById(target).textContent = e; });
        }
    </script>
</body>
</html>"#;
