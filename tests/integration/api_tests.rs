use super::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use veggie_watcher::plugins::sources::RecommendationScraper;
use veggie_watcher::web::{create_router, AppState};
use veggie_watcher::{FavoritesStore, WatchContext};

fn pick_card(rank: u32, name: &str, wholesale: &str, retail: &str) -> String {
    format!(
        r#"<div class="vege_price"><a href="/p/{rank}"> 推薦No: {rank} {name} </a>
           <span class="text-price">1</span><span class="text-price">{wholesale}</span>
           <span class="text-price">2</span><span class="text-price">{retail}</span></div>"#
    )
}

fn create_test_app(
    server: &MockServer,
    dir: &TempDir,
    year: StaticYearPrices,
) -> (Router, Arc<RecordingDispatcher>) {
    let config = get_test_config(&server.uri());
    let dispatcher = Arc::new(RecordingDispatcher::default());

    let watch = WatchContext {
        store: FavoritesStore::new(dir.path().join("fruit_list.json")),
        lookup: build_lookup(&config, Arc::new(year)),
        dispatcher: Arc::clone(&dispatcher) as Arc<dyn Dispatcher>,
        subject: config.notifications.subject.clone(),
    };
    let client = http_client(&config.market).unwrap();
    let recommender = RecommendationScraper::new(client, &config.market).unwrap();

    let state = AppState::new(Arc::new(watch), Arc::new(recommender));
    (create_router(state), dispatcher)
}

async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_recommend_isolates_failing_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vege"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><body>{}{}</body></html>",
            pick_card(1, "菜豆-青色", "40.0", "80.0"),
            pick_card(2, "甘藍-初秋", "12.5", "20.5"),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fruit"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (app, _) = create_test_app(&server, &dir, StaticYearPrices::default());

    let (status, body) = make_request(&app, Method::GET, "/api/v1/recommend", None).await;

    assert_eq!(status, StatusCode::OK);
    let vegetables = &body["data"]["vegetables"];
    assert_eq!(vegetables["picks"].as_array().unwrap().len(), 2);
    assert_eq!(vegetables["picks"][0]["name"], "菜豆-青色");
    assert!(vegetables["table"].as_str().unwrap().contains("| 甘藍-初秋 | 12.5 | 20.5 |"));
    assert!(vegetables["error"].is_null());

    let fruits = &body["data"]["fruits"];
    assert!(fruits["picks"].as_array().unwrap().is_empty());
    assert!(fruits["table"].is_null());
    assert!(fruits["error"].is_string());
}

#[tokio::test]
async fn test_lookup_route_end_to_end() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 12.0}]))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let year = StaticYearPrices::default().with("/fruit/X1/x", 15.0);
    let (app, _) = create_test_app(&server, &dir, year);

    let (status, body) = make_request(&app, Method::GET, "/api/v1/lookup/x", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["fruit"], "x");
    assert_eq!(body["data"]["weekly"]["period"], "2025/06/15");
    assert_eq!(body["data"]["is_currently_cheap"], true);
}

#[tokio::test]
async fn test_save_then_check_favorites() {
    let server = MockServer::start().await;
    mount_search(&server, "x", Some("X1")).await;
    mount_search(&server, "y", None).await;
    weekly_mock("X1", json!([{"endDay": "2025/06/15", "avgPrice": 12.0}]))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let year = StaticYearPrices::default().with("/fruit/X1/x", 15.0);
    let (app, dispatcher) = create_test_app(&server, &dir, year);

    let (status, body) = make_request(
        &app,
        Method::PUT,
        "/api/v1/favorites",
        Some(json!({"email": "a@b.com", "fruits": "x, y"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fruits"], json!(["x", "y"]));

    let (status, body) = make_request(&app, Method::GET, "/api/v1/favorites", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@b.com");

    let (status, body) = make_request(&app, Method::POST, "/api/v1/watch/check", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notification"]["outcome"], "sent");
    assert_eq!(body["data"]["cheap"].as_array().unwrap().len(), 1);

    let sent = dispatcher.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("x"));
}
