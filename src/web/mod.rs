use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::AppConfig;
use crate::models::FavoriteList;
use crate::plugins::sources::RecommendationScraper;
use crate::scheduler::{WatchContext, WatchScheduler};

pub mod handlers;
pub mod responses;

pub use handlers::{
    check_favorites, convert, get_favorites, health_check, index_page, lookup_fruit, recommend,
    save_favorites, watch_stats,
};
pub use responses::*;

/// Per-session interactive state. The favorites saved here gate the check action.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub saved_favorites: Option<FavoriteList>,
}

#[derive(Clone)]
pub struct AppState {
    pub watch: Arc<WatchContext>,
    pub recommender: Arc<RecommendationScraper>,
    pub scheduler: Option<Arc<Mutex<WatchScheduler>>>,
    pub session: Arc<RwLock<SessionContext>>,
}

impl AppState {
    pub fn new(watch: Arc<WatchContext>, recommender: Arc<RecommendationScraper>) -> Self {
        Self {
            watch,
            recommender,
            scheduler: None,
            session: Arc::new(RwLock::new(SessionContext::default())),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<Mutex<WatchScheduler>>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(index_page))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // 👴 weekly picks
        .route("/recommend", get(recommend))
        // 👵 quantity calculator
        .route("/convert", post(convert))
        // 🐶 favorite fruit watch
        .route("/favorites", get(get_favorites).put(save_favorites))
        .route("/lookup/:fruit", get(lookup_fruit))
        .route("/watch/check", post(check_favorites))
        .route("/watch/stats", get(watch_stats))
}

pub async fn serve(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("Server starting on {}:{}", config.server.host, config.server.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
