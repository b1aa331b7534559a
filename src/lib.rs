pub mod browser;
pub mod config;
pub mod core;
pub mod favorites;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::core::{NotifyOutcome, PriceLookup};
pub use favorites::FavoritesStore;
pub use models::{FavoriteList, FruitPriceReport};
pub use scheduler::{
    run_scheduled_check, run_watch_task, WatchContext, WatchRunSummary, WatchScheduler,
};
pub use utils::error::{AppError, LookupError};

pub type Result<T> = std::result::Result<T, AppError>;
