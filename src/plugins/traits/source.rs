use async_trait::async_trait;

use crate::models::{FruitCode, WeeklyPrice, YearAveragePrice};
use crate::utils::error::LookupError;

/// Turns a free-text fruit query into the market site's item code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<FruitCode, LookupError>;
}

/// Latest weekly average price for an item code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeeklyPriceSource: Send + Sync {
    async fn fetch(&self, code: &FruitCode) -> Result<WeeklyPrice, LookupError>;
}

/// Year-to-date average price for an item, read from its detail page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YearPriceSource: Send + Sync {
    async fn extract(&self, detail_path: &str) -> Result<YearAveragePrice, LookupError>;
}
