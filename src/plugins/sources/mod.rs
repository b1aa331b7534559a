// Market site data sources
pub mod fruit_code;
pub mod recommend;
pub mod weekly_price;
pub mod year_price;

pub use fruit_code::SearchPageResolver;
pub use recommend::RecommendationScraper;
pub use weekly_price::WeeklyPriceApi;
pub use year_price::ChartYearPriceSource;

use reqwest::Client;
use url::Url;

use crate::config::MarketConfig;
use crate::utils::error::AppError;

/// Shared HTTP client for every request to the market site.
pub fn http_client(config: &MarketConfig) -> Result<Client, AppError> {
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url, AppError> {
    base.join(path)
        .map_err(|e| AppError::Validation(format!("Invalid market path '{}': {}", path, e)))
}
