use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use super::join_url;
use crate::config::MarketConfig;
use crate::models::{FruitCode, WeeklyPrice};
use crate::plugins::traits::WeeklyPriceSource;
use crate::utils::error::{AppError, LookupError};

pub const EMPTY_OR_MALFORMED: &str = "empty or malformed response";
pub const MISSING_FIELDS: &str = "missing price or period field";

/// Client for the weekly trade summary API (`FarmTradeSumWeeks`).
pub struct WeeklyPriceApi {
    client: Client,
    endpoint: Url,
    baseline_start_day: String,
}

impl WeeklyPriceApi {
    pub fn new(client: Client, config: &MarketConfig) -> Result<Self, AppError> {
        let endpoint = join_url(&config.base()?, &config.weekly_api_path)?;
        Ok(Self {
            client,
            endpoint,
            baseline_start_day: config.baseline_start_day.clone(),
        })
    }

    /// Server-side filter: one item, weeks starting on or after the baseline, oldest first.
    pub fn filter_for(&self, code: &FruitCode) -> Value {
        json!({
            "order": "endDay asc",
            "where": {
                "itemCode": code.code,
                "startDay": { "gte": self.baseline_start_day },
            },
        })
    }
}

#[async_trait]
impl WeeklyPriceSource for WeeklyPriceApi {
    async fn fetch(&self, code: &FruitCode) -> Result<WeeklyPrice, LookupError> {
        let filter = self.filter_for(code).to_string();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("filter", filter.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LookupError::transport("failed to fetch weekly prices", e))?;

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::transport("failed to read weekly prices", e))?;

        let price = parse_weekly_payload(&body)?;
        tracing::debug!(
            code = %code.code,
            period = %price.period,
            price = price.average_price,
            "Fetched weekly price"
        );
        Ok(price)
    }
}

/// Takes the last record of an ascending list as the current week.
///
/// A zero `avgPrice` counts as missing, same as an absent one.
pub fn parse_weekly_payload(body: &str) -> Result<WeeklyPrice, LookupError> {
    let records = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(records)) => records,
        Ok(_) => return Err(LookupError::data(EMPTY_OR_MALFORMED)),
        Err(e) => return Err(LookupError::data_with_cause(EMPTY_OR_MALFORMED, e)),
    };

    let latest = records
        .last()
        .ok_or_else(|| LookupError::data(EMPTY_OR_MALFORMED))?;

    let average_price = latest
        .get("avgPrice")
        .and_then(Value::as_f64)
        .filter(|price| *price != 0.0 && price.is_finite());
    let period = latest
        .get("endDay")
        .and_then(Value::as_str)
        .filter(|day| !day.is_empty());

    match (average_price, period) {
        (Some(average_price), Some(period)) => Ok(WeeklyPrice {
            period: period.to_string(),
            average_price,
        }),
        _ => Err(LookupError::data(MISSING_FIELDS)),
    }
}
