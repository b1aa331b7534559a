use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

use crate::browser::RenderEngine;
use crate::config::AppConfig;
use crate::models::YearAveragePrice;
use crate::plugins::traits::YearPriceSource;
use crate::utils::error::{AppError, LookupError};

/// Text nodes of the price chart.
pub const CHART_LABEL_SELECTOR: &str = "tspan";

/// Marker phrase of the year-average label: "year-average trade price".
pub const YEAR_AVERAGE_MARKER: &str = "全年度平均成交價";

static NT_DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"NT\$ ?([\d.]+)").expect("valid NT$ amount pattern"));

/// Reads the year-average price off the chart drawn on an item's detail page.
pub struct ChartYearPriceSource {
    engine: Arc<dyn RenderEngine>,
    base: Url,
    wait: Duration,
}

impl ChartYearPriceSource {
    pub fn new(engine: Arc<dyn RenderEngine>, config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            engine,
            base: config.market.base()?,
            wait: config.scraper.chart_wait(),
        })
    }
}

#[async_trait]
impl YearPriceSource for ChartYearPriceSource {
    async fn extract(&self, detail_path: &str) -> Result<YearAveragePrice, LookupError> {
        let url = self
            .base
            .join(detail_path)
            .map_err(|e| LookupError::render(format!("invalid detail path '{}'", detail_path), e))?;

        let engine = Arc::clone(&self.engine);
        let wait = self.wait;

        // The browser API blocks; keep it off the async workers.
        let price = tokio::task::spawn_blocking(move || {
            extract_year_average(engine.as_ref(), url.as_str(), wait)
        })
        .await
        .map_err(|e| LookupError::render("chart scraping task failed", e))??;

        tracing::debug!(
            path = detail_path,
            price = price.average_price,
            "Extracted year-average price"
        );
        Ok(price)
    }
}

/// Opens a session, collects the chart labels, and parses the year average.
///
/// The session is dropped before parsing and on every early return, so the
/// engine gets its resources back whichever step fails.
pub fn extract_year_average(
    engine: &dyn RenderEngine,
    url: &str,
    wait: Duration,
) -> Result<YearAveragePrice, LookupError> {
    let labels = {
        let mut session = engine.open()?;
        session.load(url)?;
        session.wait_for(CHART_LABEL_SELECTOR, wait)?;
        session.texts(CHART_LABEL_SELECTOR)?
    };

    parse_year_average(&labels)
}

pub fn parse_year_average(labels: &[String]) -> Result<YearAveragePrice, LookupError> {
    let label = labels
        .iter()
        .find(|text| text.contains(YEAR_AVERAGE_MARKER))
        .ok_or_else(|| LookupError::NotFound("year-average price label not found".to_string()))?;

    let amount = NT_DOLLAR_AMOUNT
        .captures(label)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| LookupError::Parse(format!("no NT$ amount in label '{}'", label)))?;

    let average_price = amount
        .as_str()
        .parse::<f64>()
        .map_err(|_| LookupError::Parse(format!("'{}' is not a price", amount.as_str())))?;

    Ok(YearAveragePrice { average_price })
}
