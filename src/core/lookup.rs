use std::sync::Arc;
use tokio::time::Instant;

use crate::browser::ChromeEngine;
use crate::config::AppConfig;
use crate::models::{FruitPriceReport, LookupFailure, PriceSnapshot};
use crate::plugins::sources::{
    http_client, ChartYearPriceSource, SearchPageResolver, WeeklyPriceApi,
};
use crate::plugins::traits::{CodeResolver, WeeklyPriceSource, YearPriceSource};
use crate::utils::error::{AppError, LookupError};

/// Runs the resolve, weekly price, year price chain for one fruit at a time.
#[derive(Clone)]
pub struct PriceLookup {
    resolver: Arc<dyn CodeResolver>,
    weekly: Arc<dyn WeeklyPriceSource>,
    year: Arc<dyn YearPriceSource>,
}

impl PriceLookup {
    pub fn new(
        resolver: Arc<dyn CodeResolver>,
        weekly: Arc<dyn WeeklyPriceSource>,
        year: Arc<dyn YearPriceSource>,
    ) -> Self {
        Self { resolver, weekly, year }
    }

    /// Search page resolver, weekly API and a headless Chrome chart reader.
    ///
    /// Nothing is contacted or launched here.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = http_client(&config.market)?;
        let resolver = SearchPageResolver::new(client.clone(), &config.market)?;
        let weekly = WeeklyPriceApi::new(client, &config.market)?;

        let engine = ChromeEngine::new(&config.scraper, config.market.user_agent.clone());
        let year = ChartYearPriceSource::new(Arc::new(engine), config)?;

        Ok(Self::new(Arc::new(resolver), Arc::new(weekly), Arc::new(year)))
    }

    /// Never fails: a failing step ends the chain and becomes the report.
    pub async fn lookup(&self, fruit: &str) -> FruitPriceReport {
        let start_time = Instant::now();

        let report = match self.run_steps(fruit).await {
            Ok(snapshot) => {
                tracing::info!(
                    fruit,
                    weekly = snapshot.weekly().average_price,
                    year = snapshot.year().average_price,
                    cheap = snapshot.is_currently_cheap(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Price lookup succeeded"
                );
                FruitPriceReport::Success(snapshot)
            }
            Err(err) => {
                tracing::warn!(fruit, kind = ?err.kind(), "Price lookup failed: {}", err);
                FruitPriceReport::Failure(LookupFailure::from_error(fruit, &err))
            }
        };

        let outcome = if report.is_success() { "success" } else { "failure" };
        metrics::counter!("veggie_lookups_total", "outcome" => outcome).increment(1);

        report
    }

    /// One lookup after another, in input order.
    pub async fn lookup_all(&self, fruits: &[String]) -> Vec<FruitPriceReport> {
        let mut reports = Vec::with_capacity(fruits.len());
        for fruit in fruits {
            reports.push(self.lookup(fruit).await);
        }
        reports
    }

    async fn run_steps(&self, fruit: &str) -> Result<PriceSnapshot, LookupError> {
        if fruit.trim().is_empty() {
            return Err(LookupError::Resolution("empty fruit name".to_string()));
        }

        let code = self.resolver.resolve(fruit).await?;
        let weekly = self.weekly.fetch(&code).await?;
        let year = self.year.extract(&code.detail_path).await?;

        Ok(PriceSnapshot::new(fruit, weekly, year))
    }
}
