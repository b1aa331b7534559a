use serde::{Deserialize, Serialize};

use crate::utils::error::{FailureKind, LookupError};

pub mod favorites;
pub mod recommendation;

pub use favorites::FavoriteList;
pub use recommendation::{ProduceCategory, Recommendation};

/// Item code on the market site plus the detail page it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FruitCode {
    pub code: String,
    /// Relative path of the detail page, e.g. `/fruit/B5/香蕉`.
    pub detail_path: String,
}

/// Most recent weekly trading period for an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPrice {
    /// End day of the week, as the API formats it.
    pub period: String,
    pub average_price: f64,
}

/// Year-to-date average trade price, as drawn on the detail page chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearAveragePrice {
    pub average_price: f64,
}

/// Both prices for one fruit, with the verdict derived from them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceSnapshot {
    fruit: String,
    weekly: WeeklyPrice,
    year: YearAveragePrice,
    is_currently_cheap: bool,
}

impl PriceSnapshot {
    pub fn new(fruit: impl Into<String>, weekly: WeeklyPrice, year: YearAveragePrice) -> Self {
        // Strictly below: a week at exactly the yearly average is not a deal.
        let is_currently_cheap = weekly.average_price < year.average_price;
        Self {
            fruit: fruit.into(),
            weekly,
            year,
            is_currently_cheap,
        }
    }

    pub fn fruit(&self) -> &str {
        &self.fruit
    }

    pub fn weekly(&self) -> &WeeklyPrice {
        &self.weekly
    }

    pub fn year(&self) -> YearAveragePrice {
        self.year
    }

    pub fn is_currently_cheap(&self) -> bool {
        self.is_currently_cheap
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupFailure {
    pub fruit: String,
    pub kind: FailureKind,
    pub message: String,
    pub trace: Option<Vec<String>>,
}

impl LookupFailure {
    pub fn from_error(fruit: impl Into<String>, err: &LookupError) -> Self {
        Self {
            fruit: fruit.into(),
            kind: err.kind(),
            message: err.message().to_string(),
            trace: err.trace().map(<[String]>::to_vec),
        }
    }
}

/// Outcome of one price lookup.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FruitPriceReport {
    Success(PriceSnapshot),
    Failure(LookupFailure),
}

impl FruitPriceReport {
    pub fn fruit(&self) -> &str {
        match self {
            FruitPriceReport::Success(snapshot) => snapshot.fruit(),
            FruitPriceReport::Failure(failure) => &failure.fruit,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FruitPriceReport::Success(_))
    }

    pub fn as_success(&self) -> Option<&PriceSnapshot> {
        match self {
            FruitPriceReport::Success(snapshot) => Some(snapshot),
            FruitPriceReport::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&LookupFailure> {
        match self {
            FruitPriceReport::Failure(failure) => Some(failure),
            FruitPriceReport::Success(_) => None,
        }
    }

    /// True only for a successful lookup whose weekly price is under the yearly average.
    pub fn is_currently_cheap(&self) -> bool {
        self.as_success().is_some_and(PriceSnapshot::is_currently_cheap)
    }
}
