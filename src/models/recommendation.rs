use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProduceCategory {
    Vegetable,
    Fruit,
}

impl ProduceCategory {
    /// Path of the weekly top-5 page on the market site.
    pub fn path(&self) -> &'static str {
        match self {
            ProduceCategory::Vegetable => "/vege",
            ProduceCategory::Fruit => "/fruit",
        }
    }
}

/// One entry of the weekly top-5 list. Prices are NT$ per Taiwanese catty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub name: String,
    pub wholesale_price: f64,
    pub retail_price: f64,
}

impl Recommendation {
    /// A fair shelf price: between a quarter and three quarters of the
    /// way from the wholesale price to the estimated retail price.
    pub fn reasonable_range(&self) -> (f64, f64) {
        let spread = self.retail_price - self.wholesale_price;
        (
            self.wholesale_price + spread * 0.25,
            self.wholesale_price + spread * 0.75,
        )
    }

    pub fn reasonable_range_label(&self) -> String {
        let (low, high) = self.reasonable_range();
        format!("{:.1} - {:.1}", low, high)
    }
}
