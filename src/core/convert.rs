use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::error::AppError;

/// Daily vegetable intake in grams.
pub const CHILD_DAILY_GRAMS: u64 = 300;
pub const WOMAN_DAILY_GRAMS: u64 = 400;
pub const MAN_DAILY_GRAMS: u64 = 500;

const GRAMS_PER_KILOGRAM: f64 = 1000.0;
/// One Taiwanese catty (台斤).
const GRAMS_PER_CATTY: f64 = 600.0;

/// Who is eating, and for how many days. Children are under 12.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct Household {
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub women: u32,
    #[serde(default)]
    pub men: u32,
    #[validate(range(min = 1, message = "days must be at least 1"))]
    pub days: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PurchaseQuantity {
    pub grams: u64,
    pub kilograms: f64,
    pub catties: f64,
}

impl Household {
    /// `None` when the total does not fit in a `u64`.
    pub fn total_grams(&self) -> Option<u64> {
        let daily = [
            (self.children, CHILD_DAILY_GRAMS),
            (self.women, WOMAN_DAILY_GRAMS),
            (self.men, MAN_DAILY_GRAMS),
        ]
        .into_iter()
        .try_fold(0u64, |sum, (count, grams)| {
            u64::from(count).checked_mul(grams)?.checked_add(sum)
        })?;

        daily.checked_mul(u64::from(self.days))
    }
}

/// Vegetables to buy for the whole household over the given days.
pub fn purchase_quantity(household: &Household) -> Result<PurchaseQuantity, AppError> {
    household.validate()?;

    let grams = household
        .total_grams()
        .ok_or_else(|| AppError::Validation("household quantity is too large".to_string()))?;
    Ok(PurchaseQuantity {
        grams,
        kilograms: round2(grams as f64 / GRAMS_PER_KILOGRAM),
        catties: round2(grams as f64 / GRAMS_PER_CATTY),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
