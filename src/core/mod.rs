pub mod convert;
pub mod decision;
pub mod lookup;

pub use convert::{purchase_quantity, Household, PurchaseQuantity};
pub use decision::{compose_body, decide, notify, NotifyOutcome};
pub use lookup::PriceLookup;
