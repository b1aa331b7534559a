pub mod notifiers;
pub mod sources;
pub mod traits;

pub use traits::{CodeResolver, Dispatcher, WeeklyPriceSource, YearPriceSource};
