pub mod notifier;
pub mod source;

pub use notifier::{Dispatcher, Notification, NotificationResult};
pub use source::{CodeResolver, WeeklyPriceSource, YearPriceSource};
