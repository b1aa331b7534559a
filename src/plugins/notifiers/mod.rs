// Notification transports
pub mod email;

pub use email::EmailNotifier;
