use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// One outbound message: a single plain-text email per triggered run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationResult {
    pub message_id: Option<String>,
}

/// Trait for implementing notification transports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<NotificationResult, AppError>;
}
