use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::plugins::traits::{Dispatcher, Notification, NotificationResult};
use crate::utils::error::AppError;

/// Sends plain-text mail through an authenticated STARTTLS submission port.
///
/// The sender is only checked when a message is built, so a missing sender
/// fails that dispatch and nothing else.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_name: String,
    from_address: Option<String>,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Email(format!("Invalid SMTP relay {}: {}", config.host, e)))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        } else {
            tracing::warn!("SMTP credentials not configured, submitting unauthenticated");
        }

        Ok(Self {
            mailer: builder.build(),
            from_name: config.from_name.clone(),
            // Gmail expects the login name when no explicit sender is set
            from_address: config.from_address.clone().or_else(|| config.username.clone()),
        })
    }

    pub fn build_message(
        &self,
        notification: &Notification,
    ) -> Result<(Message, String), AppError> {
        let from = sender(&self.from_name, self.from_address.as_deref())?;
        let to: Mailbox = notification
            .to
            .parse()
            .map_err(|e| {
                AppError::Validation(format!("Invalid recipient '{}': {}", notification.to, e))
            })?;

        let message_id = format!("<{}@veggie-watcher>", Uuid::new_v4());

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject.as_str())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| AppError::Email(format!("Failed to build message: {}", e)))?;

        Ok((message, message_id))
    }
}

#[async_trait]
impl Dispatcher for EmailNotifier {
    async fn dispatch(
        &self,
        notification: &Notification,
    ) -> Result<NotificationResult, AppError> {
        let (message, message_id) = self.build_message(notification)?;

        let response = self
            .mailer
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("SMTP submission failed: {}", e)))?;

        tracing::debug!(
            to = %notification.to,
            code = %response.code(),
            "Mail accepted by relay"
        );
        Ok(NotificationResult {
            message_id: Some(message_id),
        })
    }
}

fn sender(name: &str, address: Option<&str>) -> Result<Mailbox, AppError> {
    let address = address
        .ok_or_else(|| AppError::Email("SMTP from_address or username must be set".to_string()))?;

    format!("{} <{}>", name, address)
        .parse()
        .map_err(|e| AppError::Email(format!("Invalid sender address '{}': {}", address, e)))
}
