//! Notification abstractions

use crate::core::currency::ExchangeRate;
use async_trait::async_trait;

pub const NOTIFICATION_SUBJECT: &str = "Currency Conversion Rate now";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn for_rate(rate: &ExchangeRate) -> Self {
        Notification {
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: format!(
                "Conversion value for 1 {} to {} currently is {}",
                rate.base, rate.quote, rate.value
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
