//! SMTP email notifier via `lettre`.

use crate::core::config::EmailConfig;
use crate::core::notify::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;
use tracing::info;

/// Sends each notification as a plain-text email from one sender to one recipient.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Port 465 uses implicit TLS, other ports use STARTTLS unless `tls` is off.
    /// Credentials come from the config, falling back to `SMTP_USERNAME` and
    /// `SMTP_PASSWORD`; without both the connection is unauthenticated.
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let host = config.smtp_host.as_str();
        let port = config.smtp_port;
        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        let username = config
            .username
            .clone()
            .or_else(|| std::env::var("SMTP_USERNAME").ok());
        let password = config
            .password
            .clone()
            .or_else(|| std::env::var("SMTP_PASSWORD").ok());
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let transport = builder
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        info!(
            subject = %notification.subject,
            recipient = %self.to,
            "Notification email delivered"
        );
        Ok(())
    }
}
