//! Email notification channel using a local SMTP relay.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NotificationChannel, default_timeout};
use crate::notification::{DeliveryReceipt, Message};
use crate::{Error, Result};

/// SMTP channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host.
    #[serde(default = "default_host")]
    pub host: String,
    /// SMTP relay port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sender email address.
    pub from_address: String,
    /// Recipient email address.
    pub to_address: String,
    /// Connection and command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    25
}

impl SmtpConfig {
    /// Relay on `localhost:25`.
    pub fn new(from_address: impl Into<String>, to_address: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            from_address: from_address.into(),
            to_address: to_address.into(),
            timeout_secs: default_timeout(),
        }
    }
}

/// SMTP notification channel.
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    /// Create a new SMTP channel.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox> {
        address
            .parse::<Mailbox>()
            .map_err(|e| Error::invalid_address(address, e))
    }

    /// Build the plain-text email.
    fn build_email(&self, message: &Message) -> Result<Email> {
        Email::builder()
            .from(Self::parse_mailbox(&self.config.from_address)?)
            .to(Self::parse_mailbox(&self.config.to_address)?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| Error::Smtp(e.to_string()))
    }

    fn transport(&self) -> AsyncSmtpTransport<Tokio1Executor> {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.config.host.as_str())
            .port(self.config.port)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build()
    }
}

#[async_trait]
impl NotificationChannel for SmtpChannel {
    fn channel_type(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt> {
        let email = self.build_email(message)?;

        let response = self
            .transport()
            .send(email)
            .await
            .map_err(|e| Error::Smtp(e.to_string()))?;

        debug!(
            host = %self.config.host,
            port = self.config.port,
            code = %response.code(),
            "SMTP notification sent"
        );
        Ok(DeliveryReceipt::sent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_config_default_relay() {
        let config = SmtpConfig::new("from@example.com", "to@example.com");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 25);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_smtp_config_deserialize_defaults() {
        let config: SmtpConfig = serde_json::from_str(
            r#"{"from_address":"from@example.com","to_address":"to@example.com"}"#,
        )
        .unwrap();
        assert_eq!(config, SmtpConfig::new("from@example.com", "to@example.com"));
    }

    #[test]
    fn test_build_email_headers() {
        let channel = SmtpChannel::new(SmtpConfig::new("from@example.com", "to@example.com"));
        let message = Message::new("[jobs] has failed.", "Error: boom");

        let email = channel.build_email(&message).unwrap();
        let formatted = String::from_utf8(email.formatted()).unwrap();

        assert!(formatted.contains("From: from@example.com"));
        assert!(formatted.contains("To: to@example.com"));
        assert!(formatted.contains("Subject: [jobs] has failed."));
        assert!(formatted.contains("Error: boom"));
    }

    #[test]
    fn test_build_email_rejects_bad_address() {
        let channel = SmtpChannel::new(SmtpConfig::new("not an address", "to@example.com"));
        let message = Message::new("subject", "body");

        assert!(matches!(
            channel.build_email(&message),
            Err(Error::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_deliver_fails_without_relay() {
        // Port 9 (discard) on loopback is not expected to speak SMTP.
        let config = SmtpConfig {
            port: 9,
            timeout_secs: 2,
            ..SmtpConfig::new("from@example.com", "to@example.com")
        };
        let channel = SmtpChannel::new(config);

        let result = channel.deliver(&Message::new("subject", "body")).await;
        assert!(matches!(result, Err(Error::Smtp(_))));
    }
}
