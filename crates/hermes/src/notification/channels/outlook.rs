//! Email notification channel using the Microsoft Graph `sendMail` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{NotificationChannel, default_timeout, ensure_success};
use crate::Result;
use crate::notification::{DeliveryReceipt, Message};

pub const GRAPH_SEND_MAIL_URL: &str = "https://graph.microsoft.com/v1.0/me/sendMail";

/// Outlook channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlookConfig {
    /// OAuth bearer token.
    pub token: String,
    /// Sender email address.
    pub from_address: String,
    /// Recipient email address.
    pub to_address: String,
    /// `sendMail` endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    GRAPH_SEND_MAIL_URL.to_string()
}

impl OutlookConfig {
    pub fn new(
        token: impl Into<String>,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            from_address: from_address.into(),
            to_address: to_address.into(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Outlook notification channel.
pub struct OutlookChannel {
    config: OutlookConfig,
    client: Client,
}

impl OutlookChannel {
    /// Create a new Outlook channel.
    pub fn new(config: OutlookConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the `sendMail` request body.
    fn build_payload(&self, message: &Message) -> serde_json::Value {
        json!({
            "message": {
                "subject": message.subject,
                "body": {
                    "contentType": "Text",
                    "content": message.body,
                },
                "from": {
                    "emailAddress": { "address": self.config.from_address }
                },
                "toRecipients": [
                    { "emailAddress": { "address": self.config.to_address } }
                ],
            },
            "saveToSentItems": "false"
        })
    }
}

#[async_trait]
impl NotificationChannel for OutlookChannel {
    fn channel_type(&self) -> &'static str {
        "outlook"
    }

    async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&self.build_payload(message))
            .send()
            .await?;

        ensure_success(self.channel_type(), response).await?;

        debug!(to = %self.config.to_address, "Outlook notification sent");
        Ok(DeliveryReceipt::sent())
    }
}
