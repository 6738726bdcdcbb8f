//! Microsoft Teams incoming webhook channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{NotificationChannel, default_timeout, ensure_success};
use crate::Result;
use crate::notification::{DeliveryReceipt, Message};

/// Teams channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsConfig {
    /// Incoming webhook URL.
    pub webhook_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl TeamsConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Teams notification channel.
pub struct TeamsChannel {
    config: TeamsConfig,
    client: Client,
}

impl TeamsChannel {
    /// Create a new Teams channel.
    pub fn new(config: TeamsConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Bold subject line followed by the body, as Teams Markdown.
    fn build_payload(&self, message: &Message) -> serde_json::Value {
        json!({
            "text": format!("**{}**\n\n{}", message.subject, message.body)
        })
    }
}

#[async_trait]
impl NotificationChannel for TeamsChannel {
    fn channel_type(&self) -> &'static str {
        "teams"
    }

    async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&self.build_payload(message))
            .send()
            .await?;

        ensure_success(self.channel_type(), response).await?;

        debug!("Teams notification sent");
        Ok(DeliveryReceipt::sent())
    }
}
