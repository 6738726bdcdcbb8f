//! Notification channels.
//!
//! This module provides the channels a message can be delivered through:
//! - Email via a local SMTP relay
//! - Email via the Microsoft Graph (Outlook) API
//! - Microsoft Teams incoming webhooks
//! - Jira issue creation

mod jira;
mod outlook;
mod smtp;
mod teams;

pub use jira::{JiraChannel, JiraConfig};
pub use outlook::{GRAPH_SEND_MAIL_URL, OutlookChannel, OutlookConfig};
pub use smtp::{SmtpChannel, SmtpConfig};
pub use teams::{TeamsChannel, TeamsConfig};

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{DeliveryReceipt, Message};
use crate::utils::http_client;
use crate::{Error, Result};

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver a message through this channel.
    async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt>;
}

/// Channel configuration wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelConfig {
    /// Mail through an SMTP relay.
    Smtp(SmtpConfig),
    /// Mail through the Outlook API.
    Outlook(OutlookConfig),
    /// Teams incoming webhook.
    Teams(TeamsConfig),
    /// Jira issue creation.
    Jira(JiraConfig),
}

impl ChannelConfig {
    /// Get the channel type name.
    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Outlook(_) => "outlook",
            Self::Teams(_) => "teams",
            Self::Jira(_) => "jira",
        }
    }

    /// Whether this channel delivers mail.
    pub fn is_mail(&self) -> bool {
        matches!(self, Self::Smtp(_) | Self::Outlook(_))
    }
}

/// Turns channel configurations into live channels.
pub trait ChannelFactory: Send + Sync {
    fn build(&self, config: &ChannelConfig) -> Arc<dyn NotificationChannel>;
}

/// Production factory: network-backed channels sharing one HTTP client.
#[derive(Clone)]
pub struct HttpChannelFactory {
    client: Client,
}

impl HttpChannelFactory {
    pub fn new() -> Self {
        Self::with_client(http_client::build_client())
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpChannelFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelFactory for HttpChannelFactory {
    fn build(&self, config: &ChannelConfig) -> Arc<dyn NotificationChannel> {
        match config {
            ChannelConfig::Smtp(c) => Arc::new(SmtpChannel::new(c.clone())),
            ChannelConfig::Outlook(c) => Arc::new(OutlookChannel::new(c.clone(), self.client.clone())),
            ChannelConfig::Teams(c) => Arc::new(TeamsChannel::new(c.clone(), self.client.clone())),
            ChannelConfig::Jira(c) => Arc::new(JiraChannel::new(c.clone(), self.client.clone())),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Turn a non-2xx response into a channel error carrying status and body.
async fn ensure_success(channel: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::channel(channel, format!("{} - {}", status, body)))
}
