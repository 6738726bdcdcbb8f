//! Jira issue creation channel (REST API v3).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{NotificationChannel, default_timeout, ensure_success};
use crate::notification::{DeliveryReceipt, Message};
use crate::settings::DEFAULT_JIRA_ISSUE_TYPE;
use crate::{Error, Result};

/// Jira channel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Site base URL, e.g. `https://example.atlassian.net`.
    pub url: String,
    /// Account email used for basic authentication.
    pub email: String,
    /// API token used for basic authentication.
    pub token: String,
    /// Project key.
    pub project: String,
    /// Issue type name (default: Task).
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_issue_type() -> String {
    DEFAULT_JIRA_ISSUE_TYPE.to_string()
}

impl JiraConfig {
    pub fn new(
        url: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            email: email.into(),
            token: token.into(),
            project: project.into(),
            issue_type: default_issue_type(),
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_issue_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    /// Issue creation endpoint.
    pub fn issue_endpoint(&self) -> String {
        format!("{}/rest/api/3/issue", self.url.trim_end_matches('/'))
    }
}

/// Response of `POST /rest/api/3/issue`.
#[derive(Debug, Deserialize)]
struct CreatedIssue {
    id: Option<String>,
    key: Option<String>,
}

/// Jira notification channel.
pub struct JiraChannel {
    config: JiraConfig,
    client: Client,
}

impl JiraChannel {
    /// Create a new Jira channel.
    pub fn new(config: JiraConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn build_payload(&self, message: &Message) -> serde_json::Value {
        json!({
            "fields": {
                "summary": message.subject,
                "description": message.body,
                "project": { "key": self.config.project },
                "issuetype": { "name": self.config.issue_type },
            }
        })
    }

    /// Create the issue and return its key (or id if no key was returned).
    pub async fn create_ticket(&self, message: &Message) -> Result<String> {
        let response = self
            .client
            .post(self.config.issue_endpoint())
            .basic_auth(&self.config.email, Some(&self.config.token))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&self.build_payload(message))
            .send()
            .await?;

        let response = ensure_success(self.channel_type(), response).await?;
        let created: CreatedIssue = serde_json::from_str(&response.text().await?)?;

        created
            .key
            .or(created.id)
            .ok_or_else(|| Error::channel("jira", "issue created without key or id"))
    }
}

#[async_trait]
impl NotificationChannel for JiraChannel {
    fn channel_type(&self) -> &'static str {
        "jira"
    }

    async fn deliver(&self, message: &Message) -> Result<DeliveryReceipt> {
        let ticket = self.create_ticket(message).await?;
        info!(
            project = %self.config.project,
            ticket = %ticket,
            "Jira issue created"
        );
        Ok(DeliveryReceipt::with_reference(ticket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JiraConfig {
        JiraConfig::new(
            "https://example.atlassian.net/",
            "bot@example.com",
            "secret",
            "OPS",
        )
    }

    #[test]
    fn test_default_issue_type() {
        assert_eq!(config().issue_type, "Task");
        assert_eq!(config().with_issue_type("Bug").issue_type, "Bug");
    }

    #[test]
    fn test_issue_endpoint_trims_trailing_slash() {
        assert_eq!(
            config().issue_endpoint(),
            "https://example.atlassian.net/rest/api/3/issue"
        );
    }

    #[test]
    fn test_build_payload() {
        let channel = JiraChannel::new(config(), crate::utils::http_client::build_client());
        let payload = channel.build_payload(&Message::new("[etl] has failed.", "Error: boom"));

        assert_eq!(payload["fields"]["summary"], "[etl] has failed.");
        assert_eq!(payload["fields"]["description"], "Error: boom");
        assert_eq!(payload["fields"]["project"]["key"], "OPS");
        assert_eq!(payload["fields"]["issuetype"]["name"], "Task");
    }

    #[test]
    fn test_created_issue_parsing() {
        let created: CreatedIssue =
            serde_json::from_str(r#"{"id":"10000","key":"OPS-7","self":"https://x"}"#).unwrap();
        assert_eq!(created.key.as_deref(), Some("OPS-7"));
        assert_eq!(created.id.as_deref(), Some("10000"));
    }
}
