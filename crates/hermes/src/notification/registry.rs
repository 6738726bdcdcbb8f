//! Active channel selection.
//!
//! The channel set is recomputed for every notification from the current
//! settings, since the environment may change between invocations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::channels::{
    ChannelConfig, ChannelFactory, JiraConfig, NotificationChannel, OutlookConfig, SmtpConfig,
    TeamsConfig,
};
use crate::settings::{
    DEFAULT_JIRA_ISSUE_TYPE, JIRA_EMAIL, JIRA_ISSUE_TYPE, JIRA_PROJECT, JIRA_TOKEN, JIRA_URL,
    OUTLOOK_TOKEN, SettingsSource, TEAMS_WEBHOOK,
};

/// Addresses and relay used for mail delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    pub from_address: String,
    pub to_address: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl MailSettings {
    /// Mail through the relay on `localhost:25`.
    pub fn new(from_address: impl Into<String>, to_address: impl Into<String>) -> Self {
        let smtp = SmtpConfig::new(String::new(), String::new());
        Self {
            from_address: from_address.into(),
            to_address: to_address.into(),
            smtp_host: smtp.host,
            smtp_port: smtp.port,
        }
    }

    pub fn with_relay(mut self, host: impl Into<String>, port: u16) -> Self {
        self.smtp_host = host.into();
        self.smtp_port = port;
        self
    }
}

/// The channels active for one notification, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRegistry {
    configs: Vec<ChannelConfig>,
}

impl ChannelRegistry {
    /// Select channels from `settings`.
    ///
    /// Order is fixed: one mail channel (Outlook when a token is set,
    /// SMTP otherwise), then Teams, then Jira.
    pub fn resolve(settings: &dyn SettingsSource, mail: &MailSettings) -> Self {
        let mut configs = Vec::with_capacity(3);

        configs.push(match settings.get(OUTLOOK_TOKEN) {
            Some(token) => ChannelConfig::Outlook(OutlookConfig::new(
                token,
                &mail.from_address,
                &mail.to_address,
            )),
            None => ChannelConfig::Smtp(SmtpConfig {
                host: mail.smtp_host.clone(),
                port: mail.smtp_port,
                ..SmtpConfig::new(&mail.from_address, &mail.to_address)
            }),
        });

        if let Some(webhook) = settings.get(TEAMS_WEBHOOK) {
            configs.push(ChannelConfig::Teams(TeamsConfig::new(webhook)));
        }

        if let Some(jira) = Self::resolve_jira(settings) {
            configs.push(ChannelConfig::Jira(jira));
        }

        Self { configs }
    }

    /// Jira needs all four settings; anything less leaves it inactive.
    fn resolve_jira(settings: &dyn SettingsSource) -> Option<JiraConfig> {
        let required = [JIRA_URL, JIRA_EMAIL, JIRA_TOKEN, JIRA_PROJECT];
        let values: Vec<Option<String>> = required.iter().map(|key| settings.get(key)).collect();

        match values.as_slice() {
            [Some(url), Some(email), Some(token), Some(project)] => {
                let issue_type = settings
                    .get(JIRA_ISSUE_TYPE)
                    .unwrap_or_else(|| DEFAULT_JIRA_ISSUE_TYPE.to_string());
                Some(JiraConfig::new(url, email, token, project).with_issue_type(issue_type))
            }
            _ => {
                let missing: Vec<&str> = required
                    .iter()
                    .zip(&values)
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| *key)
                    .collect();
                if missing.len() < required.len() {
                    debug!(?missing, "Jira partially configured, skipping channel");
                }
                None
            }
        }
    }

    pub fn configs(&self) -> &[ChannelConfig] {
        &self.configs
    }

    pub fn channel_types(&self) -> Vec<&'static str> {
        self.configs.iter().map(ChannelConfig::channel_type).collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Instantiate every selected channel.
    pub fn build(&self, factory: &dyn ChannelFactory) -> Vec<Arc<dyn NotificationChannel>> {
        self.configs.iter().map(|config| factory.build(config)).collect()
    }
}
