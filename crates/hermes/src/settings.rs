//! Named settings lookup.
//!
//! Channel activation depends on a handful of environment variables. The
//! lookup goes through [`SettingsSource`] so that tests (and embedders with
//! their own configuration store) can supply values without touching the
//! process environment.

use std::collections::HashMap;

/// Bearer token for the Microsoft Graph `sendMail` endpoint.
pub const OUTLOOK_TOKEN: &str = "OUTLOOK_TOKEN";
/// Incoming webhook URL of a Teams channel.
pub const TEAMS_WEBHOOK: &str = "TEAMS_WEBHOOK";
/// Base URL of the Jira site, e.g. `https://example.atlassian.net`.
pub const JIRA_URL: &str = "JIRA_URL";
pub const JIRA_EMAIL: &str = "JIRA_EMAIL";
pub const JIRA_TOKEN: &str = "JIRA_TOKEN";
pub const JIRA_PROJECT: &str = "JIRA_PROJECT";
/// Optional; see [`DEFAULT_JIRA_ISSUE_TYPE`].
pub const JIRA_ISSUE_TYPE: &str = "JIRA_ISSUE_TYPE";

pub const DEFAULT_JIRA_ISSUE_TYPE: &str = "Task";

/// A source of string settings looked up by name.
///
/// Blank values are reported as absent.
pub trait SettingsSource: Send + Sync {
    /// Raw lookup. Implementations return whatever is stored.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Get a setting, treating empty and whitespace-only values as unset.
    fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).filter(|value| !value.trim().is_empty())
    }
}

/// Reads the process environment on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl SettingsSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl SettingsSource for HashMap<&'static str, &'static str> {
    fn lookup(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|value| value.to_string())
    }
}
