//! Environment facts attached to every notification.

use chrono::{DateTime, Local, SecondsFormat};
use sysinfo::System;

use crate::tracker::ExecutionRecord;

const UNKNOWN: &str = "unknown";

/// Variables consulted, in order, for the invoking user's name.
const USER_VARIABLES: &[&str] = &["USER", "USERNAME", "LOGNAME"];

/// Resolves the machine name and invoking user.
#[derive(Debug, Clone, Default)]
pub enum ContextCollector {
    /// Ask the operating system on every collection.
    #[default]
    System,
    /// Report fixed values.
    Fixed { machine: String, user: String },
}

impl ContextCollector {
    pub fn system() -> Self {
        Self::System
    }

    pub fn fixed(machine: impl Into<String>, user: impl Into<String>) -> Self {
        Self::Fixed {
            machine: machine.into(),
            user: user.into(),
        }
    }

    pub fn machine(&self) -> String {
        match self {
            Self::System => System::host_name()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            Self::Fixed { machine, .. } => machine.clone(),
        }
    }

    pub fn user(&self) -> String {
        match self {
            Self::System => USER_VARIABLES
                .iter()
                .filter_map(|key| std::env::var(key).ok())
                .find(|value| !value.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            Self::Fixed { user, .. } => user.clone(),
        }
    }

    /// Combine a frozen record with the current environment facts.
    pub fn collect(&self, record: &ExecutionRecord) -> NotificationContext {
        NotificationContext {
            record: record.clone(),
            machine: self.machine(),
            user: self.user(),
        }
    }
}

/// Everything a template can refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    pub record: ExecutionRecord,
    pub machine: String,
    pub user: String,
}

impl NotificationContext {
    /// Value of a named placeholder.
    ///
    /// Returns `None` for names the renderer does not know. Failure-only
    /// fields resolve to an empty string on success.
    pub fn value(&self, name: &str) -> Option<String> {
        let record = &self.record;
        let value = match name {
            "function" => record.function_name.clone(),
            "start" => format_timestamp(&record.start_time),
            "end" => format_timestamp(&record.end_time),
            "fail_time" if record.is_success() => String::new(),
            "fail_time" => format_timestamp(&record.end_time),
            "machine" => self.machine.clone(),
            "user" => self.user.clone(),
            "error" => record.error_message.clone().unwrap_or_default(),
            "traceback" => record.traceback_text.clone().unwrap_or_default(),
            "attempts" => record.attempt_count.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// RFC 3339 with millisecond precision, in local time.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, false)
}
