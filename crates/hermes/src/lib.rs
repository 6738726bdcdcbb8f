//! hermes: run a fallible task and tell people how it went.
//!
//! A [`Notifier`] wraps an async task, retries it under a fixed-delay
//! [`RetryPolicy`], and once the task reaches a terminal outcome sends one
//! rendered message to every active channel (SMTP or Outlook mail, Teams,
//! Jira). The task's own result is always handed back unchanged; delivery
//! problems are only logged.

pub mod context;
pub mod engine;
pub mod error;
pub mod notification;
pub mod retry;
pub mod settings;
pub mod template;
pub mod tracker;
pub mod utils;

pub use context::{ContextCollector, NotificationContext};
pub use engine::{Execution, Notified, Notifier, NotifierBuilder};
pub use error::{Error, Result};
pub use notification::{DispatchReport, Message};
pub use retry::RetryPolicy;
pub use settings::{EnvSettings, SettingsSource};
pub use template::Template;
pub use tracker::{ExecutionRecord, ExecutionTracker, Outcome};
