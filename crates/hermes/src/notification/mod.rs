//! Notification delivery.
//!
//! A terminal outcome is rendered once into a [`Message`] and handed to
//! every active channel:
//! - Mail, through exactly one of a local SMTP relay or the Outlook API
//! - Teams incoming webhooks
//! - Jira issue creation
//!
//! # Example
//!
//! ```ignore
//! use hermes::notification::{ChannelRegistry, HttpChannelFactory, MailSettings, NotificationDispatcher};
//! use hermes::settings::EnvSettings;
//!
//! let mail = MailSettings::new("jobs@example.com", "ops@example.com");
//! let registry = ChannelRegistry::resolve(&EnvSettings, &mail);
//! let channels = registry.build(&HttpChannelFactory::new());
//! let report = NotificationDispatcher::new().dispatch(&message, &channels).await;
//! ```

pub mod channels;
pub mod dispatcher;
pub mod registry;

pub use channels::{
    ChannelConfig, ChannelFactory, HttpChannelFactory, JiraConfig, NotificationChannel,
    OutlookConfig, SmtpConfig, TeamsConfig,
};
pub use dispatcher::{ChannelOutcome, DispatchReport, NotificationDispatcher};
pub use registry::{ChannelRegistry, MailSettings};

use serde::{Deserialize, Serialize};

use crate::tracker::Outcome;

/// Rendered notification, identical for every channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// `"[<label>] has failed."` or `"[<label>] has succeeded."`.
    pub fn subject_for(label: &str, outcome: Outcome) -> String {
        format!("[{}] has {}.", label, outcome.verb())
    }
}

/// What a channel reports back after a successful delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Identifier assigned by the remote side, such as a Jira issue key.
    pub reference: Option<String>,
}

impl DeliveryReceipt {
    pub fn sent() -> Self {
        Self::default()
    }

    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_formats() {
        assert_eq!(
            Message::subject_for("reports", Outcome::Failure),
            "[reports] has failed."
        );
        assert_eq!(
            Message::subject_for("reports", Outcome::Success),
            "[reports] has succeeded."
        );
    }

    #[test]
    fn test_receipt_reference() {
        assert_eq!(DeliveryReceipt::sent().reference, None);
        assert_eq!(
            DeliveryReceipt::with_reference("OPS-12").reference.as_deref(),
            Some("OPS-12")
        );
    }
}
