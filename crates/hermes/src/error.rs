//! Notification-layer error types.
//!
//! None of these ever reach the caller of a wrapped task: the engine only
//! logs them. They exist so each layer can propagate with `?` internally.

use thiserror::Error;

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Library-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Channel {channel} failed: {message}")]
    Channel {
        channel: &'static str,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

}

impl Error {
    pub fn channel(channel: &'static str, message: impl Into<String>) -> Self {
        Self::Channel {
            channel,
            message: message.into(),
        }
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn invalid_address(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}
