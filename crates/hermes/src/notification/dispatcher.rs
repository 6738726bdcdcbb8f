//! Best-effort fan-out of one message to every active channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::channels::NotificationChannel;
use super::{DeliveryReceipt, Message};

/// Result of delivering to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<DeliveryReceipt, String>,
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-channel outcomes of one dispatch, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }

    /// `true` when every attempted channel delivered.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.channel == channel)
    }
}

/// Sends a message to each channel in turn.
///
/// A failing channel is logged and recorded; it never stops the remaining
/// channels and never produces an error for the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub async fn dispatch(
        &self,
        message: &Message,
        channels: &[Arc<dyn NotificationChannel>],
    ) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(channels.len());

        for channel in channels {
            let channel_type = channel.channel_type();
            let result = match channel.deliver(message).await {
                Ok(receipt) => {
                    debug!(
                        channel = channel_type,
                        reference = ?receipt.reference,
                        "Notification delivered"
                    );
                    Ok(receipt)
                }
                Err(e) => {
                    warn!(
                        channel = channel_type,
                        error = %e,
                        "Notification delivery failed"
                    );
                    Err(e.to_string())
                }
            };

            outcomes.push(ChannelOutcome {
                channel: channel_type.to_string(),
                result,
            });
        }

        DispatchReport { outcomes }
    }
}
