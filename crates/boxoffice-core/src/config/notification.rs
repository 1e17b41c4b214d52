//! Notification outbox configuration.

use serde::{Deserialize, Serialize};

use crate::notification::Channel;

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Bounded capacity of the in-process outbox.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// Channels used when a notification kind does not name its own.
    #[serde(default = "default_channels")]
    pub default_channels: Vec<Channel>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: default_outbox_capacity(),
            default_channels: default_channels(),
        }
    }
}

fn default_outbox_capacity() -> usize {
    1024
}

fn default_channels() -> Vec<Channel> {
    vec![Channel::Websocket]
}
