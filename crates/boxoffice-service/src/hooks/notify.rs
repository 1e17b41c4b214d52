//! Outbound notification queue.
//!
//! Services push onto a bounded `mpsc` channel; the worker's dispatcher
//! drains it. A full or closed queue drops the message with a warning.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use boxoffice_core::config::NotificationConfig;
use boxoffice_core::notification::{Channel, Notification};
use boxoffice_core::types::UserId;

/// A notification addressed to one user.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub user_id: UserId,
    pub notification: Notification,
    pub channels: Vec<Channel>,
}

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<OutboundNotification>,
    default_channels: Vec<Channel>,
}

impl Outbox {
    /// Create the queue. The receiver goes to the dispatcher.
    pub fn channel(config: &NotificationConfig) -> (Self, mpsc::Receiver<OutboundNotification>) {
        let (tx, rx) = mpsc::channel(config.outbox_capacity.max(1));
        (
            Self {
                tx,
                default_channels: config.default_channels.clone(),
            },
            rx,
        )
    }

    /// Queue `notification` for `user_id` without waiting.
    pub fn enqueue(&self, user_id: UserId, notification: Notification) {
        let channels = notification
            .preferred_channels()
            .map(<[Channel]>::to_vec)
            .unwrap_or_else(|| self.default_channels.clone());
        let kind = notification.kind();

        match self.tx.try_send(OutboundNotification {
            user_id,
            notification,
            channels,
        }) {
            Ok(()) => debug!(user_id = %user_id, kind, "Notification queued"),
            Err(TrySendError::Full(_)) => {
                warn!(user_id = %user_id, kind, "Notification outbox full; dropping")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(user_id = %user_id, kind, "Notification outbox closed; dropping")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::types::{EventId, PromotionId};

    fn config(capacity: usize) -> NotificationConfig {
        NotificationConfig {
            outbox_capacity: capacity,
            default_channels: vec![Channel::Sms],
        }
    }

    #[tokio::test]
    async fn test_channels_fall_back_to_default() {
        let (outbox, mut rx) = Outbox::channel(&config(4));
        let user = UserId::new();
        outbox.enqueue(
            user,
            Notification::PromotionExpired {
                promotion_id: PromotionId::new(),
                event_id: EventId::new(),
            },
        );
        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.user_id, user);
        assert_eq!(queued.channels, vec![Channel::Sms]);
    }

    #[tokio::test]
    async fn test_full_outbox_drops_without_blocking() {
        let (outbox, mut rx) = Outbox::channel(&config(1));
        for _ in 0..3 {
            outbox.enqueue(
                UserId::new(),
                Notification::PromotionExpired {
                    promotion_id: PromotionId::new(),
                    event_id: EventId::new(),
                },
            );
        }
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }
}
