//! Notification dispatcher: drains the outbox into a sender.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing;

use boxoffice_core::traits::NotificationSender;
use boxoffice_service::OutboundNotification;

/// Long-running task that delivers queued notifications.
pub struct NotificationDispatcher {
    /// Receiving half of the service outbox
    rx: mpsc::Receiver<OutboundNotification>,
    /// Delivery backend
    sender: Arc<dyn NotificationSender>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher over the outbox receiver.
    pub fn new(
        rx: mpsc::Receiver<OutboundNotification>,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self { rx, sender }
    }

    /// Deliver until the cancel signal fires or every outbox handle is
    /// dropped. Returns the number of notifications delivered.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) -> u64 {
        tracing::info!("Notification dispatcher started");
        let mut delivered = 0u64;

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Notification dispatcher received shutdown signal");
                        break;
                    }
                }
                item = self.rx.recv() => match item {
                    Some(item) => delivered += self.deliver(item).await,
                    None => {
                        tracing::info!("Notification outbox closed");
                        break;
                    }
                }
            }
        }

        // flush what was already queued before the signal
        self.rx.close();
        while let Ok(item) = self.rx.try_recv() {
            delivered += self.deliver(item).await;
        }

        tracing::info!(delivered, "Notification dispatcher shut down");
        delivered
    }

    async fn deliver(&self, item: OutboundNotification) -> u64 {
        let kind = item.notification.kind();
        match self
            .sender
            .send(item.user_id, &item.notification, &item.channels)
            .await
        {
            Ok(true) => 1,
            Ok(false) => {
                tracing::warn!(user_id = %item.user_id, kind, "No channel accepted notification");
                0
            }
            Err(e) => {
                tracing::warn!(user_id = %item.user_id, kind, error = %e, "Notification delivery failed");
                0
            }
        }
    }
}
