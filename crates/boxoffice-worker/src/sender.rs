//! Database-backed notification sender.
//!
//! Every notification is persisted once to the `notifications` table; the
//! live channels are recorded with a log line each.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::notification::{Channel, Notification};
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::NotificationSender;
use boxoffice_core::types::UserId;
use boxoffice_database::repositories::NotificationRepository;
use boxoffice_entity::notice::NotificationRecord;

/// Persists notifications and logs their channel fan-out.
#[derive(Debug, Clone)]
pub struct DatabaseNotificationSender {
    repo: NotificationRepository,
}

impl DatabaseNotificationSender {
    /// Create a sender over the notification repository.
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationSender for DatabaseNotificationSender {
    async fn send(
        &self,
        user_id: UserId,
        notification: &Notification,
        channels: &[Channel],
    ) -> AppResult<bool> {
        let record = NotificationRecord::from_notification(user_id, notification, channels, Utc::now())
            .map_err(|e| {
                AppError::with_source(ErrorKind::Serialization, "Failed to encode notification", e)
            })?;
        self.repo.insert(&record).await?;

        for channel in channels {
            info!(
                notification_id = %record.id,
                user_id = %user_id,
                kind = %record.kind,
                channel = %channel,
                "Notification sent"
            );
        }
        Ok(!channels.is_empty())
    }
}
