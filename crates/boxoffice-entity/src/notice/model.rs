//! Notification record model.

use boxoffice_core::notification::{Channel, Notification};
use boxoffice_core::types::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A notification as delivered to a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub user_id: UserId,
    /// Notification kind, e.g. `waitlist_promoted`.
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Full notification body.
    pub payload: serde_json::Value,
    /// Channels it went out on.
    pub channels: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Render a record from an outbound notification.
    pub fn from_notification(
        user_id: UserId,
        notification: &Notification,
        channels: &[Channel],
        now: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: NotificationId::new(),
            user_id,
            kind: notification.kind().to_string(),
            title: notification.title(),
            message: notification.message(),
            payload: serde_json::to_value(notification)?,
            channels: channels.iter().map(|c| c.as_str().to_string()).collect(),
            created_at: now,
        })
    }
}
