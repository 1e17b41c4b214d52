//! Notification delivery seam.

use async_trait::async_trait;

use crate::notification::{Channel, Notification};
use crate::result::AppResult;
use crate::types::UserId;

/// Delivers a notification to a user over the given channels.
#[async_trait]
pub trait NotificationSender: Send + Sync + 'static {
    /// Send `notification` to `user_id`. Returns `true` if at least one
    /// channel accepted it.
    async fn send(
        &self,
        user_id: UserId,
        notification: &Notification,
        channels: &[Channel],
    ) -> AppResult<bool>;
}
