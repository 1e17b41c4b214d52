//! Notification repository implementation.

use sqlx::PgPool;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_entity::notice::NotificationRecord;

/// Repository for delivered notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a delivered notification.
    pub async fn insert(&self, record: &NotificationRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, title, message, payload, channels, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.kind)
        .bind(&record.title)
        .bind(&record.message)
        .bind(&record.payload)
        .bind(&record.channels)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))?;
        Ok(())
    }
}
