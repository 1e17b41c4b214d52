//! Waitlist repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{EventId, UserId, WaitlistEntryId};
use boxoffice_entity::waitlist::{WaitlistEntry, WaitlistPromotion, WaitlistStatus};

use crate::store::{WaitlistStats, WaitlistStore};

const PROMOTION_COLUMNS: &str =
    "id, waitlist_id, event_id, user_id, promoted_at, expires_at, booking_window_minutes, status";

/// Repository for waitlist entries and promotions.
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    pool: PgPool,
}

impl WaitlistRepository {
    /// Create a new waitlist repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_waiting: i64,
    total_promotions: i64,
    accepted_promotions: i64,
    avg_wait_hours: Option<f64>,
}

#[async_trait]
impl WaitlistStore for WaitlistRepository {
    async fn find_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> AppResult<Option<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlists WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find waitlist entry", e))
    }

    async fn upsert_active(
        &self,
        event_id: EventId,
        user_id: UserId,
        priority_score: i64,
        joined_at: DateTime<Utc>,
    ) -> AppResult<Option<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlists (id, event_id, user_id, priority_score, joined_at, status) \
             VALUES ($1, $2, $3, $4, $5, 'active') \
             ON CONFLICT (event_id, user_id) DO UPDATE SET \
                priority_score = EXCLUDED.priority_score, \
                joined_at = EXCLUDED.joined_at, \
                position = NULL, \
                status = 'active', \
                updated_at = NOW() \
             WHERE waitlists.status <> 'active' \
             RETURNING *",
        )
        .bind(WaitlistEntryId::new())
        .bind(event_id)
        .bind(user_id)
        .bind(priority_score)
        .bind(joined_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert waitlist entry", e))
    }

    async fn close_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: WaitlistStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE waitlists SET status = $3, position = NULL, updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 AND status = 'active'",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to close waitlist entry", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_active(&self, event_id: EventId) -> AppResult<Vec<WaitlistEntry>> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlists WHERE event_id = $1 AND status = 'active' \
             ORDER BY priority_score DESC, joined_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list waitlist", e))
    }

    async fn update_positions(&self, event_id: EventId, ordered: &[UserId]) -> AppResult<()> {
        let users: Vec<Uuid> = ordered.iter().map(|id| id.into_uuid()).collect();
        sqlx::query(
            "UPDATE waitlists w SET position = u.pos::INTEGER, updated_at = NOW() \
             FROM UNNEST($2::UUID[]) WITH ORDINALITY AS u(user_id, pos) \
             WHERE w.event_id = $1 AND w.user_id = u.user_id AND w.status = 'active'",
        )
        .bind(event_id)
        .bind(users)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update positions", e))?;
        Ok(())
    }

    async fn promote_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
        window_minutes: i32,
    ) -> AppResult<Option<WaitlistPromotion>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let entry_id: Option<WaitlistEntryId> = sqlx::query_scalar(
            "UPDATE waitlists SET status = 'promoted', position = NULL, updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 AND status = 'active' RETURNING id",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to promote entry", e))?;

        let Some(entry_id) = entry_id else {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back", e)
            })?;
            return Ok(None);
        };

        let promotion = WaitlistPromotion::open(entry_id, event_id, user_id, now, window_minutes);
        let promotion = sqlx::query_as::<_, WaitlistPromotion>(&format!(
            "INSERT INTO waitlist_promotions \
             (id, waitlist_id, event_id, user_id, promoted_at, expires_at, booking_window_minutes, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PROMOTION_COLUMNS}"
        ))
        .bind(promotion.id)
        .bind(promotion.waitlist_id)
        .bind(promotion.event_id)
        .bind(promotion.user_id)
        .bind(promotion.promoted_at)
        .bind(promotion.expires_at)
        .bind(promotion.booking_window_minutes)
        .bind(promotion.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert promotion", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;
        Ok(Some(promotion))
    }

    async fn expire_due_promotions(&self, now: DateTime<Utc>) -> AppResult<Vec<WaitlistPromotion>> {
        sqlx::query_as::<_, WaitlistPromotion>(&format!(
            "WITH expired AS ( \
                UPDATE waitlist_promotions SET status = 'expired', updated_at = NOW() \
                WHERE status = 'pending' AND expires_at < $1 \
                RETURNING {PROMOTION_COLUMNS} \
             ), closed AS ( \
                UPDATE waitlists w SET status = 'expired', updated_at = NOW() \
                FROM expired e WHERE w.id = e.waitlist_id AND w.status = 'promoted' \
             ) \
             SELECT * FROM expired"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire promotions", e))
    }

    async fn stats(&self, event_id: EventId, since: DateTime<Utc>) -> AppResult<WaitlistStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT \
                (SELECT COUNT(*) FROM waitlists WHERE event_id = $1 AND status = 'active') AS total_waiting, \
                COUNT(wp.id) AS total_promotions, \
                COUNT(wp.id) FILTER (WHERE wp.status = 'accepted') AS accepted_promotions, \
                AVG(EXTRACT(EPOCH FROM (wp.promoted_at - w.joined_at)) / 3600.0)::DOUBLE PRECISION AS avg_wait_hours \
             FROM waitlist_promotions wp \
             JOIN waitlists w ON wp.waitlist_id = w.id \
             WHERE wp.event_id = $1 AND wp.promoted_at >= $2",
        )
        .bind(event_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load waitlist stats", e))?;

        Ok(WaitlistStats {
            total_waiting: row.total_waiting,
            total_promotions: row.total_promotions,
            accepted_promotions: row.accepted_promotions,
            avg_wait_hours: row.avg_wait_hours,
        })
    }
}
