//! Event repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::EventId;
use boxoffice_entity::event::{CreateEvent, Event};

/// Repository for event reads and administrative creation.
///
/// Seat counters are only written through
/// [`PgInventoryTx`](super::inventory::PgInventoryTx).
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: EventId) -> AppResult<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find event", e))
    }

    /// Active events after `now`, ordered by start time.
    pub async fn list_upcoming(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE status = 'active' AND event_date > $1 \
             ORDER BY event_date, id LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list events", e))
    }

    /// Insert an event with all seats available.
    pub async fn create(&self, data: CreateEvent) -> AppResult<Event> {
        let event = data.into_event(Utc::now());
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, name, venue, description, event_date, price, \
             total_capacity, available_seats, version, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.venue)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(event.price)
        .bind(event.total_capacity)
        .bind(event.available_seats)
        .bind(event.version)
        .bind(event.status)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create event", e))
    }
}
