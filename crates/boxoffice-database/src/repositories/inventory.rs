//! PostgreSQL inventory store.
//!
//! Each [`PgInventoryTx`] wraps one sqlx transaction. `read_for_update`
//! takes the event row lock with `SELECT ... FOR UPDATE`, and seat writes are
//! guarded by a version comparison in the `WHERE` clause.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use boxoffice_core::error::{AppError, ErrorKind};
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{BookingId, EventId, UserId};
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::booking::{Booking, BookingStatus, NewBooking};
use boxoffice_entity::event::{CreateEvent, Event, EventStatus};

use super::booking::BookingRepository;
use super::event::EventRepository;
use super::user::UserRepository;
use crate::store::{InsertOutcome, InventoryStore, InventoryTx, SeatSnapshot};

const CONFIRMED_INDEX: &str = "bookings_one_confirmed_per_user_event";

/// [`InventoryStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
    events: EventRepository,
    bookings: BookingRepository,
    users: UserRepository,
}

impl PgInventoryStore {
    /// Create a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgInventoryTx { tx }))
    }

    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>> {
        self.events.find_by_id(id).await
    }

    async fn create_event(&self, data: CreateEvent) -> AppResult<Event> {
        self.events.create(data).await
    }

    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Event>> {
        self.events.list_upcoming(now, limit).await
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        self.bookings.find_by_id(id).await
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        self.users.create(data).await
    }
}

/// One open PostgreSQL transaction.
pub struct PgInventoryTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    available_seats: i32,
    total_capacity: i32,
    version: i32,
    status: EventStatus,
}

#[async_trait]
impl InventoryTx for PgInventoryTx {
    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }

    async fn find_event(&mut self, id: EventId) -> AppResult<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find event", e))
    }

    async fn find_confirmed_booking(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 AND event_id = $2 AND status = 'confirmed'",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check existing booking", e)
        })
    }

    async fn read_for_update(&mut self, event_id: EventId) -> AppResult<Option<SeatSnapshot>> {
        let row = sqlx::query_as::<_, SeatRow>(
            "SELECT available_seats, total_capacity, version, status \
             FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock event row", e))?;

        Ok(row.map(|r| SeatSnapshot {
            available_seats: r.available_seats,
            total_capacity: r.total_capacity,
            version: r.version,
            status: r.status,
        }))
    }

    async fn write_if_version(
        &mut self,
        event_id: EventId,
        new_available: i32,
        expected_version: i32,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE events SET available_seats = $2, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $3",
        )
        .bind(event_id)
        .bind(new_available)
        .bind(expected_version)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update seats", e))?;
        Ok(result.rows_affected())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<InsertOutcome> {
        let row = booking.clone().into_booking(Utc::now());
        let inserted = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, booking_reference, user_id, event_id, quantity, \
             total_amount, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (booking_reference) DO NOTHING RETURNING *",
        )
        .bind(row.id)
        .bind(&row.booking_reference)
        .bind(row.user_id)
        .bind(row.event_id)
        .bind(row.quantity)
        .bind(row.total_amount)
        .bind(row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&mut *self.tx)
        .await;

        match inserted {
            Ok(Some(booking)) => Ok(InsertOutcome::Inserted(booking)),
            Ok(None) => Ok(InsertOutcome::ReferenceTaken),
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation() && db.constraint() == Some(CONFIRMED_INDEX) =>
            {
                Ok(InsertOutcome::DuplicateConfirmed)
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to insert booking",
                e,
            )),
        }
    }

    async fn lock_booking(&mut self, id: BookingId) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock booking", e))
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
    ) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to update booking", e)
                })?;
        Ok(result.rows_affected())
    }

    async fn accept_pending_promotion(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE waitlist_promotions SET status = 'accepted', updated_at = NOW() \
             WHERE user_id = $1 AND event_id = $2 AND status = 'pending' AND expires_at > $3",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to accept promotion", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to roll back", e))
    }
}
