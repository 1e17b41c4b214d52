//! Store traits for inventory and waitlist state.
//!
//! The booking and waitlist services depend only on these traits. The
//! PostgreSQL repositories implement them for production, and the `memory`
//! feature provides in-process equivalents with matching lock semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::result::AppResult;
use boxoffice_core::types::{BookingId, EventId, UserId};
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::booking::{Booking, BookingStatus, NewBooking};
use boxoffice_entity::event::{CreateEvent, Event, EventStatus};
use boxoffice_entity::waitlist::{WaitlistEntry, WaitlistPromotion, WaitlistStatus};

/// Seat counter as observed under the event row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub available_seats: i32,
    pub total_capacity: i32,
    pub version: i32,
    pub status: EventStatus,
}

/// Result of attempting to insert a confirmed booking.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The row was written.
    Inserted(Booking),
    /// Another booking already uses this reference.
    ReferenceTaken,
    /// The user already holds a confirmed booking for this event.
    DuplicateConfirmed,
}

/// Aggregates over an event's waitlist history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitlistStats {
    /// Entries currently queued.
    pub total_waiting: i64,
    /// Promotions issued inside the window.
    pub total_promotions: i64,
    /// Promotions in the window that ended in a booking.
    pub accepted_promotions: i64,
    /// Mean hours between joining and promotion.
    pub avg_wait_hours: Option<f64>,
}

impl WaitlistStats {
    /// Share of promotions that converted, as a percentage.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_promotions == 0 {
            return 0.0;
        }
        (self.accepted_promotions as f64 / self.total_promotions as f64) * 100.0
    }
}

/// Entry point to event, user, and booking state.
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    /// Open a transaction. Dropping it without commit rolls back.
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>>;

    /// Look up an event outside any transaction.
    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>>;

    /// Insert an event with every seat available and version 1.
    async fn create_event(&self, data: CreateEvent) -> AppResult<Event>;

    /// Active events that have not started yet, soonest first.
    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Event>>;

    /// Look up a booking outside any transaction.
    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>>;

    /// Look up a user outside any transaction.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Insert a user.
    async fn create_user(&self, data: CreateUser) -> AppResult<User>;
}

/// One booking or cancellation transaction.
///
/// Row locks taken by [`read_for_update`](Self::read_for_update) and
/// [`lock_booking`](Self::lock_booking) are held until commit or rollback.
#[async_trait]
pub trait InventoryTx: Send {
    /// Read a user.
    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>>;

    /// Read an event without locking it.
    async fn find_event(&mut self, id: EventId) -> AppResult<Option<Event>>;

    /// The user's confirmed booking for the event, if any.
    async fn find_confirmed_booking(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> AppResult<Option<Booking>>;

    /// Lock the event row and read its seat counter.
    async fn read_for_update(&mut self, event_id: EventId) -> AppResult<Option<SeatSnapshot>>;

    /// Set `available_seats` and bump `version` if the version still equals
    /// `expected_version`. Returns the number of rows written (0 or 1).
    async fn write_if_version(
        &mut self,
        event_id: EventId,
        new_available: i32,
        expected_version: i32,
    ) -> AppResult<u64>;

    /// Insert a confirmed booking.
    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<InsertOutcome>;

    /// Lock a booking row and read it.
    async fn lock_booking(&mut self, id: BookingId) -> AppResult<Option<Booking>>;

    /// Change a booking's status.
    async fn set_booking_status(&mut self, id: BookingId, status: BookingStatus)
    -> AppResult<u64>;

    /// Mark the user's open promotion for the event as accepted.
    async fn accept_pending_promotion(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Make every write visible and release row locks.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write and release row locks.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Durable waitlist entries and promotions.
#[async_trait]
pub trait WaitlistStore: Send + Sync + 'static {
    /// The entry for (event, user) in any status.
    async fn find_entry(&self, event_id: EventId, user_id: UserId)
    -> AppResult<Option<WaitlistEntry>>;

    /// Insert an active entry, or reactivate the existing row for (event, user).
    ///
    /// Returns `None` without touching the row when it is already active.
    async fn upsert_active(
        &self,
        event_id: EventId,
        user_id: UserId,
        priority_score: i64,
        joined_at: DateTime<Utc>,
    ) -> AppResult<Option<WaitlistEntry>>;

    /// Move an active entry to `status`. Returns `false` if no active entry.
    async fn close_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: WaitlistStatus,
    ) -> AppResult<bool>;

    /// Active entries for an event.
    async fn list_active(&self, event_id: EventId) -> AppResult<Vec<WaitlistEntry>>;

    /// Write one-based positions for active entries in the given order.
    async fn update_positions(&self, event_id: EventId, ordered: &[UserId]) -> AppResult<()>;

    /// Atomically mark the active entry promoted and open a pending promotion.
    ///
    /// Returns `None` if the user has no active entry.
    async fn promote_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
        window_minutes: i32,
    ) -> AppResult<Option<WaitlistPromotion>>;

    /// Expire pending promotions whose window closed before `now`, marking
    /// their entries expired. Returns the promotions that were flipped.
    async fn expire_due_promotions(&self, now: DateTime<Utc>) -> AppResult<Vec<WaitlistPromotion>>;

    /// Aggregate statistics for promotions issued at or after `since`.
    async fn stats(&self, event_id: EventId, since: DateTime<Utc>) -> AppResult<WaitlistStats>;
}
