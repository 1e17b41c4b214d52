//! In-process [`InventoryStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::types::{BookingId, EventId, PromotionId, UserId};
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::booking::{Booking, BookingStatus, NewBooking};
use boxoffice_entity::event::{CreateEvent, Event, EventStatus};
use boxoffice_entity::waitlist::PromotionStatus;

use super::{MemoryStore, Shared, Tables};
use crate::store::{InsertOutcome, InventoryStore, InventoryTx, SeatSnapshot};

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        Ok(Box::new(MemoryTx::new(self.shared.clone())))
    }

    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>> {
        Ok(self.shared.tables.lock().await.events.get(&id).cloned())
    }

    async fn create_event(&self, data: CreateEvent) -> AppResult<Event> {
        if data.total_capacity <= 0 {
            return Err(AppError::validation("total_capacity must be positive"));
        }
        let event = data.into_event(Utc::now());
        self.shared
            .tables
            .lock()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_upcoming_events(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Event>> {
        let tables = self.shared.tables.lock().await;
        let mut upcoming: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.status == EventStatus::Active && e.event_date > now)
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        upcoming.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(upcoming)
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self.shared.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.shared.tables.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let mut tables = self.shared.tables.lock().await;
        if tables.users.values().any(|u| u.email == data.email) {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                data.email
            )));
        }
        let user = data.into_user(Utc::now());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// An open in-process transaction.
///
/// Seat and booking writes are staged here and applied to the shared tables
/// on [`commit`](InventoryTx::commit). Row guards are released when the
/// transaction is consumed or dropped.
pub struct MemoryTx {
    shared: Arc<Shared>,
    event_guards: HashMap<EventId, OwnedMutexGuard<()>>,
    booking_guards: HashMap<BookingId, OwnedMutexGuard<()>>,
    seat_writes: HashMap<EventId, (i32, i32)>,
    status_writes: HashMap<BookingId, BookingStatus>,
    inserted: Vec<Booking>,
    accepted: Vec<PromotionId>,
}

impl MemoryTx {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            event_guards: HashMap::new(),
            booking_guards: HashMap::new(),
            seat_writes: HashMap::new(),
            status_writes: HashMap::new(),
            inserted: Vec::new(),
            accepted: Vec::new(),
        }
    }

    /// Apply staged seat writes to a committed event row.
    fn overlay_event(&self, mut event: Event) -> Event {
        if let Some((available, version)) = self.seat_writes.get(&event.id) {
            event.available_seats = *available;
            event.version = *version;
        }
        event
    }

    fn overlay_booking(&self, mut booking: Booking) -> Booking {
        if let Some(status) = self.status_writes.get(&booking.id) {
            booking.status = *status;
        }
        booking
    }

    /// Bookings visible to this transaction: committed rows with staged
    /// status changes, followed by staged inserts.
    fn visible_bookings(&self, tables: &Tables) -> Vec<Booking> {
        tables
            .bookings
            .values()
            .cloned()
            .map(|b| self.overlay_booking(b))
            .chain(self.inserted.iter().cloned().map(|b| self.overlay_booking(b)))
            .collect()
    }
}

#[async_trait]
impl InventoryTx for MemoryTx {
    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.shared.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_event(&mut self, id: EventId) -> AppResult<Option<Event>> {
        let event = self.shared.tables.lock().await.events.get(&id).cloned();
        Ok(event.map(|e| self.overlay_event(e)))
    }

    async fn find_confirmed_booking(
        &mut self,
        user_id: UserId,
        event_id: EventId,
    ) -> AppResult<Option<Booking>> {
        let tables = self.shared.tables.lock().await;
        Ok(self.visible_bookings(&tables).into_iter().find(|b| {
            b.user_id == user_id && b.event_id == event_id && b.status == BookingStatus::Confirmed
        }))
    }

    async fn read_for_update(&mut self, event_id: EventId) -> AppResult<Option<SeatSnapshot>> {
        if !self.event_guards.contains_key(&event_id) {
            let guard = self.shared.event_locks.lock(event_id).await;
            self.event_guards.insert(event_id, guard);
        }
        let event = self.shared.tables.lock().await.events.get(&event_id).cloned();
        Ok(event.map(|e| {
            let e = self.overlay_event(e);
            SeatSnapshot {
                available_seats: e.available_seats,
                total_capacity: e.total_capacity,
                version: e.version,
                status: e.status,
            }
        }))
    }

    async fn write_if_version(
        &mut self,
        event_id: EventId,
        new_available: i32,
        expected_version: i32,
    ) -> AppResult<u64> {
        let Some(event) = self.find_event(event_id).await? else {
            return Ok(0);
        };
        if event.version != expected_version {
            return Ok(0);
        }
        if new_available < 0 || new_available > event.total_capacity {
            return Err(AppError::database(format!(
                "available_seats {new_available} outside 0..={}",
                event.total_capacity
            )));
        }
        self.seat_writes
            .insert(event_id, (new_available, event.version + 1));
        Ok(1)
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<InsertOutcome> {
        let tables = self.shared.tables.lock().await;
        let visible = self.visible_bookings(&tables);
        drop(tables);

        if visible
            .iter()
            .any(|b| b.booking_reference == booking.booking_reference)
        {
            return Ok(InsertOutcome::ReferenceTaken);
        }
        if visible.iter().any(|b| {
            b.user_id == booking.user_id
                && b.event_id == booking.event_id
                && b.status == BookingStatus::Confirmed
        }) {
            return Ok(InsertOutcome::DuplicateConfirmed);
        }

        let row = booking.clone().into_booking(Utc::now());
        self.inserted.push(row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn lock_booking(&mut self, id: BookingId) -> AppResult<Option<Booking>> {
        if !self.booking_guards.contains_key(&id) {
            let guard = self.shared.booking_locks.lock(id).await;
            self.booking_guards.insert(id, guard);
        }
        let booking = self.shared.tables.lock().await.bookings.get(&id).cloned();
        Ok(booking.map(|b| self.overlay_booking(b)))
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
    ) -> AppResult<u64> {
        let exists = self.shared.tables.lock().await.bookings.contains_key(&id)
            || self.inserted.iter().any(|b| b.id == id);
        if !exists {
            return Ok(0);
        }
        self.status_writes.insert(id, status);
        Ok(1)
    }

    async fn accept_pending_promotion(
        &mut self,
        user_id: UserId,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let tables = self.shared.tables.lock().await;
        let open: Vec<PromotionId> = tables
            .promotions
            .values()
            .filter(|p| p.user_id == user_id && p.event_id == event_id && p.is_open_at(now))
            .map(|p| p.id)
            .collect();
        drop(tables);

        let count = open.len() as u64;
        self.accepted.extend(open);
        Ok(count)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut tables = self.shared.tables.lock().await;

        for booking in &self.inserted {
            let clash = tables.bookings.values().any(|b| {
                b.booking_reference == booking.booking_reference
                    || (b.status == BookingStatus::Confirmed
                        && b.user_id == booking.user_id
                        && b.event_id == booking.event_id)
            });
            if clash {
                return Err(AppError::conflict(format!(
                    "Booking {} violates a unique constraint",
                    booking.booking_reference
                )));
            }
        }

        let now = Utc::now();
        for (event_id, (available, version)) in &self.seat_writes {
            if let Some(event) = tables.events.get_mut(event_id) {
                event.available_seats = *available;
                event.version = *version;
                event.updated_at = now;
            }
        }
        for booking in &self.inserted {
            tables.bookings.insert(booking.id, booking.clone());
        }
        for (id, status) in &self.status_writes {
            if let Some(booking) = tables.bookings.get_mut(id) {
                booking.status = *status;
                booking.updated_at = now;
            }
        }
        for id in &self.accepted {
            if let Some(promotion) = tables.promotions.get_mut(id) {
                if promotion.status == PromotionStatus::Pending {
                    promotion.status = PromotionStatus::Accepted;
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
