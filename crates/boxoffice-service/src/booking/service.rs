//! Booking coordinator.
//!
//! A purchase runs under two guards: a short-lived distributed lock per
//! (user, event) that keeps one user from racing themselves, and the event
//! row lock plus version check that keeps concurrent buyers from overselling.
//! Side effects run only after commit, and the distributed lock is released
//! on every path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use boxoffice_cache::keys;
use boxoffice_core::config::BookingConfig;
use boxoffice_core::notification::Notification;
use boxoffice_core::traits::CoordinationStore;
use boxoffice_core::types::{BookingId, EventId, UserId};
use boxoffice_database::store::{InsertOutcome, InventoryStore, InventoryTx};
use boxoffice_entity::booking::{Booking, BookingStatus, NewBooking};
use boxoffice_entity::event::EventStatus;

use super::reference;
use crate::error::BookingError;
use crate::hooks::{CacheInvalidator, Outbox};
use crate::waitlist::WaitlistService;

const REFERENCE_ATTEMPTS: usize = 2;

/// A committed booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub reference: String,
    /// Whether the booking consumed an open waitlist promotion.
    pub promotion_accepted: bool,
}

/// A committed cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationReceipt {
    pub booking_id: BookingId,
    pub event_id: EventId,
    pub refunded_amount: i64,
    pub seats_returned: i32,
    /// Waitlist members promoted into the freed seats.
    pub promoted: u32,
}

struct Confirmed {
    booking: Booking,
    event_name: String,
    version: i32,
    promotion_accepted: bool,
}

struct Cancelled {
    booking: Booking,
    event_name: String,
    seats_returned: i32,
    version: i32,
}

/// Books and cancels seats.
#[derive(Clone)]
pub struct BookingService {
    inventory: Arc<dyn InventoryStore>,
    coordination: Arc<dyn CoordinationStore>,
    waitlist: Arc<WaitlistService>,
    cache: CacheInvalidator,
    outbox: Outbox,
    config: BookingConfig,
}

impl std::fmt::Debug for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingService")
            .field("config", &self.config)
            .finish()
    }
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        coordination: Arc<dyn CoordinationStore>,
        waitlist: Arc<WaitlistService>,
        cache: CacheInvalidator,
        outbox: Outbox,
        config: BookingConfig,
    ) -> Self {
        Self {
            inventory,
            coordination,
            waitlist,
            cache,
            outbox,
            config,
        }
    }

    /// Book `quantity` seats for a user.
    ///
    /// Contention surfaces as [`BookingError::LockBusy`] or
    /// [`BookingError::VersionConflict`]; neither is retried here.
    pub async fn book_tickets(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: i32,
    ) -> Result<BookingReceipt, BookingError> {
        let max = self.config.max_tickets_per_booking;
        if quantity < 1 || quantity > max {
            return Err(BookingError::InvalidQuantity {
                requested: quantity,
                max,
            });
        }

        let lock_key = keys::booking_lock(user_id, event_id);
        let token = Uuid::new_v4().to_string();
        self.acquire(&lock_key, &token).await?;

        let result = self.book_locked(user_id, event_id, quantity).await;
        self.release(&lock_key, &token).await;
        let confirmed = result?;

        let booking = confirmed.booking;
        info!(
            booking_id = %booking.id,
            reference = %booking.booking_reference,
            user_id = %user_id,
            event_id = %event_id,
            quantity,
            version = confirmed.version,
            "Booking confirmed"
        );

        self.cache.event_changed(event_id).await;
        self.outbox.enqueue(
            user_id,
            Notification::BookingConfirmed {
                booking_id: booking.id,
                event_id,
                event_name: confirmed.event_name,
                booking_reference: booking.booking_reference.clone(),
                quantity: booking.quantity,
                total_amount: booking.total_amount,
            },
        );

        Ok(BookingReceipt {
            reference: booking.booking_reference.clone(),
            booking,
            promotion_accepted: confirmed.promotion_accepted,
        })
    }

    /// Cancel a confirmed booking, return its seats, and promote waitlisted
    /// users into them.
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<CancellationReceipt, BookingError> {
        let lock_key = keys::cancel_lock(booking_id);
        let token = Uuid::new_v4().to_string();
        self.acquire(&lock_key, &token).await?;

        let result = self.cancel_locked(booking_id).await;
        self.release(&lock_key, &token).await;
        let cancelled = result?;

        let booking = cancelled.booking;
        info!(
            booking_id = %booking.id,
            reference = %booking.booking_reference,
            event_id = %booking.event_id,
            seats_returned = cancelled.seats_returned,
            version = cancelled.version,
            "Booking cancelled"
        );

        self.cache.event_changed(booking.event_id).await;
        self.outbox.enqueue(
            booking.user_id,
            Notification::BookingCancelled {
                booking_id: booking.id,
                event_id: booking.event_id,
                event_name: cancelled.event_name,
                booking_reference: booking.booking_reference.clone(),
                refunded_amount: booking.total_amount,
            },
        );

        let freed = u32::try_from(cancelled.seats_returned).unwrap_or(0);
        let promoted = match self
            .waitlist
            .process_promotions(booking.event_id, freed)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    booking_id = %booking.id,
                    event_id = %booking.event_id,
                    error = %e,
                    "Waitlist promotion after cancellation failed"
                );
                0
            }
        };

        Ok(CancellationReceipt {
            booking_id: booking.id,
            event_id: booking.event_id,
            refunded_amount: booking.total_amount,
            seats_returned: cancelled.seats_returned,
            promoted,
        })
    }

    /// Look up a booking in any status.
    pub async fn find_booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.inventory
            .find_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound(booking_id))
    }

    async fn acquire(&self, key: &str, token: &str) -> Result<(), BookingError> {
        match self
            .coordination
            .acquire(key, token, self.config.lock_ttl())
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(key = %key, "Lock held elsewhere");
                Err(BookingError::LockBusy)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Lock acquisition failed");
                Err(BookingError::LockBusy)
            }
        }
    }

    async fn release(&self, key: &str, token: &str) {
        match self.coordination.release(key, token).await {
            Ok(true) => {}
            Ok(false) => warn!(key = %key, "Lock expired before release"),
            Err(e) => warn!(key = %key, error = %e, "Lock release failed"),
        }
    }

    async fn book_locked(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: i32,
    ) -> Result<Confirmed, BookingError> {
        let mut tx = self.inventory.begin().await?;
        match self
            .book_in_tx(tx.as_mut(), user_id, event_id, quantity)
            .await
        {
            Ok(confirmed) => {
                tx.commit().await?;
                Ok(confirmed)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn book_in_tx(
        &self,
        tx: &mut dyn InventoryTx,
        user_id: UserId,
        event_id: EventId,
        quantity: i32,
    ) -> Result<Confirmed, BookingError> {
        let now = Utc::now();

        tx.find_user(user_id)
            .await?
            .ok_or(BookingError::UserNotFound(user_id))?;

        let event = tx
            .find_event(event_id)
            .await?
            .filter(|e| e.status == EventStatus::Active)
            .ok_or(BookingError::EventNotFound(event_id))?;
        if event.event_date <= now {
            return Err(BookingError::EventPast(event_id));
        }

        if tx.find_confirmed_booking(user_id, event_id).await?.is_some() {
            return Err(BookingError::DuplicateBooking);
        }

        let seats = tx.read_for_update(event_id).await?.ok_or_else(|| {
            BookingError::Integrity(format!("event {event_id} vanished under row lock"))
        })?;
        if seats.status != EventStatus::Active {
            return Err(BookingError::EventNotFound(event_id));
        }
        if seats.available_seats == 0 {
            return Err(BookingError::SoldOut);
        }
        if seats.available_seats < quantity {
            return Err(BookingError::InsufficientSeats {
                available: seats.available_seats,
                requested: quantity,
            });
        }

        let written = tx
            .write_if_version(event_id, seats.available_seats - quantity, seats.version)
            .await?;
        if written == 0 {
            warn!(
                event_id = %event_id,
                version = seats.version,
                "Seat version changed under row lock"
            );
            return Err(BookingError::VersionConflict);
        }

        let booking = self
            .insert_booking(tx, user_id, event_id, quantity, event.price, now)
            .await?;
        let promotion_accepted = tx.accept_pending_promotion(user_id, event_id, now).await? > 0;

        Ok(Confirmed {
            booking,
            event_name: event.name,
            version: seats.version + 1,
            promotion_accepted,
        })
    }

    async fn insert_booking(
        &self,
        tx: &mut dyn InventoryTx,
        user_id: UserId,
        event_id: EventId,
        quantity: i32,
        price: i64,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        for attempt in 1..=REFERENCE_ATTEMPTS {
            let new_booking = NewBooking {
                booking_reference: reference::generate(&self.config.reference_prefix, now),
                user_id,
                event_id,
                quantity,
                total_amount: price * i64::from(quantity),
            };

            match tx.insert_booking(&new_booking).await? {
                InsertOutcome::Inserted(booking) => return Ok(booking),
                InsertOutcome::DuplicateConfirmed => return Err(BookingError::DuplicateBooking),
                InsertOutcome::ReferenceTaken => {
                    warn!(
                        reference = %new_booking.booking_reference,
                        attempt,
                        "Booking reference collision"
                    );
                }
            }
        }

        Err(BookingError::Integrity(
            "booking reference collided on every attempt".to_string(),
        ))
    }

    async fn cancel_locked(&self, booking_id: BookingId) -> Result<Cancelled, BookingError> {
        let mut tx = self.inventory.begin().await?;
        match self.cancel_in_tx(tx.as_mut(), booking_id).await {
            Ok(cancelled) => {
                tx.commit().await?;
                Ok(cancelled)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn cancel_in_tx(
        &self,
        tx: &mut dyn InventoryTx,
        booking_id: BookingId,
    ) -> Result<Cancelled, BookingError> {
        let booking = tx
            .lock_booking(booking_id)
            .await?
            .filter(|b| b.status == BookingStatus::Confirmed)
            .ok_or(BookingError::NotFound(booking_id))?;

        if tx
            .set_booking_status(booking_id, BookingStatus::Cancelled)
            .await?
            == 0
        {
            return Err(BookingError::Integrity(format!(
                "booking {booking_id} vanished under row lock"
            )));
        }

        let event_id = booking.event_id;
        let seats = tx.read_for_update(event_id).await?.ok_or_else(|| {
            BookingError::Integrity(format!("event {event_id} of booking {booking_id} is missing"))
        })?;

        let restored = (seats.available_seats + booking.quantity).min(seats.total_capacity);
        if restored < seats.available_seats + booking.quantity {
            warn!(
                booking_id = %booking_id,
                event_id = %event_id,
                available = seats.available_seats,
                quantity = booking.quantity,
                "Returned seats clamped to capacity"
            );
        }

        let written = tx
            .write_if_version(event_id, restored, seats.version)
            .await?;
        if written == 0 {
            return Err(BookingError::VersionConflict);
        }

        let event_name = tx
            .find_event(event_id)
            .await?
            .map(|e| e.name)
            .unwrap_or_default();

        Ok(Cancelled {
            seats_returned: restored - seats.available_seats,
            booking,
            event_name,
            version: seats.version + 1,
        })
    }
}

async fn rollback(tx: Box<dyn InventoryTx>) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}
