//! In-process inventory and waitlist stores.
//!
//! [`MemoryStore`] keeps every table behind one `tokio` mutex and emulates
//! row-level `FOR UPDATE` locks with per-row mutexes whose guards live in
//! the open transaction. Writes are buffered in the transaction and applied
//! on commit, so a dropped transaction leaves no trace.

mod inventory;
mod locks;
mod waitlist;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use boxoffice_core::types::{BookingId, EventId, PromotionId, UserId};
use boxoffice_entity::account::User;
use boxoffice_entity::booking::{Booking, BookingStatus};
use boxoffice_entity::event::Event;
use boxoffice_entity::waitlist::{WaitlistEntry, WaitlistPromotion};

pub use inventory::MemoryTx;
use locks::RowLocks;

/// Committed rows.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) events: HashMap<EventId, Event>,
    pub(crate) bookings: HashMap<BookingId, Booking>,
    pub(crate) entries: HashMap<(EventId, UserId), WaitlistEntry>,
    pub(crate) promotions: HashMap<PromotionId, WaitlistPromotion>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) tables: Mutex<Tables>,
    pub(crate) event_locks: RowLocks<EventId>,
    pub(crate) booking_locks: RowLocks<BookingId>,
}

/// In-process implementation of both store traits.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                event_locks: RowLocks::new(),
                booking_locks: RowLocks::new(),
            }),
        }
    }

    /// Confirmed bookings for an event.
    pub async fn confirmed_bookings(&self, event_id: EventId) -> Vec<Booking> {
        let tables = self.shared.tables.lock().await;
        tables
            .bookings
            .values()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Confirmed)
            .cloned()
            .collect()
    }

    /// Every promotion issued for an event.
    pub async fn promotions(&self, event_id: EventId) -> Vec<WaitlistPromotion> {
        let tables = self.shared.tables.lock().await;
        let mut promotions: Vec<_> = tables
            .promotions
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        promotions.sort_by_key(|p| p.promoted_at);
        promotions
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
