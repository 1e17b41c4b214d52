//! Waitlist service: join, leave, promote, expire.
//!
//! The coordination store holds the ordered queue (`waitlist:{event}`) and
//! the waitlist store holds the durable entries and promotions. The queue
//! is a projection; the store is the source of truth, and a popped member
//! with no active entry is skipped.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use boxoffice_cache::keys;
use boxoffice_core::config::WaitlistConfig;
use boxoffice_core::notification::Notification;
use boxoffice_core::traits::CoordinationStore;
use boxoffice_core::types::{EventId, UserId, WaitlistEntryId};
use boxoffice_database::store::{InventoryStore, WaitlistStore};
use boxoffice_entity::waitlist::{QueueScore, WaitlistPromotion, WaitlistStatus};

use super::estimate::WaitEstimate;
use crate::error::WaitlistError;
use crate::hooks::Outbox;

const STATS_WINDOW_DAYS: i64 = 30;

/// Outcome of joining a waitlist.
#[derive(Debug, Clone, Serialize)]
pub struct JoinReceipt {
    pub entry_id: WaitlistEntryId,
    /// One-based queue position.
    pub position: u64,
    pub estimated_wait_hours: f64,
    pub promotion_probability: u8,
}

/// A queued user's place in line.
#[derive(Debug, Clone, Serialize)]
pub struct QueuePosition {
    pub event_id: EventId,
    pub user_id: UserId,
    pub position: u64,
    pub total_waiting: u64,
    pub estimated_wait_hours: f64,
    pub promotion_probability: u8,
}

/// Waitlist health for an event.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistOverview {
    pub event_id: EventId,
    /// Members in the live queue.
    pub queue_length: u64,
    /// Active entries in the store.
    pub total_waiting: i64,
    /// Promotions issued in the last thirty days.
    pub total_promotions: i64,
    pub accepted_promotions: i64,
    /// Percentage of promotions that converted into bookings.
    pub acceptance_rate: f64,
    pub avg_wait_hours: Option<f64>,
}

/// Coordinates the waitlist queue with its durable entries.
#[derive(Clone)]
pub struct WaitlistService {
    store: Arc<dyn WaitlistStore>,
    inventory: Arc<dyn InventoryStore>,
    coordination: Arc<dyn CoordinationStore>,
    outbox: Outbox,
    config: WaitlistConfig,
}

impl std::fmt::Debug for WaitlistService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitlistService")
            .field("coordination", &self.coordination)
            .finish()
    }
}

impl WaitlistService {
    /// Creates a new waitlist service.
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        inventory: Arc<dyn InventoryStore>,
        coordination: Arc<dyn CoordinationStore>,
        outbox: Outbox,
        config: WaitlistConfig,
    ) -> Self {
        Self {
            store,
            inventory,
            coordination,
            outbox,
            config,
        }
    }

    /// Queue a user for a sold-out event.
    ///
    /// `tier` overrides the user's stored tier when given.
    pub async fn join_waitlist(
        &self,
        event_id: EventId,
        user_id: UserId,
        tier: Option<String>,
    ) -> Result<JoinReceipt, WaitlistError> {
        let event = self
            .inventory
            .find_event(event_id)
            .await?
            .ok_or(WaitlistError::EventNotFound(event_id))?;
        if event.available_seats > 0 {
            return Err(WaitlistError::SeatsAvailable {
                available: event.available_seats,
            });
        }

        let user = self
            .inventory
            .find_user(user_id)
            .await?
            .ok_or(WaitlistError::UserNotFound(user_id))?;
        let tier = tier.unwrap_or(user.tier);

        let priority = self.config.priority_for(&tier);
        let joined_at = Utc::now();
        // conditional upsert: exactly one concurrent join wins the row
        let entry = self
            .store
            .upsert_active(event_id, user_id, priority, joined_at)
            .await?
            .ok_or(WaitlistError::AlreadyOnWaitlist)?;

        let queue = keys::waitlist_queue(event_id);
        let member = user_id.to_string();
        let score = QueueScore::compose(priority, joined_at);
        match self
            .coordination
            .queue_add(&queue, &member, score.value())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(event_id = %event_id, user_id = %user_id, "Rescored leftover queue member");
            }
            Err(e) => {
                // an active entry with no queue member could never be promoted
                if let Err(undo) = self
                    .store
                    .close_entry(event_id, user_id, WaitlistStatus::Cancelled)
                    .await
                {
                    error!(event_id = %event_id, user_id = %user_id, error = %undo, "Failed to roll back waitlist entry");
                }
                return Err(e.into());
            }
        }

        let position = match self.coordination.queue_rank_desc(&queue, &member).await? {
            Some(rank) => rank + 1,
            None => self.coordination.queue_len(&queue).await?,
        };
        self.refresh_positions_logged(event_id).await;

        let estimate = WaitEstimate::for_position(position, &self.config);

        info!(
            event_id = %event_id,
            user_id = %user_id,
            tier = %tier,
            priority,
            position,
            "User joined waitlist"
        );

        self.outbox.enqueue(
            user_id,
            Notification::WaitlistJoined {
                event_id,
                event_name: event.name,
                position,
                estimated_wait_hours: estimate.estimated_wait_hours,
            },
        );

        Ok(JoinReceipt {
            entry_id: entry.id,
            position,
            estimated_wait_hours: estimate.estimated_wait_hours,
            promotion_probability: estimate.promotion_probability,
        })
    }

    /// Remove a user from the queue. Returns `false` if they were not queued.
    pub async fn leave_waitlist(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<bool, WaitlistError> {
        let queue = keys::waitlist_queue(event_id);
        let removed = self
            .coordination
            .queue_remove(&queue, &user_id.to_string())
            .await?;
        if !removed {
            return Ok(false);
        }

        self.store
            .close_entry(event_id, user_id, WaitlistStatus::Cancelled)
            .await?;
        self.refresh_positions_logged(event_id).await;

        info!(event_id = %event_id, user_id = %user_id, "User left waitlist");
        Ok(true)
    }

    /// Promote up to `freed` of the highest-ranked members.
    ///
    /// Promotion opens a booking window; it does not reserve seats.
    pub async fn process_promotions(
        &self,
        event_id: EventId,
        freed: u32,
    ) -> Result<u32, WaitlistError> {
        if freed == 0 {
            return Ok(0);
        }

        let event_name = self
            .inventory
            .find_event(event_id)
            .await?
            .map(|e| e.name)
            .unwrap_or_default();
        let queue = keys::waitlist_queue(event_id);
        let mut promoted = 0u32;

        while promoted < freed {
            let batch = self
                .coordination
                .queue_pop_max(&queue, u64::from(freed - promoted))
                .await?;
            if batch.is_empty() {
                break;
            }

            let mut pending = batch.into_iter();
            while let Some((member, score)) = pending.next() {
                let Ok(user_id) = member.parse::<UserId>() else {
                    warn!(event_id = %event_id, member = %member, "Dropping malformed queue member");
                    continue;
                };

                match self
                    .store
                    .promote_entry(
                        event_id,
                        user_id,
                        Utc::now(),
                        self.config.booking_window_minutes,
                    )
                    .await
                {
                    Ok(Some(promotion)) => {
                        promoted += 1;
                        self.announce_promotion(&promotion, &event_name);
                    }
                    Ok(None) => {
                        debug!(event_id = %event_id, user_id = %user_id, "Skipping stale queue member");
                    }
                    Err(e) => {
                        let unprocessed: Vec<_> =
                            std::iter::once((member, score)).chain(pending).collect();
                        self.requeue(&queue, unprocessed).await;
                        return Err(e.into());
                    }
                }
            }
        }

        self.refresh_positions_logged(event_id).await;

        if promoted > 0 {
            info!(event_id = %event_id, freed, promoted, "Waitlist promotions issued");
        }
        Ok(promoted)
    }

    /// Expire every promotion whose window has closed.
    pub async fn expire_promotions(&self) -> Result<u32, WaitlistError> {
        self.expire_promotions_at(Utc::now()).await
    }

    /// Expire promotions whose window closed before `now`.
    ///
    /// Freed windows are not passed on; the next cancellation promotes again.
    pub async fn expire_promotions_at(
        &self,
        now: chrono::DateTime<Utc>,
    ) -> Result<u32, WaitlistError> {
        let expired = self.store.expire_due_promotions(now).await?;
        for promotion in &expired {
            debug!(
                promotion_id = %promotion.id,
                event_id = %promotion.event_id,
                user_id = %promotion.user_id,
                "Promotion expired"
            );
            self.outbox.enqueue(
                promotion.user_id,
                Notification::PromotionExpired {
                    promotion_id: promotion.id,
                    event_id: promotion.event_id,
                },
            );
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Expired waitlist promotions");
        }
        Ok(expired.len() as u32)
    }

    /// Current place in line for a queued user.
    pub async fn position(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<QueuePosition, WaitlistError> {
        let queue = keys::waitlist_queue(event_id);
        let rank = self
            .coordination
            .queue_rank_desc(&queue, &user_id.to_string())
            .await?
            .ok_or(WaitlistError::NotOnWaitlist)?;
        let total_waiting = self.coordination.queue_len(&queue).await?;

        let position = rank + 1;
        let estimate = WaitEstimate::for_position(position, &self.config);
        Ok(QueuePosition {
            event_id,
            user_id,
            position,
            total_waiting,
            estimated_wait_hours: estimate.estimated_wait_hours,
            promotion_probability: estimate.promotion_probability,
        })
    }

    /// Queue length plus promotion history for the last thirty days.
    pub async fn stats(&self, event_id: EventId) -> Result<WaitlistOverview, WaitlistError> {
        if self.inventory.find_event(event_id).await?.is_none() {
            return Err(WaitlistError::EventNotFound(event_id));
        }

        let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);
        let stats = self.store.stats(event_id, since).await?;
        let queue_length = self
            .coordination
            .queue_len(&keys::waitlist_queue(event_id))
            .await?;

        Ok(WaitlistOverview {
            event_id,
            queue_length,
            total_waiting: stats.total_waiting,
            total_promotions: stats.total_promotions,
            accepted_promotions: stats.accepted_promotions,
            acceptance_rate: stats.acceptance_rate(),
            avg_wait_hours: stats.avg_wait_hours,
        })
    }

    /// Rebuild the queue from active store entries. Returns the new length.
    ///
    /// The queue is swapped in one step, so concurrent readers never see
    /// it empty. A join or leave that lands between the store read and the
    /// swap is lost from the queue until the next rebuild.
    pub async fn rebuild_queue(&self, event_id: EventId) -> Result<u64, WaitlistError> {
        let queue = keys::waitlist_queue(event_id);
        let stale = self.coordination.queue_len(&queue).await?;

        let active = self.store.list_active(event_id).await?;
        let members: Vec<(String, f64)> = active
            .iter()
            .map(|entry| {
                let score = QueueScore::compose(entry.priority_score, entry.joined_at);
                (entry.user_id.to_string(), score.value())
            })
            .collect();
        self.coordination.queue_replace(&queue, &members).await?;
        self.refresh_positions(event_id).await?;

        info!(
            event_id = %event_id,
            previous = stale,
            rebuilt = members.len(),
            "Waitlist queue rebuilt"
        );
        Ok(members.len() as u64)
    }

    /// Persist one-based positions in queue order.
    async fn refresh_positions(&self, event_id: EventId) -> Result<(), WaitlistError> {
        let queue = keys::waitlist_queue(event_id);
        let len = self.coordination.queue_len(&queue).await?;
        if len == 0 {
            return Ok(());
        }

        let ordered: Vec<UserId> = self
            .coordination
            .queue_range_desc(&queue, 0, len - 1)
            .await?
            .iter()
            .filter_map(|member| member.parse().ok())
            .collect();
        self.store.update_positions(event_id, &ordered).await?;
        Ok(())
    }

    async fn refresh_positions_logged(&self, event_id: EventId) {
        if let Err(e) = self.refresh_positions(event_id).await {
            warn!(event_id = %event_id, error = %e, "Failed to refresh waitlist positions");
        }
    }

    async fn requeue(&self, queue: &str, members: Vec<(String, f64)>) {
        for (member, score) in members {
            if let Err(e) = self.coordination.queue_add(queue, &member, score).await {
                error!(queue = %queue, member = %member, error = %e, "Failed to requeue member");
            }
        }
    }

    fn announce_promotion(&self, promotion: &WaitlistPromotion, event_name: &str) {
        info!(
            promotion_id = %promotion.id,
            event_id = %promotion.event_id,
            user_id = %promotion.user_id,
            expires_at = %promotion.expires_at,
            "User promoted from waitlist"
        );
        self.outbox.enqueue(
            promotion.user_id,
            Notification::WaitlistPromoted {
                promotion_id: promotion.id,
                event_id: promotion.event_id,
                event_name: event_name.to_string(),
                expires_at: promotion.expires_at,
                booking_window_minutes: promotion.booking_window_minutes,
            },
        );
    }
}
