//! In-process [`WaitlistStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use boxoffice_core::result::AppResult;
use boxoffice_core::types::{EventId, UserId, WaitlistEntryId};
use boxoffice_entity::waitlist::{
    PromotionStatus, WaitlistEntry, WaitlistPromotion, WaitlistStatus,
};

use super::MemoryStore;
use crate::store::{WaitlistStats, WaitlistStore};

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn find_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> AppResult<Option<WaitlistEntry>> {
        let tables = self.shared.tables.lock().await;
        Ok(tables.entries.get(&(event_id, user_id)).cloned())
    }

    async fn upsert_active(
        &self,
        event_id: EventId,
        user_id: UserId,
        priority_score: i64,
        joined_at: DateTime<Utc>,
    ) -> AppResult<Option<WaitlistEntry>> {
        let mut tables = self.shared.tables.lock().await;
        let now = Utc::now();
        match tables.entries.get_mut(&(event_id, user_id)) {
            Some(existing) if existing.is_active() => Ok(None),
            Some(existing) => {
                existing.priority_score = priority_score;
                existing.joined_at = joined_at;
                existing.position = None;
                existing.status = WaitlistStatus::Active;
                existing.updated_at = now;
                Ok(Some(existing.clone()))
            }
            None => {
                let entry = WaitlistEntry {
                    id: WaitlistEntryId::new(),
                    event_id,
                    user_id,
                    priority_score,
                    joined_at,
                    position: None,
                    status: WaitlistStatus::Active,
                    created_at: now,
                    updated_at: now,
                };
                tables.entries.insert((event_id, user_id), entry.clone());
                Ok(Some(entry))
            }
        }
    }

    async fn close_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        status: WaitlistStatus,
    ) -> AppResult<bool> {
        let mut tables = self.shared.tables.lock().await;
        match tables.entries.get_mut(&(event_id, user_id)) {
            Some(entry) if entry.is_active() => {
                entry.status = status;
                entry.position = None;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_active(&self, event_id: EventId) -> AppResult<Vec<WaitlistEntry>> {
        let tables = self.shared.tables.lock().await;
        let mut active: Vec<_> = tables
            .entries
            .values()
            .filter(|e| e.event_id == event_id && e.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then(a.joined_at.cmp(&b.joined_at))
        });
        Ok(active)
    }

    async fn update_positions(&self, event_id: EventId, ordered: &[UserId]) -> AppResult<()> {
        let mut tables = self.shared.tables.lock().await;
        let now = Utc::now();
        for (index, user_id) in ordered.iter().enumerate() {
            if let Some(entry) = tables.entries.get_mut(&(event_id, *user_id)) {
                if entry.is_active() {
                    entry.position = Some(index as i32 + 1);
                    entry.updated_at = now;
                }
            }
        }
        Ok(())
    }

    async fn promote_entry(
        &self,
        event_id: EventId,
        user_id: UserId,
        now: DateTime<Utc>,
        window_minutes: i32,
    ) -> AppResult<Option<WaitlistPromotion>> {
        let mut tables = self.shared.tables.lock().await;
        let Some(entry) = tables
            .entries
            .get_mut(&(event_id, user_id))
            .filter(|e| e.is_active())
        else {
            return Ok(None);
        };

        entry.status = WaitlistStatus::Promoted;
        entry.position = None;
        entry.updated_at = now;

        let promotion = WaitlistPromotion::open(entry.id, event_id, user_id, now, window_minutes);
        tables.promotions.insert(promotion.id, promotion.clone());
        Ok(Some(promotion))
    }

    async fn expire_due_promotions(&self, now: DateTime<Utc>) -> AppResult<Vec<WaitlistPromotion>> {
        let mut tables = self.shared.tables.lock().await;
        let mut expired = Vec::new();
        for promotion in tables.promotions.values_mut() {
            if promotion.status == PromotionStatus::Pending && promotion.expires_at < now {
                promotion.status = PromotionStatus::Expired;
                expired.push(promotion.clone());
            }
        }
        for promotion in &expired {
            if let Some(entry) = tables
                .entries
                .get_mut(&(promotion.event_id, promotion.user_id))
            {
                if entry.id == promotion.waitlist_id && entry.status == WaitlistStatus::Promoted {
                    entry.status = WaitlistStatus::Expired;
                    entry.updated_at = now;
                }
            }
        }
        Ok(expired)
    }

    async fn stats(&self, event_id: EventId, since: DateTime<Utc>) -> AppResult<WaitlistStats> {
        let tables = self.shared.tables.lock().await;
        let total_waiting = tables
            .entries
            .values()
            .filter(|e| e.event_id == event_id && e.is_active())
            .count() as i64;

        let recent: Vec<_> = tables
            .promotions
            .values()
            .filter(|p| p.event_id == event_id && p.promoted_at >= since)
            .collect();
        let accepted = recent
            .iter()
            .filter(|p| p.status == PromotionStatus::Accepted)
            .count() as i64;

        let waits: Vec<f64> = recent
            .iter()
            .filter_map(|p| {
                tables
                    .entries
                    .values()
                    .find(|e| e.id == p.waitlist_id)
                    .map(|e| (p.promoted_at - e.joined_at).num_seconds() as f64 / 3600.0)
            })
            .collect();
        let avg_wait_hours = if waits.is_empty() {
            None
        } else {
            Some(waits.iter().sum::<f64>() / waits.len() as f64)
        };

        Ok(WaitlistStats {
            total_waiting,
            total_promotions: recent.len() as i64,
            accepted_promotions: accepted,
            avg_wait_hours,
        })
    }
}
