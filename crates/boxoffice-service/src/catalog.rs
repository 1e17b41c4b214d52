//! Event catalog with a read-through view cache.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use boxoffice_cache::keys;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::CacheProvider;
use boxoffice_core::types::EventId;
use boxoffice_database::store::InventoryStore;
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::event::{CreateEvent, Event};

use crate::hooks::CacheInvalidator;

const LISTING_LIMIT: i64 = 100;

/// Event and user administration plus cached event lookup.
#[derive(Clone)]
pub struct EventCatalog {
    inventory: Arc<dyn InventoryStore>,
    cache: Arc<dyn CacheProvider>,
    invalidator: CacheInvalidator,
}

impl std::fmt::Debug for EventCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCatalog")
            .field("cache", &self.cache)
            .finish()
    }
}

impl EventCatalog {
    /// Creates a new catalog.
    pub fn new(inventory: Arc<dyn InventoryStore>, cache: Arc<dyn CacheProvider>) -> Self {
        Self {
            invalidator: CacheInvalidator::new(Arc::clone(&cache)),
            inventory,
            cache,
        }
    }

    /// Fetch an event, serving from cache when possible.
    ///
    /// Cache failures fall through to the store.
    pub async fn get_event(&self, event_id: EventId) -> AppResult<Event> {
        let key = keys::event_by_id(event_id);
        if let Some(event) = self.read_cached::<Event>(&key).await {
            return Ok(event);
        }

        let event = self
            .inventory
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event {event_id} not found")))?;
        self.write_cached(&key, &event).await;
        Ok(event)
    }

    /// Upcoming active events, soonest first, served from cache when possible.
    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        let key = keys::upcoming_events();
        if let Some(events) = self.read_cached::<Vec<Event>>(&key).await {
            return Ok(events);
        }

        let events = self
            .inventory
            .list_upcoming_events(Utc::now(), LISTING_LIMIT)
            .await?;
        self.write_cached(&key, &events).await;
        Ok(events)
    }

    /// Create an event with every seat available.
    pub async fn create_event(&self, data: CreateEvent) -> AppResult<Event> {
        if data.total_capacity <= 0 {
            return Err(AppError::validation("total_capacity must be positive"));
        }
        if data.price < 0 {
            return Err(AppError::validation("price must not be negative"));
        }
        if data.event_date <= Utc::now() {
            return Err(AppError::validation("event_date must be in the future"));
        }

        let event = self.inventory.create_event(data).await?;
        self.invalidator.event_changed(event.id).await;

        info!(
            event_id = %event.id,
            name = %event.name,
            capacity = event.total_capacity,
            "Event created"
        );
        Ok(event)
    }

    /// Register a user.
    pub async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let user = self.inventory.create_user(data).await?;
        info!(user_id = %user.id, tier = %user.tier, "User registered");
        Ok(user)
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        }
    }

    async fn write_cached<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.cache.set_default(key, &json).await {
                    warn!(key = %key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_cache::memory::MemoryCacheProvider;
    use boxoffice_core::config::cache::MemoryCacheConfig;
    use boxoffice_database::memory::MemoryStore;
    use chrono::Duration;

    fn catalog() -> (EventCatalog, Arc<dyn CacheProvider>) {
        let cache: Arc<dyn CacheProvider> =
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let catalog = EventCatalog::new(Arc::new(MemoryStore::new()), Arc::clone(&cache));
        (catalog, cache)
    }

    fn concert() -> CreateEvent {
        CreateEvent {
            name: "Night Concert".into(),
            venue: "Hall A".into(),
            description: None,
            event_date: Utc::now() + Duration::days(7),
            price: 5_000,
            total_capacity: 100,
        }
    }

    #[tokio::test]
    async fn test_get_event_populates_cache() {
        let (catalog, cache) = catalog();
        let event = catalog.create_event(concert()).await.unwrap();
        let key = keys::event_by_id(event.id);

        assert!(cache.get(&key).await.unwrap().is_none());
        let fetched = catalog.get_event(event.id).await.unwrap();
        assert_eq!(fetched.available_seats, 100);
        assert!(cache.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_an_event_is_created() {
        let (catalog, cache) = catalog();
        let first = catalog.create_event(concert()).await.unwrap();

        let listed = catalog.list_events().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first.id);
        assert!(cache.get(&keys::upcoming_events()).await.unwrap().is_some());

        catalog.create_event(concert()).await.unwrap();
        assert!(cache.get(&keys::upcoming_events()).await.unwrap().is_none());
        assert_eq!(catalog.list_events().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_invalid_events() {
        let (catalog, _) = catalog();
        let mut past = concert();
        past.event_date = Utc::now() - Duration::days(1);
        assert!(catalog.create_event(past).await.is_err());

        let mut empty = concert();
        empty.total_capacity = 0;
        assert!(catalog.create_event(empty).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_event_is_not_found() {
        let (catalog, _) = catalog();
        let err = catalog.get_event(EventId::new()).await.unwrap_err();
        assert_eq!(err.kind, boxoffice_core::error::ErrorKind::NotFound);
    }
}
