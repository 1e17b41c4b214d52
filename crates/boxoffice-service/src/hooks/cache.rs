//! Cached view invalidation.

use std::sync::Arc;

use tracing::{debug, warn};

use boxoffice_cache::keys;
use boxoffice_core::traits::CacheProvider;
use boxoffice_core::types::EventId;

/// Drops cached views that embed an event's seat count.
#[derive(Debug, Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheProvider>,
}

impl CacheInvalidator {
    /// Create an invalidator over the view cache.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Forget the event view and every event listing.
    pub async fn event_changed(&self, event_id: EventId) {
        let key = keys::event_by_id(event_id);
        if let Err(e) = self.cache.delete(&key).await {
            warn!(event_id = %event_id, key = %key, error = %e, "Cache invalidation failed");
        }

        match self.cache.delete_pattern(&keys::event_listings_pattern()).await {
            Ok(count) => debug!(event_id = %event_id, listings = count, "Event caches invalidated"),
            Err(e) => warn!(event_id = %event_id, error = %e, "Listing invalidation failed"),
        }
    }
}
