//! Shared wiring for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use boxoffice_cache::memory::{MemoryCacheProvider, MemoryCoordinationStore};
use boxoffice_core::config::cache::MemoryCacheConfig;
use boxoffice_core::config::{BookingConfig, NotificationConfig, WaitlistConfig};
use boxoffice_core::traits::CacheProvider;
use boxoffice_database::memory::MemoryStore;
use boxoffice_database::store::InventoryStore;
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::event::{CreateEvent, Event};
use boxoffice_service::{
    BookingService, CacheInvalidator, EventCatalog, OutboundNotification, Outbox, WaitlistService,
};

pub struct Harness {
    pub store: MemoryStore,
    pub coordination: Arc<MemoryCoordinationStore>,
    pub cache: Arc<dyn CacheProvider>,
    pub booking: Arc<BookingService>,
    pub waitlist: Arc<WaitlistService>,
    pub catalog: EventCatalog,
    pub outbox_rx: mpsc::Receiver<OutboundNotification>,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let coordination = Arc::new(MemoryCoordinationStore::new());
        let cache: Arc<dyn CacheProvider> =
            Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let (outbox, outbox_rx) = Outbox::channel(&NotificationConfig {
            outbox_capacity: 4096,
            ..NotificationConfig::default()
        });

        let inventory: Arc<dyn InventoryStore> = Arc::new(store.clone());
        let waitlist = Arc::new(WaitlistService::new(
            Arc::new(store.clone()),
            Arc::clone(&inventory),
            coordination.clone(),
            outbox.clone(),
            WaitlistConfig::default(),
        ));
        let booking = Arc::new(BookingService::new(
            Arc::clone(&inventory),
            coordination.clone(),
            Arc::clone(&waitlist),
            CacheInvalidator::new(Arc::clone(&cache)),
            outbox,
            BookingConfig::default(),
        ));
        let catalog = EventCatalog::new(inventory, Arc::clone(&cache));

        Self {
            store,
            coordination,
            cache,
            booking,
            waitlist,
            catalog,
            outbox_rx,
        }
    }

    pub async fn event(&self, capacity: i32) -> Event {
        self.catalog
            .create_event(CreateEvent {
                name: "Harbour Lights".into(),
                venue: "Pier 9".into(),
                description: None,
                event_date: Utc::now() + Duration::days(30),
                price: 2_500,
                total_capacity: capacity,
            })
            .await
            .unwrap()
    }

    pub async fn user(&self, tier: &str) -> User {
        let id = uuid::Uuid::new_v4();
        self.catalog
            .create_user(CreateUser {
                email: format!("{id}@example.com"),
                name: format!("user-{id}"),
                tier: tier.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn users(&self, count: usize, tier: &str) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for _ in 0..count {
            users.push(self.user(tier).await);
        }
        users
    }

    pub async fn available(&self, event: &Event) -> Event {
        self.store.find_event(event.id).await.unwrap().unwrap()
    }

    /// Everything queued on the outbox so far.
    pub fn drain(&mut self) -> Vec<OutboundNotification> {
        let mut drained = Vec::new();
        while let Ok(item) = self.outbox_rx.try_recv() {
            drained.push(item);
        }
        drained
    }
}
