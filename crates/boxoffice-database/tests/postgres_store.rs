//! PostgreSQL store tests.
//!
//! These run only when `BOXOFFICE_TEST_DATABASE_URL` points at a scratch
//! database; otherwise every test returns early.

use std::time::Duration;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use boxoffice_database::repositories::{PgInventoryStore, WaitlistRepository};
use boxoffice_database::store::{InsertOutcome, InventoryStore, WaitlistStore};
use boxoffice_entity::account::{CreateUser, User};
use boxoffice_entity::booking::NewBooking;
use boxoffice_entity::event::{CreateEvent, Event};
use boxoffice_entity::waitlist::WaitlistStatus;

async fn store() -> Option<(PgInventoryStore, WaitlistRepository)> {
    let url = std::env::var("BOXOFFICE_TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("test database must be reachable");
    boxoffice_database::migration::run_migrations(&pool)
        .await
        .expect("migrations must apply");
    Some((
        PgInventoryStore::new(pool.clone()),
        WaitlistRepository::new(pool),
    ))
}

async fn event(store: &PgInventoryStore, capacity: i32) -> Event {
    store
        .create_event(CreateEvent {
            name: "Dockside Quartet".into(),
            venue: "Warehouse 4".into(),
            description: None,
            event_date: Utc::now() + chrono::Duration::days(3),
            price: 1_500,
            total_capacity: capacity,
        })
        .await
        .unwrap()
}

async fn user(store: &PgInventoryStore) -> User {
    let id = uuid::Uuid::new_v4();
    store
        .create_user(CreateUser {
            email: format!("{id}@example.com"),
            name: "Tester".into(),
            tier: "standard".into(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_stale_version_writes_nothing() {
    let Some((store, _)) = store().await else {
        return;
    };
    let event = event(&store, 5).await;

    let mut tx = store.begin().await.unwrap();
    let seen = tx.read_for_update(event.id).await.unwrap().unwrap();
    assert_eq!(seen.version, 1);
    assert_eq!(
        tx.write_if_version(event.id, 4, seen.version + 1)
            .await
            .unwrap(),
        0
    );
    assert_eq!(tx.write_if_version(event.id, 4, seen.version).await.unwrap(), 1);
    tx.commit().await.unwrap();

    let after = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(after.available_seats, 4);
    assert_eq!(after.version, 2);
}

#[tokio::test]
async fn test_row_lock_blocks_second_transaction() {
    let Some((store, _)) = store().await else {
        return;
    };
    let event = event(&store, 5).await;

    let mut first = store.begin().await.unwrap();
    first.read_for_update(event.id).await.unwrap().unwrap();

    let contender = store.clone();
    let waiter = tokio::spawn(async move {
        let mut second = contender.begin().await.unwrap();
        let seen = second.read_for_update(event.id).await.unwrap().unwrap();
        second.rollback().await.unwrap();
        seen
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!waiter.is_finished());

    first.write_if_version(event.id, 3, 1).await.unwrap();
    first.commit().await.unwrap();

    let seen = waiter.await.unwrap();
    assert_eq!(seen.available_seats, 3);
    assert_eq!(seen.version, 2);
}

#[tokio::test]
async fn test_second_confirmed_booking_is_rejected() {
    let Some((store, _)) = store().await else {
        return;
    };
    let event = event(&store, 5).await;
    let user = user(&store).await;

    let booking = |reference: &str| NewBooking {
        booking_reference: reference.to_string(),
        user_id: user.id,
        event_id: event.id,
        quantity: 1,
        total_amount: 1_500,
    };
    let first_ref = format!("T{}", uuid::Uuid::new_v4().simple());
    let second_ref = format!("T{}", uuid::Uuid::new_v4().simple());

    let mut tx = store.begin().await.unwrap();
    assert!(matches!(
        tx.insert_booking(&booking(&first_ref)).await.unwrap(),
        InsertOutcome::Inserted(_)
    ));
    assert!(matches!(
        tx.insert_booking(&booking(&second_ref)).await.unwrap(),
        InsertOutcome::DuplicateConfirmed
    ));
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_waitlist_entry_lifecycle() {
    let Some((store, waitlist)) = store().await else {
        return;
    };
    let event = event(&store, 1).await;
    let user = user(&store).await;
    let now = Utc::now();

    let entry = waitlist
        .upsert_active(event.id, user.id, 100, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Active);
    assert!(
        waitlist
            .upsert_active(event.id, user.id, 900, now)
            .await
            .unwrap()
            .is_none()
    );

    let promotion = waitlist
        .promote_entry(event.id, user.id, now, 10)
        .await
        .unwrap()
        .unwrap();
    assert!(promotion.expires_at > now);

    let expired = waitlist
        .expire_due_promotions(now + chrono::Duration::minutes(11))
        .await
        .unwrap();
    assert!(expired.iter().any(|p| p.id == promotion.id));

    let entry = waitlist.find_entry(event.id, user.id).await.unwrap().unwrap();
    assert_eq!(entry.status, WaitlistStatus::Expired);
}
