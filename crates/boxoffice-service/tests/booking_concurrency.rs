mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use futures::future::join_all;

use boxoffice_cache::keys;
use boxoffice_core::notification::Notification;
use boxoffice_core::traits::CoordinationStore;
use boxoffice_database::store::InventoryStore;
use boxoffice_entity::event::CreateEvent;
use boxoffice_service::{BookingError, ErrorClass};

use common::Harness;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_oversell_under_contention() {
    let h = Harness::new();
    let event = h.event(10).await;
    let users = h.users(50, "standard").await;

    let handles: Vec<_> = users
        .iter()
        .map(|user| {
            let booking = h.booking.clone();
            let (user_id, event_id) = (user.id, event.id);
            tokio::spawn(async move { booking.book_tickets(user_id, event_id, 1).await })
        })
        .collect();

    let mut confirmed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(BookingError::SoldOut) => {}
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }

    assert_eq!(confirmed, 10);
    let after = h.available(&event).await;
    assert_eq!(after.available_seats, 0);
    assert_eq!(after.version, event.version + 10);
    assert_eq!(h.store.confirmed_bookings(event.id).await.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exact_sellout() {
    let h = Harness::new();
    let event = h.event(2).await;
    let users = h.users(3, "standard").await;

    let results = join_all(
        users
            .iter()
            .map(|user| h.booking.book_tickets(user.id, event.id, 1)),
    )
    .await;

    let confirmed = results.iter().filter(|r| r.is_ok()).count();
    let rejected: Vec<_> = results.into_iter().filter_map(Result::err).collect();
    assert_eq!(confirmed, 2);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(rejected[0], BookingError::SoldOut));
    assert_eq!(rejected[0].class(), ErrorClass::Business);
    assert_eq!(h.available(&event).await.available_seats, 0);
    assert_eq!(h.store.confirmed_bookings(event.id).await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_last_seat_race() {
    let h = Harness::new();
    let event = h.event(3).await;
    for user in h.users(2, "standard").await {
        h.booking.book_tickets(user.id, event.id, 1).await.unwrap();
    }
    assert_eq!(h.available(&event).await.available_seats, 1);

    let (a, b) = (h.user("standard").await, h.user("standard").await);
    let (first, second) = tokio::join!(
        h.booking.book_tickets(a.id, event.id, 1),
        h.booking.book_tickets(b.id, event.id, 1),
    );

    let lost = match (first, second) {
        (Ok(_), Err(lost)) | (Err(lost), Ok(_)) => lost,
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    // the loser runs after the winner commits and finds zero seats
    assert!(matches!(lost, BookingError::SoldOut), "{lost:?}");
    assert_eq!(h.available(&event).await.available_seats, 0);
    assert_eq!(h.store.confirmed_bookings(event.id).await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_availability_race() {
    let h = Harness::new();
    let event = h.event(3).await;
    let (a, b) = (h.user("standard").await, h.user("standard").await);

    let (first, second) = tokio::join!(
        h.booking.book_tickets(a.id, event.id, 2),
        h.booking.book_tickets(b.id, event.id, 2),
    );

    let (won, lost) = match (first, second) {
        (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(won.booking.quantity, 2);
    assert!(matches!(
        lost,
        BookingError::InsufficientSeats {
            available: 1,
            requested: 2
        }
    ));
    assert_eq!(h.available(&event).await.available_seats, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_booking() {
    let h = Harness::new();
    let event = h.event(20).await;
    let user = h.user("gold").await;

    let results = join_all((0..10).map(|_| {
        let booking = h.booking.clone();
        let (user_id, event_id) = (user.id, event.id);
        tokio::spawn(async move { booking.book_tickets(user_id, event_id, 2).await })
    }))
    .await;

    let mut confirmed = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => confirmed += 1,
            Err(BookingError::LockBusy | BookingError::DuplicateBooking) => {}
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(h.store.confirmed_bookings(event.id).await.len(), 1);
    assert_eq!(h.available(&event).await.available_seats, 18);
}

#[tokio::test]
async fn test_lock_released_after_success_and_failure() {
    let h = Harness::new();
    let event = h.event(1).await;
    let (a, b) = (h.user("standard").await, h.user("standard").await);

    h.booking.book_tickets(a.id, event.id, 1).await.unwrap();
    // a second attempt reaches the duplicate check, so the lock was free
    let err = h.booking.book_tickets(a.id, event.id, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::DuplicateBooking));

    let err = h.booking.book_tickets(b.id, event.id, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::SoldOut));

    let reacquired = h
        .coordination
        .acquire(
            &keys::booking_lock(b.id, event.id),
            "after-release",
            StdDuration::from_secs(5),
        )
        .await
        .unwrap();
    assert!(reacquired);
}

#[tokio::test]
async fn test_lock_busy_when_lock_is_held() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user("standard").await;
    let key = keys::booking_lock(user.id, event.id);

    assert!(
        h.coordination
            .acquire(&key, "other-request", StdDuration::from_secs(30))
            .await
            .unwrap()
    );

    let err = h.booking.book_tickets(user.id, event.id, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::LockBusy));
    assert!(err.is_retryable());
    assert_eq!(err.code(), "LOCK_BUSY");

    // the foreign owner still holds it
    assert!(!h.coordination.release(&key, "someone-else").await.unwrap());
    assert!(h.coordination.release(&key, "other-request").await.unwrap());
    h.booking.book_tickets(user.id, event.id, 1).await.unwrap();
}

#[tokio::test]
async fn test_request_validation() {
    let h = Harness::new();
    let event = h.event(5).await;
    let user = h.user("standard").await;

    let err = h.booking.book_tickets(user.id, event.id, 0).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidQuantity { max: 10, .. }));

    let err = h.booking.book_tickets(user.id, event.id, 11).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_QUANTITY");

    let ghost = boxoffice_core::types::UserId::new();
    let err = h.booking.book_tickets(ghost, event.id, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::UserNotFound(id) if id == ghost));

    let missing = boxoffice_core::types::EventId::new();
    let err = h.booking.book_tickets(user.id, missing, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::EventNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_past_event_is_rejected() {
    let h = Harness::new();
    let user = h.user("standard").await;
    let past = h
        .store
        .create_event(CreateEvent {
            name: "Yesterday".into(),
            venue: "Old Hall".into(),
            description: None,
            event_date: Utc::now() - Duration::hours(1),
            price: 1_000,
            total_capacity: 10,
        })
        .await
        .unwrap();

    let err = h.booking.book_tickets(user.id, past.id, 1).await.unwrap_err();
    assert!(matches!(err, BookingError::EventPast(_)));
    assert_eq!(h.available(&past).await.available_seats, 10);
}

#[tokio::test]
async fn test_cancel_returns_seats_once() {
    let mut h = Harness::new();
    let event = h.event(4).await;
    let user = h.user("standard").await;

    let receipt = h.booking.book_tickets(user.id, event.id, 3).await.unwrap();
    assert_eq!(receipt.booking.total_amount, 7_500);
    assert!(receipt.reference.starts_with("EVT"));
    assert_eq!(h.available(&event).await.available_seats, 1);

    let cancelled = h.booking.cancel_booking(receipt.booking.id).await.unwrap();
    assert_eq!(cancelled.seats_returned, 3);
    assert_eq!(cancelled.refunded_amount, 7_500);
    assert_eq!(cancelled.promoted, 0);

    let after = h.available(&event).await;
    assert_eq!(after.available_seats, 4);
    assert_eq!(after.version, event.version + 2);

    let err = h.booking.cancel_booking(receipt.booking.id).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
    assert_eq!(h.available(&event).await.available_seats, 4);

    let kinds: Vec<_> = h.drain().iter().map(|n| n.notification.kind()).collect();
    assert_eq!(kinds, vec!["booking_confirmed", "booking_cancelled"]);
}

#[tokio::test]
async fn test_booking_invalidates_cached_event() {
    let h = Harness::new();
    let event = h.event(2).await;
    let user = h.user("standard").await;

    assert_eq!(h.catalog.get_event(event.id).await.unwrap().available_seats, 2);
    h.booking.book_tickets(user.id, event.id, 1).await.unwrap();
    assert!(
        h.cache
            .get(&keys::event_by_id(event.id))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(h.catalog.get_event(event.id).await.unwrap().available_seats, 1);
}

#[tokio::test]
async fn test_booking_and_cancel_invalidate_event_listing() {
    let h = Harness::new();
    let event = h.event(2).await;
    let user = h.user("standard").await;

    let seats = |events: Vec<boxoffice_entity::event::Event>| {
        events
            .into_iter()
            .find(|e| e.id == event.id)
            .map(|e| e.available_seats)
    };

    assert_eq!(seats(h.catalog.list_events().await.unwrap()), Some(2));
    let receipt = h.booking.book_tickets(user.id, event.id, 2).await.unwrap();
    assert!(
        h.cache
            .get(&keys::upcoming_events())
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(seats(h.catalog.list_events().await.unwrap()), Some(0));

    h.booking.cancel_booking(receipt.booking.id).await.unwrap();
    assert_eq!(seats(h.catalog.list_events().await.unwrap()), Some(2));
}

#[tokio::test]
async fn test_confirmation_notification_payload() {
    let mut h = Harness::new();
    let event = h.event(2).await;
    let user = h.user("standard").await;
    let receipt = h.booking.book_tickets(user.id, event.id, 2).await.unwrap();

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_id, user.id);
    match &sent[0].notification {
        Notification::BookingConfirmed {
            booking_reference,
            quantity,
            total_amount,
            ..
        } => {
            assert_eq!(booking_reference, &receipt.reference);
            assert_eq!(*quantity, 2);
            assert_eq!(*total_amount, 5_000);
        }
        other => panic!("unexpected notification {other:?}"),
    }
}
