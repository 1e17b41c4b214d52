mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use boxoffice_cache::keys;
use boxoffice_core::notification::Notification;
use boxoffice_core::traits::CoordinationStore;
use boxoffice_database::store::WaitlistStore;
use boxoffice_entity::event::Event;
use boxoffice_entity::waitlist::{PromotionStatus, WaitlistStatus};
use boxoffice_service::WaitlistError;

use common::Harness;

/// An event with one seat, already taken.
async fn sold_out(h: &Harness) -> Event {
    let event = h.event(1).await;
    let holder = h.user("standard").await;
    h.booking.book_tickets(holder.id, event.id, 1).await.unwrap();
    event
}

async fn pause() {
    // distinct join timestamps at millisecond resolution
    tokio::time::sleep(StdDuration::from_millis(3)).await;
}

#[tokio::test]
async fn test_join_rejected_while_seats_remain() {
    let h = Harness::new();
    let event = h.event(2).await;
    let user = h.user("premium").await;

    let err = h
        .waitlist
        .join_waitlist(event.id, user.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WaitlistError::SeatsAvailable { available: 2 }));
}

#[tokio::test]
async fn test_order_by_tier_then_join_time() {
    let h = Harness::new();
    let event = sold_out(&h).await;

    let early_standard = h.user("standard").await;
    let premium = h.user("premium").await;
    let gold = h.user("gold").await;
    let late_standard = h.user("standard").await;
    let newcomer = h.user("new").await;

    for user in [&early_standard, &premium, &gold, &late_standard, &newcomer] {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
        pause().await;
    }

    let expected = [
        (&premium, 1),
        (&gold, 2),
        (&early_standard, 3),
        (&late_standard, 4),
        (&newcomer, 5),
    ];
    for (user, position) in expected {
        let queued = h.waitlist.position(event.id, user.id).await.unwrap();
        assert_eq!(queued.position, position, "tier {}", user.tier);
        assert_eq!(queued.total_waiting, 5);

        let entry = h.store.find_entry(event.id, user.id).await.unwrap().unwrap();
        assert_eq!(entry.position, Some(position as i32));
    }
}

#[tokio::test]
async fn test_join_receipt_and_tier_override() {
    let mut h = Harness::new();
    let event = sold_out(&h).await;
    let first = h.user("standard").await;
    let second = h.user("standard").await;
    h.drain();

    let receipt = h
        .waitlist
        .join_waitlist(event.id, first.id, None)
        .await
        .unwrap();
    assert_eq!(receipt.position, 1);
    assert_eq!(receipt.estimated_wait_hours, 0.5);
    assert_eq!(receipt.promotion_probability, 98);
    pause().await;

    // an explicit tier outranks the stored one
    let receipt = h
        .waitlist
        .join_waitlist(event.id, second.id, Some("premium".into()))
        .await
        .unwrap();
    assert_eq!(receipt.position, 1);
    assert_eq!(h.waitlist.position(event.id, first.id).await.unwrap().position, 2);

    let sent = h.drain();
    assert_eq!(sent.len(), 2);
    assert!(matches!(
        sent[0].notification,
        Notification::WaitlistJoined { position: 1, .. }
    ));
}

#[tokio::test]
async fn test_duplicate_join_rejected() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let user = h.user("gold").await;

    h.waitlist
        .join_waitlist(event.id, user.id, None)
        .await
        .unwrap();
    let err = h
        .waitlist
        .join_waitlist(event.id, user.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WaitlistError::AlreadyOnWaitlist));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_join_admits_one() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let user = h.user("gold").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let waitlist = h.waitlist.clone();
            let (event_id, user_id) = (event.id, user.id);
            tokio::spawn(async move { waitlist.join_waitlist(event_id, user_id, None).await })
        })
        .collect();

    let mut joined = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => joined += 1,
            Err(WaitlistError::AlreadyOnWaitlist) => {}
            Err(other) => panic!("unexpected rejection: {other:?}"),
        }
    }

    assert_eq!(joined, 1);
    let queue = keys::waitlist_queue(event.id);
    assert_eq!(h.coordination.queue_len(&queue).await.unwrap(), 1);
    assert_eq!(h.store.list_active(event.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_leave_rederives_positions() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let users = h.users(3, "standard").await;
    for user in &users {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
        pause().await;
    }

    assert!(h.waitlist.leave_waitlist(event.id, users[0].id).await.unwrap());
    assert!(!h.waitlist.leave_waitlist(event.id, users[0].id).await.unwrap());

    let left = h.store.find_entry(event.id, users[0].id).await.unwrap().unwrap();
    assert_eq!(left.status, WaitlistStatus::Cancelled);

    let next = h.store.find_entry(event.id, users[1].id).await.unwrap().unwrap();
    assert_eq!(next.position, Some(1));
    let last = h.store.find_entry(event.id, users[2].id).await.unwrap().unwrap();
    assert_eq!(last.position, Some(2));

    let err = h
        .waitlist
        .position(event.id, users[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, WaitlistError::NotOnWaitlist));

    // leaving does not bar a later rejoin
    h.waitlist
        .join_waitlist(event.id, users[0].id, None)
        .await
        .unwrap();
    assert_eq!(
        h.waitlist.position(event.id, users[0].id).await.unwrap().position,
        3
    );
}

#[tokio::test]
async fn test_cancellation_promotes_and_booking_accepts() {
    let mut h = Harness::new();
    let event = h.event(1).await;
    let holder = h.user("standard").await;
    let first = h.user("premium").await;
    let second = h.user("standard").await;

    let held = h.booking.book_tickets(holder.id, event.id, 1).await.unwrap();
    h.waitlist
        .join_waitlist(event.id, first.id, None)
        .await
        .unwrap();
    h.waitlist
        .join_waitlist(event.id, second.id, None)
        .await
        .unwrap();
    h.drain();

    let cancelled = h.booking.cancel_booking(held.booking.id).await.unwrap();
    assert_eq!(cancelled.promoted, 1);

    let promoted = h.store.find_entry(event.id, first.id).await.unwrap().unwrap();
    assert_eq!(promoted.status, WaitlistStatus::Promoted);
    assert_eq!(promoted.position, None);
    assert_eq!(h.waitlist.position(event.id, second.id).await.unwrap().position, 1);

    let promotion_note = h
        .drain()
        .into_iter()
        .find(|n| n.user_id == first.id)
        .unwrap();
    assert!(matches!(
        promotion_note.notification,
        Notification::WaitlistPromoted {
            booking_window_minutes: 10,
            ..
        }
    ));

    let receipt = h.booking.book_tickets(first.id, event.id, 1).await.unwrap();
    assert!(receipt.promotion_accepted);

    let promotions = h.store.promotions(event.id).await;
    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].status, PromotionStatus::Accepted);

    let stats = h.waitlist.stats(event.id).await.unwrap();
    assert_eq!(stats.total_promotions, 1);
    assert_eq!(stats.accepted_promotions, 1);
    assert_eq!(stats.acceptance_rate, 100.0);
    assert_eq!(stats.total_waiting, 1);
    assert_eq!(stats.queue_length, 1);
}

#[tokio::test]
async fn test_expired_promotion_is_not_reassigned() {
    let mut h = Harness::new();
    let event = h.event(1).await;
    let holder = h.user("standard").await;
    let first = h.user("gold").await;
    let second = h.user("standard").await;

    let held = h.booking.book_tickets(holder.id, event.id, 1).await.unwrap();
    for user in [&first, &second] {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
    }
    h.booking.cancel_booking(held.booking.id).await.unwrap();
    h.drain();

    // still inside the window
    assert_eq!(
        h.waitlist
            .expire_promotions_at(Utc::now() + Duration::minutes(5))
            .await
            .unwrap(),
        0
    );

    let expired = h
        .waitlist
        .expire_promotions_at(Utc::now() + Duration::minutes(11))
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let lapsed = h.store.find_entry(event.id, first.id).await.unwrap().unwrap();
    assert_eq!(lapsed.status, WaitlistStatus::Expired);
    let waiting = h.store.find_entry(event.id, second.id).await.unwrap().unwrap();
    assert_eq!(waiting.status, WaitlistStatus::Active);

    let promotions = h.store.promotions(event.id).await;
    assert_eq!(promotions.len(), 1);
    assert_eq!(promotions[0].status, PromotionStatus::Expired);
    assert_eq!(h.available(&event).await.available_seats, 1);

    let sent = h.drain();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        sent[0].notification,
        Notification::PromotionExpired { .. }
    ));

    // a lapsed promotion cannot be accepted by booking
    let receipt = h.booking.book_tickets(first.id, event.id, 1).await.unwrap();
    assert!(!receipt.promotion_accepted);
}

#[tokio::test]
async fn test_stale_queue_member_is_skipped() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let ghost = h.user("premium").await;
    let real = h.user("standard").await;

    for user in [&ghost, &real] {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
    }
    // store entry closed behind the queue's back
    h.store
        .close_entry(event.id, ghost.id, WaitlistStatus::Cancelled)
        .await
        .unwrap();

    let promoted = h.waitlist.process_promotions(event.id, 1).await.unwrap();
    assert_eq!(promoted, 1);

    let entry = h.store.find_entry(event.id, real.id).await.unwrap().unwrap();
    assert_eq!(entry.status, WaitlistStatus::Promoted);
    assert_eq!(
        h.coordination
            .queue_len(&keys::waitlist_queue(event.id))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_promotions_bounded_by_freed_seats() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let users = h.users(4, "standard").await;
    for user in &users {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
        pause().await;
    }

    assert_eq!(h.waitlist.process_promotions(event.id, 0).await.unwrap(), 0);
    assert_eq!(h.waitlist.process_promotions(event.id, 2).await.unwrap(), 2);
    assert_eq!(h.waitlist.position(event.id, users[2].id).await.unwrap().position, 1);
    assert_eq!(h.waitlist.process_promotions(event.id, 5).await.unwrap(), 2);
    assert_eq!(h.store.promotions(event.id).await.len(), 4);
}

#[tokio::test]
async fn test_rebuild_restores_lost_queue() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let standard = h.user("standard").await;
    let premium = h.user("premium").await;
    for user in [&standard, &premium] {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
    }

    let queue = keys::waitlist_queue(event.id);
    h.coordination.queue_pop_max(&queue, 10).await.unwrap();
    h.coordination.queue_add(&queue, "orphan", 1.0).await.unwrap();

    assert_eq!(h.waitlist.rebuild_queue(event.id).await.unwrap(), 2);
    assert_eq!(h.coordination.queue_len(&queue).await.unwrap(), 2);
    assert_eq!(h.waitlist.position(event.id, premium.id).await.unwrap().position, 1);
    assert_eq!(h.waitlist.position(event.id, standard.id).await.unwrap().position, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rebuild_never_exposes_empty_queue() {
    let h = Harness::new();
    let event = sold_out(&h).await;
    let users = h.users(5, "standard").await;
    for user in &users {
        h.waitlist
            .join_waitlist(event.id, user.id, None)
            .await
            .unwrap();
        pause().await;
    }

    let rebuilder = {
        let waitlist = h.waitlist.clone();
        let event_id = event.id;
        tokio::spawn(async move {
            for _ in 0..50 {
                waitlist.rebuild_queue(event_id).await.unwrap();
            }
        })
    };

    let watched = users[4].id;
    while !rebuilder.is_finished() {
        let position = h.waitlist.position(event.id, watched).await.unwrap();
        assert_eq!(position.total_waiting, 5);
        tokio::task::yield_now().await;
    }
    rebuilder.await.unwrap();
    assert_eq!(h.waitlist.position(event.id, watched).await.unwrap().position, 5);
}
