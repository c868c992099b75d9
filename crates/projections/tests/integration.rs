//! Integration tests: bus → consumer worker → ProjectionProcessor → user view.

use std::sync::Arc;
use std::time::Duration;

use common::UserId;
use event_bus::{EventBus, EventBusExt, InMemoryEventBus, Route, UserRegistered, spawn_consumer};
use projections::{ProjectionProcessor, UserViewProjector};
use store::{InMemoryUserView, UserViewRepository};
use tokio::sync::watch;

async fn wait_for_count(view: &InMemoryUserView, expected: u64) {
    for _ in 0..200 {
        if view.count().await.unwrap() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("user view never reached {} rows", expected);
}

#[tokio::test]
async fn test_registrations_flow_into_user_view() {
    let bus = InMemoryEventBus::new();
    let view = InMemoryUserView::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(UserViewProjector::new(Arc::new(view.clone()))));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = spawn_consumer(&bus, Route::UserRegistered, Arc::new(processor), 16, shutdown_rx)
        .await
        .unwrap();

    for id in [1, 2, 3] {
        bus.publish(&UserRegistered {
            user_id: UserId::new(id),
        })
        .await
        .unwrap();
    }

    wait_for_count(&view, 3).await;
    shutdown_tx.send(true).unwrap();
    let stats = worker.await.unwrap();

    assert_eq!(stats.processed, 3);
    assert!(view.exists(UserId::new(2)).await.unwrap());
}

#[tokio::test]
async fn test_registration_delivered_twice_yields_one_row() {
    let bus = InMemoryEventBus::new();
    let view = InMemoryUserView::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(UserViewProjector::new(Arc::new(view.clone()))));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = spawn_consumer(&bus, Route::UserRegistered, Arc::new(processor), 16, shutdown_rx)
        .await
        .unwrap();

    let event = UserRegistered {
        user_id: UserId::new(42),
    };
    bus.publish(&event).await.unwrap();
    bus.publish(&event).await.unwrap();
    // A later, distinct registration proves both duplicates were consumed.
    bus.publish(&UserRegistered {
        user_id: UserId::new(43),
    })
    .await
    .unwrap();

    wait_for_count(&view, 2).await;
    shutdown_tx.send(true).unwrap();
    let stats = worker.await.unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(view.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_malformed_registration_is_dropped() {
    let bus = InMemoryEventBus::new();
    let view = InMemoryUserView::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(UserViewProjector::new(Arc::new(view.clone()))));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = spawn_consumer(&bus, Route::UserRegistered, Arc::new(processor), 16, shutdown_rx)
        .await
        .unwrap();

    bus.publish_raw("user.registered", b"garbage".to_vec())
        .await
        .unwrap();
    bus.publish(&UserRegistered {
        user_id: UserId::new(7),
    })
    .await
    .unwrap();

    wait_for_count(&view, 1).await;
    shutdown_tx.send(true).unwrap();
    let stats = worker.await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.dropped, 1);
}
