//! End-to-end tests: orders and inventory services talking over the
//! in-memory bus.

use std::sync::Arc;
use std::time::Duration;

use common::{LineItem, OrderId, ProductId, UserId};
use domain::OrderStatus;
use event_bus::{
    EventBusExt, InMemoryEventBus, InventoryFailed, OrderCreated, UserRegistered, WorkerStats,
};
use projections::{ProjectionProcessor, UserViewProjector};
use saga::{
    InventoryResponder, OrderCompleter, OrderService, StockLedger, TransitionPolicy,
    spawn_inventory_workers, spawn_orders_workers,
};
use store::{InMemoryOrderStore, InMemoryStockStore, InMemoryUserView, UserViewRepository};
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct TestHarness {
    bus: InMemoryEventBus,
    orders: OrderService,
    ledger: StockLedger,
    users: InMemoryUserView,
    stock: InMemoryStockStore,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<WorkerStats>>,
}

impl TestHarness {
    async fn new(policy: TransitionPolicy, stock: &[(i64, i32)]) -> Self {
        let bus = InMemoryEventBus::recording();
        let order_store = InMemoryOrderStore::new();
        let users = InMemoryUserView::new();
        let stock = InMemoryStockStore::with_stock(stock.iter().copied());
        let ledger = StockLedger::new(Arc::new(stock.clone()));

        let orders = OrderService::new(
            Arc::new(order_store.clone()),
            Arc::new(users.clone()),
            Arc::new(bus.clone()),
        );

        let mut projections = ProjectionProcessor::new();
        projections.register(Box::new(UserViewProjector::new(Arc::new(users.clone()))));

        let (shutdown, signal) = watch::channel(false);
        let mut workers = spawn_orders_workers(
            &bus,
            OrderCompleter::new(Arc::new(order_store), policy),
            projections,
            64,
            signal.clone(),
        )
        .await
        .unwrap();
        workers.extend(
            spawn_inventory_workers(
                &bus,
                InventoryResponder::new(ledger.clone(), Arc::new(bus.clone())),
                64,
                signal,
            )
            .await
            .unwrap(),
        );

        Self {
            bus,
            orders,
            ledger,
            users,
            stock,
            shutdown,
            workers,
        }
    }

    async fn register_user(&self, id: i64) {
        self.bus
            .publish(&UserRegistered {
                user_id: UserId::new(id),
            })
            .await
            .unwrap();
        for _ in 0..200 {
            if self.users.exists(UserId::new(id)).await.unwrap() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("user {} never reached the view", id);
    }

    async fn wait_for_status(&self, id: OrderId, expected: OrderStatus) {
        for _ in 0..200 {
            if self.orders.get_order(id).await.unwrap().status == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let actual = self.orders.get_order(id).await.unwrap().status;
        panic!("order {} stayed {} instead of {}", id, actual, expected);
    }

    async fn wait_for_published(&self, routing_key: &str, count: usize) {
        for _ in 0..200 {
            if self.bus.published_with_key(routing_key).await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("never saw {} {} messages", count, routing_key);
    }

    async fn shutdown(self) -> Vec<WorkerStats> {
        self.shutdown.send(true).unwrap();
        let mut stats = Vec::new();
        for worker in self.workers {
            stats.push(worker.await.unwrap());
        }
        stats
    }
}

#[tokio::test]
async fn test_order_confirmed_when_stock_suffices() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 5)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 2, 10.0)])
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::PendingInventory);

    h.wait_for_status(order.id, OrderStatus::Confirmed).await;
    assert_eq!(h.stock.quantity(1).await, Some(3));

    let stats = h.shutdown().await;
    assert!(stats.iter().all(|s| s.dropped == 0));
}

#[tokio::test]
async fn test_order_cancelled_when_stock_short() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 1)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 2, 10.0)])
        .await
        .unwrap();

    h.wait_for_status(order.id, OrderStatus::Cancelled).await;
    assert_eq!(h.stock.quantity(1).await, Some(1));

    let failed: InventoryFailed = h.bus.published_with_key("inventory.failed").await[0]
        .decode()
        .unwrap();
    assert_eq!(failed.order_id, order.id);
    assert_eq!(
        failed.reason,
        "insufficient stock for product 1: requested 2, available 1"
    );

    h.shutdown().await;
}

#[tokio::test]
async fn test_partial_reservation_keeps_earlier_items() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 5), (2, 1)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(
            UserId::new(42),
            vec![LineItem::new(1, 2, 1.0), LineItem::new(2, 5, 1.0)],
        )
        .await
        .unwrap();

    h.wait_for_status(order.id, OrderStatus::Cancelled).await;
    assert_eq!(h.stock.quantity(1).await, Some(3));
    assert_eq!(h.stock.quantity(2).await, Some(1));

    h.shutdown().await;
}

#[tokio::test]
async fn test_unregistered_user_never_reaches_inventory() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 5)]).await;

    let err = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 1, 1.0)])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "user not registered: 42");
    assert!(h.bus.published().await.is_empty());
    assert_eq!(h.stock.quantity(1).await, Some(5));

    h.shutdown().await;
}

#[tokio::test]
async fn test_redelivered_creation_double_reserves() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 10)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 3, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(order.id, OrderStatus::Confirmed).await;

    // The broker hands the same creation event over again.
    h.bus.publish(&OrderCreated::from(&order)).await.unwrap();
    h.wait_for_published("inventory.reserved", 2).await;

    assert_eq!(h.stock.quantity(1).await, Some(4));

    h.shutdown().await;
}

#[tokio::test]
async fn test_late_failure_overwrites_confirmed_order() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 5)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 1, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(order.id, OrderStatus::Confirmed).await;

    h.bus
        .publish(&InventoryFailed {
            order_id: order.id,
            reason: "late".to_string(),
        })
        .await
        .unwrap();

    h.wait_for_status(order.id, OrderStatus::Cancelled).await;
    h.shutdown().await;
}

#[tokio::test]
async fn test_pending_only_keeps_terminal_status() {
    let h = TestHarness::new(TransitionPolicy::PendingOnly, &[(1, 5)]).await;
    h.register_user(42).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 1, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(order.id, OrderStatus::Confirmed).await;

    h.bus
        .publish(&InventoryFailed {
            order_id: order.id,
            reason: "late".to_string(),
        })
        .await
        .unwrap();

    // A later order on the same queue proves the late event was consumed.
    let marker = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 10, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(marker.id, OrderStatus::Cancelled).await;

    assert_eq!(
        h.orders.get_order(order.id).await.unwrap().status,
        OrderStatus::Confirmed
    );
    h.shutdown().await;
}

#[tokio::test]
async fn test_publish_failure_leaves_order_pending() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 5)]).await;
    h.register_user(42).await;
    h.bus.set_fail_on_publish(true).await;

    let order = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 1, 1.0)])
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        h.orders.get_order(order.id).await.unwrap().status,
        OrderStatus::PendingInventory
    );
    assert_eq!(h.stock.quantity(1).await, Some(5));

    h.shutdown().await;
}

#[tokio::test]
async fn test_replenished_stock_satisfies_retry() {
    let h = TestHarness::new(TransitionPolicy::Unconditional, &[(1, 1)]).await;
    h.register_user(42).await;

    let first = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 3, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(first.id, OrderStatus::Cancelled).await;

    h.ledger.add(ProductId::new(1), 4).await.unwrap();

    let second = h
        .orders
        .create_order(UserId::new(42), vec![LineItem::new(1, 3, 1.0)])
        .await
        .unwrap();
    h.wait_for_status(second.id, OrderStatus::Confirmed).await;
    assert_eq!(h.stock.quantity(1).await, Some(2));

    h.shutdown().await;
}
