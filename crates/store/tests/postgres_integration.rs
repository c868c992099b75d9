//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{LineItem, OrderId, ProductId, UserId};
use domain::{NewOrder, OrderStatus, Stock, StockError};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    OrderRepository, PostgresOrderStore, PostgresStockStore, PostgresUserView, StockRepository,
    StoreError, UserViewRepository,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, stock, user_view RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn new_order(items: Vec<LineItem>) -> NewOrder {
    NewOrder::pending(UserId::new(42), items).unwrap()
}

#[tokio::test]
#[serial]
async fn create_and_load_order_with_items() {
    let store = PostgresOrderStore::new(get_test_pool().await);

    let created = store
        .create(new_order(vec![
            LineItem::new(3, 1, 5.5),
            LineItem::new(1, 2, 10.0),
        ]))
        .await
        .unwrap();
    assert_eq!(created.status, OrderStatus::PendingInventory);

    let loaded = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.user_id, UserId::new(42));
    assert_eq!(loaded.status, OrderStatus::PendingInventory);
    assert_eq!(
        loaded.items,
        vec![LineItem::new(3, 1, 5.5), LineItem::new(1, 2, 10.0)]
    );
}

#[tokio::test]
#[serial]
async fn failed_item_insert_rolls_back_the_order() {
    let pool = get_test_pool().await;
    // Force the second item insert to violate a constraint.
    sqlx::query("ALTER TABLE order_items ADD CONSTRAINT positive_qty CHECK (quantity > 0)")
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresOrderStore::new(pool.clone());
    let result = store
        .create(new_order(vec![
            LineItem::new(1, 2, 10.0),
            LineItem::new(2, 0, 10.0),
        ]))
        .await;

    sqlx::query("ALTER TABLE order_items DROP CONSTRAINT positive_qty")
        .execute(&pool)
        .await
        .unwrap();

    assert!(matches!(result, Err(StoreError::Database(_))));
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(items, 0);
}

#[tokio::test]
#[serial]
async fn get_missing_order_returns_none() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    assert!(store.get(OrderId::new(12345)).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn update_status_overwrites_terminal_status() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = store
        .create(new_order(vec![LineItem::new(1, 1, 1.0)]))
        .await
        .unwrap();

    store
        .update_status(order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    store
        .update_status(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let loaded = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Cancelled);
}

#[tokio::test]
#[serial]
async fn transition_status_only_moves_from_expected_status() {
    let store = PostgresOrderStore::new(get_test_pool().await);
    let order = store
        .create(new_order(vec![LineItem::new(1, 1, 1.0)]))
        .await
        .unwrap();

    assert!(
        store
            .transition_status(order.id, OrderStatus::PendingInventory, OrderStatus::Cancelled)
            .await
            .unwrap()
    );
    assert!(
        !store
            .transition_status(order.id, OrderStatus::PendingInventory, OrderStatus::Confirmed)
            .await
            .unwrap()
    );

    let missing = store
        .transition_status(
            OrderId::new(999),
            OrderStatus::PendingInventory,
            OrderStatus::Confirmed,
        )
        .await;
    assert!(matches!(missing, Err(StoreError::OrderNotFound(_))));
}

#[tokio::test]
#[serial]
async fn stock_reserve_and_add() {
    let store = PostgresStockStore::new(get_test_pool().await);
    store
        .create(Stock::new(ProductId::new(1), 5).unwrap())
        .await
        .unwrap();

    let after = store.try_reserve(ProductId::new(1), 2).await.unwrap();
    assert_eq!(after.quantity, 3);

    let after = store.add(ProductId::new(1), 4).await.unwrap();
    assert_eq!(after.quantity, 7);
}

#[tokio::test]
#[serial]
async fn stock_add_past_integer_range_is_invalid_quantity() {
    let store = PostgresStockStore::new(get_test_pool().await);
    store
        .create(Stock::new(ProductId::new(1), i32::MAX - 1).unwrap())
        .await
        .unwrap();

    let result = store.add(ProductId::new(1), 2).await;
    assert!(matches!(
        result,
        Err(StoreError::Stock(StockError::InvalidQuantity(2)))
    ));
    assert_eq!(result.unwrap_err().kind(), common::ErrorKind::Validation);

    let after = store.add(ProductId::new(1), 1).await.unwrap();
    assert_eq!(after.quantity, i32::MAX);

    let missing = store.add(ProductId::new(2), 1).await;
    assert!(matches!(
        missing,
        Err(StoreError::Stock(StockError::NotFound(_)))
    ));
}

#[tokio::test]
#[serial]
async fn stock_reserve_rejections_leave_quantity_unchanged() {
    let store = PostgresStockStore::new(get_test_pool().await);
    store
        .create(Stock::new(ProductId::new(1), 1).unwrap())
        .await
        .unwrap();

    for qty in [2, 0, -1] {
        let result = store.try_reserve(ProductId::new(1), qty).await;
        assert!(matches!(
            result,
            Err(StoreError::Stock(StockError::InsufficientStock { .. }))
        ));
    }

    let missing = store.try_reserve(ProductId::new(2), 1).await;
    assert!(matches!(
        missing,
        Err(StoreError::Stock(StockError::NotFound(_)))
    ));

    let stock = store.get(ProductId::new(1)).await.unwrap().unwrap();
    assert_eq!(stock.quantity, 1);
}

#[tokio::test]
#[serial]
async fn concurrent_reservations_never_oversell() {
    let store = PostgresStockStore::new(get_test_pool().await);
    store
        .create(Stock::new(ProductId::new(1), 10).unwrap())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.try_reserve(ProductId::new(1), 1).await.is_ok()
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10);
    let stock = store.get(ProductId::new(1)).await.unwrap().unwrap();
    assert_eq!(stock.quantity, 0);
}

#[tokio::test]
#[serial]
async fn duplicate_stock_is_a_conflict() {
    let store = PostgresStockStore::new(get_test_pool().await);
    let stock = Stock::new(ProductId::new(1), 1).unwrap();
    store.create(stock).await.unwrap();

    let result = store.create(stock).await;
    assert!(matches!(
        result,
        Err(StoreError::Stock(StockError::AlreadyExists(_)))
    ));
}

#[tokio::test]
#[serial]
async fn user_view_insert_if_absent() {
    let view = PostgresUserView::new(get_test_pool().await);

    assert!(view.insert(UserId::new(42)).await.unwrap());
    assert!(!view.insert(UserId::new(42)).await.unwrap());
    assert_eq!(view.count().await.unwrap(), 1);
    assert!(view.exists(UserId::new(42)).await.unwrap());
    assert!(!view.exists(UserId::new(7)).await.unwrap());
}
