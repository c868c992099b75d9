use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{NewOrder, Order, OrderStatus, Stock, StockError};
use tokio::sync::RwLock;

use crate::repository::{OrderRepository, StockRepository, UserViewRepository};
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct OrderState {
    orders: BTreeMap<OrderId, Order>,
    next_id: i64,
    fail_on_create: bool,
}

/// In-memory order store for testing.
///
/// This implementation provides the same interface as the PostgreSQL
/// implementation. Ids are assigned from a sequence starting at 1.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail every subsequent `create` call.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;

        if state.fail_on_create {
            return Err(StoreError::Unavailable("order insert failed".to_string()));
        }

        state.next_id += 1;
        let order = order.into_order(OrderId::new(state.next_id));
        state.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.status = status;
        Ok(())
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;

        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        Ok(true)
    }
}

/// In-memory stock store for testing.
///
/// Reservations check and write under one write lock, matching the guarded
/// update of the PostgreSQL store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockStore {
    stock: Arc<RwLock<HashMap<ProductId, Stock>>>,
}

impl InMemoryStockStore {
    /// Creates a new empty in-memory stock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with the given `(product, quantity)` pairs.
    pub fn with_stock(entries: impl IntoIterator<Item = (i64, i32)>) -> Self {
        let stock = entries
            .into_iter()
            .map(|(product_id, quantity)| {
                let product_id = ProductId::new(product_id);
                (
                    product_id,
                    Stock {
                        product_id,
                        quantity,
                    },
                )
            })
            .collect();
        Self {
            stock: Arc::new(RwLock::new(stock)),
        }
    }

    /// Returns the available quantity for a product, if it has a record.
    pub async fn quantity(&self, product_id: i64) -> Option<i32> {
        self.stock
            .read()
            .await
            .get(&ProductId::new(product_id))
            .map(|s| s.quantity)
    }
}

#[async_trait]
impl StockRepository for InMemoryStockStore {
    async fn create(&self, stock: Stock) -> Result<()> {
        let mut map = self.stock.write().await;
        if map.contains_key(&stock.product_id) {
            return Err(StockError::AlreadyExists(stock.product_id).into());
        }
        map.insert(stock.product_id, stock);
        Ok(())
    }

    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>> {
        Ok(self.stock.read().await.get(&product_id).copied())
    }

    async fn try_reserve(&self, product_id: ProductId, qty: i32) -> Result<Stock> {
        let mut map = self.stock.write().await;
        let stock = map
            .get_mut(&product_id)
            .ok_or(StockError::NotFound(product_id))?;
        stock.reserve(qty)?;
        Ok(*stock)
    }

    async fn add(&self, product_id: ProductId, qty: i32) -> Result<Stock> {
        let mut map = self.stock.write().await;
        let stock = map
            .get_mut(&product_id)
            .ok_or(StockError::NotFound(product_id))?;
        stock.add(qty)?;
        Ok(*stock)
    }
}

/// In-memory user view for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserView {
    users: Arc<RwLock<BTreeSet<UserId>>>,
}

impl InMemoryUserView {
    /// Creates a new empty user view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a view that already knows the given users.
    pub fn with_users(users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users.into_iter().map(UserId::new).collect())),
        }
    }
}

#[async_trait]
impl UserViewRepository for InMemoryUserView {
    async fn insert(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.write().await.insert(user_id))
    }

    async fn exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.read().await.contains(&user_id))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}
