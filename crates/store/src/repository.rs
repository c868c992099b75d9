use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{NewOrder, Order, OrderStatus, Stock};

use crate::Result;

/// Storage for orders and their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order together with all of its line items.
    ///
    /// The write is atomic: either the order and every item are stored, or
    /// nothing is. Returns the order with its assigned id.
    async fn create(&self, order: NewOrder) -> Result<Order>;

    /// Loads an order with its items in insertion order.
    ///
    /// Returns None if the order doesn't exist.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Overwrites the status without looking at the current one.
    ///
    /// Fails with `OrderNotFound` when no row matches.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;

    /// Moves the order from `from` to `to` only if it is currently in `from`.
    ///
    /// Returns true if the row changed, false if the order was in some other
    /// status. Fails with `OrderNotFound` when no row matches.
    async fn transition_status(&self, id: OrderId, from: OrderStatus, to: OrderStatus)
    -> Result<bool>;
}

/// Storage for per-product stock.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Inserts a new stock record. Fails with `StockError::AlreadyExists` if
    /// one is already present.
    async fn create(&self, stock: Stock) -> Result<()>;

    /// Loads the stock record for a product.
    ///
    /// Returns None if no record exists.
    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>>;

    /// Decrements the available quantity by `qty` if, and only if, at least
    /// `qty` units are available at the moment of the write.
    ///
    /// The check and the write are a single atomic step, so concurrent
    /// reservations cannot drive the quantity negative. Returns the updated
    /// record, or `StockError::InsufficientStock` / `StockError::NotFound`.
    async fn try_reserve(&self, product_id: ProductId, qty: i32) -> Result<Stock>;

    /// Increments the available quantity by `qty` in a single write.
    ///
    /// Returns the updated record, or `StockError::NotFound`.
    async fn add(&self, product_id: ProductId, qty: i32) -> Result<Stock>;
}

/// The orders service's local projection of registered users.
#[async_trait]
pub trait UserViewRepository: Send + Sync {
    /// Inserts the user id if absent. Returns true if a row was added.
    async fn insert(&self, user_id: UserId) -> Result<bool>;

    /// Returns true if the user id is present.
    async fn exists(&self, user_id: UserId) -> Result<bool>;

    /// Returns the number of users in the view.
    async fn count(&self) -> Result<u64>;
}
