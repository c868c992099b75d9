use std::sync::Arc;

use common::{LineItem, OrderId, UserId};
use domain::{NewOrder, Order, OrderError};
use event_bus::{EventBus, EventBusExt, OrderCreated};
use store::{OrderRepository, UserViewRepository};

use crate::{Result, SagaError};

/// Entry point of the saga on the orders side.
///
/// Validates a request, commits the order with its items, then announces it
/// on the bus.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    users: Arc<dyn UserViewRepository>,
    bus: Arc<dyn EventBus>,
}

impl OrderService {
    /// Creates a new order service.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserViewRepository>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self { orders, users, bus }
    }

    /// Creates an order in `PENDING_INVENTORY` and publishes `order.created`.
    ///
    /// The user id and the item list are checked before the user view, so a
    /// malformed request never touches storage. The user view is eventually
    /// consistent: a user who registered a moment ago may still be rejected.
    ///
    /// Once the order is committed it is returned even if the publish
    /// fails. Such an order stays pending until something republishes it.
    #[tracing::instrument(skip(self, items), fields(user_id = %user_id, items = items.len()))]
    pub async fn create_order(&self, user_id: UserId, items: Vec<LineItem>) -> Result<Order> {
        let new_order = NewOrder::pending(user_id, items)?;

        if !self.users.exists(user_id).await? {
            return Err(OrderError::UserNotRegistered(user_id).into());
        }

        let order = self.orders.create(new_order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order created");

        if let Err(e) = self.bus.publish(&OrderCreated::from(&order)).await {
            tracing::warn!(
                order_id = %order.id,
                error = %e,
                "failed to publish order.created; order stays pending"
            );
        }

        Ok(order)
    }

    /// Loads an order with its items.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or(SagaError::OrderNotFound(id))
    }
}
