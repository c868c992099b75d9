//! Event contracts exchanged over the bus.
//!
//! Payloads are plain JSON objects with no envelope and no schema version.
//! The routing key alone identifies the contract.

use chrono::{DateTime, Utc};
use common::{LineItem, OrderId, UserId};
use domain::{Order, OrderStatus};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::topology::Route;

/// A payload that travels on a fixed route.
pub trait Event: Serialize + DeserializeOwned + Send + Sync {
    /// Route the event is published on.
    const ROUTE: Route;
}

/// A user became known to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user_id: UserId,
}

impl Event for UserRegistered {
    const ROUTE: Route = Route::UserRegistered;
}

/// An order was committed and is waiting for inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderCreated {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            status: order.status,
            items: order.items.clone(),
            created_at: order.created_at,
        }
    }
}

impl Event for OrderCreated {
    const ROUTE: Route = Route::OrderCreated;
}

/// Every item of an order was reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReserved {
    pub order_id: OrderId,
    pub items: Vec<LineItem>,
}

impl Event for InventoryReserved {
    const ROUTE: Route = Route::InventoryReserved;
}

/// Reservation stopped at an item that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryFailed {
    pub order_id: OrderId,
    pub reason: String,
}

impl Event for InventoryFailed {
    const ROUTE: Route = Route::InventoryFailed;
}
