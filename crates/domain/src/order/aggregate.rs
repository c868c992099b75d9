//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{LineItem, OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// A validated order that has not been persisted yet.
///
/// Storage assigns the identifier when it writes the order and its items in
/// one transaction, turning this into an [`Order`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    user_id: UserId,
    items: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Validates the request shape and builds a pending order stamped now.
    ///
    /// Checks run in a fixed order: the user id first, then the item list.
    /// Whether the user is actually registered is checked by the caller
    /// against its user view.
    pub fn pending(user_id: UserId, items: Vec<LineItem>) -> Result<Self, OrderError> {
        if !user_id.is_valid() {
            return Err(OrderError::InvalidUserId(user_id.get()));
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        Ok(Self {
            user_id,
            items,
            created_at: Utc::now(),
        })
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the line items in request order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attaches the identifier assigned by storage.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            status: OrderStatus::PendingInventory,
            items: self.items,
            created_at: self.created_at,
        }
    }
}

/// Order aggregate root.
///
/// Line items are immutable once created and keep the order in which they
/// were requested; the inventory service reserves them in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total price of all line items.
    pub fn total(&self) -> f64 {
        self.items.iter().map(LineItem::total).sum()
    }

    /// Moves the order to `target`, enforcing the state machine.
    pub fn transition_to(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                target,
            });
        }
        self.status = target;
        Ok(())
    }
}
