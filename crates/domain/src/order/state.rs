//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// PendingInventory ──┬──► Confirmed   (inventory.reserved)
///                    └──► Cancelled   (inventory.failed)
/// ```
///
/// There is no timeout: an order whose outcome event never arrives stays
/// pending forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Waiting for the inventory service to reserve stock.
    #[default]
    PendingInventory,

    /// Stock was reserved for every line item (terminal state).
    Confirmed,

    /// Stock could not be reserved (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if moving to `target` is a legal transition.
    ///
    /// Only a pending order moves, and only into a terminal state.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        !self.is_terminal() && target.is_terminal()
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }

    /// Returns the status as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingInventory => "PENDING_INVENTORY",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_INVENTORY" => Ok(OrderStatus::PendingInventory),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
