//! Order aggregate and related types.

mod aggregate;
mod state;

pub use aggregate::{NewOrder, Order};
pub use state::{OrderStatus, UnknownStatus};

use common::{ErrorKind, UserId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    /// The owning user id is not a positive integer.
    #[error("invalid user id: {0}")]
    InvalidUserId(i64),

    /// The request carried no line items.
    #[error("order must have items")]
    NoItems,

    /// The user is absent from the local user view.
    ///
    /// The view is eventually consistent, so a freshly registered user may
    /// still be rejected here.
    #[error("user not registered: {0}")]
    UserNotRegistered(UserId),

    /// The order is not in a state that allows the requested transition.
    #[error("invalid state transition: cannot move from {current} to {target}")]
    InvalidStateTransition {
        current: OrderStatus,
        target: OrderStatus,
    },
}

impl OrderError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidUserId(_)
            | OrderError::NoItems
            | OrderError::UserNotRegistered(_) => ErrorKind::Validation,
            OrderError::InvalidStateTransition { .. } => ErrorKind::Conflict,
        }
    }
}
