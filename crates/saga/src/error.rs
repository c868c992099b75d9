//! Saga error types.

use common::{ErrorKind, OrderId, UserId};
use domain::{OrderError, StockError};
use event_bus::{BusError, ConsumeError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The order request was rejected.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A stock rule rejected the operation.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A user id that is not a positive integer.
    #[error("invalid user id: {0}")]
    InvalidUserId(UserId),

    /// No order exists with the given id.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Storage failed.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// The bus refused a publish or subscription.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// An event payload could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A delivery arrived on a routing key the handler does not serve.
    #[error("unexpected routing key: {0}")]
    UnexpectedRoute(String),
}

impl SagaError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SagaError::Order(e) => e.kind(),
            SagaError::Stock(e) => e.kind(),
            SagaError::InvalidUserId(_) => ErrorKind::Validation,
            SagaError::OrderNotFound(_) => ErrorKind::NotFound,
            SagaError::Store(e) => e.kind(),
            SagaError::Bus(e) => e.kind(),
            SagaError::Serialization(_) | SagaError::UnexpectedRoute(_) => ErrorKind::Validation,
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Stock(e) => SagaError::Stock(e),
            StoreError::OrderNotFound(id) => SagaError::OrderNotFound(id),
            other => SagaError::Store(other),
        }
    }
}

impl From<SagaError> for ConsumeError {
    fn from(err: SagaError) -> Self {
        match err {
            SagaError::Serialization(e) => ConsumeError::Decode(e),
            other => ConsumeError::processing(other.kind(), other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
