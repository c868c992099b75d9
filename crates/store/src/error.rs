use common::{ErrorKind, OrderId};
use domain::StockError;
use thiserror::Error;

/// Errors that can occur when interacting with storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists with the given id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A stock rule rejected the write (unknown product, insufficient stock,
    /// duplicate record).
    #[error(transparent)]
    Stock(#[from] StockError),

    /// A row could not be mapped back into a domain value.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A failure injected by an in-memory store.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::OrderNotFound(_) => ErrorKind::NotFound,
            StoreError::Stock(e) => e.kind(),
            StoreError::CorruptRow(_)
            | StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
