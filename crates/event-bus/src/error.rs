//! Bus error types.

use common::ErrorKind;
use thiserror::Error;

/// Errors that can occur during bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),
}

impl BusError {
    /// Classifies the error. The broker being unreachable or refusing a
    /// publish are infrastructure failures.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Infrastructure
    }
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Why a consumer dropped a delivery.
///
/// The delivery was already acknowledged, so either way the message is gone.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The payload did not match the expected contract.
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The handler failed while applying the event.
    #[error("{message}")]
    Processing { kind: ErrorKind, message: String },
}

impl ConsumeError {
    /// Builds a processing failure from any classified error.
    pub fn processing(kind: ErrorKind, err: impl std::fmt::Display) -> Self {
        ConsumeError::Processing {
            kind,
            message: err.to_string(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsumeError::Decode(_) => ErrorKind::Validation,
            ConsumeError::Processing { kind, .. } => *kind,
        }
    }
}
