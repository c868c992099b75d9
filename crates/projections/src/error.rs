//! Projection error types.

use common::ErrorKind;
use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the backing store.
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl ProjectionError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectionError::Store(e) => e.kind(),
            ProjectionError::Deserialization(_) => ErrorKind::Validation,
        }
    }
}

impl From<ProjectionError> for event_bus::ConsumeError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::Deserialization(e) => event_bus::ConsumeError::Decode(e),
            other => event_bus::ConsumeError::processing(other.kind(), other),
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
