//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_bus::{Delivery, Route};

use crate::Result;

/// Tracks how many deliveries a projection has applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of deliveries applied by this projection.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self {
            events_processed: 0,
        }
    }

    /// Advances the position by one delivery.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that applies bus events to a local read model.
///
/// Deliveries are at-most-once and may still arrive twice when a publisher
/// repeats itself, so `handle` must be safe to apply more than once.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Returns the route this projection consumes.
    fn route(&self) -> Route;

    /// Applies a single delivery to the read model.
    async fn handle(&self, delivery: &Delivery) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;
}
