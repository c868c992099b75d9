//! Local read models fed from bus events.
//!
//! This crate provides:
//! - [`Projection`] trait for applying bus events to a read model
//! - [`ProjectionProcessor`] for routing queue deliveries to projections
//! - [`UserViewProjector`], which keeps the local set of known users that
//!   order creation is validated against

pub mod error;
pub mod processor;
pub mod projection;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use views::UserViewProjector;
