//! Domain layer for the order fulfillment saga.
//!
//! This crate holds the rules that do not depend on storage or messaging:
//! - [`Order`] aggregate with the [`OrderStatus`] state machine
//! - [`Stock`] record with the reservation invariant (quantity never negative)
//! - Closed error enums classified by [`common::ErrorKind`]

pub mod order;
pub mod stock;

pub use order::{NewOrder, Order, OrderError, OrderStatus, UnknownStatus};
pub use stock::{Stock, StockError};
