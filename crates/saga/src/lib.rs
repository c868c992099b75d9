//! Choreographed saga for order fulfillment.
//!
//! There is no coordinator. Each service reacts to the events of the other:
//!
//! 1. [`OrderService`] commits a pending order and announces `order.created`
//! 2. [`InventoryResponder`] reserves stock through the [`StockLedger`] and
//!    answers with `inventory.reserved` or `inventory.failed`
//! 3. [`OrderCompleter`] confirms or cancels the order
//!
//! Nothing is compensated: a reservation that fails part-way keeps the
//! units already taken, and an order whose outcome event is lost stays
//! pending.

pub mod completer;
pub mod error;
pub mod responder;
pub mod services;
pub mod workers;

pub use completer::{OrderCompleter, TransitionPolicy};
pub use error::{Result, SagaError};
pub use responder::InventoryResponder;
pub use services::{OrderService, StockLedger, UserRegistrar};
pub use workers::{spawn_inventory_workers, spawn_orders_workers};
