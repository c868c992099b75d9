//! Types shared by every service taking part in the order fulfillment saga.
//!
//! Services never share a database, but they agree on the shape of the
//! identifiers and line items carried by events on the bus.

mod error;
mod item;
mod types;

pub use error::ErrorKind;
pub use item::LineItem;
pub use types::{OrderId, ProductId, UserId};
