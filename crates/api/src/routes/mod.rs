//! HTTP route handlers.

pub mod ops;
pub mod orders;
pub mod stock;
pub mod users;
