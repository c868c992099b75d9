//! Request-side services of the orders and inventory services, plus the
//! registration hook standing in for the user service.

mod orders;
mod stock;
mod users;

pub use orders::OrderService;
pub use stock::StockLedger;
pub use users::UserRegistrar;
