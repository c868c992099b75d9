//! Persistence for the order fulfillment services.
//!
//! Each service owns its own tables and never reads another service's:
//! - orders service: `orders`, `order_items`, `user_view`
//! - inventory service: `stock`
//!
//! Repositories are traits so services receive their storage handle by
//! injection. Two backends are provided: in-memory (tests, local runs) and
//! PostgreSQL.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryStockStore, InMemoryUserView};
pub use postgres::{PostgresOrderStore, PostgresStockStore, PostgresUserView, run_migrations};
pub use repository::{OrderRepository, StockRepository, UserViewRepository};
