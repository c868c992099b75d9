//! Event bus for the choreographed order fulfillment saga.
//!
//! This crate provides:
//! - Event contracts exchanged between services ([`events`])
//! - The broker topology: one durable topic exchange, one durable queue per
//!   consumer bound to a single routing key ([`topology`])
//! - [`EventBus`] trait with an in-memory and an AMQP (RabbitMQ) exchange
//! - [`ConsumerWorker`]: one background task per queue, processing
//!   deliveries sequentially until shutdown
//!
//! Delivery is at-most-once: a message counts as acknowledged as soon as it
//! leaves the broker, before any handler has looked at it.

pub mod amqp;
pub mod bus;
pub mod error;
pub mod events;
pub mod memory;
pub mod topology;
pub mod worker;

pub use amqp::{AmqpEventBus, validate_url};
pub use bus::{Delivery, EventBus, EventBusExt};
pub use error::{BusError, ConsumeError, Result};
pub use events::{Event, InventoryFailed, InventoryReserved, OrderCreated, UserRegistered};
pub use memory::InMemoryEventBus;
pub use topology::{EXCHANGE, Route, topic_matches};
pub use worker::{ConsumerWorker, DeliveryHandler, WorkerStats, spawn_consumer};
