use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::Result;
use crate::events::Event;

/// A message taken off a queue.
///
/// By the time a `Delivery` exists it has already been acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    pub payload: Vec<u8>,
}

impl Delivery {
    /// Creates a delivery from raw parts.
    pub fn new(routing_key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            routing_key: routing_key.into(),
            payload,
        }
    }

    /// Decodes the JSON payload.
    pub fn decode<E: DeserializeOwned>(&self) -> serde_json::Result<E> {
        serde_json::from_slice(&self.payload)
    }
}

/// A topic exchange with durable, singly-bound queues.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an encoded payload to the exchange.
    ///
    /// Returns once the broker has accepted the message. Messages published
    /// before any queue is bound to the key are dropped by the exchange.
    async fn publish_raw(&self, routing_key: &str, payload: Vec<u8>) -> Result<()>;

    /// Declares `queue`, binds it to `routing_key` and starts consuming.
    ///
    /// Deliveries are forwarded into a channel holding at most `capacity`
    /// messages.
    async fn subscribe(
        &self,
        queue: &str,
        routing_key: &str,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Delivery>>;

    /// Releases the broker connection. Nothing can be published afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Extension trait providing typed publishing.
#[async_trait]
pub trait EventBusExt: EventBus {
    /// Encodes an event and publishes it on its route.
    async fn publish<E: Event>(&self, event: &E) -> Result<()> {
        let payload = serde_json::to_vec(event)?;
        let routing_key = E::ROUTE.routing_key();
        self.publish_raw(routing_key, payload).await?;
        metrics::counter!("events_published_total", "routing_key" => routing_key).increment(1);
        Ok(())
    }
}

impl<T: EventBus + ?Sized> EventBusExt for T {}
