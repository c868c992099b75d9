use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use crate::bus::{Delivery, EventBus};
use crate::topology::topic_matches;
use crate::{BusError, Result};

#[derive(Debug)]
struct Binding {
    queue: String,
    pattern: String,
    sender: mpsc::Sender<Delivery>,
}

#[derive(Debug, Default)]
struct BusState {
    bindings: Vec<Binding>,
    published: Option<Vec<Delivery>>,
    fail_on_publish: bool,
}

/// In-process topic exchange for testing and single-binary deployments.
///
/// Routes each published message to every queue whose binding matches the
/// routing key. Handing a message to a queue channel counts as delivery; a
/// full queue drops the message. Only a bus built with
/// [`InMemoryEventBus::recording`] keeps a log of what was published.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<RwLock<BusState>>,
}

impl InMemoryEventBus {
    /// Creates a new bus with no queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus that also logs every accepted message.
    pub fn recording() -> Self {
        let state = BusState {
            published: Some(Vec::new()),
            ..BusState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Configures the bus to refuse every subsequent publish.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns every message accepted by the exchange, in publish order.
    ///
    /// Always empty unless the bus is recording.
    pub async fn published(&self) -> Vec<Delivery> {
        self.state.read().await.published.clone().unwrap_or_default()
    }

    /// Returns the messages accepted with the given routing key.
    pub async fn published_with_key(&self, routing_key: &str) -> Vec<Delivery> {
        self.state
            .read()
            .await
            .published
            .iter()
            .flatten()
            .filter(|d| d.routing_key == routing_key)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish_raw(&self, routing_key: &str, payload: Vec<u8>) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(BusError::Publish(format!(
                "exchange refused message for {}",
                routing_key
            )));
        }

        let delivery = Delivery::new(routing_key, payload);
        state.bindings.retain(|b| !b.sender.is_closed());

        for binding in state.bindings.iter() {
            if !topic_matches(&binding.pattern, routing_key) {
                continue;
            }
            if binding.sender.try_send(delivery.clone()).is_err() {
                tracing::warn!(
                    queue = %binding.queue,
                    routing_key,
                    "Queue full, dropping message"
                );
                metrics::counter!("bus_deliveries_dropped_total", "queue" => binding.queue.clone())
                    .increment(1);
            }
        }

        if let Some(log) = state.published.as_mut() {
            log.push(delivery);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        routing_key: &str,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Delivery>> {
        if capacity == 0 {
            return Err(BusError::Subscribe(format!(
                "queue {} needs a capacity of at least one",
                queue
            )));
        }

        let (sender, receiver) = mpsc::channel(capacity);
        self.state.write().await.bindings.push(Binding {
            queue: queue.to_string(),
            pattern: routing_key.to_string(),
            sender,
        });

        tracing::debug!(queue, routing_key, "Bound queue");
        Ok(receiver)
    }
}
