//! Queue consumer workers.
//!
//! Each subscribed queue gets one long-lived task that handles deliveries
//! one at a time. Workers are independent of each other and of request
//! handling; a shared `watch` signal stops them all.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::bus::{Delivery, EventBus};
use crate::error::ConsumeError;
use crate::topology::Route;
use crate::Result;

/// Applies deliveries taken from one queue.
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handles a single delivery.
    ///
    /// An error drops the delivery; it is never redelivered.
    async fn handle(&self, delivery: &Delivery) -> std::result::Result<(), ConsumeError>;
}

/// Counters reported by a worker when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: u64,
    pub dropped: u64,
}

/// Sequential consumer for a single queue.
pub struct ConsumerWorker {
    queue: String,
    receiver: mpsc::Receiver<Delivery>,
    handler: Arc<dyn DeliveryHandler>,
    shutdown: watch::Receiver<bool>,
    stats: WorkerStats,
}

impl ConsumerWorker {
    /// Creates a worker over an already-subscribed queue.
    pub fn new(
        queue: impl Into<String>,
        receiver: mpsc::Receiver<Delivery>,
        handler: Arc<dyn DeliveryHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue: queue.into(),
            receiver,
            handler,
            shutdown,
            stats: WorkerStats::default(),
        }
    }

    /// Runs until shutdown is signalled or the queue closes.
    ///
    /// In-flight work is not drained: deliveries still buffered when the
    /// signal arrives are discarded.
    pub async fn run(mut self) -> WorkerStats {
        tracing::info!(queue = %self.queue, handler = self.handler.name(), "Worker started");

        while !*self.shutdown.borrow() {
            tokio::select! {
                maybe = self.receiver.recv() => {
                    match maybe {
                        Some(delivery) => self.process(delivery).await,
                        None => {
                            tracing::info!(queue = %self.queue, "Queue closed");
                            break;
                        }
                    }
                }

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        tracing::info!(queue = %self.queue, "Shutdown signal received");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            queue = %self.queue,
            processed = self.stats.processed,
            dropped = self.stats.dropped,
            "Worker stopped"
        );
        self.stats
    }

    async fn process(&mut self, delivery: Delivery) {
        match self.handler.handle(&delivery).await {
            Ok(()) => self.stats.processed += 1,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::error!(
                    queue = %self.queue,
                    routing_key = %delivery.routing_key,
                    kind = %e.kind(),
                    error = %e,
                    "Dropping delivery"
                );
                metrics::counter!("bus_deliveries_dropped_total", "queue" => self.queue.clone())
                    .increment(1);
            }
        }
    }
}

/// Binds the route's queue and spawns a worker for it.
pub async fn spawn_consumer(
    bus: &dyn EventBus,
    route: Route,
    handler: Arc<dyn DeliveryHandler>,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> Result<JoinHandle<WorkerStats>> {
    let receiver = bus
        .subscribe(route.queue(), route.routing_key(), capacity)
        .await?;
    let worker = ConsumerWorker::new(route.queue(), receiver, handler, shutdown);
    Ok(tokio::spawn(worker.run()))
}
