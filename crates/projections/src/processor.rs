//! Projection processor for feeding queue deliveries to projections.

use async_trait::async_trait;
use event_bus::{ConsumeError, Delivery, DeliveryHandler, topic_matches};

use crate::Result;
use crate::projection::Projection;

/// Delivers queue messages to every projection bound to their routing key.
///
/// The processor is itself a [`DeliveryHandler`], so it can be mounted on a
/// consumer worker directly.
#[derive(Default)]
pub struct ProjectionProcessor {
    projections: Vec<Box<dyn Projection>>,
}

impl ProjectionProcessor {
    /// Creates a processor with no projections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers a single message to the matching projections.
    ///
    /// Stops at the first projection that fails.
    #[tracing::instrument(skip(self, delivery), fields(routing_key = %delivery.routing_key))]
    pub async fn process(&self, delivery: &Delivery) -> Result<usize> {
        let mut applied = 0;
        for projection in &self.projections {
            if !topic_matches(projection.route().routing_key(), &delivery.routing_key) {
                continue;
            }
            projection.handle(delivery).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
            applied += 1;
        }

        if applied == 0 {
            tracing::debug!("No projection bound to routing key");
        }
        Ok(applied)
    }
}

#[async_trait]
impl DeliveryHandler for ProjectionProcessor {
    fn name(&self) -> &'static str {
        "projections"
    }

    async fn handle(&self, delivery: &Delivery) -> std::result::Result<(), ConsumeError> {
        self.process(delivery).await?;
        Ok(())
    }
}
