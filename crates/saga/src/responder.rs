//! Inventory side of the saga.

use std::sync::Arc;

use async_trait::async_trait;
use event_bus::{
    ConsumeError, Delivery, DeliveryHandler, EventBus, EventBusExt, InventoryFailed,
    InventoryReserved, OrderCreated,
};

use crate::Result;
use crate::services::StockLedger;

/// Reserves stock for every created order and reports the outcome.
///
/// The responder keeps no record of the orders it has seen. A creation event
/// delivered twice reserves the items twice.
#[derive(Clone)]
pub struct InventoryResponder {
    ledger: StockLedger,
    bus: Arc<dyn EventBus>,
}

impl InventoryResponder {
    /// Creates a responder publishing its outcomes on `bus`.
    pub fn new(ledger: StockLedger, bus: Arc<dyn EventBus>) -> Self {
        Self { ledger, bus }
    }

    /// Reserves the order's items and publishes the outcome.
    ///
    /// A failed reservation is not an error here: it becomes an
    /// `inventory.failed` event carrying the error text. Only a publish
    /// failure is returned, and nothing retries it.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn respond(&self, event: &OrderCreated) -> Result<()> {
        match self.ledger.reserve_for_order(&event.items).await {
            Ok(()) => {
                self.bus
                    .publish(&InventoryReserved {
                        order_id: event.order_id,
                        items: event.items.clone(),
                    })
                    .await?;
                tracing::info!("inventory reserved");
            }
            Err(e) => {
                self.bus
                    .publish(&InventoryFailed {
                        order_id: event.order_id,
                        reason: e.to_string(),
                    })
                    .await?;
                tracing::info!(reason = %e, "inventory reservation failed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryHandler for InventoryResponder {
    fn name(&self) -> &'static str {
        "inventory-responder"
    }

    async fn handle(&self, delivery: &Delivery) -> std::result::Result<(), ConsumeError> {
        let event: OrderCreated = delivery.decode()?;
        self.respond(&event).await?;
        Ok(())
    }
}
