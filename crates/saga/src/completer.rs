//! Orders side of the saga: applies inventory outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::OrderStatus;
use event_bus::{ConsumeError, Delivery, DeliveryHandler, InventoryFailed, InventoryReserved, Route};
use store::OrderRepository;

use crate::{Result, SagaError};

/// How an outcome event is applied to the stored order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Overwrite the status whatever it currently is. A late or duplicate
    /// outcome can flip a confirmed order to cancelled and back.
    #[default]
    Unconditional,
    /// Let the order state machine decide. A repeated outcome is ignored and
    /// a contradicting one is refused, so a terminal status never changes.
    PendingOnly,
}

/// Confirms or cancels orders when inventory answers.
#[derive(Clone)]
pub struct OrderCompleter {
    orders: Arc<dyn OrderRepository>,
    policy: TransitionPolicy,
}

impl OrderCompleter {
    /// Creates a completer with the given policy.
    pub fn new(orders: Arc<dyn OrderRepository>, policy: TransitionPolicy) -> Self {
        Self { orders, policy }
    }

    /// Returns the active policy.
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Moves an order to `target`.
    ///
    /// Returns false when the policy left the order untouched. Under
    /// `PendingOnly` an outcome that repeats the current status is a no-op,
    /// while one contradicting a terminal status fails with
    /// [`domain::OrderError::InvalidStateTransition`].
    #[tracing::instrument(skip(self), fields(policy = ?self.policy))]
    pub async fn complete(&self, order_id: OrderId, target: OrderStatus) -> Result<bool> {
        let applied = match self.policy {
            TransitionPolicy::Unconditional => {
                self.orders.update_status(order_id, target).await?;
                true
            }
            TransitionPolicy::PendingOnly => self.guarded_transition(order_id, target).await?,
        };

        if applied {
            metrics::counter!("saga_outcomes_total", "outcome" => target.as_str()).increment(1);
            tracing::info!(%order_id, status = %target, "order completed");
        }
        Ok(applied)
    }

    async fn guarded_transition(&self, order_id: OrderId, target: OrderStatus) -> Result<bool> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;
        let current = order.status;

        if let Err(e) = order.transition_to(target) {
            if current == target {
                tracing::info!(%order_id, status = %target, "order already completed, ignoring");
                return Ok(false);
            }
            return Err(e.into());
        }

        // The stored status may have moved since it was read.
        let applied = self
            .orders
            .transition_status(order_id, current, target)
            .await?;
        if !applied {
            tracing::warn!(%order_id, status = %target, "order changed concurrently, ignoring");
        }
        Ok(applied)
    }

    async fn apply(&self, delivery: &Delivery) -> Result<bool> {
        match Route::from_routing_key(&delivery.routing_key) {
            Some(Route::InventoryReserved) => {
                let event: InventoryReserved = delivery.decode()?;
                self.complete(event.order_id, OrderStatus::Confirmed).await
            }
            Some(Route::InventoryFailed) => {
                let event: InventoryFailed = delivery.decode()?;
                tracing::info!(
                    order_id = %event.order_id,
                    reason = %event.reason,
                    "inventory refused order"
                );
                self.complete(event.order_id, OrderStatus::Cancelled).await
            }
            _ => Err(SagaError::UnexpectedRoute(delivery.routing_key.clone())),
        }
    }
}

#[async_trait]
impl DeliveryHandler for OrderCompleter {
    fn name(&self) -> &'static str {
        "order-completer"
    }

    async fn handle(&self, delivery: &Delivery) -> std::result::Result<(), ConsumeError> {
        self.apply(delivery).await?;
        Ok(())
    }
}
