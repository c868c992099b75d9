//! Background consumers for each service.

use std::sync::Arc;

use event_bus::{EventBus, Route, WorkerStats, spawn_consumer};
use projections::ProjectionProcessor;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;
use crate::completer::OrderCompleter;
use crate::responder::InventoryResponder;

/// Starts the orders service consumers.
///
/// One worker per queue: the user view projection on `user.registered`, and
/// the completer on both inventory outcomes.
pub async fn spawn_orders_workers(
    bus: &dyn EventBus,
    completer: OrderCompleter,
    projections: ProjectionProcessor,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<JoinHandle<WorkerStats>>> {
    let completer = Arc::new(completer);
    let handles = vec![
        spawn_consumer(
            bus,
            Route::UserRegistered,
            Arc::new(projections),
            capacity,
            shutdown.clone(),
        )
        .await?,
        spawn_consumer(
            bus,
            Route::InventoryReserved,
            completer.clone(),
            capacity,
            shutdown.clone(),
        )
        .await?,
        spawn_consumer(bus, Route::InventoryFailed, completer, capacity, shutdown).await?,
    ];
    tracing::info!(workers = handles.len(), "orders workers started");
    Ok(handles)
}

/// Starts the inventory service consumer on `order.created`.
pub async fn spawn_inventory_workers(
    bus: &dyn EventBus,
    responder: InventoryResponder,
    capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<JoinHandle<WorkerStats>>> {
    let handle = spawn_consumer(
        bus,
        Route::OrderCreated,
        Arc::new(responder),
        capacity,
        shutdown,
    )
    .await?;
    tracing::info!(workers = 1, "inventory workers started");
    Ok(vec![handle])
}
