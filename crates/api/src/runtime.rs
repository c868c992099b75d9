//! Backend selection and worker startup for a service role.

use std::sync::Arc;

use event_bus::{AmqpEventBus, BusError, EventBus, InMemoryEventBus, WorkerStats};
use projections::{ProjectionProcessor, UserViewProjector};
use saga::{
    InventoryResponder, OrderCompleter, OrderService, SagaError, StockLedger, TransitionPolicy,
    UserRegistrar, spawn_inventory_workers, spawn_orders_workers,
};
use store::{
    InMemoryOrderStore, InMemoryStockStore, InMemoryUserView, OrderRepository,
    PostgresOrderStore, PostgresStockStore, PostgresUserView, StockRepository, StoreError,
    UserViewRepository,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, ConfigError, ServiceRole};

/// Errors that stop the process from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("broker error: {0}")]
    Bus(#[from] BusError),

    #[error("worker startup failed: {0}")]
    Saga(#[from] SagaError),
}

/// Storage and broker handles shared by every component of the process.
#[derive(Clone)]
pub struct Backends {
    pub orders: Arc<dyn OrderRepository>,
    pub users: Arc<dyn UserViewRepository>,
    pub stock: Arc<dyn StockRepository>,
    pub bus: Arc<dyn EventBus>,
}

impl Backends {
    /// In-process storage and bus.
    pub fn in_memory() -> Self {
        Self::with_bus(Arc::new(InMemoryEventBus::new()))
    }

    /// In-process storage around an existing bus.
    pub fn with_bus(bus: Arc<dyn EventBus>) -> Self {
        Self {
            orders: Arc::new(InMemoryOrderStore::new()),
            users: Arc::new(InMemoryUserView::new()),
            stock: Arc::new(InMemoryStockStore::new()),
            bus,
        }
    }

    /// Connects to whatever the configuration names, falling back to
    /// in-process backends for anything left unset.
    pub async fn connect(config: &Config) -> Result<Self, StartupError> {
        let bus: Arc<dyn EventBus> = match &config.rabbitmq_url {
            Some(url) => Arc::new(AmqpEventBus::connect(url).await?),
            None => {
                if config.role != ServiceRole::All {
                    tracing::warn!(
                        role = ?config.role,
                        "no RABBITMQ_URL: the in-process bus cannot reach the other service"
                    );
                }
                Arc::new(InMemoryEventBus::new())
            }
        };

        let Some(database_url) = &config.database_url else {
            tracing::info!("no DATABASE_URL, using in-memory storage");
            return Ok(Self::with_bus(bus));
        };

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        store::run_migrations(&pool).await?;
        tracing::info!("connected to PostgreSQL");

        Ok(Self {
            orders: Arc::new(PostgresOrderStore::new(pool.clone())),
            users: Arc::new(PostgresUserView::new(pool.clone())),
            stock: Arc::new(PostgresStockStore::new(pool)),
            bus,
        })
    }
}

/// Request-side services mounted on the router, per role.
#[derive(Clone, Default)]
pub struct Services {
    pub orders: Option<OrderService>,
    pub stock: Option<StockLedger>,
    pub users: Option<UserRegistrar>,
}

/// A started role: its services and background consumers.
pub struct Running {
    pub services: Services,
    workers: Vec<JoinHandle<WorkerStats>>,
    shutdown: watch::Sender<bool>,
}

impl Running {
    /// Returns the number of consumer workers started.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signals every worker to stop and waits for them.
    pub async fn stop(self) -> Vec<WorkerStats> {
        // Receivers may already be gone if every worker exited on its own.
        let _ = self.shutdown.send(true);
        let mut stats = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            match worker.await {
                Ok(s) => stats.push(s),
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }
        stats
    }
}

/// Builds the services of `config.role` and starts their consumers.
pub async fn start(config: &Config, backends: Backends) -> Result<Running, StartupError> {
    let (shutdown, signal) = watch::channel(false);
    let mut services = Services {
        users: Some(UserRegistrar::new(backends.bus.clone())),
        ..Services::default()
    };
    let mut workers = Vec::new();

    if config.role.runs_orders() {
        let policy = if config.strict_transitions {
            TransitionPolicy::PendingOnly
        } else {
            TransitionPolicy::Unconditional
        };

        let mut projections = ProjectionProcessor::new();
        projections.register(Box::new(UserViewProjector::new(backends.users.clone())));

        workers.extend(
            spawn_orders_workers(
                backends.bus.as_ref(),
                OrderCompleter::new(backends.orders.clone(), policy),
                projections,
                config.queue_capacity,
                signal.clone(),
            )
            .await?,
        );

        services.orders = Some(OrderService::new(
            backends.orders.clone(),
            backends.users.clone(),
            backends.bus.clone(),
        ));
    }

    if config.role.runs_inventory() {
        let ledger = StockLedger::new(backends.stock.clone());
        workers.extend(
            spawn_inventory_workers(
                backends.bus.as_ref(),
                InventoryResponder::new(ledger.clone(), backends.bus.clone()),
                config.queue_capacity,
                signal,
            )
            .await?,
        );
        services.stock = Some(ledger);
    }

    tracing::info!(role = ?config.role, workers = workers.len(), "role started");

    Ok(Running {
        services,
        workers,
        shutdown,
    })
}
