//! HTTP API and worker host for the order fulfillment services.
//!
//! One binary hosts the orders service, the inventory service, or both,
//! selected by `SERVICE_ROLE`. Each role exposes its REST endpoints and runs
//! its queue consumers in the background, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod runtime;

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::ServiceRole;
use runtime::Services;

/// Creates the Axum application router for the services a role hosts.
pub fn create_app(services: Services, role: ServiceRole, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    let mut app = Router::new()
        .route("/health", get(routes::ops::health))
        .with_state(role)
        .merge(metrics_router);

    if let Some(orders) = services.orders {
        app = app.merge(routes::orders::router(orders));
    }
    if let Some(ledger) = services.stock {
        app = app.merge(routes::stock::router(ledger));
    }
    if let Some(registrar) = services.users {
        app = app.merge(routes::users::router(registrar));
    }

    app.fallback(routes::ops::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
