//! Liveness and Prometheus endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::config::ServiceRole;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub role: &'static str,
}

/// GET /health — reports liveness and the role this process hosts.
pub async fn health(State(role): State<ServiceRole>) -> Json<HealthResponse> {
    let role = match role {
        ServiceRole::Orders => "orders",
        ServiceRole::Inventory => "inventory",
        ServiceRole::All => "all",
    };
    Json(HealthResponse { status: "ok", role })
}

/// GET /metrics — saga counters in the Prometheus text format.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}

/// Fallback for unknown routes, including routes of a role this process
/// does not host.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}
