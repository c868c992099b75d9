//! Order endpoints of the orders service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use common::{LineItem, OrderId, UserId};
use domain::{Order, OrderStatus};
use saga::OrderService;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Builds the order routes around an order service.
pub fn router(service: OrderService) -> Router {
    Router::new()
        .route("/orders", post(create))
        .route("/orders/{id}", get(fetch))
        .with_state(service)
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            total: order.total(),
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            items: order.items,
            created_at: order.created_at,
        }
    }
}

/// POST /orders — create an order pending inventory.
///
/// The response only says the order was accepted; confirmation or
/// cancellation happens asynchronously.
#[tracing::instrument(skip(service, req), fields(user_id = req.user_id))]
pub async fn create(
    State(service): State<OrderService>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = service
        .create_order(UserId::new(req.user_id), req.items)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id} — load an order with its items.
pub async fn fetch(
    State(service): State<OrderService>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = service.get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}
