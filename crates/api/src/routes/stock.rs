//! Stock endpoints of the inventory service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::ProductId;
use domain::Stock;
use saga::StockLedger;
use serde::Deserialize;

use crate::error::ApiError;

/// Builds the stock routes around a ledger.
pub fn router(ledger: StockLedger) -> Router {
    Router::new()
        .route("/stock", post(create))
        .route("/stock/{product_id}", get(fetch))
        .route("/stock/{product_id}/add", post(add))
        .with_state(ledger)
}

#[derive(Deserialize)]
pub struct CreateStockRequest {
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct AddStockRequest {
    pub quantity: i32,
}

/// POST /stock — seed the stock record of a new product.
pub async fn create(
    State(ledger): State<StockLedger>,
    Json(req): Json<CreateStockRequest>,
) -> Result<(StatusCode, Json<Stock>), ApiError> {
    let stock = ledger
        .create(ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// GET /stock/{product_id} — current available quantity.
pub async fn fetch(
    State(ledger): State<StockLedger>,
    Path(product_id): Path<i64>,
) -> Result<Json<Stock>, ApiError> {
    Ok(Json(ledger.get(ProductId::new(product_id)).await?))
}

/// POST /stock/{product_id}/add — replenish a product.
#[tracing::instrument(skip(ledger, req), fields(quantity = req.quantity))]
pub async fn add(
    State(ledger): State<StockLedger>,
    Path(product_id): Path<i64>,
    Json(req): Json<AddStockRequest>,
) -> Result<Json<Stock>, ApiError> {
    Ok(Json(
        ledger.add(ProductId::new(product_id), req.quantity).await?,
    ))
}
