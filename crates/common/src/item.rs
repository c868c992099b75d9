use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A product line as it travels between services.
///
/// The same shape appears in order creation requests, in persisted order
/// items and in the `order.created` / `inventory.reserved` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product being ordered.
    pub product_id: ProductId,
    /// Units requested. Expected to be positive; the stock ledger rejects
    /// anything else.
    pub quantity: i32,
    /// Unit price at the time the order was placed.
    pub price: f64,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, quantity: i32, price: f64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price,
        }
    }

    /// Returns `quantity * price`.
    pub fn total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}
