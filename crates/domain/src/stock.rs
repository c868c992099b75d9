//! Per-product stock and the reservation invariant.

use common::{ErrorKind, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by stock rules and the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// The requested quantity cannot be reserved.
    ///
    /// A non-positive request and a request above the available quantity
    /// both end up here, so callers cannot tell a bad request from an
    /// out-of-stock product.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The product id is not a positive integer.
    #[error("invalid product id: {0}")]
    InvalidProductId(i64),

    /// A replenishment or seed quantity is out of range.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// No stock record exists for the product.
    #[error("stock not found for product {0}")]
    NotFound(ProductId),

    /// A stock record already exists for the product.
    #[error("stock already exists for product {0}")]
    AlreadyExists(ProductId),
}

impl StockError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StockError::InsufficientStock { .. } | StockError::AlreadyExists(_) => {
                ErrorKind::Conflict
            }
            StockError::InvalidProductId(_) | StockError::InvalidQuantity(_) => {
                ErrorKind::Validation
            }
            StockError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Available quantity of a single product.
///
/// Invariant: `quantity >= 0`. Every mutation goes through [`Stock::reserve`]
/// or [`Stock::add`], which refuse changes that would break it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl Stock {
    /// Creates a stock record with an initial quantity.
    pub fn new(product_id: ProductId, quantity: i32) -> Result<Self, StockError> {
        if !product_id.is_valid() {
            return Err(StockError::InvalidProductId(product_id.get()));
        }
        if quantity < 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }

    /// Checks whether `qty` units can be reserved.
    pub fn can_reserve(&self, qty: i32) -> Result<(), StockError> {
        if qty <= 0 || self.quantity < qty {
            return Err(StockError::InsufficientStock {
                product_id: self.product_id,
                requested: qty,
                available: self.quantity,
            });
        }
        Ok(())
    }

    /// Reserves `qty` units, leaving the record untouched on failure.
    pub fn reserve(&mut self, qty: i32) -> Result<(), StockError> {
        self.can_reserve(qty)?;
        self.quantity -= qty;
        Ok(())
    }

    /// Replenishes `qty` units.
    pub fn add(&mut self, qty: i32) -> Result<(), StockError> {
        if qty <= 0 {
            return Err(StockError::InvalidQuantity(qty));
        }
        self.quantity = self
            .quantity
            .checked_add(qty)
            .ok_or(StockError::InvalidQuantity(qty))?;
        Ok(())
    }
}
