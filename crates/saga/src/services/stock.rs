use std::sync::Arc;

use common::{LineItem, ProductId};
use domain::{Stock, StockError};
use store::StockRepository;

use crate::Result;

/// Per-product stock owned by the inventory service.
#[derive(Clone)]
pub struct StockLedger {
    stock: Arc<dyn StockRepository>,
}

impl StockLedger {
    /// Creates a ledger over the given stock store.
    pub fn new(stock: Arc<dyn StockRepository>) -> Self {
        Self { stock }
    }

    /// Reserves every item of an order, in order.
    ///
    /// Stops at the first item that cannot be reserved. Items reserved before
    /// it stay reserved: there is no rollback. A quantity of zero or less is
    /// reported as insufficient stock.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub async fn reserve_for_order(&self, items: &[LineItem]) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            match self.stock.try_reserve(item.product_id, item.quantity).await {
                Ok(after) => {
                    metrics::counter!("stock_reservations_total", "result" => "reserved")
                        .increment(1);
                    tracing::debug!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        remaining = after.quantity,
                        "reserved"
                    );
                }
                Err(e) => {
                    metrics::counter!("stock_reservations_total", "result" => "rejected")
                        .increment(1);
                    tracing::warn!(
                        product_id = %item.product_id,
                        quantity = item.quantity,
                        already_reserved = index,
                        error = %e,
                        "reservation stopped"
                    );
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Seeds a stock record for a new product.
    pub async fn create(&self, product_id: ProductId, quantity: i32) -> Result<Stock> {
        let stock = Stock::new(product_id, quantity)?;
        self.stock.create(stock).await?;
        tracing::info!(%product_id, quantity, "stock created");
        Ok(stock)
    }

    /// Returns the stock record for a product.
    pub async fn get(&self, product_id: ProductId) -> Result<Stock> {
        if !product_id.is_valid() {
            return Err(StockError::InvalidProductId(product_id.get()).into());
        }
        Ok(self
            .stock
            .get(product_id)
            .await?
            .ok_or(StockError::NotFound(product_id))?)
    }

    /// Replenishes a product.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: i32) -> Result<Stock> {
        if !product_id.is_valid() {
            return Err(StockError::InvalidProductId(product_id.get()).into());
        }
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity).into());
        }
        Ok(self.stock.add(product_id, quantity).await?)
    }
}
