use async_trait::async_trait;
use common::{LineItem, OrderId, ProductId, UserId};
use domain::{NewOrder, Order, OrderStatus, Stock, StockError};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::repository::{OrderRepository, StockRepository, UserViewRepository};
use crate::{Result, StoreError};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: PgRow) -> Result<LineItem> {
        Ok(LineItem {
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
        })
    }

    async fn order_exists(&self, id: OrderId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id()))]
    async fn create(&self, order: NewOrder) -> Result<Order> {
        // Dropping the transaction without commit rolls everything back.
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, status, created_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.user_id().get())
        .bind(OrderStatus::PendingInventory.as_str())
        .bind(order.created_at())
        .fetch_one(&mut *tx)
        .await?;

        for item in order.items() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(item.product_id.get())
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order.into_order(OrderId::new(id)))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let Some(row) =
            sqlx::query("SELECT id, user_id, status, created_at FROM orders WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRow(e.to_string()))?;

        let items = sqlx::query(
            r#"
            SELECT product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_item)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(Order {
            id: OrderId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            status,
            items,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id.get())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if !self.order_exists(id).await? {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(false)
    }
}

/// PostgreSQL-backed stock store.
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Creates a new PostgreSQL stock store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_stock(row: PgRow) -> Result<Stock> {
        Ok(Stock {
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
        })
    }
}

#[async_trait]
impl StockRepository for PostgresStockStore {
    async fn create(&self, stock: Stock) -> Result<()> {
        sqlx::query("INSERT INTO stock (product_id, quantity) VALUES ($1, $2)")
            .bind(stock.product_id.get())
            .bind(stock.quantity)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Stock(StockError::AlreadyExists(stock.product_id));
                }
                StoreError::Database(e)
            })?;
        Ok(())
    }

    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>> {
        sqlx::query("SELECT product_id, quantity FROM stock WHERE product_id = $1")
            .bind(product_id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(Self::row_to_stock)
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn try_reserve(&self, product_id: ProductId, qty: i32) -> Result<Stock> {
        let row = sqlx::query(
            r#"
            UPDATE stock
            SET quantity = quantity - $1
            WHERE product_id = $2 AND $1 > 0 AND quantity >= $1
            RETURNING product_id, quantity
            "#,
        )
        .bind(qty)
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_stock(row);
        }

        // Nothing matched the guard: report why using the current row.
        let current = self
            .get(product_id)
            .await?
            .ok_or(StockError::NotFound(product_id))?;
        current.can_reserve(qty)?;

        // The row changed between the guarded update and the read.
        Err(StockError::InsufficientStock {
            product_id,
            requested: qty,
            available: current.quantity,
        }
        .into())
    }

    async fn add(&self, product_id: ProductId, qty: i32) -> Result<Stock> {
        if qty <= 0 {
            return Err(StockError::InvalidQuantity(qty).into());
        }

        // The guard keeps the sum inside INTEGER instead of letting the
        // database raise an out-of-range error.
        let row = sqlx::query(
            r#"
            UPDATE stock
            SET quantity = quantity + $1
            WHERE product_id = $2 AND quantity <= 2147483647 - $1
            RETURNING product_id, quantity
            "#,
        )
        .bind(qty)
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_stock(row);
        }

        match self.get(product_id).await? {
            Some(_) => Err(StockError::InvalidQuantity(qty).into()),
            None => Err(StockError::NotFound(product_id).into()),
        }
    }
}

/// PostgreSQL-backed user view.
#[derive(Clone)]
pub struct PostgresUserView {
    pool: PgPool,
}

impl PostgresUserView {
    /// Creates a new PostgreSQL user view.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserViewRepository for PostgresUserView {
    async fn insert(&self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_view (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id.get())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn exists(&self, user_id: UserId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_view WHERE user_id = $1)")
                .bind(user_id.get())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_view")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
