use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderRecord, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderStore, Result, StoreError};

/// PostgreSQL-backed order store implementation.
///
/// Items are stored as a JSONB array alongside the scalar columns.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and builds a store over the pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let items: Vec<OrderItem> = serde_json::from_value(row.try_get("items")?)?;
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status).ok_or_else(|| StoreError::CorruptRecord {
            order_id: id.to_string(),
            reason: format!("unknown status '{status}'"),
        })?;

        Ok(Order::from(OrderRecord {
            id,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            total: Money::from_cents(row.try_get("total_cents")?),
            status,
            payment_id: row.try_get("payment_id")?,
            payment_url: row.try_get("payment_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn create(&self, order: &Order) -> Result<()> {
        let start = std::time::Instant::now();
        let items = serde_json::to_value(order.items())?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_cents, status, payment_id, payment_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_str())
        .bind(items)
        .bind(order.total().cents())
        .bind(order.status().as_str())
        .bind(order.payment_id())
        .bind(order.payment_url())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::AlreadyExists(order.id());
            }
            StoreError::Database(e)
        })?;

        metrics::histogram!("order_store_query_seconds", "op" => "create")
            .record(start.elapsed().as_secs_f64());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let start = std::time::Instant::now();
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, user_id, items, total_cents, status, payment_id, payment_url, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        metrics::histogram!("order_store_query_seconds", "op" => "find")
            .record(start.elapsed().as_secs_f64());
        row.map(Self::row_to_order).transpose()
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id(), status = %order.status()))]
    async fn update(&self, order: &Order) -> Result<()> {
        let start = std::time::Instant::now();
        let items = serde_json::to_value(order.items())?;

        // Plain overwrite: no version column, the last writer wins.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET user_id = $2, items = $3, total_cents = $4, status = $5,
                payment_id = $6, payment_url = $7, created_at = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_str())
        .bind(items)
        .bind(order.total().cents())
        .bind(order.status().as_str())
        .bind(order.payment_id())
        .bind(order.payment_url())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        metrics::histogram!("order_store_query_seconds", "op" => "update")
            .record(start.elapsed().as_secs_f64());

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(order.id()));
        }
        Ok(())
    }
}
