//! Product catalog backed by `PostgreSQL`.

use crate::db_err;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::future::Future;
use std::pin::Pin;
use surge_core::error::StoreError;
use surge_core::types::{PriceCents, Product, ProductId, ProductPatch};

/// `PostgreSQL`-backed [`ProductCatalog`](surge_core::store::ProductCatalog).
#[derive(Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Create a catalog over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, created_at, updated_at";

fn row_to_product(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(row.get("id")),
        name: row.get("name"),
        description: row.get("description"),
        price: price_from_db(row.get("price_cents"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Map a `BIGINT` price column back into [`PriceCents`].
///
/// The schema's check constraint keeps the column non-negative; a negative
/// value means corruption and surfaces as a database error.
fn price_from_db(value: i64) -> Result<PriceCents, StoreError> {
    u64::try_from(value)
        .map(PriceCents::from_cents)
        .map_err(|_| StoreError::Database(format!("column price_cents out of range: {value}")))
}

fn price_to_db(price: PriceCents) -> Result<i64, StoreError> {
    i64::try_from(price.cents())
        .map_err(|_| StoreError::Database(format!("price exceeds BIGINT: {price}")))
}

impl surge_core::store::ProductCatalog for PgProductCatalog {
    fn insert(
        &self,
        product: Product,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO products (id, name, description, price_cents, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(price_to_db(product.price)?)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn get(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_product).transpose()
        })
    }

    fn exists(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT 1 FROM products WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            Ok(row.is_some())
        })
    }

    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let offset = i64::from(page.max(1) - 1) * i64::from(page_size);
            let rows = sqlx::query(&format!(
                r"
                SELECT {PRODUCT_COLUMNS} FROM products
                ORDER BY created_at ASC, id ASC
                LIMIT $1 OFFSET $2
                ",
            ))
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_product).collect()
        })
    }

    fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let price = patch.price.map(price_to_db).transpose()?;
            let row = sqlx::query(&format!(
                r"
                UPDATE products
                SET name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    price_cents = COALESCE($4, price_cents),
                    updated_at = $5
                WHERE id = $1
                RETURNING {PRODUCT_COLUMNS}
                ",
            ))
            .bind(id.as_uuid())
            .bind(patch.name)
            .bind(patch.description)
            .bind(price)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_product).transpose()
        })
    }

    fn delete(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
