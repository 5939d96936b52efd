//! Sale window store backed by `PostgreSQL`.

use crate::{db_err, units_from_db};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::future::Future;
use std::pin::Pin;
use surge_core::error::StoreError;
use surge_core::store::SaleWindowStore;
use surge_core::types::{ProductId, SaleWindow, SaleWindowId, SchedulePatch};

/// `PostgreSQL`-backed [`SaleWindowStore`].
///
/// The atomic decrement is one conditional `UPDATE`; Postgres row locking
/// serializes concurrent callers on the same window, so at most one caller
/// can win each unit of stock even across server processes.
#[derive(Clone)]
pub struct PgSaleWindowStore {
    pool: PgPool,
}

impl PgSaleWindowStore {
    /// Create a store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const WINDOW_COLUMNS: &str =
    "id, product_id, allocated_units, remaining_units, sale_start, sale_end, created_at, updated_at";

pub(crate) fn row_to_window(row: &PgRow) -> Result<SaleWindow, StoreError> {
    Ok(SaleWindow {
        id: SaleWindowId::from_uuid(row.get("id")),
        product_id: ProductId::from_uuid(row.get("product_id")),
        allocated_units: units_from_db(row.get("allocated_units"), "allocated_units")?,
        remaining_units: units_from_db(row.get("remaining_units"), "remaining_units")?,
        sale_start: row.get("sale_start"),
        sale_end: row.get("sale_end"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl SaleWindowStore for PgSaleWindowStore {
    fn insert(
        &self,
        window: SaleWindow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO sale_windows (
                    id, product_id, allocated_units, remaining_units,
                    sale_start, sale_end, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(window.id.as_uuid())
            .bind(window.product_id.as_uuid())
            .bind(i64::from(window.allocated_units))
            .bind(i64::from(window.remaining_units))
            .bind(window.sale_start)
            .bind(window.sale_end)
            .bind(window.created_at)
            .bind(window.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn get(
        &self,
        id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {WINDOW_COLUMNS} FROM sale_windows WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_window).transpose()
        })
    }

    fn decrement_stock(
        &self,
        id: SaleWindowId,
        quantity: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            // The commit point of every purchase: condition and mutation in
            // one statement. Zero rows means the stock boundary held against
            // this caller (or the window vanished); either way the attempt
            // loses without side effects.
            let row = sqlx::query(&format!(
                r"
                UPDATE sale_windows
                SET remaining_units = remaining_units - $2
                WHERE id = $1 AND remaining_units >= $2
                RETURNING {WINDOW_COLUMNS}
                ",
            ))
            .bind(id.as_uuid())
            .bind(i64::from(quantity))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

            let snapshot = row.as_ref().map(row_to_window).transpose()?;
            if snapshot.is_none() {
                tracing::debug!(sale_window_id = %id, quantity, "Decrement matched no row");
                metrics::counter!("sale_window.decrement_lost").increment(1);
            }
            Ok(snapshot)
        })
    }

    fn find_overlapping(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                r"
                SELECT {WINDOW_COLUMNS} FROM sale_windows
                WHERE product_id = $1 AND sale_end >= $2 AND sale_start <= $3
                LIMIT 1
                ",
            ))
            .bind(product_id.as_uuid())
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_window).transpose()
        })
    }

    fn list_active(
        &self,
        now: DateTime<Utc>,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SaleWindow>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let offset = i64::from(page.max(1) - 1) * i64::from(page_size);
            let rows = sqlx::query(&format!(
                r"
                SELECT {WINDOW_COLUMNS} FROM sale_windows
                WHERE sale_start <= $1 AND sale_end >= $1
                ORDER BY sale_start ASC, id ASC
                LIMIT $2 OFFSET $3
                ",
            ))
            .bind(now)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_window).collect()
        })
    }

    fn update_schedule(
        &self,
        id: SaleWindowId,
        patch: SchedulePatch,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                r"
                UPDATE sale_windows
                SET sale_start = COALESCE($2, sale_start),
                    sale_end = COALESCE($3, sale_end),
                    updated_at = $4
                WHERE id = $1
                RETURNING {WINDOW_COLUMNS}
                ",
            ))
            .bind(id.as_uuid())
            .bind(patch.sale_start)
            .bind(patch.sale_end)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_window).transpose()
        })
    }

    fn delete(
        &self,
        id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM sale_windows WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
