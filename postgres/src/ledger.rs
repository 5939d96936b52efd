//! Purchase ledger backed by `PostgreSQL`.

use crate::{db_err, units_from_db};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::future::Future;
use std::pin::Pin;
use surge_core::error::{LedgerError, StoreError};
use surge_core::store::PurchaseLedger;
use surge_core::types::{Purchase, PurchaseId, SaleWindowId, UserId};

/// Postgres error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// `PostgreSQL`-backed [`PurchaseLedger`].
///
/// Uniqueness of `(user_id, sale_window_id)` is enforced by
/// `idx_purchases_user_window`; the append itself fails under a race, which
/// is the guarantee the engine's pre-check cannot give.
#[derive(Clone)]
pub struct PgPurchaseLedger {
    pool: PgPool,
}

impl PgPurchaseLedger {
    /// Create a ledger over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PURCHASE_COLUMNS: &str = "id, user_id, sale_window_id, quantity, purchase_time";

fn row_to_purchase(row: &PgRow) -> Result<Purchase, StoreError> {
    Ok(Purchase {
        id: PurchaseId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        sale_window_id: SaleWindowId::from_uuid(row.get("sale_window_id")),
        quantity: units_from_db(row.get("quantity"), "quantity")?,
        purchase_time: row.get("purchase_time"),
    })
}

fn append_err(e: sqlx::Error) -> LedgerError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            LedgerError::Duplicate
        }
        _ => LedgerError::Store(db_err(e)),
    }
}

impl PurchaseLedger for PgPurchaseLedger {
    fn append(
        &self,
        purchase: Purchase,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO purchases (id, user_id, sale_window_id, quantity, purchase_time)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(purchase.id.as_uuid())
            .bind(purchase.user_id.as_uuid())
            .bind(purchase.sale_window_id.as_uuid())
            .bind(i64::from(purchase.quantity))
            .bind(purchase.purchase_time)
            .execute(&self.pool)
            .await
            .map_err(append_err)?;
            Ok(())
        })
    }

    fn find_for_user(
        &self,
        user_id: UserId,
        sale_window_id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Purchase>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE user_id = $1 AND sale_window_id = $2"
            ))
            .bind(user_id.as_uuid())
            .bind(sale_window_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_purchase).transpose()
        })
    }

    fn get(
        &self,
        id: PurchaseId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Purchase>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
            row.as_ref().map(row_to_purchase).transpose()
        })
    }

    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let offset = i64::from(page.max(1) - 1) * i64::from(page_size);
            let rows = sqlx::query(&format!(
                r"
                SELECT {PURCHASE_COLUMNS} FROM purchases
                ORDER BY purchase_time DESC, id ASC
                LIMIT $1 OFFSET $2
                ",
            ))
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_purchase).collect()
        })
    }

    fn list_for_window(
        &self,
        sale_window_id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE sale_window_id = $1"
            ))
            .bind(sale_window_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_purchase).collect()
        })
    }

    fn leaderboard(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY purchase_time ASC, id ASC"
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
            rows.iter().map(row_to_purchase).collect()
        })
    }

    fn delete(
        &self,
        id: PurchaseId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM purchases WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
