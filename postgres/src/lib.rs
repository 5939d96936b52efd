//! # Surge Postgres
//!
//! `PostgreSQL` implementations of the Surge store traits.
//!
//! The correctness-critical piece is [`PgSaleWindowStore::decrement_stock`]:
//! a single conditional `UPDATE` that decrements `remaining_units` only when
//! enough stock is present, atomic with respect to every other connection,
//! including other server instances sharing the database. No advisory locks,
//! no transactions held across round-trips.
//!
//! The purchase ledger enforces `(user_id, sale_window_id)` uniqueness with
//! a unique index, so a race past the engine's pre-check fails on the append
//! itself.

pub mod catalog;
pub mod ledger;
pub mod sale_windows;

pub use catalog::PgProductCatalog;
pub use ledger::PgPurchaseLedger;
pub use sale_windows::PgSaleWindowStore;

use sqlx::PgPool;
use surge_core::error::StoreError;

/// Run the embedded migrations against `pool`.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))
}

pub(crate) fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Map a Postgres `BIGINT` back into a unit count.
///
/// The schema's check constraints keep these columns inside `u32` range; a
/// value outside it means corruption, surfaced as a database error rather
/// than clamped.
pub(crate) fn units_from_db(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Database(format!("column {column} out of range: {value}")))
}
