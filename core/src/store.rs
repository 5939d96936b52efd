//! Store traits: the seams between the purchase engine and durable storage.
//!
//! The engine never locks and never assumes in-process shared memory. All
//! correctness under contention is delegated to the backing store through one
//! primitive, [`SaleWindowStore::decrement_stock`], which must be a single
//! atomic conditional update with respect to every other caller, including
//! callers in other server processes sharing the same store.
//!
//! # Dyn Compatibility
//!
//! These traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to enable trait object usage (`Arc<dyn SaleWindowStore>`): the
//! engine and the HTTP shell hold stores behind trait objects so the
//! Postgres and in-memory implementations are interchangeable.

use crate::error::{LedgerError, StoreError};
use crate::types::{
    Product, ProductId, ProductPatch, Purchase, PurchaseId, SaleWindow, SaleWindowId,
    SchedulePatch, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Durable store for [`SaleWindow`] records.
pub trait SaleWindowStore: Send + Sync {
    /// Persist a freshly created window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert(
        &self,
        window: SaleWindow,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Point lookup by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get(
        &self,
        id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>>;

    /// Conditionally decrement `remaining_units` by `quantity`.
    ///
    /// The contract of the whole system: "decrement iff
    /// `remaining_units >= quantity`" must execute as one atomic step with
    /// respect to every concurrent caller targeting the same window, with no
    /// external locking. At most one caller may win each unit of stock.
    ///
    /// Returns the post-decrement snapshot on success, or `None` when the
    /// condition did not hold at commit time (stock exhausted, or the window
    /// disappeared). Callers must not retry a `None` automatically: it is a
    /// final business outcome, not a transient error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures, which are
    /// side-effect free and safe to retry from the top.
    fn decrement_stock(
        &self,
        id: SaleWindowId,
        quantity: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>>;

    /// Find any window for `product_id` whose period intersects
    /// `[start, end]` (touching endpoints count as overlap).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_overlapping(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>>;

    /// Windows whose schedule contains `now`, ordered by `sale_start`,
    /// paginated with a 1-based `page`. Restartable: the same page can be
    /// re-fetched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list_active(
        &self,
        now: DateTime<Utc>,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SaleWindow>, StoreError>> + Send + '_>>;

    /// Apply an admin schedule edit. Never touches allocation or stock.
    ///
    /// Returns the updated window, or `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn update_schedule(
        &self,
        id: SaleWindowId,
        patch: SchedulePatch,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SaleWindow>, StoreError>> + Send + '_>>;

    /// Delete a window. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(
        &self,
        id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;
}

/// Append-only ledger of granted purchases.
///
/// Implementations must enforce `(user_id, sale_window_id)` uniqueness in
/// the storage layer itself, not only via the engine's pre-check: two
/// requests racing through the gates must still end with a single row, the
/// loser seeing [`LedgerError::Duplicate`] on append.
pub trait PurchaseLedger: Send + Sync {
    /// Record a granted purchase.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Duplicate`] when the uniqueness constraint fires;
    /// [`LedgerError::Store`] for infrastructure failures.
    fn append(
        &self,
        purchase: Purchase,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>;

    /// Look up the purchase a user holds in a window, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn find_for_user(
        &self,
        user_id: UserId,
        sale_window_id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Purchase>, StoreError>> + Send + '_>>;

    /// Point lookup by purchase id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get(
        &self,
        id: PurchaseId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Purchase>, StoreError>> + Send + '_>>;

    /// Paginated listing, newest first, 1-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>>;

    /// Every purchase recorded against one window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list_for_window(
        &self,
        sale_window_id: SaleWindowId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>>;

    /// All purchases ordered by `purchase_time` ascending. Ties are possible
    /// and acceptable; arrival order is not tracked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn leaderboard(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Purchase>, StoreError>> + Send + '_>>;

    /// Administrative delete. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(
        &self,
        id: PurchaseId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;
}

/// Catalog lookup collaborator.
///
/// The purchase engine only checks existence at window creation; the rest of
/// the surface backs the product CRUD endpoints.
pub trait ProductCatalog: Send + Sync {
    /// Persist a new product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn insert(
        &self,
        product: Product,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Point lookup by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn get(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, StoreError>> + Send + '_>>;

    /// Existence check, cheaper than a full fetch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn exists(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;

    /// Paginated listing, 1-based `page`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    fn list(
        &self,
        page: u32,
        page_size: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>, StoreError>> + Send + '_>>;

    /// Apply an admin edit. Returns the updated product, or `None` if the id
    /// is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, StoreError>> + Send + '_>>;

    /// Delete a product. Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(
        &self,
        id: ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;
}
