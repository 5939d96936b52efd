//! Mock implementations of the core store traits.
//!
//! The in-memory stores keep the exact concurrency contract of the real
//! ones: the conditional decrement is check-and-mutate under one lock, and
//! the ledger enforces `(user, sale window)` uniqueness at append time, not
//! only via the engine's pre-check. Tests that race tasks against these
//! mocks therefore exercise the same at-most-one-winner guarantee the
//! Postgres store provides.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use surge_core::error::{LedgerError, StoreError};
use surge_core::store::{ProductCatalog, PurchaseLedger, SaleWindowStore};
use surge_core::types::{
    Product, ProductId, ProductPatch, Purchase, PurchaseId, SaleWindow, SaleWindowId,
    SchedulePatch, UserId,
};
use surge_core::{Clock, ClockOffset, PurchaseEngine};

/// Deterministic clock for reproducible tests.
///
/// Unlike the wall clock it only moves when a test says so.
#[derive(Debug)]
pub struct FixedClock {
    time: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Mutex::new(time),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, time: DateTime<Utc>) {
        *lock(&self.time) = time;
    }

    /// Move forward (or backward) by `duration`.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = lock(&self.time);
        *guard += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.time)
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC).
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(crate::fixtures::t0())
}

// Mutex poisoning only happens after a panicking test; recovering the inner
// value keeps the remaining assertions meaningful.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Sale window store
// ============================================================================

/// In-memory [`SaleWindowStore`] with a lock-guarded conditional decrement.
#[derive(Debug, Default)]
pub struct MemorySaleWindowStore {
    windows: Mutex<HashMap<SaleWindowId, SaleWindow>>,
    fail_next_get: AtomicBool,
}

impl MemorySaleWindowStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `get` fail with [`StoreError::Unavailable`], then
    /// recover. Used to test pre-commit retry semantics.
    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }

    /// Direct snapshot access for assertions.
    #[must_use]
    pub fn snapshot(&self, id: SaleWindowId) -> Option<SaleWindow> {
        lock(&self.windows).get(&id).cloned()
    }
}

impl SaleWindowStore for MemorySaleWindowStore {
    fn insert(&self, window: SaleWindow) -> BoxFuture<'_, Result<(), StoreError>> {
        lock(&self.windows).insert(window.id, window);
        Box::pin(async { Ok(()) })
    }

    fn get(&self, id: SaleWindowId) -> BoxFuture<'_, Result<Option<SaleWindow>, StoreError>> {
        if self.fail_next_get.swap(false, Ordering::SeqCst) {
            return Box::pin(async { Err(StoreError::Unavailable) });
        }
        let found = lock(&self.windows).get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn decrement_stock(
        &self,
        id: SaleWindowId,
        quantity: u32,
    ) -> BoxFuture<'_, Result<Option<SaleWindow>, StoreError>> {
        // Check and mutate under one lock: the in-memory equivalent of the
        // single conditional UPDATE.
        let mut windows = lock(&self.windows);
        let result = match windows.get_mut(&id) {
            Some(window) if window.remaining_units >= quantity => {
                window.remaining_units -= quantity;
                Some(window.clone())
            }
            _ => None,
        };
        drop(windows);
        Box::pin(async move { Ok(result) })
    }

    fn find_overlapping(
        &self,
        product_id: ProductId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<SaleWindow>, StoreError>> {
        let found = lock(&self.windows)
            .values()
            .find(|w| w.product_id == product_id && w.sale_end >= start && w.sale_start <= end)
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn list_active(
        &self,
        now: DateTime<Utc>,
        page: u32,
        page_size: u32,
    ) -> BoxFuture<'_, Result<Vec<SaleWindow>, StoreError>> {
        let mut active: Vec<SaleWindow> = lock(&self.windows)
            .values()
            .filter(|w| w.sale_start <= now && w.sale_end >= now)
            .cloned()
            .collect();
        active.sort_by_key(|w| (w.sale_start, w.id.as_uuid().as_u128()));
        let skip = (page.max(1) - 1) as usize * page_size as usize;
        let out: Vec<SaleWindow> = active.into_iter().skip(skip).take(page_size as usize).collect();
        Box::pin(async move { Ok(out) })
    }

    fn update_schedule(
        &self,
        id: SaleWindowId,
        patch: SchedulePatch,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<SaleWindow>, StoreError>> {
        let mut windows = lock(&self.windows);
        let updated = windows.get_mut(&id).map(|window| {
            if let Some(start) = patch.sale_start {
                window.sale_start = start;
            }
            if let Some(end) = patch.sale_end {
                window.sale_end = end;
            }
            window.updated_at = now;
            window.clone()
        });
        drop(windows);
        Box::pin(async move { Ok(updated) })
    }

    fn delete(&self, id: SaleWindowId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let existed = lock(&self.windows).remove(&id).is_some();
        Box::pin(async move { Ok(existed) })
    }
}

// ============================================================================
// Purchase ledger
// ============================================================================

/// In-memory [`PurchaseLedger`] enforcing uniqueness at append time.
#[derive(Debug, Default)]
pub struct MemoryPurchaseLedger {
    purchases: Mutex<Vec<Purchase>>,
    fail_appends: AtomicBool,
}

impl MemoryPurchaseLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append fail with [`StoreError::Unavailable`] until reset.
    /// Used to test the post-commit fault path.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Total units recorded against one window; conservation assertions.
    #[must_use]
    pub fn units_recorded(&self, sale_window_id: SaleWindowId) -> u64 {
        lock(&self.purchases)
            .iter()
            .filter(|p| p.sale_window_id == sale_window_id)
            .map(|p| u64::from(p.quantity))
            .sum()
    }
}

impl PurchaseLedger for MemoryPurchaseLedger {
    fn append(&self, purchase: Purchase) -> BoxFuture<'_, Result<(), LedgerError>> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Box::pin(async { Err(LedgerError::Store(StoreError::Unavailable)) });
        }
        // Uniqueness check and insert under one lock, like the unique index.
        let mut purchases = lock(&self.purchases);
        let result = if purchases
            .iter()
            .any(|p| p.user_id == purchase.user_id && p.sale_window_id == purchase.sale_window_id)
        {
            Err(LedgerError::Duplicate)
        } else {
            purchases.push(purchase);
            Ok(())
        };
        drop(purchases);
        Box::pin(async move { result })
    }

    fn find_for_user(
        &self,
        user_id: UserId,
        sale_window_id: SaleWindowId,
    ) -> BoxFuture<'_, Result<Option<Purchase>, StoreError>> {
        let found = lock(&self.purchases)
            .iter()
            .find(|p| p.user_id == user_id && p.sale_window_id == sale_window_id)
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn get(&self, id: PurchaseId) -> BoxFuture<'_, Result<Option<Purchase>, StoreError>> {
        let found = lock(&self.purchases).iter().find(|p| p.id == id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn list(&self, page: u32, page_size: u32) -> BoxFuture<'_, Result<Vec<Purchase>, StoreError>> {
        let mut all: Vec<Purchase> = lock(&self.purchases).clone();
        all.sort_by(|a, b| b.purchase_time.cmp(&a.purchase_time));
        let skip = (page.max(1) - 1) as usize * page_size as usize;
        let out: Vec<Purchase> = all.into_iter().skip(skip).take(page_size as usize).collect();
        Box::pin(async move { Ok(out) })
    }

    fn list_for_window(
        &self,
        sale_window_id: SaleWindowId,
    ) -> BoxFuture<'_, Result<Vec<Purchase>, StoreError>> {
        let out: Vec<Purchase> = lock(&self.purchases)
            .iter()
            .filter(|p| p.sale_window_id == sale_window_id)
            .cloned()
            .collect();
        Box::pin(async move { Ok(out) })
    }

    fn leaderboard(&self) -> BoxFuture<'_, Result<Vec<Purchase>, StoreError>> {
        let mut all: Vec<Purchase> = lock(&self.purchases).clone();
        all.sort_by_key(|p| p.purchase_time);
        Box::pin(async move { Ok(all) })
    }

    fn delete(&self, id: PurchaseId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let mut purchases = lock(&self.purchases);
        let before = purchases.len();
        purchases.retain(|p| p.id != id);
        let existed = purchases.len() < before;
        drop(purchases);
        Box::pin(async move { Ok(existed) })
    }
}

// ============================================================================
// Product catalog
// ============================================================================

/// In-memory [`ProductCatalog`].
#[derive(Debug, Default)]
pub struct MemoryProductCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl MemoryProductCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductCatalog for MemoryProductCatalog {
    fn insert(&self, product: Product) -> BoxFuture<'_, Result<(), StoreError>> {
        lock(&self.products).insert(product.id, product);
        Box::pin(async { Ok(()) })
    }

    fn get(&self, id: ProductId) -> BoxFuture<'_, Result<Option<Product>, StoreError>> {
        let found = lock(&self.products).get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn exists(&self, id: ProductId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let exists = lock(&self.products).contains_key(&id);
        Box::pin(async move { Ok(exists) })
    }

    fn list(&self, page: u32, page_size: u32) -> BoxFuture<'_, Result<Vec<Product>, StoreError>> {
        let mut all: Vec<Product> = lock(&self.products).values().cloned().collect();
        all.sort_by_key(|p| (p.created_at, p.id.as_uuid().as_u128()));
        let skip = (page.max(1) - 1) as usize * page_size as usize;
        let out: Vec<Product> = all.into_iter().skip(skip).take(page_size as usize).collect();
        Box::pin(async move { Ok(out) })
    }

    fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Option<Product>, StoreError>> {
        let mut products = lock(&self.products);
        let updated = products.get_mut(&id).map(|product| {
            if let Some(name) = patch.name {
                product.name = name;
            }
            if let Some(description) = patch.description {
                product.description = description;
            }
            if let Some(price) = patch.price {
                product.price = price;
            }
            product.updated_at = now;
            product.clone()
        });
        drop(products);
        Box::pin(async move { Ok(updated) })
    }

    fn delete(&self, id: ProductId) -> BoxFuture<'_, Result<bool, StoreError>> {
        let existed = lock(&self.products).remove(&id).is_some();
        Box::pin(async move { Ok(existed) })
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// Bundle of the three in-memory stores, with an engine builder.
#[derive(Debug, Default)]
pub struct MemoryStores {
    /// Sale window store
    pub windows: Arc<MemorySaleWindowStore>,
    /// Purchase ledger
    pub ledger: Arc<MemoryPurchaseLedger>,
    /// Product catalog
    pub catalog: Arc<MemoryProductCatalog>,
}

impl MemoryStores {
    /// Create a fresh, empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a [`PurchaseEngine`] over these stores.
    #[must_use]
    pub fn engine(&self, clock: Arc<dyn Clock>, offset: ClockOffset) -> PurchaseEngine {
        PurchaseEngine::new(
            self.windows.clone(),
            self.ledger.clone(),
            self.catalog.clone(),
            clock,
            offset,
        )
    }
}
