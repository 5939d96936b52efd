//! Purchase engine: orchestration of the flash-sale core flows.
//!
//! The engine sequences the gates in front of the atomic decrement and owns
//! the sale-window lifecycle (creation with the overlap guard, schedule
//! edits, active listing). It holds its collaborators behind trait objects,
//! so the Postgres and in-memory stores are interchangeable, and it never
//! takes a lock: every step before the conditional decrement is
//! side-effect-free, and the decrement itself is the commit point.

use crate::availability::{self, MAX_PER_TRANSACTION};
use crate::clock::{Clock, ClockOffset};
use crate::error::{LedgerError, PurchaseError, SaleWindowError, StoreError};
use crate::store::{ProductCatalog, PurchaseLedger, SaleWindowStore};
use crate::types::{Purchase, ProductId, SaleWindow, SaleWindowId, SchedulePatch, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Orchestrator for purchase attempts and sale-window administration.
pub struct PurchaseEngine {
    windows: Arc<dyn SaleWindowStore>,
    ledger: Arc<dyn PurchaseLedger>,
    catalog: Arc<dyn ProductCatalog>,
    clock: Arc<dyn Clock>,
    clock_offset: ClockOffset,
}

impl PurchaseEngine {
    /// Create an engine over the given collaborators.
    ///
    /// `clock_offset` is the named clock-skew compensation applied to "now"
    /// before every availability comparison (see [`ClockOffset`]).
    #[must_use]
    pub fn new(
        windows: Arc<dyn SaleWindowStore>,
        ledger: Arc<dyn PurchaseLedger>,
        catalog: Arc<dyn ProductCatalog>,
        clock: Arc<dyn Clock>,
        clock_offset: ClockOffset,
    ) -> Self {
        Self {
            windows,
            ledger,
            catalog,
            clock,
            clock_offset,
        }
    }

    /// The configured clock-skew compensation.
    #[must_use]
    pub const fn clock_offset(&self) -> ClockOffset {
        self.clock_offset
    }

    /// The offset-adjusted instant schedules are evaluated at.
    #[must_use]
    pub fn adjusted_now(&self) -> DateTime<Utc> {
        self.clock_offset.adjust(self.clock.now())
    }

    /// Attempt a purchase of `quantity` units for `user_id` in the given
    /// window.
    ///
    /// Sequencing, with failure at any gate aborting cleanly:
    ///
    /// 1. quantity bounds check (no store access on failure);
    /// 2. window lookup;
    /// 3. duplicate pre-check against the ledger (best effort — the ledger's
    ///    uniqueness constraint is the real enforcement);
    /// 4. availability evaluation at the offset-adjusted current time;
    /// 5. atomic conditional decrement — the commit point;
    /// 6. ledger append with `purchase_time` set to the commit time.
    ///
    /// A failed decrement after an eligible evaluation is reported as
    /// [`PurchaseError::StockExhausted`]: concurrent callers consumed the
    /// stock between steps 4 and 5. A ledger failure after the decrement is
    /// a reconciliation-required fault, never an ordinary rejection.
    ///
    /// # Errors
    ///
    /// Any [`PurchaseError`] variant; only [`PurchaseError::Store`] is
    /// retryable.
    pub async fn purchase(
        &self,
        user_id: UserId,
        sale_window_id: SaleWindowId,
        quantity: u32,
    ) -> Result<Purchase, PurchaseError> {
        // Step 1: bounds validation, before any store access.
        if quantity == 0 {
            return Err(reject(PurchaseError::InvalidQuantity { quantity }));
        }
        if quantity > MAX_PER_TRANSACTION {
            return Err(reject(PurchaseError::ExceedsPerTransactionLimit));
        }

        // Step 2: load the window.
        let window = self
            .windows
            .get(sale_window_id)
            .await?
            .ok_or(PurchaseError::WindowNotFound(sale_window_id))?;

        // Step 3: duplicate pre-check. Best effort only; the unique
        // constraint on the ledger catches the race this can miss.
        if self
            .ledger
            .find_for_user(user_id, sale_window_id)
            .await?
            .is_some()
        {
            return Err(reject(PurchaseError::DuplicatePurchase));
        }

        // Step 4: availability at the offset-adjusted instant.
        let availability = availability::evaluate(self.adjusted_now(), &window, quantity);
        if let Some(rejection) = PurchaseError::from_availability(availability) {
            return Err(reject(rejection));
        }

        // Step 5: the commit point. Everything above was side-effect-free.
        let Some(snapshot) = self.windows.decrement_stock(sale_window_id, quantity).await? else {
            return Err(reject(PurchaseError::StockExhausted));
        };

        // Step 6: record the grant at commit time (wall clock, unadjusted).
        let purchase = Purchase::new(user_id, sale_window_id, quantity, self.clock.now());
        match self.ledger.append(purchase.clone()).await {
            Ok(()) => {
                tracing::info!(
                    purchase_id = %purchase.id,
                    user_id = %user_id,
                    sale_window_id = %sale_window_id,
                    quantity = quantity,
                    remaining_units = snapshot.remaining_units,
                    "Purchase granted"
                );
                metrics::counter!("purchase.granted").increment(1);
                Ok(purchase)
            }
            Err(LedgerError::Duplicate) => {
                // The same user raced itself past the pre-check. The stock
                // decrement already committed, so flag for reconciliation
                // before reporting the duplicate.
                tracing::error!(
                    fault = "duplicate_after_decrement",
                    user_id = %user_id,
                    sale_window_id = %sale_window_id,
                    quantity = quantity,
                    "Duplicate purchase detected after stock decrement; units need reconciliation"
                );
                metrics::counter!("purchase.reconciliation_fault").increment(1);
                Err(reject(PurchaseError::DuplicatePurchase))
            }
            Err(LedgerError::Store(err)) => {
                // The unit was consumed but never recorded. This must not be
                // retried (it would double-charge) and must not look like a
                // routine failure to the caller.
                tracing::error!(
                    fault = "post_commit_ledger_append",
                    user_id = %user_id,
                    sale_window_id = %sale_window_id,
                    quantity = quantity,
                    error = %err,
                    "Stock decremented but ledger append failed; reconciliation required"
                );
                metrics::counter!("purchase.reconciliation_fault").increment(1);
                Err(PurchaseError::PostCommitFault {
                    sale_window_id,
                    user_id,
                    quantity,
                })
            }
        }
    }

    /// Create a sale window for a product.
    ///
    /// Validates the schedule and allocation, confirms the product exists and
    /// runs the overlap guard: no two windows for the same product may have
    /// intersecting periods (touching endpoints count). The guard is
    /// advisory read-then-write — window creation is an admin path with no
    /// contention to speak of.
    ///
    /// # Errors
    ///
    /// Any [`SaleWindowError`] variant.
    pub async fn create_sale_window(
        &self,
        product_id: ProductId,
        allocated_units: u32,
        sale_start: DateTime<Utc>,
        sale_end: DateTime<Utc>,
    ) -> Result<SaleWindow, SaleWindowError> {
        if allocated_units == 0 {
            return Err(SaleWindowError::InvalidAllocation);
        }
        if sale_start >= sale_end {
            return Err(SaleWindowError::InvalidSchedule);
        }
        if !self.catalog.exists(product_id).await? {
            return Err(SaleWindowError::ProductNotFound(product_id));
        }
        if self
            .windows
            .find_overlapping(product_id, sale_start, sale_end)
            .await?
            .is_some()
        {
            return Err(SaleWindowError::OverlappingWindow);
        }

        let window = SaleWindow::new(
            product_id,
            allocated_units,
            sale_start,
            sale_end,
            self.clock.now(),
        );
        self.windows.insert(window.clone()).await?;

        tracing::info!(
            sale_window_id = %window.id,
            product_id = %product_id,
            allocated_units = allocated_units,
            sale_start = %sale_start,
            sale_end = %sale_end,
            "Sale window created"
        );
        metrics::counter!("sale_window.created").increment(1);

        Ok(window)
    }

    /// Fetch a window by id.
    ///
    /// # Errors
    ///
    /// [`SaleWindowError::NotFound`] if the id is unknown, or a store error.
    pub async fn get_sale_window(&self, id: SaleWindowId) -> Result<SaleWindow, SaleWindowError> {
        self.windows
            .get(id)
            .await?
            .ok_or(SaleWindowError::NotFound(id))
    }

    /// Apply an admin schedule edit.
    ///
    /// Allocation and stock are untouchable; only the start/end instants may
    /// move, and the resulting schedule must still be well-formed.
    ///
    /// # Errors
    ///
    /// [`SaleWindowError::NotFound`], [`SaleWindowError::InvalidSchedule`]
    /// or a store error.
    pub async fn update_sale_window(
        &self,
        id: SaleWindowId,
        patch: SchedulePatch,
    ) -> Result<SaleWindow, SaleWindowError> {
        let current = self.get_sale_window(id).await?;
        let new_start = patch.sale_start.unwrap_or(current.sale_start);
        let new_end = patch.sale_end.unwrap_or(current.sale_end);
        if new_start >= new_end {
            return Err(SaleWindowError::InvalidSchedule);
        }

        self.windows
            .update_schedule(id, patch, self.clock.now())
            .await?
            .ok_or(SaleWindowError::NotFound(id))
    }

    /// Delete a window.
    ///
    /// Deleting a window with recorded purchases orphans the ledger's
    /// references; that is an operational concern left to the admin, not
    /// enforced here.
    ///
    /// # Errors
    ///
    /// [`SaleWindowError::NotFound`] if the id is unknown, or a store error.
    pub async fn delete_sale_window(&self, id: SaleWindowId) -> Result<(), SaleWindowError> {
        if self.windows.delete(id).await? {
            tracing::info!(sale_window_id = %id, "Sale window deleted");
            Ok(())
        } else {
            Err(SaleWindowError::NotFound(id))
        }
    }

    /// Windows currently inside their schedule at the offset-adjusted now,
    /// paginated (1-based `page`). Sold-out windows still appear; their
    /// derived state tells callers they cannot be purchased from.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn list_active_sale_windows(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SaleWindow>, StoreError> {
        self.windows
            .list_active(self.adjusted_now(), page, page_size)
            .await
    }
}

const fn rejection_reason(rejection: &PurchaseError) -> &'static str {
    match rejection {
        PurchaseError::InvalidQuantity { .. } => "invalid_quantity",
        PurchaseError::WindowNotFound(_) => "window_not_found",
        PurchaseError::DuplicatePurchase => "duplicate_purchase",
        PurchaseError::NotStarted => "not_started",
        PurchaseError::Ended => "ended",
        PurchaseError::ExceedsPerTransactionLimit => "exceeds_limit",
        PurchaseError::InsufficientStock => "insufficient_stock",
        PurchaseError::StockExhausted => "stock_exhausted",
        PurchaseError::PostCommitFault { .. } => "post_commit_fault",
        PurchaseError::Store(_) => "store_error",
    }
}

fn reject(rejection: PurchaseError) -> PurchaseError {
    metrics::counter!("purchase.rejected", "reason" => rejection_reason(&rejection)).increment(1);
    rejection
}
