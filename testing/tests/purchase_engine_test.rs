//! Purchase engine scenarios against the in-memory stores.
//!
//! Covers the gate sequencing, the overlap guard, the clock-offset policy
//! and both fault paths (pre-commit retry, post-commit reconciliation).

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code may unwrap

use chrono::Duration;
use std::sync::Arc;
use surge_core::{
    Clock, ClockOffset, PurchaseEngine, PurchaseError, SaleState, SaleWindowError, StoreError,
    types::{SaleWindow, SchedulePatch, UserId},
};
use surge_core::store::{ProductCatalog, PurchaseLedger, SaleWindowStore};
use surge_testing::{FixedClock, MemoryStores, fixtures};

struct Harness {
    stores: MemoryStores,
    clock: Arc<FixedClock>,
    engine: PurchaseEngine,
}

fn harness(offset: ClockOffset) -> Harness {
    let stores = MemoryStores::new();
    let clock = Arc::new(FixedClock::new(fixtures::t0()));
    let engine = stores.engine(clock.clone(), offset);
    Harness {
        stores,
        clock,
        engine,
    }
}

/// Seed a product and a one-hour window opening at `t0` with `allocated`
/// units, bypassing the engine so tests control the schedule exactly.
async fn seed_window(h: &Harness, allocated: u32) -> SaleWindow {
    let product = fixtures::product();
    h.stores
        .catalog
        .insert(product.clone())
        .await
        .expect("catalog insert");
    let window = fixtures::one_hour_window(&product, allocated);
    h.stores
        .windows
        .insert(window.clone())
        .await
        .expect("window insert");
    window
}

#[tokio::test]
async fn single_unit_window_sells_out() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 1).await;

    h.clock.set(fixtures::t0() + Duration::minutes(30));
    let purchase = h
        .engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect("first buyer should win the unit");
    assert_eq!(purchase.quantity, 1);
    assert_eq!(purchase.sale_window_id, window.id);

    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 0);
    assert_eq!(snapshot.state(h.clock.now()), SaleState::SoldOut);

    // A different buyer a minute later sees the empty shelf.
    h.clock.set(fixtures::t0() + Duration::minutes(31));
    let err = h
        .engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect_err("sold-out window must reject");
    assert_eq!(err, PurchaseError::InsufficientStock);
}

#[tokio::test]
async fn purchase_before_start_is_not_started() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 5).await;

    h.clock.set(fixtures::t0() - Duration::minutes(1));
    let err = h
        .engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect_err("sale has not opened");
    assert_eq!(err, PurchaseError::NotStarted);
}

#[tokio::test]
async fn purchase_after_end_is_ended() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 5).await;

    h.clock.set(fixtures::t0() + Duration::minutes(61));
    let err = h
        .engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect_err("sale is over");
    assert_eq!(err, PurchaseError::Ended);
}

#[tokio::test]
async fn oversized_quantity_rejected_regardless_of_stock() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 200).await;

    h.clock.set(fixtures::t0() + Duration::minutes(5));
    let err = h
        .engine
        .purchase(UserId::new(), window.id, 6)
        .await
        .expect_err("over the per-transaction limit");
    assert_eq!(err, PurchaseError::ExceedsPerTransactionLimit);

    // Stock untouched by the rejection.
    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 200);
}

#[tokio::test]
async fn zero_quantity_is_a_validation_error() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 5).await;

    h.clock.set(fixtures::t0() + Duration::minutes(5));
    let err = h
        .engine
        .purchase(UserId::new(), window.id, 0)
        .await
        .expect_err("zero quantity is malformed");
    assert_eq!(err, PurchaseError::InvalidQuantity { quantity: 0 });
}

#[tokio::test]
async fn unknown_window_is_not_found() {
    let h = harness(ClockOffset::ZERO);
    let ghost = surge_core::SaleWindowId::new();
    let err = h
        .engine
        .purchase(UserId::new(), ghost, 1)
        .await
        .expect_err("no such window");
    assert_eq!(err, PurchaseError::WindowNotFound(ghost));
}

#[tokio::test]
async fn same_user_cannot_purchase_twice() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 10).await;
    let buyer = UserId::new();

    h.clock.set(fixtures::t0() + Duration::minutes(10));
    h.engine
        .purchase(buyer, window.id, 2)
        .await
        .expect("first purchase succeeds");

    let err = h
        .engine
        .purchase(buyer, window.id, 1)
        .await
        .expect_err("one purchase per user per window");
    assert_eq!(err, PurchaseError::DuplicatePurchase);

    // Only the first purchase consumed stock.
    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 8);
}

#[tokio::test]
async fn allocation_minus_remaining_equals_recorded_units() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 50).await;

    h.clock.set(fixtures::t0() + Duration::minutes(1));
    for quantity in [1_u32, 2, 3, 4, 5] {
        h.engine
            .purchase(UserId::new(), window.id, quantity)
            .await
            .expect("purchase succeeds");
    }

    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(
        u64::from(snapshot.allocated_units - snapshot.remaining_units),
        h.stores.ledger.units_recorded(window.id)
    );
    assert_eq!(snapshot.remaining_units, 35);
}

#[tokio::test]
async fn clock_offset_shifts_the_evaluation_instant() {
    // Window opens 30 minutes from the raw clock. With the historical
    // one-hour compensation the adjusted instant is already inside.
    let h = harness(ClockOffset::from_minutes(60));
    let product = fixtures::product();
    h.stores.catalog.insert(product.clone()).await.expect("insert");
    let window = SaleWindow::new(
        product.id,
        5,
        fixtures::t0() + Duration::minutes(30),
        fixtures::t0() + Duration::minutes(90),
        fixtures::t0() - Duration::days(1),
    );
    h.stores.windows.insert(window.clone()).await.expect("insert");

    h.engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect("offset-adjusted now is inside the window");

    // Without compensation the same attempt is early.
    let bare = harness(ClockOffset::ZERO);
    bare.stores.catalog.insert(product.clone()).await.expect("insert");
    bare.stores.windows.insert(window.clone()).await.expect("insert");
    let err = bare
        .engine
        .purchase(UserId::new(), window.id, 1)
        .await
        .expect_err("raw now precedes sale_start");
    assert_eq!(err, PurchaseError::NotStarted);
}

#[tokio::test]
async fn transient_fault_before_commit_is_retryable() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 3).await;
    let buyer = UserId::new();

    h.clock.set(fixtures::t0() + Duration::minutes(5));
    h.stores.windows.fail_next_get();

    let err = h
        .engine
        .purchase(buyer, window.id, 1)
        .await
        .expect_err("injected store fault");
    assert_eq!(err, PurchaseError::Store(StoreError::Unavailable));

    // Nothing committed: the retry behaves exactly like a first attempt.
    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 3);
    assert_eq!(h.stores.ledger.units_recorded(window.id), 0);

    h.engine
        .purchase(buyer, window.id, 1)
        .await
        .expect("retry succeeds with current state");
    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 2);
    assert_eq!(h.stores.ledger.units_recorded(window.id), 1);
}

#[tokio::test]
async fn ledger_failure_after_decrement_is_a_reconciliation_fault() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 3).await;
    let buyer = UserId::new();

    h.clock.set(fixtures::t0() + Duration::minutes(5));
    h.stores.ledger.set_fail_appends(true);

    let err = h
        .engine
        .purchase(buyer, window.id, 2)
        .await
        .expect_err("append fails after the commit point");
    assert_eq!(
        err,
        PurchaseError::PostCommitFault {
            sale_window_id: window.id,
            user_id: buyer,
            quantity: 2,
        }
    );

    // The unit was genuinely consumed, and no ledger row exists: exactly the
    // state an operator has to reconcile.
    let snapshot = h.stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 1);
    assert_eq!(h.stores.ledger.units_recorded(window.id), 0);
}

// ============================================================================
// Sale window lifecycle
// ============================================================================

#[tokio::test]
async fn create_sale_window_initializes_full_stock() {
    let h = harness(ClockOffset::ZERO);
    let product = fixtures::product();
    h.stores.catalog.insert(product.clone()).await.expect("insert");

    let window = h
        .engine
        .create_sale_window(
            product.id,
            200,
            fixtures::t0(),
            fixtures::t0() + Duration::hours(1),
        )
        .await
        .expect("creation succeeds");
    assert_eq!(window.allocated_units, 200);
    assert_eq!(window.remaining_units, 200);
    assert_eq!(window.state(fixtures::t0() - Duration::hours(1)), SaleState::Scheduled);
}

#[tokio::test]
async fn create_sale_window_rejects_unknown_product() {
    let h = harness(ClockOffset::ZERO);
    let ghost = surge_core::ProductId::new();
    let err = h
        .engine
        .create_sale_window(ghost, 10, fixtures::t0(), fixtures::t0() + Duration::hours(1))
        .await
        .expect_err("product does not exist");
    assert_eq!(err, SaleWindowError::ProductNotFound(ghost));
}

#[tokio::test]
async fn create_sale_window_rejects_bad_inputs() {
    let h = harness(ClockOffset::ZERO);
    let product = fixtures::product();
    h.stores.catalog.insert(product.clone()).await.expect("insert");

    let err = h
        .engine
        .create_sale_window(product.id, 0, fixtures::t0(), fixtures::t0() + Duration::hours(1))
        .await
        .expect_err("zero allocation");
    assert_eq!(err, SaleWindowError::InvalidAllocation);

    let err = h
        .engine
        .create_sale_window(product.id, 10, fixtures::t0() + Duration::hours(1), fixtures::t0())
        .await
        .expect_err("inverted schedule");
    assert_eq!(err, SaleWindowError::InvalidSchedule);
}

#[tokio::test]
async fn overlapping_windows_for_same_product_are_rejected() {
    let h = harness(ClockOffset::ZERO);
    let product = fixtures::product();
    h.stores.catalog.insert(product.clone()).await.expect("insert");

    let t0 = fixtures::t0();
    let t1 = t0 + Duration::hours(1);
    h.engine
        .create_sale_window(product.id, 10, t0 + Duration::minutes(10), t1 + Duration::minutes(10))
        .await
        .expect("first window");

    // Overlapping period for the same product.
    let err = h
        .engine
        .create_sale_window(product.id, 10, t0, t1)
        .await
        .expect_err("periods intersect");
    assert_eq!(err, SaleWindowError::OverlappingWindow);

    // Touching endpoints count as overlap.
    let err = h
        .engine
        .create_sale_window(
            product.id,
            10,
            t1 + Duration::minutes(10),
            t1 + Duration::hours(1),
        )
        .await
        .expect_err("endpoint touches the existing window");
    assert_eq!(err, SaleWindowError::OverlappingWindow);

    // Disjoint period is fine.
    h.engine
        .create_sale_window(
            product.id,
            10,
            t1 + Duration::minutes(11),
            t1 + Duration::hours(2),
        )
        .await
        .expect("disjoint window");

    // Same period for a different product is fine.
    let other = fixtures::product();
    h.stores.catalog.insert(other.clone()).await.expect("insert");
    h.engine
        .create_sale_window(other.id, 10, t0, t1)
        .await
        .expect("different product may overlap in time");
}

#[tokio::test]
async fn schedule_updates_validate_and_preserve_stock() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 10).await;

    let updated = h
        .engine
        .update_sale_window(
            window.id,
            SchedulePatch {
                sale_end: Some(window.sale_end + Duration::hours(1)),
                ..SchedulePatch::default()
            },
        )
        .await
        .expect("extending the window is valid");
    assert_eq!(updated.sale_end, window.sale_end + Duration::hours(1));
    assert_eq!(updated.allocated_units, 10);
    assert_eq!(updated.remaining_units, 10);

    let err = h
        .engine
        .update_sale_window(
            window.id,
            SchedulePatch {
                sale_start: Some(window.sale_end + Duration::hours(2)),
                ..SchedulePatch::default()
            },
        )
        .await
        .expect_err("start after end");
    assert_eq!(err, SaleWindowError::InvalidSchedule);
}

#[tokio::test]
async fn delete_sale_window_is_not_found_twice() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 10).await;

    h.engine.delete_sale_window(window.id).await.expect("first delete");
    let err = h
        .engine
        .delete_sale_window(window.id)
        .await
        .expect_err("already gone");
    assert_eq!(err, SaleWindowError::NotFound(window.id));
}

#[tokio::test]
async fn list_active_pages_are_restartable_and_include_sold_out() {
    let h = harness(ClockOffset::ZERO);
    let t0 = fixtures::t0();

    // Three live windows (one sold out), one scheduled, one ended.
    for (start_offset, end_offset, remaining) in [
        (-30_i64, 30_i64, 5_u32),
        (-20, 40, 0),
        (-10, 50, 3),
        (60, 120, 5),
        (-120, -60, 5),
    ] {
        let product = fixtures::product();
        h.stores.catalog.insert(product.clone()).await.expect("insert");
        let mut window = SaleWindow::new(
            product.id,
            5,
            t0 + Duration::minutes(start_offset),
            t0 + Duration::minutes(end_offset),
            t0 - Duration::days(1),
        );
        window.remaining_units = remaining;
        h.stores.windows.insert(window).await.expect("insert");
    }

    let page1 = h
        .engine
        .list_active_sale_windows(1, 2)
        .await
        .expect("first page");
    let page2 = h
        .engine
        .list_active_sale_windows(2, 2)
        .await
        .expect("second page");
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 1);

    // Sold-out window is still listed; its derived state says it all.
    let all: Vec<_> = page1.iter().chain(page2.iter()).collect();
    assert!(all.iter().any(|w| w.state(t0) == SaleState::SoldOut));
    assert!(all.iter().all(|w| w.sale_start <= t0 && w.sale_end >= t0));

    // Restartable: refetching a page yields the same slice.
    let page1_again = h
        .engine
        .list_active_sale_windows(1, 2)
        .await
        .expect("refetch");
    assert_eq!(page1, page1_again);
}

#[tokio::test]
async fn leaderboard_orders_by_purchase_time_ascending() {
    let h = harness(ClockOffset::ZERO);
    let window = seed_window(&h, 10).await;

    for minutes in [30_i64, 5, 20] {
        h.clock.set(fixtures::t0() + Duration::minutes(minutes));
        h.engine
            .purchase(UserId::new(), window.id, 1)
            .await
            .expect("purchase succeeds");
    }

    let board = h.stores.ledger.leaderboard().await.expect("leaderboard");
    let times: Vec<_> = board.iter().map(|p| p.purchase_time).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);
    assert_eq!(board.len(), 3);
}
