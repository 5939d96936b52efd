//! Concurrency stress tests for the atomic decrement protocol.
//!
//! These tests verify that under heavy concurrent load the stock boundary
//! holds: each unit of stock is granted to at most one successful purchase,
//! and the conservation invariant survives the scramble.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)] // Test code may unwrap

use chrono::Duration;
use std::sync::Arc;
use surge_core::{ClockOffset, PurchaseError, types::UserId};
use surge_core::store::{ProductCatalog, PurchaseLedger, SaleWindowStore};
use surge_testing::{FixedClock, MemoryStores, fixtures};

/// 100 concurrent single-unit attempts against 10 units of stock.
///
/// Exactly 10 must succeed, 90 must be rejected on stock, and the window
/// must end drained with the ledger agreeing unit for unit.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn hundred_buyers_ten_units() {
    const ATTEMPTS: usize = 100;
    const STOCK: u32 = 10;

    let stores = MemoryStores::new();
    let clock = Arc::new(FixedClock::new(fixtures::t0() + Duration::minutes(5)));
    let engine = Arc::new(stores.engine(clock, ClockOffset::ZERO));

    let product = fixtures::product();
    stores.catalog.insert(product.clone()).await.expect("insert");
    let window = fixtures::one_hour_window(&product, STOCK);
    stores.windows.insert(window.clone()).await.expect("insert");

    let mut handles = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let engine = Arc::clone(&engine);
        let window_id = window.id;
        handles.push(tokio::spawn(async move {
            engine.purchase(UserId::new(), window_id, 1).await
        }));
    }

    let mut granted = 0_u32;
    let mut stock_rejections = 0_u32;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => granted += 1,
            Err(PurchaseError::InsufficientStock | PurchaseError::StockExhausted) => {
                stock_rejections += 1;
            }
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    assert_eq!(granted, STOCK);
    assert_eq!(stock_rejections, ATTEMPTS as u32 - STOCK);

    let snapshot = stores.windows.snapshot(window.id).expect("window exists");
    assert_eq!(snapshot.remaining_units, 0);
    assert_eq!(stores.ledger.units_recorded(window.id), u64::from(STOCK));
}

/// Concurrent multi-unit attempts never oversell past the boundary.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn mixed_quantities_never_oversell() {
    const STOCK: u32 = 17;

    let stores = MemoryStores::new();
    let clock = Arc::new(FixedClock::new(fixtures::t0() + Duration::minutes(5)));
    let engine = Arc::new(stores.engine(clock, ClockOffset::ZERO));

    let product = fixtures::product();
    stores.catalog.insert(product.clone()).await.expect("insert");
    let window = fixtures::one_hour_window(&product, STOCK);
    stores.windows.insert(window.clone()).await.expect("insert");

    let mut handles = Vec::new();
    for i in 0..40_u32 {
        let engine = Arc::clone(&engine);
        let window_id = window.id;
        let quantity = i % 5 + 1;
        handles.push(tokio::spawn(async move {
            engine.purchase(UserId::new(), window_id, quantity).await
        }));
    }

    let mut granted_units = 0_u64;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(purchase) => granted_units += u64::from(purchase.quantity),
            Err(PurchaseError::InsufficientStock | PurchaseError::StockExhausted) => {}
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    let snapshot = stores.windows.snapshot(window.id).expect("window exists");
    assert!(granted_units <= u64::from(STOCK));
    assert_eq!(
        u64::from(STOCK - snapshot.remaining_units),
        granted_units,
        "every decremented unit belongs to exactly one granted purchase"
    );
    assert_eq!(stores.ledger.units_recorded(window.id), granted_units);
}

/// The same user racing itself ends with a single ledger row.
///
/// The engine's pre-check can miss the race; the ledger's uniqueness
/// constraint is the enforcement point that must hold.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn same_user_race_yields_one_purchase() {
    let stores = MemoryStores::new();
    let clock = Arc::new(FixedClock::new(fixtures::t0() + Duration::minutes(5)));
    let engine = Arc::new(stores.engine(clock, ClockOffset::ZERO));

    let product = fixtures::product();
    stores.catalog.insert(product.clone()).await.expect("insert");
    let window = fixtures::one_hour_window(&product, 50);
    stores.windows.insert(window.clone()).await.expect("insert");

    let buyer = UserId::new();
    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = Arc::clone(&engine);
        let window_id = window.id;
        handles.push(tokio::spawn(async move {
            engine.purchase(buyer, window_id, 1).await
        }));
    }

    let mut granted = 0_u32;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => granted += 1,
            Err(PurchaseError::DuplicatePurchase) => {}
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    assert_eq!(granted, 1, "exactly one attempt may win");
    let row = stores
        .ledger
        .find_for_user(buyer, window.id)
        .await
        .expect("query")
        .expect("one recorded purchase");
    assert_eq!(row.user_id, buyer);
}
