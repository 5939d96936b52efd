//! # Surge Testing
//!
//! Test doubles and fixtures for the Surge flash-sale backend.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic, manually advanced time
//! - In-memory implementations of the core store traits with the same
//!   atomicity semantics as the Postgres implementations
//! - Failure-injection knobs for exercising the fault paths
//!
//! ## Example
//!
//! ```ignore
//! use surge_testing::{fixtures, FixedClock, MemoryStores};
//!
//! #[tokio::test]
//! async fn sold_out_window_rejects() {
//!     let clock = Arc::new(FixedClock::new(fixtures::t0()));
//!     let stores = MemoryStores::new();
//!     let engine = stores.engine(clock.clone(), ClockOffset::ZERO);
//!     // ...
//! }
//! ```

pub mod fixtures;
pub mod mocks;

pub use mocks::{
    FixedClock, MemoryProductCatalog, MemoryPurchaseLedger, MemorySaleWindowStore, MemoryStores,
    test_clock,
};
