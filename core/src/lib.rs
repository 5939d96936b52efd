//! # Surge Core
//!
//! Domain types and business rules for the Surge flash-sale backend.
//!
//! This crate holds the one subsystem with real concurrency hazards: the
//! flash-sale inventory and purchase engine. Everything around it (HTTP,
//! identity, catalog storage) is plumbing that lives in sibling crates and
//! reaches the domain only through the traits defined here.
//!
//! ## Core Concepts
//!
//! - **`SaleWindow`**: a time-boxed, per-product allocation of purchasable
//!   units. Its `remaining_units` counter is the only hot shared resource in
//!   the system.
//! - **Availability evaluator**: a pure function deciding whether a purchase
//!   attempt is eligible at a given instant. Time is always injected.
//! - **Atomic decrement**: the store-level conditional update that makes
//!   overselling impossible, even across server instances. The
//!   [`store::SaleWindowStore`] trait delegates atomicity to the backing
//!   store; callers never lock.
//! - **Purchase ledger**: append-only record of granted purchases, with
//!   `(user, sale window)` uniqueness enforced by the storage layer.
//!
//! ## Architecture Principles
//!
//! - Derived state only: a window's `Scheduled`/`Active`/`SoldOut`/`Ended`
//!   status is computed from timestamps and stock on every read, never
//!   persisted where it could drift.
//! - Typed outcomes: business-rule rejections are enum variants the HTTP
//!   shell maps to stable status codes; only infrastructure faults are
//!   opaque errors.

// Re-export commonly used types
pub use availability::{Availability, MAX_PER_TRANSACTION, evaluate};
pub use clock::{Clock, ClockOffset, SystemClock};
pub use engine::PurchaseEngine;
pub use error::{LedgerError, PurchaseError, SaleWindowError, StoreError};
pub use types::{
    PriceCents, Product, ProductId, ProductPatch, Purchase, PurchaseId, SaleState, SaleWindow,
    SaleWindowId, SchedulePatch, UserId,
};

pub mod availability;
pub mod clock;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;
