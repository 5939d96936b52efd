//! Domain types for the flash-sale backend.
//!
//! Value objects and entities shared by every crate in the workspace:
//! identifiers, the [`SaleWindow`] inventory record, the [`Purchase`] ledger
//! entry and the catalog [`Product`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a user (owned by the identity collaborator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a catalog product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a new random `ProductId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ProductId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a sale window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleWindowId(Uuid);

impl SaleWindowId {
    /// Creates a new random `SaleWindowId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `SaleWindowId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SaleWindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SaleWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a recorded purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseId(Uuid);

impl PurchaseId {
    /// Creates a new random `PurchaseId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PurchaseId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PurchaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Product price in cents, to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceCents(u64);

impl PriceCents {
    /// Creates a price from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a price from whole dollars, with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PriceCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Sale Window
// ============================================================================

/// Derived lifecycle state of a sale window.
///
/// Never stored: always computed from the schedule and the live stock count
/// so it cannot drift from the record it describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleState {
    /// The window's start time is still in the future.
    Scheduled,
    /// The window is live and has stock left.
    Active,
    /// The window is inside its schedule but every unit has been sold.
    /// Terminal for purchase purposes, equivalent to `Ended`.
    SoldOut,
    /// The window's end time has passed.
    Ended,
}

/// A time-boxed, per-product allocation of purchasable units.
///
/// `remaining_units` is the single contended field in the whole system. It is
/// initialized to `allocated_units` at creation and only ever moves downward,
/// exclusively through the store's atomic conditional decrement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleWindow {
    /// Window identifier
    pub id: SaleWindowId,
    /// The product on sale (catalog-owned reference)
    pub product_id: ProductId,
    /// Total units allocated to this window; immutable after creation
    pub allocated_units: u32,
    /// Units still unsold; `0 ..= allocated_units`, never increases
    pub remaining_units: u32,
    /// Instant the sale opens
    pub sale_start: DateTime<Utc>,
    /// Instant the sale closes
    pub sale_end: DateTime<Utc>,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last admin edit timestamp
    pub updated_at: DateTime<Utc>,
}

impl SaleWindow {
    /// Create a fresh window with full stock.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        allocated_units: u32,
        sale_start: DateTime<Utc>,
        sale_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SaleWindowId::new(),
            product_id,
            allocated_units,
            remaining_units: allocated_units,
            sale_start,
            sale_end,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive the lifecycle state at `now`.
    ///
    /// `now` is expected to already carry any configured clock offset; this
    /// method never reads a clock itself.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> SaleState {
        if now < self.sale_start {
            SaleState::Scheduled
        } else if now > self.sale_end {
            SaleState::Ended
        } else if self.remaining_units == 0 {
            SaleState::SoldOut
        } else {
            SaleState::Active
        }
    }

    /// Units already granted to purchasers.
    #[must_use]
    pub const fn sold_units(&self) -> u32 {
        self.allocated_units - self.remaining_units
    }
}

/// Admin edit to a sale window's schedule.
///
/// Allocation and remaining stock are deliberately absent: the allocation is
/// immutable and stock moves only through the atomic decrement.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct SchedulePatch {
    /// New start instant, if changing
    pub sale_start: Option<DateTime<Utc>>,
    /// New end instant, if changing
    pub sale_end: Option<DateTime<Utc>>,
}

impl SchedulePatch {
    /// True when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sale_start.is_none() && self.sale_end.is_none()
    }
}

// ============================================================================
// Purchase
// ============================================================================

/// A granted purchase: one per `(user, sale window)` pair, immutable once
/// recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase identifier
    pub id: PurchaseId,
    /// The buyer (identity-owned reference)
    pub user_id: UserId,
    /// The window the units came out of
    pub sale_window_id: SaleWindowId,
    /// Units granted; `1 ..= MAX_PER_TRANSACTION`
    pub quantity: u32,
    /// Commit instant of the atomic decrement; leaderboard ordering key
    pub purchase_time: DateTime<Utc>,
}

impl Purchase {
    /// Record a new purchase at `purchase_time`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        sale_window_id: SaleWindowId,
        quantity: u32,
        purchase_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PurchaseId::new(),
            user_id,
            sale_window_id,
            quantity,
            purchase_time,
        }
    }
}

// ============================================================================
// Product (catalog collaborator)
// ============================================================================

/// A catalog product. The purchase engine only ever checks existence; the
/// full record is carried for the CRUD surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Description shown on listings
    pub description: String,
    /// Unit price
    pub price: PriceCents,
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new catalog product.
    #[must_use]
    pub fn new(name: String, description: String, price: PriceCents, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            name,
            description,
            price,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin edit to a catalog product.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductPatch {
    /// New name, if changing
    pub name: Option<String>,
    /// New description, if changing
    pub description: Option<String>,
    /// New price, if changing
    pub price: Option<PriceCents>,
}
