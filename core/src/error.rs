//! Error taxonomy for the flash-sale domain.
//!
//! Three tiers, kept apart so the HTTP shell can map them to stable status
//! codes:
//!
//! - business-rule rejections: deterministic, safe to show to the end user
//!   verbatim, never retried automatically;
//! - infrastructure faults ([`StoreError`]): the whole attempt is safely
//!   retryable from the top, nothing committed;
//! - post-commit durability faults: the decrement committed but the ledger
//!   append did not. Never presented as an ordinary failure, logged for
//!   operator reconciliation.

use crate::availability::Availability;
use crate::types::{ProductId, SaleWindowId, UserId};
use thiserror::Error;

/// Infrastructure-level store failure.
///
/// Always retryable by the caller: a `StoreError` is only returned before the
/// atomic decrement commits, so nothing has been consumed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// The store is temporarily unreachable.
    #[error("store unavailable")]
    Unavailable,
}

/// Failure appending to the purchase ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The `(user, sale window)` uniqueness constraint fired: a concurrent
    /// request for the same pair won the race.
    #[error("purchase already recorded for this user and sale window")]
    Duplicate,

    /// Infrastructure failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a rejected or failed purchase attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PurchaseError {
    /// Quantity outside `1..=MAX_PER_TRANSACTION` caught before any store
    /// access.
    #[error("quantity must be between 1 and the per-transaction limit, got {quantity}")]
    InvalidQuantity {
        /// The rejected quantity.
        quantity: u32,
    },

    /// No sale window with this id.
    #[error("sale window not found: {0}")]
    WindowNotFound(SaleWindowId),

    /// The user already holds a purchase in this window.
    #[error("user has already purchased in this sale window")]
    DuplicatePurchase,

    /// The sale has not started yet.
    #[error("flash sale has not started yet")]
    NotStarted,

    /// The sale is over.
    #[error("flash sale has ended")]
    Ended,

    /// More units requested than one transaction may claim.
    #[error("cannot purchase more than {} units per transaction", crate::MAX_PER_TRANSACTION)]
    ExceedsPerTransactionLimit,

    /// The availability snapshot showed fewer units than requested.
    #[error("insufficient stock available")]
    InsufficientStock,

    /// The conditional decrement failed at commit time: concurrent callers
    /// consumed the stock between the availability check and the commit.
    /// Distinct from [`Self::InsufficientStock`] so operators can see races.
    #[error("stock exhausted by concurrent purchases")]
    StockExhausted,

    /// The decrement committed but the ledger append failed. The unit was
    /// consumed; this must reach operators for reconciliation, not the
    /// buyer as a routine rejection.
    #[error("purchase committed but not recorded; reconciliation required")]
    PostCommitFault {
        /// Window whose stock was decremented.
        sale_window_id: SaleWindowId,
        /// Buyer the missing ledger row belongs to.
        user_id: UserId,
        /// Units consumed by the unrecorded purchase.
        quantity: u32,
    },

    /// Pre-commit infrastructure failure; the whole attempt is retryable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PurchaseError {
    /// Map a non-eligible availability outcome onto its rejection.
    ///
    /// Returns `None` for [`Availability::Eligible`].
    #[must_use]
    pub const fn from_availability(availability: Availability) -> Option<Self> {
        match availability {
            Availability::Eligible => None,
            Availability::NotStarted => Some(Self::NotStarted),
            Availability::Ended => Some(Self::Ended),
            Availability::ExceedsPerTransactionLimit => Some(Self::ExceedsPerTransactionLimit),
            Availability::InsufficientStock => Some(Self::InsufficientStock),
        }
    }

    /// Whether this is a deterministic business-rule rejection, safe to show
    /// to the end user verbatim.
    #[must_use]
    pub const fn is_business_rejection(&self) -> bool {
        !matches!(self, Self::PostCommitFault { .. } | Self::Store(_))
    }
}

/// Failure creating or administering a sale window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaleWindowError {
    /// The referenced product does not exist in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Another window for the same product overlaps the requested period.
    #[error("a sale window for this product already exists during the specified time period")]
    OverlappingWindow,

    /// `sale_start` is not strictly before `sale_end`.
    #[error("sale start must be before sale end")]
    InvalidSchedule,

    /// Allocation of zero units.
    #[error("allocated units must be at least 1")]
    InvalidAllocation,

    /// No sale window with this id.
    #[error("sale window not found: {0}")]
    NotFound(SaleWindowId),

    /// Infrastructure failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
