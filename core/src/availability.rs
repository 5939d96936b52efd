//! Availability evaluator: the pure gate in front of the atomic decrement.
//!
//! Given an injected "now", a sale window snapshot and a requested quantity,
//! [`evaluate`] decides whether the attempt may proceed. No side effects, no
//! implicit clock reads; identical inputs always yield identical outcomes.

use crate::types::SaleWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum units a single purchase may claim.
pub const MAX_PER_TRANSACTION: u32 = 5;

/// Outcome of an availability check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The attempt may proceed to the atomic decrement.
    Eligible,
    /// The window's start instant is still in the future.
    NotStarted,
    /// The window's end instant has passed.
    Ended,
    /// Requested quantity exceeds [`MAX_PER_TRANSACTION`].
    ExceedsPerTransactionLimit,
    /// The snapshot shows fewer units than requested. Advisory only: the
    /// authoritative check is the conditional decrement itself.
    InsufficientStock,
}

impl Availability {
    /// Whether this outcome allows the purchase to proceed.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Evaluate a purchase attempt against a sale window snapshot.
///
/// Gates are checked in a fixed order: schedule first, then the
/// per-transaction limit, then stock. The limit therefore rejects an
/// oversized request regardless of how much stock remains, but only once the
/// window is live.
///
/// `now` must already carry any configured [`crate::ClockOffset`]; the
/// evaluator itself never touches a clock.
#[must_use]
pub fn evaluate(now: DateTime<Utc>, window: &SaleWindow, quantity: u32) -> Availability {
    if now < window.sale_start {
        return Availability::NotStarted;
    }
    if now > window.sale_end {
        return Availability::Ended;
    }
    if quantity > MAX_PER_TRANSACTION {
        return Availability::ExceedsPerTransactionLimit;
    }
    if window.remaining_units < quantity {
        return Availability::InsufficientStock;
    }
    Availability::Eligible
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::types::ProductId;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn window(remaining: u32) -> SaleWindow {
        let mut w = SaleWindow::new(
            ProductId::new(),
            200,
            t0(),
            t0() + Duration::hours(1),
            t0() - Duration::days(1),
        );
        w.remaining_units = remaining;
        w
    }

    #[test]
    fn eligible_inside_window_with_stock() {
        let w = window(10);
        assert_eq!(
            evaluate(t0() + Duration::minutes(30), &w, 3),
            Availability::Eligible
        );
    }

    #[test]
    fn rejects_before_sale_start() {
        let w = window(10);
        assert_eq!(
            evaluate(t0() - Duration::minutes(1), &w, 1),
            Availability::NotStarted
        );
    }

    #[test]
    fn rejects_after_sale_end() {
        let w = window(10);
        assert_eq!(
            evaluate(t0() + Duration::minutes(61), &w, 1),
            Availability::Ended
        );
    }

    #[test]
    fn boundary_instants_are_inside_the_window() {
        let w = window(10);
        assert_eq!(evaluate(w.sale_start, &w, 1), Availability::Eligible);
        assert_eq!(evaluate(w.sale_end, &w, 1), Availability::Eligible);
    }

    #[test]
    fn limit_beats_stock_regardless_of_remaining() {
        // Plenty of stock: quantity 6 is still rejected on the limit.
        let w = window(200);
        assert_eq!(
            evaluate(t0() + Duration::minutes(5), &w, 6),
            Availability::ExceedsPerTransactionLimit
        );
        // No stock at all: the limit still wins the race to reject.
        let empty = window(0);
        assert_eq!(
            evaluate(t0() + Duration::minutes(5), &empty, 6),
            Availability::ExceedsPerTransactionLimit
        );
    }

    #[test]
    fn insufficient_stock_when_snapshot_is_short() {
        let w = window(2);
        assert_eq!(
            evaluate(t0() + Duration::minutes(5), &w, 3),
            Availability::InsufficientStock
        );
        assert_eq!(
            evaluate(t0() + Duration::minutes(5), &w, 2),
            Availability::Eligible
        );
    }

    proptest! {
        /// Purity: the same inputs always produce the same outcome.
        #[test]
        fn evaluation_is_deterministic(
            offset_mins in -120i64..240,
            remaining in 0u32..300,
            quantity in 0u32..10,
        ) {
            let w = window(remaining);
            let now = t0() + Duration::minutes(offset_mins);
            let first = evaluate(now, &w, quantity);
            let second = evaluate(now, &w, quantity);
            prop_assert_eq!(first, second);
        }

        /// An eligible outcome implies every gate actually passed.
        #[test]
        fn eligible_implies_all_gates_hold(
            offset_mins in -120i64..240,
            remaining in 0u32..300,
            quantity in 0u32..10,
        ) {
            let w = window(remaining);
            let now = t0() + Duration::minutes(offset_mins);
            if evaluate(now, &w, quantity).is_eligible() {
                prop_assert!(now >= w.sale_start);
                prop_assert!(now <= w.sale_end);
                prop_assert!(quantity <= MAX_PER_TRANSACTION);
                prop_assert!(w.remaining_units >= quantity);
            }
        }
    }
}
