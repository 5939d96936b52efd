//! Shared fixtures for flash-sale tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use surge_core::types::{PriceCents, Product, SaleWindow};

/// Reference instant used across tests: 2025-01-01 00:00:00 UTC.
///
/// # Panics
///
/// Never in practice; the timestamp is a valid calendar date.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// A catalog product created a day before [`t0`].
#[must_use]
pub fn product() -> Product {
    Product::new(
        "Limited Edition Sneaker".to_string(),
        "Numbered drop, one colourway".to_string(),
        PriceCents::from_cents(18_900),
        t0() - Duration::days(1),
    )
}

/// A one-hour sale window opening at [`t0`] with `allocated` units.
#[must_use]
pub fn one_hour_window(product: &Product, allocated: u32) -> SaleWindow {
    SaleWindow::new(
        product.id,
        allocated,
        t0(),
        t0() + Duration::hours(1),
        t0() - Duration::days(1),
    )
}
