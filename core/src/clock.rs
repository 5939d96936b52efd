//! Injected time source.
//!
//! The availability evaluator is pure: it never reads a clock. Anything that
//! needs "now" receives it from a [`Clock`], which keeps every time-dependent
//! rule testable with a fixed instant.

use chrono::{DateTime, Duration, Utc};

/// Time source abstraction.
///
/// Production code uses [`SystemClock`]; tests inject a fixed clock from the
/// testing crate.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Named clock-skew compensation applied before availability checks.
///
/// The system this backend replaces shifted "now" forward by one hour before
/// comparing against stored sale schedules, apparently papering over a
/// timezone mismatch between the evaluation clock and the stored timestamps.
/// The shift is carried forward, but as an explicit configurable value
/// instead of a silent adjustment. Deployments with consistent UTC handling
/// should run with an offset of zero; confirm the real timezone semantics
/// before relying on the historical 60 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset(Duration);

impl ClockOffset {
    /// No compensation.
    pub const ZERO: Self = Self(Duration::zero());

    /// Offset of `minutes` (may be negative).
    #[must_use]
    pub const fn from_minutes(minutes: i64) -> Self {
        Self(Duration::minutes(minutes))
    }

    /// Apply the offset to an instant.
    #[must_use]
    pub fn adjust(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.0
    }

    /// The raw offset duration.
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for ClockOffset {
    fn default() -> Self {
        Self::ZERO
    }
}
