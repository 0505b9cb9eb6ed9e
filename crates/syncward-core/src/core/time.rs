// crates/syncward-core/src/core/time.rs
// ============================================================================
// Module: Syncward Time Model
// Description: Epoch-second timestamps and whole-day arithmetic.
// Purpose: Keep health evaluation deterministic by passing time explicitly.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Job records and evaluation requests carry explicit unix epoch seconds. The
//! core never reads wall-clock time directly; hosts supply `now` when they
//! invoke an engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch timestamp with second precision.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// Returns the timestamp as unix epoch seconds.
    #[must_use]
    pub const fn as_unix_seconds(self) -> i64 {
        self.0
    }

    /// Returns the timestamp `days` whole days earlier, saturating at the range bounds.
    #[must_use]
    pub fn minus_days(self, days: u32) -> Self {
        Self(self.0.saturating_sub(i64::from(days).saturating_mul(SECONDS_PER_DAY)))
    }

    /// Returns the whole days elapsed from `earlier` to `self`, rounded down.
    ///
    /// Partial days never count; negative spans floor toward negative infinity.
    #[must_use]
    pub const fn whole_days_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0).div_euclid(SECONDS_PER_DAY)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
