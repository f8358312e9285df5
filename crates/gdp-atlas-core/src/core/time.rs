// crates/gdp-atlas-core/src/core/time.rs
// ============================================================================
// Module: GDP Atlas Time Model
// Description: UTC timestamp helpers for refresh cycles and storage.
// Purpose: Keep one wire format (RFC 3339) and one storage format (unix millis).
// Dependencies: time
// ============================================================================

//! ## Overview
//! Every timestamp in GDP Atlas is UTC. The wire format is RFC 3339 via serde
//! attributes on the record types; stores persist unix epoch milliseconds.
//! These helpers are the only conversion points between the two.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Returns the current UTC time.
#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Converts a timestamp to unix epoch milliseconds.
///
/// Saturates at `i64::MAX`, which is unreachable for wall-clock values.
#[must_use]
pub fn to_unix_millis(timestamp: OffsetDateTime) -> i64 {
    i64::try_from(timestamp.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

/// Converts unix epoch milliseconds back to a UTC timestamp.
///
/// Returns `None` for values outside the representable range.
#[must_use]
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
