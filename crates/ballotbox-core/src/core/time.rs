// crates/ballotbox-core/src/core/time.rs
// ============================================================================
// Module: Ballotbox Time Model
// Description: Canonical timestamp representation for poll and ballot records.
// Purpose: Provide a single unix-millisecond time value with a stable wire form.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Ballotbox records carry creation timestamps as unix epoch milliseconds.
//! Timestamps are informational; no ordering or monotonicity guarantee is
//! derived from them anywhere in the voting protocol.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch milliseconds wrapped for type safety.
///
/// # Invariants
/// - Values before the unix epoch clamp to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
