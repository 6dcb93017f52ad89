// crates/ballotbox-core/src/core/poll.rs
// ============================================================================
// Module: Ballotbox Poll Records
// Description: Poll and option records plus creation/update payloads.
// Purpose: Capture the tally document mutated by the vote recorder.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A [`Poll`] holds an ordered sequence of [`PollOption`] entries, each with
//! a non-negative vote counter. The poll row is the only resource mutated by
//! more than one voter concurrently, and it is mutated exclusively through
//! the store's atomic increment, never read-modify-written.
//!
//! Invariants:
//! - A poll has at least [`MIN_POLL_OPTIONS`] options at all times.
//! - Option identity is stable once assigned; edits that replace the option
//!   set are only legal while the poll has zero recorded votes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum number of options a poll must carry after creation.
pub const MIN_POLL_OPTIONS: usize = 2;

// ============================================================================
// SECTION: Poll Records
// ============================================================================

/// One selectable option with its running tally.
///
/// # Invariants
/// - `vote_count` is non-negative and only changes via atomic increments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Stable option identifier.
    pub id: OptionId,
    /// Display text for the option.
    pub text: String,
    /// Number of ballots cast for this option.
    pub vote_count: u64,
}

impl PollOption {
    /// Creates a fresh option with a zero tally and a generated identifier.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: OptionId::generate(),
            text: text.into(),
            vote_count: 0,
        }
    }
}

/// A poll document with its ordered options and ownership metadata.
///
/// # Invariants
/// - `options` holds at least [`MIN_POLL_OPTIONS`] entries.
/// - Only `created_by` may edit or delete the poll, and only while
///   [`Poll::total_votes`] is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Poll identifier.
    pub id: PollId,
    /// Poll title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Ordered options with their tallies.
    pub options: Vec<PollOption>,
    /// Owning user.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: Timestamp,
}

impl Poll {
    /// Returns the sum of all option tallies.
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|option| option.vote_count).sum()
    }

    /// Returns the option matching `option_id`, if present.
    #[must_use]
    pub fn option(&self, option_id: &OptionId) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == *option_id)
    }

    /// Returns whether the poll carries the given option.
    #[must_use]
    pub fn has_option(&self, option_id: &OptionId) -> bool {
        self.option(option_id).is_some()
    }
}

// ============================================================================
// SECTION: Creation And Update Payloads
// ============================================================================

/// Payload for creating a poll.
///
/// # Invariants
/// - `options` entries are trimmed, non-empty texts; validation happens in
///   the lifecycle module before any store write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDraft {
    /// Poll title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Option texts in display order.
    pub options: Vec<String>,
}

/// Payload for editing a poll before voting has started.
///
/// # Invariants
/// - `None` fields leave the current value unchanged.
/// - A `Some(options)` replacement resets all tallies to zero and mints
///   fresh option identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollUpdate {
    /// Replacement title, when present.
    pub title: Option<String>,
    /// Replacement description, when present.
    pub description: Option<Option<String>>,
    /// Replacement option texts, when present.
    pub options: Option<Vec<String>>,
}
