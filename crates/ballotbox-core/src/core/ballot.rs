// crates/ballotbox-core/src/core/ballot.rs
// ============================================================================
// Module: Ballotbox Ballot Record
// Description: The durable record of one user's vote on one poll.
// Purpose: Pair the voter with the chosen option for uniqueness enforcement.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A [`Ballot`] is created by the vote recorder on a cast attempt, never
//! mutated, and deleted only as a compensating action when the paired tally
//! increment fails (or when its poll is deleted). The ballot store's
//! uniqueness constraint on (`user_id`, `poll_id`) is the single source of
//! truth for the one-vote-per-user invariant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BallotId;
use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Ballot Record
// ============================================================================

/// The durable record of one user's vote on one poll.
///
/// # Invariants
/// - For a fixed `poll_id`, a `user_id` appears on at most one ballot.
/// - Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Ballot identifier.
    pub id: BallotId,
    /// Voting user.
    pub user_id: UserId,
    /// Target poll.
    pub poll_id: PollId,
    /// Chosen option.
    pub option_id: OptionId,
    /// Cast time.
    pub created_at: Timestamp,
}

impl Ballot {
    /// Creates a fresh ballot with a generated identifier and current time.
    #[must_use]
    pub fn new(user_id: UserId, poll_id: PollId, option_id: OptionId) -> Self {
        Self {
            id: BallotId::generate(),
            user_id,
            poll_id,
            option_id,
            created_at: Timestamp::now(),
        }
    }
}
