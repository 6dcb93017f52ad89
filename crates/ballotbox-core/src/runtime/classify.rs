// crates/ballotbox-core/src/runtime/classify.rs
// ============================================================================
// Module: Conflict Classifier
// Description: Maps store failures into the vote recorder's error taxonomy.
// Purpose: Keep raw store error vocabulary below a single classification boundary.
// Dependencies: crate::{interfaces, runtime::recorder}
// ============================================================================

//! ## Overview
//! Store-level errors are classified exactly once, here, into the
//! [`VoteError`] taxonomy. Nothing above the vote recorder inspects store
//! error enums, and nothing above the store crates inspects raw backend
//! error codes. The mapping is total: every store failure lands in exactly
//! one taxonomy variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::BallotStoreError;
use crate::interfaces::TallyStoreError;
use crate::interfaces::VoteStoreError;
use crate::runtime::recorder::VoteError;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a ballot store failure.
///
/// A uniqueness-constraint violation is a correctness signal, not a fault:
/// the user already voted.
#[must_use]
pub fn classify_ballot_error(error: BallotStoreError) -> VoteError {
    match error {
        BallotStoreError::Duplicate { .. } => VoteError::DuplicateVote,
        BallotStoreError::Unavailable(message) | BallotStoreError::Invalid(message) => {
            VoteError::Transient(message)
        }
    }
}

/// Classifies a tally store failure.
///
/// A missing poll and a stale/forged option id are deliberately collapsed
/// into one not-found outcome; the caller's remedy is the same.
#[must_use]
pub fn classify_tally_error(error: TallyStoreError) -> VoteError {
    match error {
        TallyStoreError::NotFound(_) | TallyStoreError::OptionNotFound { .. } => {
            VoteError::PollOrOptionNotFound
        }
        TallyStoreError::Unavailable(message) | TallyStoreError::Invalid(message) => {
            VoteError::Transient(message)
        }
    }
}

/// Classifies a combined failure from the atomic cast path.
#[must_use]
pub fn classify_cast_error(error: VoteStoreError) -> VoteError {
    match error {
        VoteStoreError::Ballot(inner) => classify_ballot_error(inner),
        VoteStoreError::Tally(inner) => classify_tally_error(inner),
        VoteStoreError::TransactionsUnsupported => {
            VoteError::Transient("store does not support atomic cast transactions".to_string())
        }
    }
}
