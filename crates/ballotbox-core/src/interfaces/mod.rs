// crates/ballotbox-core/src/interfaces/mod.rs
// ============================================================================
// Module: Ballotbox Store Interfaces
// Description: Backend-agnostic interfaces for ballot and poll persistence.
// Purpose: Define the contract surfaces used by the vote recorder.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Ballotbox integrates with storage backends without
//! embedding backend-specific details. Implementations must enforce the
//! ballot uniqueness constraint atomically at insert time and perform tally
//! increments as atomic single-row operations. Raw backend error vocabulary
//! never crosses these boundaries; implementations translate it into the
//! error enums defined here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ballot::Ballot;
use crate::core::identifiers::BallotId;
use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::poll::Poll;

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Storage capabilities advertised at startup.
///
/// # Invariants
/// - Capabilities are fixed for the lifetime of a store handle; strategy
///   selection never re-inspects live connection topology per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCapabilities {
    /// Whether the backend supports atomic multi-statement transactions
    /// spanning the ballot and poll tables.
    pub transactions: bool,
}

// ============================================================================
// SECTION: Ballot Store
// ============================================================================

/// Ballot store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BallotStoreError {
    /// A ballot already exists for the (user, poll) pair.
    #[error("duplicate ballot for user {user_id} on poll {poll_id}")]
    Duplicate {
        /// Voting user.
        user_id: UserId,
        /// Target poll.
        poll_id: PollId,
    },
    /// The store is unavailable or the operation failed transiently.
    #[error("ballot store unavailable: {0}")]
    Unavailable(String),
    /// Stored ballot data is invalid.
    #[error("ballot store invalid data: {0}")]
    Invalid(String),
}

/// Durable table of cast votes.
///
/// The uniqueness constraint on (`user_id`, `poll_id`) is the single source
/// of truth for the one-vote-per-user invariant. It must be evaluated
/// atomically at insert time; implementations must not substitute a prior
/// existence check.
pub trait BallotStore: Send + Sync {
    /// Inserts a ballot, failing on a duplicate (user, poll) pair.
    ///
    /// # Errors
    ///
    /// Returns [`BallotStoreError::Duplicate`] when a ballot already exists
    /// for the pair, and other variants on store failure.
    fn insert_ballot(&self, ballot: &Ballot) -> Result<(), BallotStoreError>;

    /// Best-effort compensating removal. Returns whether a row was removed;
    /// an already-absent row is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BallotStoreError`] when the store cannot execute the delete.
    fn delete_ballot(&self, ballot_id: &BallotId) -> Result<bool, BallotStoreError>;

    /// Returns the ballot a user has cast on a poll, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BallotStoreError`] when the lookup fails.
    fn find_ballot(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<Option<Ballot>, BallotStoreError>;

    /// Counts ballots recorded for a poll. Audit/recovery path, not the hot
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`BallotStoreError`] when the count fails.
    fn count_ballots(&self, poll_id: &PollId) -> Result<u64, BallotStoreError>;

    /// Removes all ballots referencing a poll; used by poll-deletion cascade.
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`BallotStoreError`] when the cascade delete fails.
    fn delete_ballots_for_poll(&self, poll_id: &PollId) -> Result<u64, BallotStoreError>;
}

// ============================================================================
// SECTION: Poll Tally Store
// ============================================================================

/// Poll tally store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TallyStoreError {
    /// The poll does not exist.
    #[error("poll not found: {0}")]
    NotFound(PollId),
    /// The poll does not exist or the option is not among its current
    /// options (covers concurrent deletion and stale/forged option ids).
    #[error("option {option_id} not found on poll {poll_id}")]
    OptionNotFound {
        /// Target poll.
        poll_id: PollId,
        /// Requested option.
        option_id: OptionId,
    },
    /// The store is unavailable or the operation failed transiently.
    #[error("poll store unavailable: {0}")]
    Unavailable(String),
    /// Stored poll data is invalid.
    #[error("poll store invalid data: {0}")]
    Invalid(String),
}

/// One page of polls, newest first.
///
/// # Invariants
/// - `items.len() <= limit` for the requested limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPage {
    /// Polls on this page.
    pub items: Vec<Poll>,
    /// 1-based page number served.
    pub page: u64,
    /// Page size served.
    pub limit: u64,
}

/// Durable record per poll holding ordered options and per-option counters.
pub trait PollStore: Send + Sync {
    /// Persists a new poll.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError`] when the write fails.
    fn create_poll(&self, poll: &Poll) -> Result<(), TallyStoreError>;

    /// Loads a poll by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError::NotFound`] when the poll does not exist.
    fn get_poll(&self, poll_id: &PollId) -> Result<Poll, TallyStoreError>;

    /// Atomically increments the matching option's count by exactly 1 and
    /// returns the poll's new state.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError::OptionNotFound`] when the poll is missing
    /// or the option is not among its current options.
    fn increment_option(
        &self,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, TallyStoreError>;

    /// Replaces a poll's mutable fields; callers must have applied the
    /// lifecycle guard first.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError::NotFound`] when the poll does not exist.
    fn update_poll(&self, poll: &Poll) -> Result<(), TallyStoreError>;

    /// Deletes a poll. Ballot cascade is the caller's responsibility.
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError`] when the delete fails.
    fn delete_poll(&self, poll_id: &PollId) -> Result<bool, TallyStoreError>;

    /// Lists polls newest-first with 1-based pagination.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError`] when the query fails.
    fn list_polls(&self, page: u64, limit: u64) -> Result<PollPage, TallyStoreError>;

    /// Lists polls owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TallyStoreError`] when the query fails.
    fn list_polls_by_owner(&self, owner: &UserId) -> Result<Vec<Poll>, TallyStoreError>;
}

// ============================================================================
// SECTION: Vote Store
// ============================================================================

/// Combined vote store errors for the atomic cast path.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum VoteStoreError {
    /// Ballot-side failure.
    #[error(transparent)]
    Ballot(#[from] BallotStoreError),
    /// Tally-side failure.
    #[error(transparent)]
    Tally(#[from] TallyStoreError),
    /// The backend does not support atomic multi-statement transactions.
    #[error("store does not support atomic cast transactions")]
    TransactionsUnsupported,
}

/// Combined store surface consumed by the vote recorder.
///
/// Implementations that advertise `transactions` in their
/// [`StoreCapabilities`] must override [`VoteStore::cast_atomic`] with a real
/// multi-statement transaction spanning both tables.
pub trait VoteStore: BallotStore + PollStore {
    /// Returns the capabilities advertised by this store.
    fn capabilities(&self) -> StoreCapabilities;

    /// Inserts the ballot and increments the chosen option inside one store
    /// transaction; on any failure neither write is visible.
    ///
    /// # Errors
    ///
    /// Returns [`VoteStoreError::TransactionsUnsupported`] unless overridden,
    /// and translated ballot/tally errors from the transaction body.
    fn cast_atomic(&self, ballot: &Ballot) -> Result<Poll, VoteStoreError> {
        let _ = ballot;
        Err(VoteStoreError::TransactionsUnsupported)
    }

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`VoteStoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), VoteStoreError> {
        Ok(())
    }
}
