// crates/ballotbox-core/src/runtime/recorder.rs
// ============================================================================
// Module: Vote Recorder
// Description: The cast-vote protocol core with strategy selection.
// Purpose: Record at most one vote per (user, poll) with a consistent tally.
// Dependencies: crate::{audit, core, interfaces, runtime::classify}, thiserror
// ============================================================================

//! ## Overview
//! The [`VoteRecorder`] orchestrates the ballot and tally stores to perform
//! one logical cast-vote operation. Two strategies are supported, fixed at
//! construction time from the store's advertised capabilities:
//!
//! - *Transactional*: ballot insert and option increment run inside one
//!   store transaction; on failure neither write is visible.
//! - *Compensating*: the ballot is inserted first, then the increment runs;
//!   a failed increment triggers a single compensating ballot delete. The
//!   window between the two writes is an accepted weak-consistency
//!   trade-off for backends without cross-table transactions.
//!
//! Store operations within one cast run sequentially so the compensation
//! step can react to the increment outcome. Correctness under concurrent
//! callers rests entirely on the store's atomic constraint enforcement and
//! atomic counter increment; the recorder holds no locks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::audit::VoteAuditEvent;
use crate::audit::VoteAuditSink;
use crate::core::ballot::Ballot;
use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::identifiers::is_well_formed;
use crate::core::poll::Poll;
use crate::interfaces::TallyStoreError;
use crate::interfaces::VoteStore;
use crate::runtime::classify::classify_ballot_error;
use crate::runtime::classify::classify_cast_error;
use crate::runtime::classify::classify_tally_error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Cast-vote error taxonomy surfaced to callers.
///
/// # Invariants
/// - Variants are stable; callers depend on the distinction to decide
///   whether to retry, so variants are never collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// Malformed input; never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The user already voted on this poll; never retried.
    #[error("user has already voted on this poll")]
    DuplicateVote,
    /// The poll or option no longer exists; a retry must pick a valid
    /// option first.
    #[error("poll or option not found")]
    PollOrOptionNotFound,
    /// Infrastructure flake; safe to retry with backoff. A retried cast
    /// that already inserted its ballot re-surfaces [`VoteError::DuplicateVote`]
    /// rather than double-counting.
    #[error("transient store error: {0}")]
    Transient(String),
}

impl VoteError {
    /// Returns whether the caller may safely retry the cast.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Recorder construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Transactional mode was requested against a store that does not
    /// advertise multi-statement transactions.
    #[error("transactional mode requires a store advertising transactions")]
    TransactionsUnavailable,
}

// ============================================================================
// SECTION: Consistency Mode
// ============================================================================

/// Cast strategy, fixed at recorder construction.
///
/// # Invariants
/// - Selection is a configuration fact established at startup, never
///   inferred per call from live connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Ballot insert and tally increment in one store transaction.
    Transactional,
    /// Ballot first, increment second, with a compensating delete on a
    /// failed increment.
    Compensating,
}

// ============================================================================
// SECTION: Vote Recorder
// ============================================================================

/// Orchestrates ballot and tally writes for one logical cast-vote operation.
///
/// # Invariants
/// - The strategy never changes after construction.
/// - Compensation is attempted exactly once; its failure is recorded through
///   the audit sink and never re-thrown to the caller.
pub struct VoteRecorder<S: ?Sized> {
    /// Combined store handle.
    store: Arc<S>,
    /// Cast strategy fixed at construction.
    mode: ConsistencyMode,
    /// Sink for vote outcomes and compensation failures.
    audit: Arc<dyn VoteAuditSink>,
}

impl<S: VoteStore + ?Sized> VoteRecorder<S> {
    /// Creates a recorder with an explicit strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::TransactionsUnavailable`] when transactional
    /// mode is requested but the store does not advertise transactions.
    pub fn new(
        store: Arc<S>,
        mode: ConsistencyMode,
        audit: Arc<dyn VoteAuditSink>,
    ) -> Result<Self, RecorderError> {
        if mode == ConsistencyMode::Transactional && !store.capabilities().transactions {
            return Err(RecorderError::TransactionsUnavailable);
        }
        Ok(Self { store, mode, audit })
    }

    /// Creates a recorder whose strategy follows the store's advertised
    /// capabilities.
    #[must_use]
    pub fn from_capabilities(store: Arc<S>, audit: Arc<dyn VoteAuditSink>) -> Self {
        let mode = if store.capabilities().transactions {
            ConsistencyMode::Transactional
        } else {
            ConsistencyMode::Compensating
        };
        Self { store, mode, audit }
    }

    /// Returns the strategy in effect.
    #[must_use]
    pub const fn mode(&self) -> ConsistencyMode {
        self.mode
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Casts a vote, returning the poll's fresh state on success so the
    /// caller observes its own increment.
    ///
    /// # Errors
    ///
    /// Returns [`VoteError::InvalidArgument`] for malformed identifiers,
    /// [`VoteError::DuplicateVote`] when the user already voted,
    /// [`VoteError::PollOrOptionNotFound`] for stale references, and
    /// [`VoteError::Transient`] for retryable store failures.
    pub fn cast_vote(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, VoteError> {
        if user_id.as_str().is_empty() {
            return Err(VoteError::InvalidArgument("user id must not be empty".to_string()));
        }
        if !is_well_formed(poll_id.as_str()) {
            return Err(VoteError::InvalidArgument(format!(
                "malformed poll id: {poll_id}"
            )));
        }
        if !is_well_formed(option_id.as_str()) {
            return Err(VoteError::InvalidArgument(format!(
                "malformed option id: {option_id}"
            )));
        }
        let ballot = Ballot::new(user_id.clone(), poll_id.clone(), option_id.clone());
        let poll = match self.mode {
            ConsistencyMode::Transactional => {
                self.store.cast_atomic(&ballot).map_err(classify_cast_error)?
            }
            ConsistencyMode::Compensating => self.cast_compensating(&ballot)?,
        };
        self.audit.record(&VoteAuditEvent::VoteRecorded {
            user_id: user_id.clone(),
            poll_id: poll_id.clone(),
            option_id: option_id.clone(),
        });
        Ok(poll)
    }

    /// Two-phase cast for stores without cross-table transactions: ballot
    /// first (the cheaper, uniqueness-checked write), increment second.
    fn cast_compensating(&self, ballot: &Ballot) -> Result<Poll, VoteError> {
        self.store.insert_ballot(ballot).map_err(classify_ballot_error)?;
        match self.store.increment_option(&ballot.poll_id, &ballot.option_id) {
            Ok(poll) => Ok(poll),
            Err(
                error @ (TallyStoreError::NotFound(_) | TallyStoreError::OptionNotFound { .. }),
            ) => {
                self.compensate(ballot);
                Err(classify_tally_error(error))
            }
            Err(error) => {
                // Outcome unknown: the increment may have been applied, so the
                // ballot must stay. A blind retry surfaces DuplicateVote.
                self.audit.record(&VoteAuditEvent::OrphanedBallot {
                    ballot_id: ballot.id.clone(),
                    poll_id: ballot.poll_id.clone(),
                    reason: format!("tally increment outcome unknown: {error}"),
                });
                Err(classify_tally_error(error))
            }
        }
    }

    /// Issues the compensating ballot delete exactly once. Failure leaves an
    /// orphaned ballot recorded for out-of-band reconciliation.
    fn compensate(&self, ballot: &Ballot) {
        match self.store.delete_ballot(&ballot.id) {
            Ok(_) => {
                self.audit.record(&VoteAuditEvent::CompensationApplied {
                    ballot_id: ballot.id.clone(),
                    poll_id: ballot.poll_id.clone(),
                });
            }
            Err(error) => {
                self.audit.record(&VoteAuditEvent::OrphanedBallot {
                    ballot_id: ballot.id.clone(),
                    poll_id: ballot.poll_id.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }
}
