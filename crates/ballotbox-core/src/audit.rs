// crates/ballotbox-core/src/audit.rs
// ============================================================================
// Module: Vote Audit Sink
// Description: Observability hooks for vote outcomes and compensation failures.
// Purpose: Record orphaned-ballot conditions without hard observability deps.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! This module exposes a thin audit interface for vote-path events. It is
//! intentionally dependency-light so downstream deployments can plug in
//! their own logging or metrics pipeline without redesign. The recorder uses
//! it for exactly one correctness-relevant purpose: a failed compensating
//! delete leaves an orphaned ballot recoverable only by an out-of-band
//! reconciliation sweep, and that condition must be recorded, never
//! re-thrown to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::BallotId;
use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Vote-path audit event payloads.
///
/// # Invariants
/// - Variants are stable for downstream sinks; payloads carry identifiers
///   only, never raw store error codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteAuditEvent {
    /// A vote was recorded successfully.
    VoteRecorded {
        /// Voting user.
        user_id: UserId,
        /// Target poll.
        poll_id: PollId,
        /// Chosen option.
        option_id: OptionId,
    },
    /// A compensating ballot delete was issued after a failed increment.
    CompensationApplied {
        /// Rolled-back ballot.
        ballot_id: BallotId,
        /// Target poll.
        poll_id: PollId,
    },
    /// A compensating delete itself failed; the ballot row remains orphaned
    /// and must be reconciled out of band.
    OrphanedBallot {
        /// Orphaned ballot.
        ballot_id: BallotId,
        /// Target poll.
        poll_id: PollId,
        /// Human-readable failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for vote-path audit events.
pub trait VoteAuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &VoteAuditEvent);
}

/// No-op audit sink.
///
/// # Invariants
/// - Events are intentionally discarded.
pub struct NoopVoteAudit;

impl VoteAuditSink for NoopVoteAudit {
    fn record(&self, _event: &VoteAuditEvent) {}
}
