// crates/ballotbox-core/src/lib.rs
// ============================================================================
// Module: Ballotbox Core Library
// Description: Domain model, store interfaces, and the vote-recording runtime.
// Purpose: Define the voting protocol core independent of any storage backend.
// Dependencies: rand, serde, thiserror
// ============================================================================

//! ## Overview
//! Ballotbox Core defines the poll and ballot domain model, the
//! backend-agnostic store interfaces, and the [`VoteRecorder`] that performs
//! the one-vote-per-user cast protocol.
//! Invariants:
//! - A (user, poll) pair contributes at most one ballot, enforced by the
//!   ballot store's uniqueness constraint, never by a check-then-act probe.
//! - Tally increments are atomic single-row operations.
//! - Store failures are classified exactly once, at the
//!   [`runtime::classify`] boundary, into the [`VoteError`] taxonomy.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod memory;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::NoopVoteAudit;
pub use audit::VoteAuditEvent;
pub use audit::VoteAuditSink;
pub use core::ballot::Ballot;
pub use core::identifiers::BallotId;
pub use core::identifiers::OptionId;
pub use core::identifiers::PollId;
pub use core::identifiers::UserId;
pub use core::poll::Poll;
pub use core::poll::PollDraft;
pub use core::poll::PollOption;
pub use core::poll::PollUpdate;
pub use core::time::Timestamp;
pub use interfaces::BallotStore;
pub use interfaces::BallotStoreError;
pub use interfaces::PollPage;
pub use interfaces::PollStore;
pub use interfaces::StoreCapabilities;
pub use interfaces::TallyStoreError;
pub use interfaces::VoteStore;
pub use interfaces::VoteStoreError;
pub use memory::InMemoryVoteStore;
pub use runtime::lifecycle::LifecycleError;
pub use runtime::recorder::ConsistencyMode;
pub use runtime::recorder::RecorderError;
pub use runtime::recorder::VoteError;
pub use runtime::recorder::VoteRecorder;
