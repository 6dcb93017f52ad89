// crates/ballotbox-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Poll Lifecycle Guard
// Description: Ownership and frozen-options enforcement for poll mutation.
// Purpose: Reject edits and deletions once voting has started.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! Edit and delete on a poll are rejected once `sum(option.vote_count) > 0`:
//! the option set is frozen the moment voting starts. The guard sums current
//! tallies immediately before a mutation commits; without it, concurrent
//! edits could invalidate option identifiers referenced by in-flight votes.
//! Ownership is enforced on the same path: only the creator may mutate or
//! delete a poll. Poll deletion cascades ballot cleanup explicitly, since
//! the store does not enforce referential integrity on its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::poll::MIN_POLL_OPTIONS;
use crate::core::poll::Poll;
use crate::core::poll::PollDraft;
use crate::core::poll::PollOption;
use crate::core::poll::PollUpdate;
use crate::core::time::Timestamp;
use crate::interfaces::BallotStoreError;
use crate::interfaces::TallyStoreError;
use crate::interfaces::VoteStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Poll lifecycle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The poll does not exist.
    #[error("poll not found: {0}")]
    NotFound(PollId),
    /// The caller is not the poll's owner.
    #[error("only the poll owner may modify it")]
    NotOwner,
    /// The poll has recorded votes; its option set is frozen.
    #[error("cannot modify a poll once voting has started")]
    VotingStarted,
    /// Fewer than the minimum number of non-empty options were supplied.
    #[error("a poll requires at least {MIN_POLL_OPTIONS} options")]
    TooFewOptions,
    /// The poll title is empty.
    #[error("poll title must not be empty")]
    EmptyTitle,
    /// The store failed while applying the mutation.
    #[error("poll lifecycle store error: {0}")]
    Store(String),
}

impl From<TallyStoreError> for LifecycleError {
    fn from(error: TallyStoreError) -> Self {
        match error {
            TallyStoreError::NotFound(poll_id) => Self::NotFound(poll_id),
            TallyStoreError::OptionNotFound { poll_id, .. } => Self::NotFound(poll_id),
            TallyStoreError::Unavailable(message) | TallyStoreError::Invalid(message) => {
                Self::Store(message)
            }
        }
    }
}

impl From<BallotStoreError> for LifecycleError {
    fn from(error: BallotStoreError) -> Self {
        Self::Store(error.to_string())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Normalizes draft option texts: trimmed, empties dropped, minimum enforced.
fn normalize_options(texts: &[String]) -> Result<Vec<PollOption>, LifecycleError> {
    let options: Vec<PollOption> = texts
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(PollOption::new)
        .collect();
    if options.len() < MIN_POLL_OPTIONS {
        return Err(LifecycleError::TooFewOptions);
    }
    Ok(options)
}

/// Checks ownership and the frozen-options guard against current tallies.
fn ensure_mutable(poll: &Poll, actor: &UserId) -> Result<(), LifecycleError> {
    if poll.created_by != *actor {
        return Err(LifecycleError::NotOwner);
    }
    if poll.total_votes() > 0 {
        return Err(LifecycleError::VotingStarted);
    }
    Ok(())
}

// ============================================================================
// SECTION: Lifecycle Operations
// ============================================================================

/// Creates a poll from a draft, enforcing title and option invariants.
///
/// # Errors
///
/// Returns [`LifecycleError::EmptyTitle`] or
/// [`LifecycleError::TooFewOptions`] on invalid drafts, and
/// [`LifecycleError::Store`] on store failure.
pub fn create_poll<S: VoteStore + ?Sized>(
    store: &S,
    owner: &UserId,
    draft: &PollDraft,
) -> Result<Poll, LifecycleError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(LifecycleError::EmptyTitle);
    }
    let options = normalize_options(&draft.options)?;
    let poll = Poll {
        id: PollId::generate(),
        title: title.to_string(),
        description: draft.description.clone(),
        options,
        created_by: owner.clone(),
        created_at: Timestamp::now(),
    };
    store.create_poll(&poll)?;
    Ok(poll)
}

/// Applies an edit, subject to ownership and the frozen-options guard.
///
/// Replacing the option set mints fresh option identifiers with zero
/// tallies; this is only reachable while the poll has zero votes, so no
/// ballot can reference a retired identifier.
///
/// # Errors
///
/// Returns [`LifecycleError::NotFound`], [`LifecycleError::NotOwner`],
/// [`LifecycleError::VotingStarted`], [`LifecycleError::TooFewOptions`], or
/// [`LifecycleError::Store`].
pub fn update_poll<S: VoteStore + ?Sized>(
    store: &S,
    actor: &UserId,
    poll_id: &PollId,
    update: &PollUpdate,
) -> Result<Poll, LifecycleError> {
    let mut poll = store.get_poll(poll_id)?;
    ensure_mutable(&poll, actor)?;
    if let Some(title) = &update.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(LifecycleError::EmptyTitle);
        }
        poll.title = title.to_string();
    }
    if let Some(description) = &update.description {
        poll.description.clone_from(description);
    }
    if let Some(texts) = &update.options {
        poll.options = normalize_options(texts)?;
    }
    store.update_poll(&poll)?;
    Ok(poll)
}

/// Deletes a poll, subject to ownership and the frozen-options guard, and
/// cascades ballot cleanup. Returns the number of ballots removed (orphaned
/// ballots may exist even when all tallies are zero).
///
/// # Errors
///
/// Returns [`LifecycleError::NotFound`], [`LifecycleError::NotOwner`],
/// [`LifecycleError::VotingStarted`], or [`LifecycleError::Store`].
pub fn delete_poll<S: VoteStore + ?Sized>(
    store: &S,
    actor: &UserId,
    poll_id: &PollId,
) -> Result<u64, LifecycleError> {
    let poll = store.get_poll(poll_id)?;
    ensure_mutable(&poll, actor)?;
    let removed_ballots = store.delete_ballots_for_poll(poll_id)?;
    store.delete_poll(poll_id)?;
    Ok(removed_ballots)
}
