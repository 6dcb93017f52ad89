// crates/ballotbox-core/src/memory.rs
// ============================================================================
// Module: In-Memory Vote Store
// Description: Mutex-guarded reference store for tests and dev deployments.
// Purpose: Provide a fully transactional VoteStore without external state.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryVoteStore`] keeps polls and ballots in process memory behind a
//! single mutex, which makes every operation trivially atomic. It advertises
//! transaction capability and overrides [`VoteStore::cast_atomic`] with a
//! check-then-apply sequence under one lock acquisition.
//!
//! The in-memory store backs the `memory` config backend and the core test
//! suite; durability is explicitly out of scope for it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::ballot::Ballot;
use crate::core::identifiers::BallotId;
use crate::core::identifiers::OptionId;
use crate::core::identifiers::PollId;
use crate::core::identifiers::UserId;
use crate::core::poll::Poll;
use crate::interfaces::BallotStore;
use crate::interfaces::BallotStoreError;
use crate::interfaces::PollPage;
use crate::interfaces::PollStore;
use crate::interfaces::StoreCapabilities;
use crate::interfaces::TallyStoreError;
use crate::interfaces::VoteStore;
use crate::interfaces::VoteStoreError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Mutable state guarded by the store mutex.
#[derive(Debug, Default)]
struct InnerState {
    /// Polls keyed by identifier.
    polls: BTreeMap<PollId, Poll>,
    /// Ballots keyed by identifier.
    ballots: BTreeMap<BallotId, Ballot>,
}

impl InnerState {
    /// Returns whether a ballot exists for the (user, poll) pair.
    fn has_ballot(&self, user_id: &UserId, poll_id: &PollId) -> bool {
        self.ballots
            .values()
            .any(|ballot| ballot.user_id == *user_id && ballot.poll_id == *poll_id)
    }

    /// Increments the matching option in place, returning the new poll state.
    fn increment(
        &mut self,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, TallyStoreError> {
        let Some(poll) = self.polls.get_mut(poll_id) else {
            return Err(TallyStoreError::OptionNotFound {
                poll_id: poll_id.clone(),
                option_id: option_id.clone(),
            });
        };
        let Some(option) = poll.options.iter_mut().find(|option| option.id == *option_id) else {
            return Err(TallyStoreError::OptionNotFound {
                poll_id: poll_id.clone(),
                option_id: option_id.clone(),
            });
        };
        option.vote_count = option.vote_count.saturating_add(1);
        Ok(poll.clone())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Mutex-guarded in-memory vote store.
///
/// # Invariants
/// - Every operation holds the single mutex for its full duration, so all
///   invariant checks are atomic with their writes.
#[derive(Debug, Default)]
pub struct InMemoryVoteStore {
    /// Polls and ballots behind one lock.
    state: Mutex<InnerState>,
}

impl InMemoryVoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, surfacing poisoning as a store failure message.
    fn lock(&self) -> Result<MutexGuard<'_, InnerState>, String> {
        self.state.lock().map_err(|_| "in-memory store mutex poisoned".to_string())
    }
}

impl BallotStore for InMemoryVoteStore {
    fn insert_ballot(&self, ballot: &Ballot) -> Result<(), BallotStoreError> {
        let mut state = self.lock().map_err(BallotStoreError::Unavailable)?;
        if state.has_ballot(&ballot.user_id, &ballot.poll_id) {
            return Err(BallotStoreError::Duplicate {
                user_id: ballot.user_id.clone(),
                poll_id: ballot.poll_id.clone(),
            });
        }
        state.ballots.insert(ballot.id.clone(), ballot.clone());
        Ok(())
    }

    fn delete_ballot(&self, ballot_id: &BallotId) -> Result<bool, BallotStoreError> {
        let mut state = self.lock().map_err(BallotStoreError::Unavailable)?;
        Ok(state.ballots.remove(ballot_id).is_some())
    }

    fn find_ballot(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<Option<Ballot>, BallotStoreError> {
        let state = self.lock().map_err(BallotStoreError::Unavailable)?;
        Ok(state
            .ballots
            .values()
            .find(|ballot| ballot.user_id == *user_id && ballot.poll_id == *poll_id)
            .cloned())
    }

    fn count_ballots(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        let state = self.lock().map_err(BallotStoreError::Unavailable)?;
        let count = state.ballots.values().filter(|ballot| ballot.poll_id == *poll_id).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    fn delete_ballots_for_poll(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        let mut state = self.lock().map_err(BallotStoreError::Unavailable)?;
        let before = state.ballots.len();
        state.ballots.retain(|_, ballot| ballot.poll_id != *poll_id);
        Ok(u64::try_from(before - state.ballots.len()).unwrap_or(u64::MAX))
    }
}

impl PollStore for InMemoryVoteStore {
    fn create_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        let mut state = self.lock().map_err(TallyStoreError::Unavailable)?;
        state.polls.insert(poll.id.clone(), poll.clone());
        Ok(())
    }

    fn get_poll(&self, poll_id: &PollId) -> Result<Poll, TallyStoreError> {
        let state = self.lock().map_err(TallyStoreError::Unavailable)?;
        state
            .polls
            .get(poll_id)
            .cloned()
            .ok_or_else(|| TallyStoreError::NotFound(poll_id.clone()))
    }

    fn increment_option(
        &self,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, TallyStoreError> {
        let mut state = self.lock().map_err(TallyStoreError::Unavailable)?;
        state.increment(poll_id, option_id)
    }

    fn update_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        let mut state = self.lock().map_err(TallyStoreError::Unavailable)?;
        if !state.polls.contains_key(&poll.id) {
            return Err(TallyStoreError::NotFound(poll.id.clone()));
        }
        state.polls.insert(poll.id.clone(), poll.clone());
        Ok(())
    }

    fn delete_poll(&self, poll_id: &PollId) -> Result<bool, TallyStoreError> {
        let mut state = self.lock().map_err(TallyStoreError::Unavailable)?;
        Ok(state.polls.remove(poll_id).is_some())
    }

    fn list_polls(&self, page: u64, limit: u64) -> Result<PollPage, TallyStoreError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 50);
        let state = self.lock().map_err(TallyStoreError::Unavailable)?;
        let mut polls: Vec<Poll> = state.polls.values().cloned().collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        let skip = usize::try_from((page - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = polls.into_iter().skip(skip).take(take).collect();
        Ok(PollPage { items, page, limit })
    }

    fn list_polls_by_owner(&self, owner: &UserId) -> Result<Vec<Poll>, TallyStoreError> {
        let state = self.lock().map_err(TallyStoreError::Unavailable)?;
        let mut polls: Vec<Poll> =
            state.polls.values().filter(|poll| poll.created_by == *owner).cloned().collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(polls)
    }
}

impl VoteStore for InMemoryVoteStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { transactions: true }
    }

    fn cast_atomic(&self, ballot: &Ballot) -> Result<Poll, VoteStoreError> {
        let mut state = self.lock().map_err(BallotStoreError::Unavailable)?;
        if state.has_ballot(&ballot.user_id, &ballot.poll_id) {
            return Err(BallotStoreError::Duplicate {
                user_id: ballot.user_id.clone(),
                poll_id: ballot.poll_id.clone(),
            }
            .into());
        }
        // Increment first: it fails without side effects when the option is
        // missing, so the ballot insert below cannot be left dangling.
        let poll = state.increment(&ballot.poll_id, &ballot.option_id)?;
        state.ballots.insert(ballot.id.clone(), ballot.clone());
        Ok(poll)
    }
}
