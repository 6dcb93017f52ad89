// crates/ballotbox-core/tests/recorder.rs
// ============================================================================
// Module: Vote Recorder Unit Tests
// Description: Cast protocol tests for both consistency strategies.
// Purpose: Validate uniqueness, tally attribution, compensation, and
//          concurrency behavior against the in-memory store.
// Dependencies: ballotbox-core
// ============================================================================

//! ## Overview
//! Exercises the vote recorder against the in-memory store:
//! - One successful cast per (user, poll); duplicates leave tallies unchanged
//! - Exactly-one-increment attribution to the chosen option
//! - Parallel casts with distinct and identical users
//! - Compensating rollback on a failed increment, and orphan reporting when
//!   the compensation itself fails
//! - Transient increment outcomes that leave the ballot in place for a safe
//!   retry

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use ballotbox_core::Ballot;
use ballotbox_core::BallotId;
use ballotbox_core::BallotStore;
use ballotbox_core::BallotStoreError;
use ballotbox_core::ConsistencyMode;
use ballotbox_core::InMemoryVoteStore;
use ballotbox_core::NoopVoteAudit;
use ballotbox_core::OptionId;
use ballotbox_core::Poll;
use ballotbox_core::PollDraft;
use ballotbox_core::PollId;
use ballotbox_core::PollPage;
use ballotbox_core::PollStore;
use ballotbox_core::RecorderError;
use ballotbox_core::StoreCapabilities;
use ballotbox_core::TallyStoreError;
use ballotbox_core::UserId;
use ballotbox_core::VoteAuditEvent;
use ballotbox_core::VoteAuditSink;
use ballotbox_core::VoteError;
use ballotbox_core::VoteRecorder;
use ballotbox_core::VoteStore;
use ballotbox_core::runtime::lifecycle;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Audit sink retaining every event for assertions.
#[derive(Default)]
struct TestAudit {
    events: Mutex<Vec<VoteAuditEvent>>,
}

impl VoteAuditSink for TestAudit {
    fn record(&self, event: &VoteAuditEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

fn sample_poll(store: &InMemoryVoteStore, owner: &str) -> Poll {
    lifecycle::create_poll(
        store,
        &UserId::new(owner),
        &PollDraft {
            title: "lunch spot".to_string(),
            description: None,
            options: vec!["ramen".to_string(), "tacos".to_string()],
        },
    )
    .expect("create poll")
}

fn recorder_with_mode(
    store: &Arc<InMemoryVoteStore>,
    mode: ConsistencyMode,
) -> VoteRecorder<InMemoryVoteStore> {
    VoteRecorder::new(Arc::clone(store), mode, Arc::new(NoopVoteAudit)).expect("recorder")
}

fn both_modes() -> [ConsistencyMode; 2] {
    [ConsistencyMode::Transactional, ConsistencyMode::Compensating]
}

// ============================================================================
// SECTION: Single-Caller Properties
// ============================================================================

#[test]
fn successful_cast_increments_chosen_option_only() {
    for mode in both_modes() {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = sample_poll(&store, "owner");
        let recorder = recorder_with_mode(&store, mode);
        let before: u64 = poll.total_votes();

        let updated = recorder
            .cast_vote(&UserId::new("u1"), &poll.id, &poll.options[0].id)
            .expect("cast succeeds");

        assert_eq!(updated.total_votes(), before + 1);
        assert_eq!(updated.options[0].vote_count, 1);
        assert_eq!(updated.options[1].vote_count, 0);
    }
}

#[test]
fn second_cast_returns_duplicate_and_leaves_tallies_unchanged() {
    for mode in both_modes() {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = sample_poll(&store, "owner");
        let recorder = recorder_with_mode(&store, mode);
        let user = UserId::new("u1");

        recorder.cast_vote(&user, &poll.id, &poll.options[0].id).expect("first cast");
        // Second attempt with a different option on the same poll.
        let err = recorder
            .cast_vote(&user, &poll.id, &poll.options[1].id)
            .expect_err("second cast rejected");

        assert_eq!(err, VoteError::DuplicateVote);
        assert!(!err.is_retryable());
        let current = store.get_poll(&poll.id).expect("poll");
        assert_eq!(current.options[0].vote_count, 1);
        assert_eq!(current.options[1].vote_count, 0);
    }
}

#[test]
fn worked_example_two_users() {
    let store = Arc::new(InMemoryVoteStore::new());
    let poll = sample_poll(&store, "owner");
    let recorder = recorder_with_mode(&store, ConsistencyMode::Transactional);
    let option_a = poll.options[0].id.clone();
    let option_b = poll.options[1].id.clone();

    let after_u1 = recorder.cast_vote(&UserId::new("u1"), &poll.id, &option_a).expect("u1 votes a");
    assert_eq!(after_u1.options[0].vote_count, 1);

    let err = recorder
        .cast_vote(&UserId::new("u1"), &poll.id, &option_b)
        .expect_err("u1 votes again");
    assert_eq!(err, VoteError::DuplicateVote);

    let after_u2 = recorder.cast_vote(&UserId::new("u2"), &poll.id, &option_b).expect("u2 votes b");
    assert_eq!(after_u2.options[0].vote_count, 1);
    assert_eq!(after_u2.options[1].vote_count, 1);
}

#[test]
fn malformed_identifiers_are_rejected_without_store_writes() {
    let store = Arc::new(InMemoryVoteStore::new());
    let poll = sample_poll(&store, "owner");
    let recorder = recorder_with_mode(&store, ConsistencyMode::Transactional);

    let err = recorder
        .cast_vote(&UserId::new("u1"), &PollId::new("no/slashes"), &poll.options[0].id)
        .expect_err("malformed poll id");
    assert!(matches!(err, VoteError::InvalidArgument(_)));

    let err = recorder
        .cast_vote(&UserId::new("u1"), &poll.id, &OptionId::new(""))
        .expect_err("empty option id");
    assert!(matches!(err, VoteError::InvalidArgument(_)));

    assert_eq!(store.count_ballots(&poll.id).expect("count"), 0);
}

#[test]
fn unknown_poll_or_option_maps_to_not_found() {
    for mode in both_modes() {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = sample_poll(&store, "owner");
        let recorder = recorder_with_mode(&store, mode);

        let err = recorder
            .cast_vote(&UserId::new("u1"), &PollId::new("missing"), &poll.options[0].id)
            .expect_err("missing poll");
        assert_eq!(err, VoteError::PollOrOptionNotFound);

        let err = recorder
            .cast_vote(&UserId::new("u1"), &poll.id, &OptionId::new("forged"))
            .expect_err("forged option");
        assert_eq!(err, VoteError::PollOrOptionNotFound);
    }
}

// ============================================================================
// SECTION: Compensation
// ============================================================================

#[test]
fn failed_increment_rolls_back_ballot_and_retry_succeeds() {
    let store = Arc::new(InMemoryVoteStore::new());
    let poll = sample_poll(&store, "owner");
    let other_poll = sample_poll(&store, "owner");
    let audit = Arc::new(TestAudit::default());
    let recorder = VoteRecorder::new(
        Arc::clone(&store),
        ConsistencyMode::Compensating,
        Arc::clone(&audit) as Arc<dyn VoteAuditSink>,
    )
    .expect("recorder");
    let user = UserId::new("u1");

    // Option belongs to a different poll, so the increment must fail after
    // the ballot insert succeeded.
    let err = recorder
        .cast_vote(&user, &poll.id, &other_poll.options[0].id)
        .expect_err("cross-poll option");
    assert_eq!(err, VoteError::PollOrOptionNotFound);
    assert_eq!(store.count_ballots(&poll.id).expect("count"), 0);
    assert!(
        audit
            .events
            .lock()
            .expect("events lock")
            .iter()
            .any(|event| matches!(event, VoteAuditEvent::CompensationApplied { .. }))
    );

    // The one-vote invariant was restored; a valid retry succeeds.
    let updated = recorder.cast_vote(&user, &poll.id, &poll.options[0].id).expect("retry");
    assert_eq!(updated.options[0].vote_count, 1);
}

/// Delegating store with injectable ballot-delete and increment faults.
struct FaultyStore {
    inner: InMemoryVoteStore,
    fail_delete: bool,
    fail_increment: bool,
}

impl FaultyStore {
    fn new(fail_delete: bool, fail_increment: bool) -> Self {
        Self {
            inner: InMemoryVoteStore::new(),
            fail_delete,
            fail_increment,
        }
    }
}

impl BallotStore for FaultyStore {
    fn insert_ballot(&self, ballot: &Ballot) -> Result<(), BallotStoreError> {
        self.inner.insert_ballot(ballot)
    }

    fn delete_ballot(&self, ballot_id: &BallotId) -> Result<bool, BallotStoreError> {
        if self.fail_delete {
            return Err(BallotStoreError::Unavailable("delete path wedged".to_string()));
        }
        self.inner.delete_ballot(ballot_id)
    }

    fn find_ballot(
        &self,
        user_id: &UserId,
        poll_id: &PollId,
    ) -> Result<Option<Ballot>, BallotStoreError> {
        self.inner.find_ballot(user_id, poll_id)
    }

    fn count_ballots(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        self.inner.count_ballots(poll_id)
    }

    fn delete_ballots_for_poll(&self, poll_id: &PollId) -> Result<u64, BallotStoreError> {
        self.inner.delete_ballots_for_poll(poll_id)
    }
}

impl PollStore for FaultyStore {
    fn create_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        self.inner.create_poll(poll)
    }

    fn get_poll(&self, poll_id: &PollId) -> Result<Poll, TallyStoreError> {
        self.inner.get_poll(poll_id)
    }

    fn increment_option(
        &self,
        poll_id: &PollId,
        option_id: &OptionId,
    ) -> Result<Poll, TallyStoreError> {
        if self.fail_increment {
            return Err(TallyStoreError::Unavailable("tally write timed out".to_string()));
        }
        self.inner.increment_option(poll_id, option_id)
    }

    fn update_poll(&self, poll: &Poll) -> Result<(), TallyStoreError> {
        self.inner.update_poll(poll)
    }

    fn delete_poll(&self, poll_id: &PollId) -> Result<bool, TallyStoreError> {
        self.inner.delete_poll(poll_id)
    }

    fn list_polls(&self, page: u64, limit: u64) -> Result<PollPage, TallyStoreError> {
        self.inner.list_polls(page, limit)
    }

    fn list_polls_by_owner(&self, owner: &UserId) -> Result<Vec<Poll>, TallyStoreError> {
        self.inner.list_polls_by_owner(owner)
    }
}

impl VoteStore for FaultyStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { transactions: false }
    }
}

#[test]
fn transient_increment_leaves_ballot_for_safe_retry() {
    let store = Arc::new(FaultyStore::new(false, true));
    let poll = sample_poll(&store.inner, "owner");
    let audit = Arc::new(TestAudit::default());
    let recorder = VoteRecorder::new(
        Arc::clone(&store),
        ConsistencyMode::Compensating,
        Arc::clone(&audit) as Arc<dyn VoteAuditSink>,
    )
    .expect("recorder");
    let user = UserId::new("u1");

    let err = recorder
        .cast_vote(&user, &poll.id, &poll.options[0].id)
        .expect_err("increment flaked");
    assert!(matches!(err, VoteError::Transient(_)));
    assert!(err.is_retryable());
    // The increment outcome is unknown, so the ballot must stay in place and
    // be flagged for reconciliation.
    assert_eq!(store.count_ballots(&poll.id).expect("count"), 1);
    assert!(
        audit
            .events
            .lock()
            .expect("events lock")
            .iter()
            .any(|event| matches!(event, VoteAuditEvent::OrphanedBallot { .. }))
    );

    // A blind retry cannot double-count; it resolves as a duplicate.
    let retry = recorder
        .cast_vote(&user, &poll.id, &poll.options[0].id)
        .expect_err("retry after unknown outcome");
    assert_eq!(retry, VoteError::DuplicateVote);
}

#[test]
fn failed_compensation_is_reported_as_orphaned_ballot() {
    let store = Arc::new(FaultyStore::new(true, false));
    let poll = sample_poll(&store.inner, "owner");
    let audit = Arc::new(TestAudit::default());
    let recorder = VoteRecorder::new(
        Arc::clone(&store),
        ConsistencyMode::Compensating,
        Arc::clone(&audit) as Arc<dyn VoteAuditSink>,
    )
    .expect("recorder");

    let err = recorder
        .cast_vote(&UserId::new("u1"), &poll.id, &OptionId::new("forged"))
        .expect_err("forged option");
    // The caller still gets a definitive outcome.
    assert_eq!(err, VoteError::PollOrOptionNotFound);
    // The orphaned ballot row remains, flagged for reconciliation.
    assert_eq!(store.count_ballots(&poll.id).expect("count"), 1);
    assert!(
        audit
            .events
            .lock()
            .expect("events lock")
            .iter()
            .any(|event| matches!(event, VoteAuditEvent::OrphanedBallot { .. }))
    );
}

#[test]
fn transactional_mode_requires_capability() {
    let store = Arc::new(FaultyStore::new(false, false));
    let Err(err) =
        VoteRecorder::new(store, ConsistencyMode::Transactional, Arc::new(NoopVoteAudit))
    else {
        panic!("recorder construction must fail without transaction support");
    };
    assert!(matches!(err, RecorderError::TransactionsUnavailable));
}

#[test]
fn from_capabilities_follows_store_advertisement() {
    let memory = Arc::new(InMemoryVoteStore::new());
    let recorder = VoteRecorder::from_capabilities(memory, Arc::new(NoopVoteAudit));
    assert_eq!(recorder.mode(), ConsistencyMode::Transactional);

    let fallback = Arc::new(FaultyStore::new(false, false));
    let recorder = VoteRecorder::from_capabilities(fallback, Arc::new(NoopVoteAudit));
    assert_eq!(recorder.mode(), ConsistencyMode::Compensating);
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn parallel_distinct_users_yield_exact_count() {
    for mode in both_modes() {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = sample_poll(&store, "owner");
        let recorder = Arc::new(recorder_with_mode(&store, mode));
        let option = poll.options[0].id.clone();
        let voters = 32;

        let handles: Vec<_> = (0 .. voters)
            .map(|index| {
                let recorder = Arc::clone(&recorder);
                let poll_id = poll.id.clone();
                let option = option.clone();
                thread::spawn(move || {
                    recorder.cast_vote(&UserId::new(format!("user-{index}")), &poll_id, &option)
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|handle| handle.join().expect("join"))
            .filter(Result::is_ok)
            .count();

        assert_eq!(successes, voters);
        let current = store.get_poll(&poll.id).expect("poll");
        assert_eq!(current.options[0].vote_count, u64::try_from(voters).expect("fits"));
    }
}

#[test]
fn parallel_same_user_yields_single_success() {
    for mode in both_modes() {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = sample_poll(&store, "owner");
        let recorder = Arc::new(recorder_with_mode(&store, mode));
        let option = poll.options[0].id.clone();
        let attempts = 16;

        let handles: Vec<_> = (0 .. attempts)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                let poll_id = poll.id.clone();
                let option = option.clone();
                thread::spawn(move || recorder.cast_vote(&UserId::new("same"), &poll_id, &option))
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|handle| handle.join().expect("join")).collect();

        let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(VoteError::DuplicateVote)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(duplicates, attempts - 1);
        let current = store.get_poll(&poll.id).expect("poll");
        assert_eq!(current.options[0].vote_count, 1);
    }
}
