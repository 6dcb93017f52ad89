// crates/ballotbox-core/tests/proptest_recorder.rs
// ============================================================================
// Module: Vote Recorder Property Tests
// Description: Randomized cast sequences against the in-memory store.
// Purpose: Validate the tally-sum invariant over arbitrary vote interleavings.
// Dependencies: ballotbox-core, proptest
// ============================================================================

//! ## Overview
//! Drives random sequences of cast attempts (mixed users, options, and
//! strategies) and asserts the core accounting invariant: the sum of option
//! tallies always equals the number of successful casts, and never exceeds
//! the number of distinct users that attempted to vote.

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

use std::collections::BTreeSet;
use std::sync::Arc;

use ballotbox_core::ConsistencyMode;
use ballotbox_core::InMemoryVoteStore;
use ballotbox_core::NoopVoteAudit;
use ballotbox_core::PollDraft;
use ballotbox_core::PollStore;
use ballotbox_core::UserId;
use ballotbox_core::VoteRecorder;
use ballotbox_core::runtime::lifecycle;
use proptest::prelude::Strategy;
use proptest::prelude::any;
use proptest::prelude::prop;
use proptest::prop_assert;
use proptest::prop_assert_eq;
use proptest::proptest;

/// One randomized cast attempt: user index, option index, and whether the
/// option index is deliberately out of range (forged).
fn attempt_strategy() -> impl Strategy<Value = (u8, usize, bool)> {
    (any::<u8>(), 0_usize .. 4, proptest::bool::weighted(0.1))
}

proptest! {
    #[test]
    fn tally_sum_matches_successful_casts(
        attempts in prop::collection::vec(attempt_strategy(), 1 .. 64),
        transactional in proptest::bool::ANY,
    ) {
        let store = Arc::new(InMemoryVoteStore::new());
        let poll = lifecycle::create_poll(
            store.as_ref(),
            &UserId::new("owner"),
            &PollDraft {
                title: "prop".to_string(),
                description: None,
                options: vec![
                    "a".to_string(),
                    "b".to_string(),
                    "c".to_string(),
                    "d".to_string(),
                ],
            },
        ).expect("create poll");
        let mode = if transactional {
            ConsistencyMode::Transactional
        } else {
            ConsistencyMode::Compensating
        };
        let recorder = VoteRecorder::new(Arc::clone(&store), mode, Arc::new(NoopVoteAudit))
            .expect("recorder");

        let mut successes: u64 = 0;
        let mut distinct_users: BTreeSet<u8> = BTreeSet::new();
        for (user, option_index, forged) in attempts {
            distinct_users.insert(user);
            let option_id = if forged {
                ballotbox_core::OptionId::new("forged")
            } else {
                poll.options[option_index].id.clone()
            };
            if recorder
                .cast_vote(&UserId::new(format!("user-{user}")), &poll.id, &option_id)
                .is_ok()
            {
                successes += 1;
            }
        }

        let current = store.get_poll(&poll.id).expect("poll");
        let user_ceiling = u64::try_from(distinct_users.len()).expect("fits in u64");
        prop_assert_eq!(current.total_votes(), successes);
        prop_assert!(successes <= user_ceiling);
    }
}
