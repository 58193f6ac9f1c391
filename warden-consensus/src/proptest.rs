//! Property-based tests for governance.
//!
//! Uses proptest to verify tally, sortition and settlement invariants hold
//! for arbitrary vote sequences and node sets.

use std::sync::Arc;

use proptest::prelude::*;

use warden_core::{
    Hash, InMemoryDirectory, ManualClock, NodeId, NodeRecord, SecretKey, Timestamp, WalletAddress,
};

use crate::config::GovernanceConfig;
use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::invariants::GovernanceInvariants;
use crate::period::NodeStats;
use crate::settlement::quota;
use crate::sortition;
use crate::votes::VoteTally;

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Generate arbitrary Hash values.
fn arb_hash() -> impl Strategy<Value = Hash> {
    prop::array::uniform32(any::<u8>()).prop_map(Hash::from_bytes)
}

/// Generate a sorted set of distinct node ids.
fn arb_active_set(max: usize) -> impl Strategy<Value = Vec<NodeId>> {
    prop::collection::btree_set(prop::array::uniform32(1u8..=255), 0..max)
        .prop_map(|set| set.into_iter().map(NodeId).collect())
}

/// Generate a vote: (voter index, approve). Indices past the committee are outsiders.
fn arb_vote() -> impl Strategy<Value = (usize, bool)> {
    (0usize..12, any::<bool>())
}

fn committee(n: usize) -> Vec<NodeId> {
    (0..n).map(|i| NodeId([i as u8 + 1; 32])).collect()
}

// ============================================================================
// Tally Properties
// ============================================================================

proptest! {
    #[test]
    fn tally_never_exceeds_committee(
        size in 1usize..9,
        votes in prop::collection::vec(arb_vote(), 0..30),
    ) {
        let members = committee(size);
        let subject = NodeId([200; 32]);
        let mut tally = VoteTally::new(members.clone());
        let mut frozen: Option<VoteTally> = None;

        for (idx, approve) in votes {
            let voter = NodeId([idx as u8 + 1; 32]);
            let _ = tally.cast(1, subject, voter, approve, Timestamp(0));

            prop_assert!(tally.yes() + tally.no() <= size as u32);
            prop_assert!(tally.voters().all(|v| members.contains(v)));

            if let Some(ref snapshot) = frozen {
                prop_assert_eq!(snapshot, &tally);
            } else if tally.is_completed() {
                frozen = Some(tally.clone());
            }
        }
    }

    #[test]
    fn tally_outcome_matches_majority(
        size in 1usize..9,
        approvals in prop::collection::vec(any::<bool>(), 0..9),
    ) {
        let members = committee(size);
        let subject = NodeId([200; 32]);
        let mut tally = VoteTally::new(members.clone());

        for (voter, approve) in members.iter().zip(approvals) {
            if tally.is_completed() {
                break;
            }
            tally.cast(1, subject, *voter, approve, Timestamp(0)).unwrap();
        }

        let threshold = tally.threshold();
        prop_assert_eq!(threshold as usize, size / 2 + 1);
        prop_assert_eq!(
            tally.is_completed(),
            tally.yes() >= threshold || tally.no() >= threshold
        );
    }
}

// ============================================================================
// Sortition Properties
// ============================================================================

proptest! {
    #[test]
    fn sortition_committees_are_valid(
        active in arb_active_set(16),
        seed in arb_hash(),
        committee_size in 1usize..8,
    ) {
        let draw = sortition::draw(&active, &seed, committee_size, None);

        if active.len() < 2 {
            prop_assert!(draw.is_empty());
        } else {
            prop_assert_eq!(draw.subjects.len(), active.len());
            for (subject, members) in &draw.committees {
                prop_assert!(!members.contains(subject));
                prop_assert_eq!(members.len(), committee_size.min(active.len() - 1));
                prop_assert!(members.iter().all(|m| active.contains(m)));
                let unique: std::collections::BTreeSet<_> = members.iter().collect();
                prop_assert_eq!(unique.len(), members.len());
            }
        }
    }

    #[test]
    fn sortition_is_reproducible(active in arb_active_set(16), seed in arb_hash()) {
        prop_assert_eq!(
            sortition::draw(&active, &seed, 3, Some(4)),
            sortition::draw(&active, &seed, 3, Some(4))
        );
    }
}

// ============================================================================
// Settlement Properties
// ============================================================================

proptest! {
    #[test]
    fn quota_never_exceeds_passes(
        passed in 0u64..1000,
        failed in 0u64..1000,
        max_failures in 0u64..10,
    ) {
        let stats = NodeStats { selected: passed + failed, passed, failed };
        let q = quota(&stats, max_failures);
        prop_assert!(q <= passed);
        prop_assert_eq!(q == 0 && passed > 0, failed > max_failures && passed > 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_preserves_invariants(
        node_count in 2usize..8,
        rounds in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..40), 1..5),
    ) {
        let keys: Vec<SecretKey> = (0..node_count).map(|_| SecretKey::generate()).collect();
        let directory = InMemoryDirectory::from_records(
            keys.iter().map(|k| NodeRecord::new(k.public_key(), WalletAddress([7; 20]))),
        )
        .unwrap();
        let clock = Arc::new(ManualClock::new(Timestamp(0)));
        let config = GovernanceConfig::default().with_committee_size(3);
        let mut engine = GovernanceEngine::new(config, Arc::new(directory), clock.clone()).unwrap();
        let invariants = GovernanceInvariants::all();

        for approvals in rounds {
            clock.advance(3600);
            let before = engine.snapshot();
            let round_id = engine.start_new_round().unwrap();

            let mut approvals = approvals.into_iter();
            let subjects = engine.round_subjects(round_id).unwrap().to_vec();
            for subject in subjects {
                for voter in engine.committee(round_id, &subject).unwrap().to_vec() {
                    let Some(approve) = approvals.next() else { break };
                    let _ = engine.vote(voter, round_id, subject, approve);
                }
            }

            let after = engine.snapshot();
            prop_assert!(invariants.verify(&after).is_ok());
            prop_assert!(invariants.verify_transition(&before, &after).is_ok());
        }

        clock.advance(3600);
        engine.start_new_round().unwrap();
        let previous = engine.current_period_id() - 1;
        for period in 1..=previous {
            let first = engine.settle_period(period).unwrap().clone();
            let again = engine.settle_period(period);
            prop_assert!(matches!(again, Err(GovernanceError::AlreadySettled(_))));
            prop_assert_eq!(engine.settlement(period), Some(&first));
        }
        prop_assert!(invariants.verify(&engine.snapshot()).is_ok());
    }
}
