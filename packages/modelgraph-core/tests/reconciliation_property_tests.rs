//! Property-based tests for sequence synchronization
//!
//! Invariants that hold for every pair of sequences:
//! - Shape: the result has one item per right item, in right order
//! - Accounting: created + updated == right, updated + destroyed == left
//! - Identity: a surviving item keeps its identity
//! - Stability: synchronizing a sequence with itself creates nothing

use modelgraph_core::{synchronize, SyncHandler};
use proptest::prelude::*;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::convert::Infallible;

/// Live object: a key plus an identity assigned at creation
#[derive(Debug, Clone, PartialEq)]
struct Item {
    key: u8,
    id: usize,
}

#[derive(Default)]
struct Recorder {
    next_id: usize,
    destroyed: Vec<usize>,
}

impl Recorder {
    fn starting_at(next_id: usize) -> Self {
        Self {
            next_id,
            destroyed: Vec::new(),
        }
    }
}

impl SyncHandler<Item, u8> for Recorder {
    type Error = Infallible;

    fn left_only(&mut self, left: Item) -> Result<(), Infallible> {
        self.destroyed.push(left.id);
        Ok(())
    }

    fn right_only(&mut self, right: &u8, _index: usize) -> Result<Option<Item>, Infallible> {
        self.next_id += 1;
        Ok(Some(Item {
            key: *right,
            id: self.next_id,
        }))
    }

    fn common(&mut self, _left: &mut Item, _right: &u8, _index: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

fn live(keys: &[u8]) -> Vec<Item> {
    keys.iter()
        .enumerate()
        .map(|(id, key)| Item { key: *key, id })
        .collect()
}

fn run(old: &[u8], new: &[u8]) -> (Vec<Item>, Recorder, modelgraph_core::SyncStats) {
    let mut left = live(old);
    let right: Vec<&u8> = new.iter().collect();
    let mut recorder = Recorder::starting_at(old.len());
    let stats = match synchronize(&mut left, &right, |l, r| l.key == *r, &mut recorder) {
        Ok(stats) => stats,
        Err(never) => match never {},
    };
    (left, recorder, stats)
}

// ============================================================================
// QuickCheck Tests
// ============================================================================

#[quickcheck]
fn qc_result_follows_right_order(old: Vec<u8>, new: Vec<u8>) -> bool {
    let (left, _, _) = run(&old, &new);
    left.iter().map(|i| i.key).collect::<Vec<_>>() == new
}

#[quickcheck]
fn qc_stats_account_for_every_item(old: Vec<u8>, new: Vec<u8>) -> bool {
    let (_, recorder, stats) = run(&old, &new);
    stats.created + stats.updated == new.len()
        && stats.updated + stats.destroyed == old.len()
        && recorder.destroyed.len() == stats.destroyed
}

#[quickcheck]
fn qc_self_sync_is_stable(keys: Vec<u8>) -> bool {
    let (left, _, stats) = run(&keys, &keys);
    stats.is_stable() && left == live(&keys)
}

#[quickcheck]
fn qc_reverse_keeps_identities(keys: Vec<u8>) -> TestResult {
    let mut unique = keys.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != keys.len() {
        return TestResult::discard();
    }
    let reversed: Vec<u8> = keys.iter().rev().copied().collect();
    let (left, _, stats) = run(&keys, &reversed);
    let expected: Vec<usize> = (0..keys.len()).rev().collect();
    TestResult::from_bool(stats.is_stable() && left.iter().map(|i| i.id).collect::<Vec<_>>() == expected)
}

// ============================================================================
// Proptest Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_survivors_keep_identity(
        old in prop::collection::vec(0u8..8, 0..12),
        new in prop::collection::vec(0u8..8, 0..12),
    ) {
        let (left, recorder, _) = run(&old, &new);
        for item in &left {
            if item.id < old.len() {
                // An old identity still carries the key it was created with
                prop_assert_eq!(old[item.id], item.key);
                prop_assert!(!recorder.destroyed.contains(&item.id));
            }
        }
        let mut seen: Vec<usize> = left.iter().map(|i| i.id).chain(recorder.destroyed.iter().copied()).collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), left.len() + recorder.destroyed.len());
    }

    #[test]
    fn prop_new_items_only_when_needed(
        old in prop::collection::vec(0u8..4, 0..10),
        new in prop::collection::vec(0u8..4, 0..10),
    ) {
        let (_, _, stats) = run(&old, &new);
        // Each key is created only as often as the new sequence outnumbers the old one
        let expected: usize = (0u8..4)
            .map(|k| {
                let before = old.iter().filter(|x| **x == k).count();
                let after = new.iter().filter(|x| **x == k).count();
                after.saturating_sub(before)
            })
            .sum();
        prop_assert_eq!(stats.created, expected);
    }

    #[test]
    fn prop_appending_is_pure_creation(
        old in prop::collection::vec(any::<u8>(), 0..10),
        extra in prop::collection::vec(any::<u8>(), 0..5),
    ) {
        let mut new = old.clone();
        new.extend(&extra);
        let (left, _, stats) = run(&old, &new);
        prop_assert_eq!(stats.destroyed, 0);
        prop_assert_eq!(stats.created, extra.len());
        prop_assert_eq!(&left[..old.len()], &live(&old)[..]);
    }
}
