use std::sync::Arc;

use mutscan::genomics::{
    normalize_pair, strip_insertions, DeletionRunCounter, GroupId, TrailingRuns, GAP,
};
use mutscan::pipeline::ScanCounts;
use proptest::prelude::*;

fn base() -> impl Strategy<Value = u8> {
    prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T')]
}

fn query_symbol() -> impl Strategy<Value = u8> {
    prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'-'), Just(b'N')]
}

fn aligned_symbol() -> impl Strategy<Value = u8> {
    prop_oneof![Just(b'A'), Just(b'C'), Just(b'G'), Just(b'T'), Just(b'-')]
}

/// A reference over ACGT and a batch of queries of the same length.
fn batch() -> impl Strategy<Value = (Vec<u8>, Vec<Vec<u8>>)> {
    (1usize..24).prop_flat_map(|len| {
        (
            proptest::collection::vec(base(), len),
            proptest::collection::vec(proptest::collection::vec(query_symbol(), len), 0..6),
        )
    })
}

fn counts_for(reference: &[u8], queries: &[Vec<u8>], tag: &str) -> ScanCounts {
    let mut counts = ScanCounts::new(reference.len(), true, TrailingRuns::Discard);
    for (i, query) in queries.iter().enumerate() {
        let pair = normalize_pair(reference, query, reference.len()).expect("same length");
        let group: GroupId = Arc::from(format!("{tag}{i}"));
        counts.observe(&pair, &group).expect("frame matches");
    }
    counts
}

proptest! {
    #[test]
    fn stripping_removes_reference_gaps_and_is_idempotent(
        rows in (1usize..40).prop_flat_map(|len| (
            proptest::collection::vec(aligned_symbol(), len),
            proptest::collection::vec(aligned_symbol(), len),
        ))
    ) {
        let (reference, query) = rows;
        let (new_ref, new_query) = strip_insertions(&reference, &query).expect("equal rows");

        prop_assert_eq!(new_ref.len(), new_query.len());
        prop_assert!(!new_ref.contains(&GAP));
        prop_assert_eq!(new_ref.len(), reference.iter().filter(|&&b| b != GAP).count());

        let (again_ref, again_query) = strip_insertions(&new_ref, &new_query).expect("equal rows");
        prop_assert_eq!(again_ref, new_ref);
        prop_assert_eq!(again_query, new_query);
    }

    #[test]
    fn recorded_runs_cover_every_gap(
        query in proptest::collection::vec(aligned_symbol(), 1..48)
    ) {
        let mut counter = DeletionRunCounter::new(query.len(), TrailingRuns::Record);
        counter.observe(&query);
        let covered: usize = counter.runs().map(|(_, length, count)| length * count as usize).sum();
        prop_assert_eq!(covered, query.iter().filter(|&&b| b == GAP).count());

        let mut discarding = DeletionRunCounter::new(query.len(), TrailingRuns::Discard);
        discarding.observe(&query);
        let kept: usize = discarding.runs().map(|(_, length, count)| length * count as usize).sum();
        prop_assert!(kept <= covered);
    }

    #[test]
    fn position_gaps_match_query_gaps((reference, queries) in batch()) {
        let counts = counts_for(&reference, &queries, "q");
        let gaps: u64 = queries
            .iter()
            .map(|query| query.iter().filter(|&&b| b == GAP).count() as u64)
            .sum();
        let tallied: u64 = counts.positions().iter().map(|tally| tally.deletion_count()).sum();
        prop_assert_eq!(tallied, gaps);
        prop_assert_eq!(counts.sequences(), queries.len() as u64);
        prop_assert!(counts.sequences_with_deletions() <= counts.sequences());
        for (_, &sequences) in counts.deletions().histogram() {
            prop_assert!(sequences <= counts.sequences());
        }
    }

    #[test]
    fn merge_is_associative(
        (reference, a, b, c) in (1usize..16).prop_flat_map(|len| {
            let queries = || proptest::collection::vec(
                proptest::collection::vec(query_symbol(), len),
                0..4,
            );
            (proptest::collection::vec(base(), len), queries(), queries(), queries())
        })
    ) {
        let shard = |queries: &[Vec<u8>], tag: &str| counts_for(&reference, queries, tag);

        let mut left = shard(&a, "a");
        left.merge(shard(&b, "b"));
        left.merge(shard(&c, "c"));

        let mut tail = shard(&b, "b");
        tail.merge(shard(&c, "c"));
        let mut right = shard(&a, "a");
        right.merge(tail);

        prop_assert_eq!(&left, &right);

        let all: Vec<Vec<u8>> = a.iter().chain(&b).chain(&c).cloned().collect();
        let sequential = counts_for(&reference, &all, "x");
        prop_assert_eq!(left.sequences(), sequential.sequences());
        prop_assert_eq!(left.deletions(), sequential.deletions());
    }
}
