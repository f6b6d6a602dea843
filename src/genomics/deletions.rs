//! Contiguous deletion run segmentation.
//!
//! A run is a maximal span of gap characters in the normalized query. Runs are
//! keyed by their 0-based start position and length; the length histogram
//! counts sequences, not occurrences.

use std::collections::BTreeMap;

use bitvec::prelude::*;

use super::types::GAP;

/// What to do with a run that is still open when the query ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingRuns {
    /// Never record a run that reaches the end of the query. Matches the
    /// historical tables, which only closed a run on a following base.
    #[default]
    Discard,
    /// Flush the open run at the end of the scan like any other run.
    Record,
}

/// `(start, length) -> occurrences` table plus the per-sequence length histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRunCounter {
    runs: Vec<BTreeMap<usize, u64>>,
    histogram: BTreeMap<usize, u64>,
    seen: BitVec,
    trailing: TrailingRuns,
}

impl DeletionRunCounter {
    /// Empty counter over a frame of `len` positions.
    pub fn new(len: usize, trailing: TrailingRuns) -> Self {
        Self {
            runs: vec![BTreeMap::new(); len],
            histogram: BTreeMap::new(),
            seen: bitvec![0; len + 1],
            trailing,
        }
    }

    /// Segment one normalized query and fold its runs in.
    ///
    /// Returns the number of runs recorded for this query.
    pub fn observe(&mut self, query: &[u8]) -> usize {
        debug_assert_eq!(query.len(), self.runs.len());

        let mut recorded = 0;
        let mut run = 0usize;
        for (i, &symbol) in query.iter().enumerate() {
            if symbol == GAP {
                run += 1;
            } else if run > 0 {
                self.record(i - run, run);
                recorded += 1;
                run = 0;
            }
        }
        if run > 0 && self.trailing == TrailingRuns::Record {
            self.record(query.len() - run, run);
            recorded += 1;
        }

        for length in self.seen.iter_ones() {
            *self.histogram.entry(length).or_insert(0) += 1;
        }
        self.seen.fill(false);

        recorded
    }

    fn record(&mut self, start: usize, length: usize) {
        *self.runs[start].entry(length).or_insert(0) += 1;
        self.seen.set(length, true);
    }

    /// Add another shard's runs and histogram.
    ///
    /// # Panics
    ///
    /// Panics if the frames differ in length.
    pub fn merge(&mut self, other: DeletionRunCounter) {
        assert_eq!(
            self.runs.len(),
            other.runs.len(),
            "cannot merge deletion runs over different frames"
        );
        for (mine, theirs) in self.runs.iter_mut().zip(other.runs) {
            for (length, count) in theirs {
                *mine.entry(length).or_insert(0) += count;
            }
        }
        for (length, count) in other.histogram {
            *self.histogram.entry(length).or_insert(0) += count;
        }
    }

    /// Occurrences of a run starting at `start` with `length` gaps.
    pub fn run_count(&self, start: usize, length: usize) -> u64 {
        self.runs
            .get(start)
            .and_then(|lengths| lengths.get(&length))
            .copied()
            .unwrap_or(0)
    }

    /// All recorded runs as `(start, length, count)`, ordered by start then length.
    pub fn runs(&self) -> impl Iterator<Item = (usize, usize, u64)> + '_ {
        self.runs.iter().enumerate().flat_map(|(start, lengths)| {
            lengths
                .iter()
                .map(move |(&length, &count)| (start, length, count))
        })
    }

    /// Number of sequences with at least one run of each length.
    pub fn histogram(&self) -> &BTreeMap<usize, u64> {
        &self.histogram
    }

    /// Frame length.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Policy applied to runs reaching the end of the query.
    pub fn trailing(&self) -> TrailingRuns {
        self.trailing
    }
}
