//! Accumulated counters of one scan and their frozen summary.

use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::genomics::{
    deletion_length_rows, deletion_run_rows, position_rows, render_substitution_sites,
    save_substitution_sites, save_table, DeletionLengthRow, DeletionRunCounter, DeletionRunRow,
    GroupId, NormalizeError, NormalizedPair, PositionCounts, PositionRow, TrailingRuns,
};

use super::ScanError;

/// Running counters over a fixed frame of length `L`.
///
/// Counters built over the same frame can be merged in any order, so a corpus
/// can be split into shards and the partial counts combined afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCounts {
    positions: PositionCounts,
    deletions: DeletionRunCounter,
    sequences: u64,
    sequences_with_deletions: u64,
    skipped: u64,
}

impl ScanCounts {
    /// Empty counters for a frame of `len` positions.
    pub fn new(len: usize, track_groups: bool, trailing: TrailingRuns) -> Self {
        Self {
            positions: PositionCounts::new(len, track_groups),
            deletions: DeletionRunCounter::new(len, trailing),
            sequences: 0,
            sequences_with_deletions: 0,
            skipped: 0,
        }
    }

    /// Fold one normalized pair into both counters.
    pub fn observe(&mut self, pair: &NormalizedPair, group: &GroupId) -> Result<(), NormalizeError> {
        if pair.len() != self.len() {
            return Err(NormalizeError::LengthMismatch {
                expected: self.len(),
                reference: pair.reference().len(),
                query: pair.query().len(),
            });
        }

        self.positions.observe(pair.reference(), pair.query(), group);
        self.deletions.observe(pair.query());
        self.sequences += 1;
        if pair.has_deletion() {
            self.sequences_with_deletions += 1;
        }
        Ok(())
    }

    /// Note an input that was passed over without counting.
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Add another shard's counters.
    ///
    /// # Panics
    ///
    /// Panics if the frames differ in length.
    pub fn merge(&mut self, other: ScanCounts) {
        self.positions.merge(other.positions);
        self.deletions.merge(other.deletions);
        self.sequences += other.sequences;
        self.sequences_with_deletions += other.sequences_with_deletions;
        self.skipped += other.skipped;
    }

    /// Frame length `L`.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sequences counted so far (`N`).
    pub fn sequences(&self) -> u64 {
        self.sequences
    }

    /// Sequences with at least one gap.
    pub fn sequences_with_deletions(&self) -> u64 {
        self.sequences_with_deletions
    }

    /// Inputs passed over.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Substitution tallies.
    pub fn positions(&self) -> &PositionCounts {
        &self.positions
    }

    /// Deletion-run tallies.
    pub fn deletions(&self) -> &DeletionRunCounter {
        &self.deletions
    }

    /// Freeze the counters; fails when nothing was counted.
    pub fn freeze(self) -> Result<ScanSummary, ScanError> {
        let total = NonZeroU64::new(self.sequences).ok_or(ScanError::EmptyScan)?;
        Ok(ScanSummary { counts: self, total })
    }
}

/// Final counters with a non-zero sequence total, ready to be tabulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    counts: ScanCounts,
    total: NonZeroU64,
}

impl ScanSummary {
    /// Number of sequences counted (`N`).
    pub fn total(&self) -> u64 {
        self.total.get()
    }

    /// Underlying counters.
    pub fn counts(&self) -> &ScanCounts {
        &self.counts
    }

    /// Query bytes that were neither a nucleotide nor a gap, plus reference
    /// bytes that were not a nucleotide.
    pub fn unrecognized(&self) -> u64 {
        self.counts.positions.unrecognized()
    }

    /// Per-position table.
    pub fn position_rows(&self) -> Vec<PositionRow> {
        position_rows(&self.counts.positions, self.total)
    }

    /// Deletion-run table.
    pub fn deletion_run_rows(&self) -> Vec<DeletionRunRow> {
        deletion_run_rows(
            &self.counts.deletions,
            self.total,
            self.counts.sequences_with_deletions,
        )
    }

    /// Deletion-length table.
    pub fn deletion_length_rows(&self) -> Vec<DeletionLengthRow> {
        deletion_length_rows(&self.counts.deletions, self.total)
    }

    /// Per-site substitution report as text.
    pub fn substitution_sites(&self) -> Result<String> {
        render_substitution_sites(&self.counts.positions)
    }

    /// Digest of every count in the summary.
    ///
    /// Two scans over the same inputs in the same order produce the same
    /// fingerprint.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.counts.len() as u64).to_le_bytes());
        hasher.update(&self.total.get().to_le_bytes());
        hasher.update(&self.counts.sequences_with_deletions.to_le_bytes());
        hasher.update(&self.counts.skipped.to_le_bytes());
        hasher.update(&self.unrecognized().to_le_bytes());

        for tally in self.counts.positions.iter() {
            for (symbol, entry) in tally.observed() {
                hasher.update(&[symbol.as_byte()]);
                hasher.update(&entry.count.to_le_bytes());
                for group in &entry.groups {
                    hasher.update(group.as_bytes());
                    hasher.update(&[0]);
                }
            }
            hasher.update(b"|");
        }
        for (start, length, count) in self.counts.deletions.runs() {
            for value in [start as u64, length as u64, count] {
                hasher.update(&value.to_le_bytes());
            }
        }
        for (&length, &count) in self.counts.deletions.histogram() {
            hasher.update(&(length as u64).to_le_bytes());
            hasher.update(&count.to_le_bytes());
        }
        hasher.finalize()
    }

    /// Write the three tables and the sites report.
    pub fn save(&self, outputs: &OutputPaths) -> Result<()> {
        save_table(&outputs.positions, &self.position_rows())?;
        save_table(&outputs.deletion_runs, &self.deletion_run_rows())?;
        save_table(&outputs.deletion_lengths, &self.deletion_length_rows())?;
        save_substitution_sites(&outputs.sites, &self.counts.positions)?;
        Ok(())
    }
}

/// Destinations of the scan outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Per-position table.
    pub positions: PathBuf,
    /// Deletion-run table.
    pub deletion_runs: PathBuf,
    /// Deletion-length table.
    pub deletion_lengths: PathBuf,
    /// Per-site substitution report.
    pub sites: PathBuf,
}

impl OutputPaths {
    /// Standard file names under `dir`, each starting with `prefix`.
    pub fn with_prefix(dir: impl AsRef<Path>, prefix: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            positions: dir.join(format!("{prefix}_mutation_frequencies.csv")),
            deletion_runs: dir.join(format!("{prefix}_deletion_frequencies.csv")),
            deletion_lengths: dir.join(format!("{prefix}_deletion_lengths.csv")),
            sites: dir.join(format!("{prefix}_substitution_sites.txt")),
        }
    }
}
