//! Frequency tables derived from the final counters.
//!
//! Every frequency is `count / N` in double precision, where `N` is the number
//! of processed sequences.

use std::cmp::Ordering;
use std::io::Write;
use std::num::NonZeroU64;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::deletions::DeletionRunCounter;
use super::substitutions::PositionCounts;
use super::types::GroupId;
use crate::util::write_atomically;

/// Row type of an output table with a fixed header.
pub trait TableRow: Serialize {
    /// Column names, written even when the table has no rows.
    const HEADER: &'static [&'static str];
}

/// One row per frame position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    /// 0-based position in the gene frame.
    #[serde(rename = "Index")]
    pub index: usize,
    /// Substitutions to any nucleotide.
    #[serde(rename = "Substitution_Count")]
    pub substitution_count: u64,
    /// Gaps at this position.
    #[serde(rename = "Deletion_Count")]
    pub deletion_count: u64,
    /// `substitution_count / N`.
    #[serde(rename = "Substitution_Freq")]
    pub substitution_freq: f64,
    /// `deletion_count / N`.
    #[serde(rename = "Deletion_Freq")]
    pub deletion_freq: f64,
}

impl TableRow for PositionRow {
    const HEADER: &'static [&'static str] = &[
        "Index",
        "Substitution_Count",
        "Deletion_Count",
        "Substitution_Freq",
        "Deletion_Freq",
    ];
}

/// One row per observed `(start, length)` deletion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionRunRow {
    /// 1-based first deleted position.
    #[serde(rename = "Starting_Nucleotide_Position")]
    pub start: usize,
    /// Run length.
    #[serde(rename = "Deletion_Length")]
    pub length: usize,
    /// 1-based last deleted position.
    #[serde(rename = "Ending_Nucleotide_Position")]
    pub end: usize,
    /// Occurrences of this run.
    #[serde(rename = "Deletion_Count")]
    pub count: u64,
    /// `count / N`.
    #[serde(rename = "Deletion_Freq")]
    pub frequency: f64,
    /// Sequences with at least one gap.
    #[serde(rename = "Num_Sequences_With_Deletions")]
    pub sequences_with_deletions: u64,
    /// `sequences_with_deletions / N`.
    #[serde(rename = "Ratio_With_Deletions")]
    pub ratio_with_deletions: f64,
}

impl TableRow for DeletionRunRow {
    const HEADER: &'static [&'static str] = &[
        "Starting_Nucleotide_Position",
        "Deletion_Length",
        "Ending_Nucleotide_Position",
        "Deletion_Count",
        "Deletion_Freq",
        "Num_Sequences_With_Deletions",
        "Ratio_With_Deletions",
    ];
}

/// One row per deletion length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionLengthRow {
    /// Run length.
    #[serde(rename = "Deletion Length")]
    pub length: usize,
    /// Sequences with at least one run of this length.
    #[serde(rename = "Count")]
    pub count: u64,
    /// `count / N`.
    #[serde(rename = "Frequency")]
    pub frequency: f64,
}

impl TableRow for DeletionLengthRow {
    const HEADER: &'static [&'static str] = &["Deletion Length", "Count", "Frequency"];
}

/// `count / total` without rounding.
pub fn frequency(count: u64, total: NonZeroU64) -> f64 {
    count as f64 / total.get() as f64
}

/// Position table; always one row per frame position.
pub fn position_rows(counts: &PositionCounts, total: NonZeroU64) -> Vec<PositionRow> {
    counts
        .iter()
        .enumerate()
        .map(|(index, tally)| {
            let substitution_count = tally.substitution_count();
            let deletion_count = tally.deletion_count();
            PositionRow {
                index,
                substitution_count,
                deletion_count,
                substitution_freq: frequency(substitution_count, total),
                deletion_freq: frequency(deletion_count, total),
            }
        })
        .collect()
}

/// Deletion-run table ordered by start, then length.
pub fn deletion_run_rows(
    runs: &DeletionRunCounter,
    total: NonZeroU64,
    sequences_with_deletions: u64,
) -> Vec<DeletionRunRow> {
    let ratio_with_deletions = frequency(sequences_with_deletions, total);
    runs.runs()
        .map(|(start, length, count)| DeletionRunRow {
            start: start + 1,
            length,
            end: start + length,
            count,
            frequency: frequency(count, total),
            sequences_with_deletions,
            ratio_with_deletions,
        })
        .collect()
}

/// Deletion-length table in ascending length order.
pub fn deletion_length_rows(runs: &DeletionRunCounter, total: NonZeroU64) -> Vec<DeletionLengthRow> {
    runs.histogram()
        .iter()
        .map(|(&length, &count)| DeletionLengthRow {
            length,
            count,
            frequency: frequency(count, total),
        })
        .collect()
}

/// Write rows as comma-separated text with a header line.
pub fn write_table<W: Write, T: TableRow>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv.write_record(T::HEADER)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Render rows into a string (useful for tests and snapshots).
pub fn render_table<T: TableRow>(rows: &[T]) -> Result<String> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, rows)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered table is not valid UTF-8"))
}

/// Write rows to `path` via a temporary file, so the table is complete or absent.
pub fn save_table<T: TableRow>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let mut buffer = Vec::new();
    write_table(&mut buffer, rows)?;
    write_atomically(path, |w| w.write_all(&buffer))
        .with_context(|| format!("failed to write table {}", path.display()))
}

/// Write the per-site substitution report to `path` via a temporary file.
pub fn save_substitution_sites(path: impl AsRef<Path>, counts: &PositionCounts) -> Result<()> {
    let path = path.as_ref();
    let mut buffer = Vec::new();
    write_substitution_sites(&mut buffer, counts)?;
    write_atomically(path, |w| w.write_all(&buffer))
        .with_context(|| format!("failed to write report {}", path.display()))
}

/// Write the per-site substitution report.
///
/// One line per position with any entry:
/// `index : symbols : < X : count : id id ... > ...`, symbols in byte order and
/// ids in natural order.
pub fn write_substitution_sites<W: Write>(writer: &mut W, counts: &PositionCounts) -> Result<()> {
    for (index, tally) in counts.iter().enumerate() {
        let observed: Vec<_> = tally.observed().collect();
        if observed.is_empty() {
            continue;
        }

        write!(writer, "{index} : {} : ", observed.len())?;
        for (symbol, entry) in observed {
            write!(writer, "< {symbol} : {} : ", entry.count)?;
            let mut groups: Vec<&GroupId> = entry.groups.iter().collect();
            groups.sort_by(|a, b| natural_cmp(a, b));
            for group in groups {
                write!(writer, "{group} ")?;
            }
            write!(writer, "> ")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the per-site substitution report into a string.
pub fn render_substitution_sites(counts: &PositionCounts) -> Result<String> {
    let mut buffer = Vec::new();
    write_substitution_sites(&mut buffer, counts)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered report is not valid UTF-8"))
}

/// Numeric ids compare as numbers, anything else lexically.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
