//! Reference-frame normalization of aligned pairs.
//!
//! Columns where the reference carries a gap are insertions present only in
//! the query; dropping them registers every remaining column to a reference
//! coordinate, which is the frame all counters index into.

use thiserror::Error;

use super::alignment::AlignmentPair;
use super::annotation::{CodingRange, GeneRecord};
use super::types::GAP;

/// Errors raised while normalizing a pair.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The raw aligned rows are not the same length.
    #[error("raw aligned rows differ in length: reference {reference}, query {query}")]
    RawLengthMismatch {
        /// Raw reference length.
        reference: usize,
        /// Raw query length.
        query: usize,
    },

    /// The normalized pair does not match the gene length.
    #[error("normalized pair has length {reference}/{query}, expected {expected}")]
    LengthMismatch {
        /// Expected frame length.
        expected: usize,
        /// Normalized reference length.
        reference: usize,
        /// Normalized query length.
        query: usize,
    },

    /// A gene range is not covered by the aligned reference.
    #[error("gene range {range} lies outside the aligned frame at {frame_start} ({frame_len} bases)")]
    GeneOutOfFrame {
        /// Offending range (1-based, inclusive).
        range: CodingRange,
        /// 0-based start of the aligned reference.
        frame_start: u64,
        /// Number of reference bases in the aligned frame.
        frame_len: usize,
    },
}

/// Reference-registered pair of equal, fixed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPair {
    reference: Vec<u8>,
    query: Vec<u8>,
}

impl NormalizedPair {
    /// Reference row; never contains a gap.
    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// Query row; gaps mark deletions.
    pub fn query(&self) -> &[u8] {
        &self.query
    }

    /// Frame length `L`.
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Whether the query has at least one gap.
    pub fn has_deletion(&self) -> bool {
        self.query.contains(&GAP)
    }

    /// Consume into `(reference, query)`.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.reference, self.query)
    }

    fn checked(reference: Vec<u8>, query: Vec<u8>, expected: usize) -> Result<Self, NormalizeError> {
        if reference.len() != expected || query.len() != expected {
            return Err(NormalizeError::LengthMismatch {
                expected,
                reference: reference.len(),
                query: query.len(),
            });
        }
        Ok(Self { reference, query })
    }
}

/// Drop every column where the reference has a gap.
///
/// No length check is applied beyond requiring equal raw lengths.
pub fn strip_insertions(reference: &[u8], query: &[u8]) -> Result<(Vec<u8>, Vec<u8>), NormalizeError> {
    if reference.len() != query.len() {
        return Err(NormalizeError::RawLengthMismatch {
            reference: reference.len(),
            query: query.len(),
        });
    }

    let mut new_ref = Vec::with_capacity(reference.len());
    let mut new_query = Vec::with_capacity(query.len());
    for (&r, &q) in reference.iter().zip(query) {
        if r == GAP {
            continue;
        }
        new_ref.push(r);
        new_query.push(q);
    }
    Ok((new_ref, new_query))
}

/// Remove insertion columns and check the result against the frame length.
pub fn normalize_pair(
    reference: &[u8],
    query: &[u8],
    expected_len: usize,
) -> Result<NormalizedPair, NormalizeError> {
    let (reference, query) = strip_insertions(reference, query)?;
    NormalizedPair::checked(reference, query, expected_len)
}

/// Coordinate frame of one gene, used to cut a gene out of a whole-genome
/// alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneFrame {
    ranges: Vec<CodingRange>,
    len: usize,
}

impl GeneFrame {
    /// Frame covering the gene's ranges in exon order.
    pub fn from_gene(gene: &GeneRecord) -> Self {
        Self::from_ranges(gene.location.ranges().to_vec())
    }

    /// Frame over explicit ranges.
    pub fn from_ranges(ranges: Vec<CodingRange>) -> Self {
        let len = ranges.iter().map(CodingRange::len).sum();
        Self { ranges, len }
    }

    /// Length of the projected frame.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the frame covers no bases.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ranges in exon order.
    pub fn ranges(&self) -> &[CodingRange] {
        &self.ranges
    }

    /// Normalize a whole-genome pair and cut out the gene.
    ///
    /// The stripped reference starts at `pair.reference.start` (0-based), so
    /// a 1-based range `s..=e` maps to `[s - 1 - start, e - start)`.
    pub fn project(&self, pair: &AlignmentPair) -> Result<NormalizedPair, NormalizeError> {
        let (reference, query) = strip_insertions(&pair.reference.sequence, &pair.query.sequence)?;
        let frame_start = pair.reference.start;

        let mut gene_ref = Vec::with_capacity(self.len);
        let mut gene_query = Vec::with_capacity(self.len);
        for range in &self.ranges {
            let out_of_frame = || NormalizeError::GeneOutOfFrame {
                range: *range,
                frame_start,
                frame_len: reference.len(),
            };
            let lo = range
                .start
                .checked_sub(1)
                .and_then(|start| start.checked_sub(frame_start))
                .ok_or_else(out_of_frame)? as usize;
            let hi = range.end.checked_sub(frame_start).ok_or_else(out_of_frame)? as usize;
            if lo > hi || hi > reference.len() {
                return Err(out_of_frame());
            }
            gene_ref.extend_from_slice(&reference[lo..hi]);
            gene_query.extend_from_slice(&query[lo..hi]);
        }

        NormalizedPair::checked(gene_ref, gene_query, self.len)
    }
}
