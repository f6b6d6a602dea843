//! Genomics primitives: annotation and alignment parsing, frame
//! normalization, the two per-pair counters and the output tables.
//!
//! Everything here works on a single gene frame of fixed length `L`; the
//! [`pipeline`](crate::pipeline) module drives these pieces over a corpus.

mod alignment;
mod annotation;
mod deletions;
mod normalize;
mod substitutions;
mod tables;
mod types;

pub use alignment::{
    extract_pair, parse_sequence_line, read_pair_file, AlignmentError, AlignmentPair,
    MultiAlignmentReader, SequenceRecord, SEQUENCE_MARKER,
};
pub use annotation::{
    parse_location, CodingRange, GeneAnnotations, GeneLocation, GeneRecord, ParseError,
    HEADER_MARKER,
};
pub use deletions::{DeletionRunCounter, TrailingRuns};
pub use normalize::{normalize_pair, strip_insertions, GeneFrame, NormalizeError, NormalizedPair};
pub use substitutions::{PositionCounts, PositionTally, SymbolTally};
pub use tables::{
    deletion_length_rows, deletion_run_rows, frequency, position_rows, render_substitution_sites,
    render_table, save_substitution_sites, save_table, write_substitution_sites, write_table,
    DeletionLengthRow, DeletionRunRow, PositionRow, TableRow,
};
pub use types::{GroupId, Symbol, ALPHABET_SIZE, GAP};
