//! # Streaming mutation and deletion counting over aligned genomes
//!
//! This library counts point substitutions and contiguous deletions in one
//! gene across a large corpus of sequences aligned to a reference genome.
//!
//! ## Pipeline
//!
//! 1. **Annotation**: parse the gene table and resolve the gene frame of length `L`
//! 2. **Alignment**: stream reference/query pairs from a multi-alignment file or
//!    a directory of pairwise alignment files
//! 3. **Normalization**: drop reference-gap columns, projecting whole-genome
//!    pairs onto the gene's coding ranges
//! 4. **Counting**: fold each pair into per-position tallies and a deletion-run
//!    table, reporting progress to a ledger
//! 5. **Tables**: freeze the counters and write frequency tables
//!
//! Memory is `O(L)` plus the contributing-id lists, independent of corpus size.
//!
//! ## Usage Example
//!
//! ```ignore
//! use mutscan::{GeneAnnotations, ScanConfig, Scanner, MultiAlignmentReader};
//!
//! let annotations = GeneAnnotations::from_path("genes.txt")?;
//! let mut scanner = Scanner::new(&ScanConfig::for_gene(3), &annotations)?;
//! scanner.scan_multi(MultiAlignmentReader::from_path("spike.maf")?)?;
//! let summary = scanner.finish()?;
//! println!("{} sequences", summary.total());
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod genomics; // Parsing, normalization, counters and tables
pub mod ledger;   // Streaming progress tracking
pub mod pipeline; // Scan drivers
pub mod util;     // Helper functions

// Re-exports for convenience
pub use genomics::{
    AlignmentPair, DeletionRunCounter, GeneAnnotations, GeneRecord, MultiAlignmentReader,
    NormalizedPair, PositionCounts, Symbol, TrailingRuns,
};
pub use ledger::{NoProgress, ProgressFile, ProgressLedger, ProgressSink};
pub use pipeline::{
    scan_multi_file, scan_pairwise_dir, Exclusions, OutputPaths, ScanConfig, ScanCounts,
    ScanError, ScanSummary, Scanner,
};
