//! Scan drivers.
//!
//! A [`Scanner`] owns the counters for one gene and folds alignment pairs into
//! them, either from a single multi-alignment file whose rows are already in
//! the gene frame, or from a directory of whole-genome pairwise alignments that
//! are projected onto the gene first. The scan is a single read-only pass: the
//! tables are only produced once it has completed.

mod config;
mod counts;
mod exclusions;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::genomics::{
    normalize_pair, read_pair_file, AlignmentError, AlignmentPair, GeneAnnotations, GeneFrame,
    GeneRecord, MultiAlignmentReader, NormalizeError, NormalizedPair, ParseError,
};
use crate::ledger::{NoProgress, ProgressError, ProgressLedger, ProgressSink};

pub use config::ScanConfig;
pub use counts::{OutputPaths, ScanCounts, ScanSummary};
pub use exclusions::{list_alignment_files, Exclusions};

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Annotation input could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Alignment input could not be read.
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    /// A pair could not be registered to the gene frame.
    #[error("{origin}: {source}")]
    Normalize {
        /// Input the pair came from.
        origin: String,
        /// Normalization failure.
        #[source]
        source: NormalizeError,
    },

    /// Progress could not be reported.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// The configured gene is not annotated.
    #[error("gene {0} is not present in the annotations")]
    UnknownGene(u32),

    /// The configuration cannot drive a scan.
    #[error("invalid scan configuration: {0}")]
    InvalidConfiguration(String),

    /// No sequence was counted, so no frequency is defined.
    #[error("no sequences were processed")]
    EmptyScan,

    /// Filesystem failure outside the alignment readers.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Counting pass over one gene.
pub struct Scanner<S = NoProgress> {
    gene: GeneRecord,
    frame: GeneFrame,
    length: usize,
    counts: ScanCounts,
    ledger: ProgressLedger<S>,
    reference_checked: bool,
}

impl Scanner<NoProgress> {
    /// Scanner without progress reporting.
    pub fn new(config: &ScanConfig, annotations: &GeneAnnotations) -> Result<Self, ScanError> {
        Self::with_progress(config, annotations, NoProgress)
    }
}

impl<S: ProgressSink> Scanner<S> {
    /// Scanner reporting to `sink` every `config.progress_interval` sequences.
    pub fn with_progress(
        config: &ScanConfig,
        annotations: &GeneAnnotations,
        sink: S,
    ) -> Result<Self, ScanError> {
        let (gene, length) = config.resolve(annotations)?;
        info!(
            gene_number = gene.gene_number,
            gene = %gene.gene_name,
            length,
            "scanning gene"
        );
        Ok(Self {
            gene: gene.clone(),
            frame: GeneFrame::from_gene(gene),
            length,
            counts: ScanCounts::new(length, config.track_groups, config.trailing_runs),
            ledger: ProgressLedger::new(sink, config.progress_interval),
            reference_checked: false,
        })
    }

    /// Gene under study.
    pub fn gene(&self) -> &GeneRecord {
        &self.gene
    }

    /// Frame length `L`.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Counters accumulated so far.
    pub fn counts(&self) -> &ScanCounts {
        &self.counts
    }

    /// Count a pair whose rows are already restricted to the gene.
    pub fn observe_gene_pair(&mut self, pair: &AlignmentPair) -> Result<(), ScanError> {
        let normalized = normalize_pair(&pair.reference.sequence, &pair.query.sequence, self.length)
            .map_err(|source| ScanError::Normalize {
                origin: format!("query {}", pair.query.id),
                source,
            })?;
        self.count(&normalized, pair)
    }

    /// Cut the gene out of a whole-genome pair and count it.
    pub fn observe_genome_pair(&mut self, pair: &AlignmentPair, origin: &str) -> Result<(), ScanError> {
        let normalized = self
            .frame
            .project(pair)
            .map_err(|source| ScanError::Normalize {
                origin: origin.to_string(),
                source,
            })?;
        self.count(&normalized, pair)
    }

    /// Count every pair of a multi-alignment stream.
    pub fn scan_multi<R: BufRead>(&mut self, reader: MultiAlignmentReader<R>) -> Result<(), ScanError> {
        for pair in reader {
            self.observe_gene_pair(&pair?)?;
        }
        Ok(())
    }

    /// Count one pairwise alignment file per path.
    ///
    /// Excluded files are passed over silently; files without a complete pair
    /// are logged and counted as skipped. Every other failure aborts the scan.
    pub fn scan_pairwise<I, P>(&mut self, paths: I, exclusions: &Exclusions) -> Result<(), ScanError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut excluded = 0u64;
        for path in paths {
            let path = path.as_ref();
            if exclusions.contains(path) {
                debug!(path = %path.display(), "excluded");
                excluded += 1;
                continue;
            }

            let pair = match read_pair_file(path) {
                Ok(pair) => pair,
                Err(err @ AlignmentError::MissingAlignment { .. }) => {
                    warn!(%err, "skipping file");
                    self.counts.skip();
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            self.observe_genome_pair(&pair, &path.display().to_string())?;
        }
        if excluded > 0 {
            info!(excluded, "files excluded");
        }
        Ok(())
    }

    /// Report final progress and freeze the counters.
    pub fn finish(mut self) -> Result<ScanSummary, ScanError> {
        let processed = self.ledger.finish()?;
        let summary = self.counts.freeze()?;
        info!(
            sequences = processed,
            with_deletions = summary.counts().sequences_with_deletions(),
            skipped = summary.counts().skipped(),
            "scan complete"
        );
        let unrecognized = summary.unrecognized();
        if unrecognized > 0 {
            warn!(unrecognized, "positions with unrecognized symbols were not counted");
        }
        Ok(summary)
    }

    fn count(&mut self, normalized: &NormalizedPair, pair: &AlignmentPair) -> Result<(), ScanError> {
        if !self.reference_checked {
            self.reference_checked = true;
            if !self.gene.matches_coding_sequence(normalized.reference()) {
                warn!(
                    gene = %self.gene.gene_name,
                    reference = %pair.reference.id,
                    "aligned reference differs from the annotated coding sequence"
                );
            }
        }

        self.counts
            .observe(normalized, &pair.query.id)
            .map_err(|source| ScanError::Normalize {
                origin: format!("query {}", pair.query.id),
                source,
            })?;
        self.ledger.record()?;
        Ok(())
    }
}

impl<S> std::fmt::Debug for Scanner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("gene", &self.gene.gene_name)
            .field("length", &self.length)
            .field("sequences", &self.counts.sequences())
            .finish_non_exhaustive()
    }
}

/// Scan a multi-alignment file for the configured gene.
pub fn scan_multi_file<S: ProgressSink>(
    config: &ScanConfig,
    annotations: &GeneAnnotations,
    alignment: impl AsRef<Path>,
    sink: S,
) -> Result<ScanSummary, ScanError> {
    let mut scanner = Scanner::with_progress(config, annotations, sink)?;
    scanner.scan_multi(MultiAlignmentReader::from_path(alignment)?)?;
    scanner.finish()
}

/// Scan every pairwise alignment file in `dir` for the configured gene.
pub fn scan_pairwise_dir<S: ProgressSink>(
    config: &ScanConfig,
    annotations: &GeneAnnotations,
    dir: impl AsRef<Path>,
    exclusions: &Exclusions,
    sink: S,
) -> Result<ScanSummary, ScanError> {
    let paths = list_alignment_files(dir)?;
    let mut scanner = Scanner::with_progress(config, annotations, sink)?;
    scanner.scan_pairwise(&paths, exclusions)?;
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Symbol;

    const ANNOTATIONS: &str = ">id [gene=S] a b [protein=spike glycoprotein] [location=3..10]\nATCGATCG\n";

    fn scanner() -> Scanner {
        let annotations = GeneAnnotations::parse(ANNOTATIONS.as_bytes()).unwrap();
        Scanner::new(&ScanConfig::for_gene(1), &annotations).unwrap()
    }

    #[test]
    fn multi_alignment_is_counted_per_query() {
        let maf = "a\ns ref 0 8 + 8 ATCGATCG\ns q1 0 6 + 6 AT--GATC\n\na\ns ref 0 8 + 8 ATCGATCG\ns q2 0 8 + 8 ATCGATCA\n";
        let mut scanner = scanner();
        scanner
            .scan_multi(MultiAlignmentReader::new(maf.as_bytes(), "test.maf"))
            .unwrap();
        let summary = scanner.finish().unwrap();

        assert_eq!(summary.total(), 2);
        let rows = summary.position_rows();
        assert_eq!(rows[2].deletion_count, 1);
        assert_eq!(rows[7].substitution_count, 2);

        let last = summary.counts().positions().get(7).unwrap();
        let groups: Vec<&str> = last.get(Symbol::A).groups.iter().map(|g| g.as_ref()).collect();
        assert_eq!(groups, ["q2"]);
    }

    #[test]
    fn wrong_length_pair_is_fatal() {
        let maf = "s ref 0 4 + 4 ATCG\ns q1 0 4 + 4 ATCG\n";
        let mut scanner = scanner();
        let err = scanner
            .scan_multi(MultiAlignmentReader::new(maf.as_bytes(), "short.maf"))
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Normalize {
                source: NormalizeError::LengthMismatch { expected: 8, .. },
                ..
            }
        ));
    }

    #[test]
    fn nothing_counted_is_an_empty_scan() {
        assert!(matches!(scanner().finish(), Err(ScanError::EmptyScan)));
    }

    #[test]
    fn genome_pair_is_projected_onto_gene() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.maf"),
            "s ref 0 12 + 12 GGATCGATCGTT\ns q 0 12 + 12 GGAT--ATCGTT\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("b.maf"), "s ref 0 12 + 12 GGATCGATCGTT\n").unwrap();
        std::fs::write(dir.path().join("c.maf"), "garbage that is excluded\n").unwrap();

        let exclusions: Exclusions = ["c.maf"].into_iter().collect();
        let mut scanner = scanner();
        scanner
            .scan_pairwise(list_alignment_files(dir.path()).unwrap(), &exclusions)
            .unwrap();
        let summary = scanner.finish().unwrap();

        assert_eq!(summary.total(), 1);
        assert_eq!(summary.counts().skipped(), 1);
        let runs = summary.deletion_run_rows();
        assert_eq!(runs.len(), 1);
        assert_eq!((runs[0].start, runs[0].length, runs[0].end), (3, 2, 4));
    }
}
