#[path = "common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::sync::Arc;

use blake3::hash;
use common::{GENE_ALIGNMENT, SINGLE_GENE};
use mutscan::genomics::{normalize_pair, render_table, GeneAnnotations, MultiAlignmentReader, TrailingRuns};
use mutscan::pipeline::{ScanConfig, ScanCounts, ScanSummary, Scanner};

fn scan() -> ScanSummary {
    let annotations = GeneAnnotations::parse(SINGLE_GENE.as_bytes()).expect("annotations parse");
    let mut scanner = Scanner::new(&ScanConfig::for_gene(1), &annotations).expect("gene resolves");
    scanner
        .scan_multi(MultiAlignmentReader::new(GENE_ALIGNMENT.as_bytes(), "gene.maf"))
        .expect("scan succeeds");
    scanner.finish().expect("sequences counted")
}

#[test]
fn repeated_scans_produce_identical_tables() {
    let mut fingerprints = HashSet::new();
    let mut tables = HashSet::new();
    for _ in 0..5 {
        let summary = scan();
        fingerprints.insert(summary.fingerprint());
        let rendered = render_table(&summary.position_rows()).expect("rendering succeeds")
            + &render_table(&summary.deletion_run_rows()).expect("rendering succeeds")
            + &summary.substitution_sites().expect("rendering succeeds");
        tables.insert(hash(rendered.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "counters diverged across runs");
    assert_eq!(tables.len(), 1, "tables diverged across runs");
}

#[test]
fn sharded_counts_match_a_single_pass() {
    let pairs: Vec<_> = MultiAlignmentReader::new(GENE_ALIGNMENT.as_bytes(), "gene.maf")
        .collect::<Result<_, _>>()
        .expect("pairs parse");

    let count = |pairs: &[mutscan::genomics::AlignmentPair]| {
        let mut counts = ScanCounts::new(8, true, TrailingRuns::Discard);
        for pair in pairs {
            let normalized =
                normalize_pair(&pair.reference.sequence, &pair.query.sequence, 8).expect("frame");
            counts.observe(&normalized, &pair.query.id).expect("frame");
        }
        counts
    };

    let mut sharded = count(&pairs[..1]);
    sharded.merge(count(&pairs[1..]));

    let merged = sharded.freeze().expect("non-empty");
    assert_eq!(merged.fingerprint(), scan().fingerprint());
    assert_eq!(merged, scan());
}

#[test]
fn fingerprint_tracks_contributing_ids() {
    let mut counts = ScanCounts::new(4, true, TrailingRuns::Discard);
    let pair = normalize_pair(b"ACGT", b"ACGA", 4).unwrap();
    counts.observe(&pair, &Arc::from("a")).unwrap();
    let first = counts.clone().freeze().unwrap().fingerprint();

    let mut renamed = ScanCounts::new(4, true, TrailingRuns::Discard);
    renamed.observe(&pair, &Arc::from("b")).unwrap();
    assert_ne!(first, renamed.freeze().unwrap().fingerprint());
}
