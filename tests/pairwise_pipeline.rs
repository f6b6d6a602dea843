#[path = "common/mod.rs"]
mod common;

use std::fs;

use common::{write_fixture, JOINED_GENE, SINGLE_GENE};
use mutscan::genomics::{GeneAnnotations, NormalizeError};
use mutscan::ledger::ProgressFile;
use mutscan::pipeline::{scan_pairwise_dir, Exclusions, ScanConfig, ScanError, Scanner};

// Reference "GG ATCG TT ATCG CCCCCCCC"; the gene is the two ATCG exons.
const WITH_INSERTION: &str = "\
a score=100
s REF 0 20 + 20 GGATCG-TTATCGCCCCCCCC
s MW000001.1 0 19 + 19 GGAT--ATTATCACCCCCCCC
";

const INTRON_ONLY: &str = "\
a score=100
s REF 0 20 + 20 GGATCGTTATCGCCCCCCCC
s MW000002.1 0 20 + 20 GGATCGAAATCGCCCCCCCC
";

const REFERENCE_ONLY: &str = "s REF 0 20 + 20 GGATCGTTATCGCCCCCCCC\n";

fn joined() -> GeneAnnotations {
    GeneAnnotations::parse(JOINED_GENE.as_bytes()).expect("annotations parse")
}

#[test]
fn directory_scan_projects_joined_gene() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("alignments");
    fs::create_dir(&inputs).unwrap();
    write_fixture(&inputs, "a.maf", WITH_INSERTION);
    write_fixture(&inputs, "b.maf", INTRON_ONLY);
    write_fixture(&inputs, "c.maf", REFERENCE_ONLY);
    write_fixture(&inputs, "d.maf", "s broken\n");

    let exclusions: Exclusions = ["d.maf"].into_iter().collect();
    let progress = dir.path().join("progress.txt");
    let config = ScanConfig::for_gene(1).with_progress_interval(1);
    let summary = scan_pairwise_dir(
        &config,
        &joined(),
        &inputs,
        &exclusions,
        ProgressFile::new(&progress),
    )
    .unwrap();

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.counts().skipped(), 1);
    assert_eq!(fs::read_to_string(&progress).unwrap(), "2\n");

    let rows = summary.position_rows();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[2].deletion_count, 1);
    assert_eq!(rows[2].deletion_freq, 0.5);
    assert_eq!(rows[7].substitution_count, 1);
    assert_eq!(rows.iter().map(|row| row.substitution_count).sum::<u64>(), 1);

    let runs = summary.deletion_run_rows();
    assert_eq!(runs.len(), 1);
    assert_eq!((runs[0].start, runs[0].length, runs[0].end), (3, 2, 4));
    assert_eq!(runs[0].sequences_with_deletions, 1);
    assert_eq!(runs[0].ratio_with_deletions, 0.5);
}

#[test]
fn malformed_file_is_fatal_unless_excluded() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "a.maf", WITH_INSERTION);
    write_fixture(dir.path(), "d.maf", "s broken\n");

    let config = ScanConfig::for_gene(1);
    let err = scan_pairwise_dir(&config, &joined(), dir.path(), &Exclusions::default(), |_: u64| {
        Ok::<(), mutscan::ledger::ProgressError>(())
    })
    .unwrap_err();
    assert!(matches!(err, ScanError::Alignment(_)));
}

#[test]
fn gene_outside_alignment_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "a.maf", INTRON_ONLY);

    // The single gene sits at 21563..21570, far beyond this 20-base alignment.
    let annotations = GeneAnnotations::parse(SINGLE_GENE.as_bytes()).unwrap();
    let mut scanner = Scanner::new(&ScanConfig::for_gene(1), &annotations).unwrap();
    let err = scanner.scan_pairwise([&path], &Exclusions::default()).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Normalize {
            source: NormalizeError::GeneOutOfFrame { .. },
            ..
        }
    ));
}

#[test]
fn only_skipped_files_is_an_empty_scan() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "c.maf", REFERENCE_ONLY);

    let mut scanner = Scanner::new(&ScanConfig::for_gene(1), &joined()).unwrap();
    scanner
        .scan_pairwise([dir.path().join("c.maf")], &Exclusions::default())
        .unwrap();
    assert_eq!(scanner.counts().skipped(), 1);
    assert!(matches!(scanner.finish(), Err(ScanError::EmptyScan)));
}

#[test]
fn exclusion_list_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_fixture(dir.path(), "exclude.txt", "b.maf\n\nd.maf\n");
    let exclusions = Exclusions::from_path(&list).unwrap();
    assert_eq!(exclusions.len(), 2);
    assert!(exclusions.contains(&dir.path().join("d.maf")));
}
