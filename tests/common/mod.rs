#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Spike-like gene spanning eight reference bases.
pub const SINGLE_GENE: &str = "\
>lcl|NC_045512.2_cds_1 [gene=S] [locus_tag=GU280_gp02] [db_xref=GeneID:43740568] [protein=surface glycoprotein] [location=21563..21570]
ATCGATCG
";

/// Three queries against the gene: an interior deletion with substitutions,
/// a single substitution, and a short deletion plus a trailing gap.
pub const GENE_ALIGNMENT: &str = "\
##maf version=1
a score=0
s NC_045512.2 21562 8 + 29903 ATCGATCG
s q1 0 6 + 6 AT--GATC

a score=0
s NC_045512.2 21562 8 + 29903 ATCGATCG
s q2 0 8 + 8 ATCGATCA

a score=0
s NC_045512.2 21562 8 + 29903 ATCGATCG
s q3 0 6 + 6 A-CGATC-
";

/// Two-exon gene at `3..6` and `9..12` of a 20-base genome.
pub const JOINED_GENE: &str = "\
>lcl|REF_cds_1 [gene=orf1] [locus_tag=T01] [db_xref=GeneID:1] [protein=test polyprotein] [location=join(3..6,9..12)]
ATCG
ATCG
";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("MUTSCAN_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set MUTSCAN_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

/// Write `contents` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}
