use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::ScanError;

/// File names to leave out of a pairwise scan, one per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    names: BTreeSet<String>,
}

impl Exclusions {
    /// Read an exclusion list from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let io_err = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        Self::parse(BufReader::new(file)).map_err(io_err)
    }

    /// Parse an exclusion list; surrounding whitespace and blank lines are ignored.
    pub fn parse<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut names = BTreeSet::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
        Ok(Self { names })
    }

    /// Whether the file name of `path` is excluded.
    pub fn contains(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| self.names.contains(name))
    }

    /// Number of excluded names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Exclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_alignment_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ScanError> {
    let dir = dir.as_ref();
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}
