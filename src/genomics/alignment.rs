//! Extraction of reference/query pairs from MAF-style alignment records.
//!
//! Only sequence lines (`s <id> <start> ... <aligned sequence>`) are relevant;
//! the first one of a pair is the reference and the second is the query.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::types::GroupId;

/// First token of every sequence record line.
pub const SEQUENCE_MARKER: &str = "s";

const MIN_RECORD_TOKENS: usize = 4;

/// Errors raised while extracting alignment pairs.
#[derive(Debug, Error)]
pub enum AlignmentError {
    /// Underlying reader failed.
    #[error("failed to read alignment {origin}: {source}")]
    Io {
        /// File or stream being read.
        origin: String,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Fewer than two sequence records were found.
    #[error("alignment {origin} has {found} sequence record(s), expected a reference and a query")]
    MissingAlignment {
        /// File or stream being read.
        origin: String,
        /// Number of sequence records found.
        found: usize,
    },

    /// A sequence record could not be parsed.
    #[error("malformed sequence record in {origin} on line {line_number}: {reason}")]
    MalformedRecord {
        /// File or stream being read.
        origin: String,
        /// 1-based line number.
        line_number: usize,
        /// What was wrong with the line.
        reason: String,
    },
}

/// One aligned sequence row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Sequence identifier (group id for multi-alignment queries).
    pub id: GroupId,
    /// 0-based start coordinate on the source sequence.
    pub start: u64,
    /// Aligned sequence including gap characters.
    pub sequence: Vec<u8>,
}

/// Reference and query rows of one alignment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentPair {
    /// Reference row.
    pub reference: SequenceRecord,
    /// Query row.
    pub query: SequenceRecord,
}

/// Parse a single alignment line. Lines that are not sequence records yield `None`.
pub fn parse_sequence_line(
    line: &str,
    line_number: usize,
    origin: &str,
) -> Result<Option<SequenceRecord>, AlignmentError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some(SEQUENCE_MARKER) {
        return Ok(None);
    }

    let malformed = |reason: String| AlignmentError::MalformedRecord {
        origin: origin.to_string(),
        line_number,
        reason,
    };

    let fields: Vec<&str> = tokens.collect();
    if fields.len() + 1 < MIN_RECORD_TOKENS {
        return Err(malformed(format!(
            "expected at least {MIN_RECORD_TOKENS} fields, found {}",
            fields.len() + 1
        )));
    }

    let start = fields[1]
        .parse::<u64>()
        .map_err(|_| malformed(format!("invalid start coordinate '{}'", fields[1])))?;
    let sequence = fields[fields.len() - 1].as_bytes().to_vec();

    Ok(Some(SequenceRecord {
        id: Arc::from(fields[0]),
        start,
        sequence,
    }))
}

/// Extract the first reference/query pair from a reader. The rest of the input
/// is not consumed.
pub fn extract_pair<R: BufRead>(mut reader: R, origin: &str) -> Result<AlignmentPair, AlignmentError> {
    let mut records = Vec::with_capacity(2);
    let mut line = String::new();
    let mut line_number = 0;

    while records.len() < 2 {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|source| AlignmentError::Io {
            origin: origin.to_string(),
            source,
        })?;
        if read == 0 {
            break;
        }
        line_number += 1;
        if let Some(record) = parse_sequence_line(&line, line_number, origin)? {
            records.push(record);
        }
    }

    let found = records.len();
    let mut records = records.into_iter();
    match (records.next(), records.next()) {
        (Some(reference), Some(query)) => Ok(AlignmentPair { reference, query }),
        _ => Err(AlignmentError::MissingAlignment {
            origin: origin.to_string(),
            found,
        }),
    }
}

/// Extract the alignment pair of a pairwise alignment file.
pub fn read_pair_file(path: impl AsRef<Path>) -> Result<AlignmentPair, AlignmentError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let file = File::open(path).map_err(|source| AlignmentError::Io {
        origin: origin.clone(),
        source,
    })?;
    extract_pair(BufReader::new(file), &origin)
}

/// Streaming reader over a multi-block alignment file.
///
/// Yields one [`AlignmentPair`] per consecutive reference/query couple of
/// sequence lines and keeps only the current line in memory.
#[derive(Debug)]
pub struct MultiAlignmentReader<R> {
    reader: R,
    origin: String,
    line: String,
    line_number: usize,
    failed: bool,
}

impl MultiAlignmentReader<BufReader<File>> {
    /// Open a multi-block alignment file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AlignmentError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| AlignmentError::Io {
            origin: origin.clone(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), origin))
    }
}

impl<R: BufRead> MultiAlignmentReader<R> {
    /// Wrap an already opened reader.
    pub fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            reader,
            origin: origin.into(),
            line: String::new(),
            line_number: 0,
            failed: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_record(&mut self) -> Result<Option<SequenceRecord>, AlignmentError> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|source| AlignmentError::Io {
                    origin: self.origin.clone(),
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if let Some(record) = parse_sequence_line(&self.line, self.line_number, &self.origin)? {
                return Ok(Some(record));
            }
        }
    }

    fn next_pair(&mut self) -> Result<Option<AlignmentPair>, AlignmentError> {
        let Some(reference) = self.next_record()? else {
            return Ok(None);
        };
        let Some(query) = self.next_record()? else {
            return Err(AlignmentError::MissingAlignment {
                origin: format!("{} (reference on line {})", self.origin, self.line_number),
                found: 1,
            });
        };
        Ok(Some(AlignmentPair { reference, query }))
    }
}

impl<R: BufRead> Iterator for MultiAlignmentReader<R> {
    type Item = Result<AlignmentPair, AlignmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_pair() {
            Ok(pair) => pair.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
