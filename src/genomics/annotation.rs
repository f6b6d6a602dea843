//! Gene-coordinate annotation parsing.
//!
//! The annotation file is the coding-sequence export of a reference genome:
//! each gene starts with a `>` header line carrying its name, protein and
//! location, followed by the coding sequence wrapped over any number of lines.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Marker that opens a gene header line.
pub const HEADER_MARKER: char = '>';

const MIN_HEADER_TOKENS: usize = 6;

/// Errors raised while parsing an annotation file. All of them are fatal for a
/// scan, since the coordinate frame depends on the parsed locations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying reader failed.
    #[error("failed to read annotations: {0}")]
    Io(#[from] std::io::Error),

    /// Header has too few whitespace-separated fields.
    #[error("malformed gene header on line {line_number}: {line}")]
    MalformedHeader {
        /// 1-based line number.
        line_number: usize,
        /// Offending line.
        line: String,
    },

    /// Header lacks a recognizable location pattern.
    #[error("missing location on line {line_number}: {line}")]
    MissingLocation {
        /// 1-based line number.
        line_number: usize,
        /// Offending line.
        line: String,
    },

    /// Location coordinates are out of order or do not fit an integer.
    #[error("invalid location {location} on line {line_number}")]
    InvalidLocation {
        /// 1-based line number.
        line_number: usize,
        /// Offending location text.
        location: String,
    },

    /// Sequence data found before any header.
    #[error("sequence data before the first gene header on line {line_number}: {line}")]
    SequenceBeforeHeader {
        /// 1-based line number.
        line_number: usize,
        /// Offending line.
        line: String,
    },
}

/// Inclusive, 1-based coordinate range on the reference genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingRange {
    /// First coordinate (1-based, inclusive).
    pub start: u64,
    /// Last coordinate (1-based, inclusive).
    pub end: u64,
}

impl CodingRange {
    /// Construct a new range.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bases covered.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.end - self.start + 1) as usize
    }

    /// Whether the range is reversed (never the case for parsed ranges).
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for CodingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<(u64, u64)> for CodingRange {
    fn from((start, end): (u64, u64)) -> Self {
        Self::new(start, end)
    }
}

/// Location of a gene on the reference genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneLocation {
    /// Contiguous gene.
    Simple(CodingRange),
    /// Spliced gene; ranges are kept in exon order.
    Joined(Vec<CodingRange>),
}

impl GeneLocation {
    /// Ranges in exon order.
    pub fn ranges(&self) -> &[CodingRange] {
        match self {
            GeneLocation::Simple(range) => std::slice::from_ref(range),
            GeneLocation::Joined(ranges) => ranges,
        }
    }
}

/// One parsed gene block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    /// 1-based gene number in order of appearance.
    pub gene_number: u32,
    /// Gene name field of the header.
    pub gene_name: String,
    /// Protein name fields of the header.
    pub protein_name: String,
    /// Coordinate range(s) on the reference genome.
    pub location: GeneLocation,
    /// Coding sequence with line terminators stripped.
    pub sequence: String,
}

impl GeneRecord {
    /// Length of the coding frame: the sum of all range lengths.
    pub fn coding_len(&self) -> usize {
        self.location.ranges().iter().map(CodingRange::len).sum()
    }

    /// Whether a projected reference matches the annotated coding sequence.
    pub fn matches_coding_sequence(&self, reference: &[u8]) -> bool {
        self.sequence.as_bytes().eq_ignore_ascii_case(reference)
    }
}

/// Ordered gene records keyed by gene number.
#[derive(Debug, Clone, Default)]
pub struct GeneAnnotations {
    genes: BTreeMap<u32, GeneRecord>,
}

impl GeneAnnotations {
    /// Read and parse an annotation file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    /// Parse annotations from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut genes = BTreeMap::new();
        let mut current: Option<GeneRecord> = None;
        let mut gene_number = 0u32;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = idx + 1;

            if line.starts_with(HEADER_MARKER) {
                if let Some(done) = current.take() {
                    genes.insert(done.gene_number, done);
                }
                gene_number += 1;
                current = Some(parse_header(&line, line_number, gene_number)?);
                continue;
            }

            let sequence = line.trim_end();
            match current.as_mut() {
                Some(gene) => gene.sequence.push_str(sequence),
                None if sequence.is_empty() => {}
                None => {
                    return Err(ParseError::SequenceBeforeHeader {
                        line_number,
                        line,
                    })
                }
            }
        }

        if let Some(done) = current.take() {
            genes.insert(done.gene_number, done);
        }
        debug!(genes = genes.len(), "parsed gene annotations");
        Ok(Self { genes })
    }

    /// Gene by number.
    pub fn get(&self, gene_number: u32) -> Option<&GeneRecord> {
        self.genes.get(&gene_number)
    }

    /// First gene whose name matches, either verbatim or as a `[gene=NAME]` field.
    pub fn find_by_name(&self, name: &str) -> Option<&GeneRecord> {
        self.genes.values().find(|gene| {
            gene.gene_name == name
                || gene
                    .gene_name
                    .strip_prefix("[gene=")
                    .and_then(|rest| rest.strip_suffix(']'))
                    == Some(name)
        })
    }

    /// Genes in number order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneRecord> {
        self.genes.values()
    }

    /// Number of parsed genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether no genes were parsed.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

fn simple_location() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"location=(\d+)\.\.(\d+)").expect("valid pattern"))
}

fn joined_location() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\.\d+(?:,\d+\.\.\d+)+").expect("valid pattern"))
}

fn range_pair() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.\.(\d+)").expect("valid pattern"))
}

fn parse_header(line: &str, line_number: usize, gene_number: u32) -> Result<GeneRecord, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_HEADER_TOKENS {
        return Err(ParseError::MalformedHeader {
            line_number,
            line: line.to_string(),
        });
    }

    Ok(GeneRecord {
        gene_number,
        gene_name: tokens[1].to_string(),
        protein_name: format!("{}, {}", tokens[4], tokens[5]),
        location: parse_location(line, line_number)?,
        sequence: String::new(),
    })
}

/// Extract the gene location from a header line.
///
/// Headers mentioning `join` carry a comma-separated list of ranges which is
/// kept in exon order; all other headers carry `location=<start>..<end>`.
pub fn parse_location(line: &str, line_number: usize) -> Result<GeneLocation, ParseError> {
    let missing = || ParseError::MissingLocation {
        line_number,
        line: line.to_string(),
    };

    if line.contains("join") {
        let joined = joined_location().find(line).ok_or_else(missing)?;
        let ranges = range_pair()
            .captures_iter(joined.as_str())
            .map(|caps| parse_range(&caps[1], &caps[2], line_number))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(GeneLocation::Joined(ranges));
    }

    let caps = simple_location().captures(line).ok_or_else(missing)?;
    Ok(GeneLocation::Simple(parse_range(&caps[1], &caps[2], line_number)?))
}

fn parse_range(start: &str, end: &str, line_number: usize) -> Result<CodingRange, ParseError> {
    let invalid = || ParseError::InvalidLocation {
        line_number,
        location: format!("{start}..{end}"),
    };
    let start: u64 = start.parse().map_err(|_| invalid())?;
    let end: u64 = end.parse().map_err(|_| invalid())?;
    if start == 0 || start > end {
        return Err(invalid());
    }
    Ok(CodingRange::new(start, end))
}
