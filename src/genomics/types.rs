use std::fmt;
use std::sync::Arc;

/// Gap character used by alignment records for both insertions (in the
/// reference row) and deletions (in the query row).
pub const GAP: u8 = b'-';

/// Number of symbols in the closed counting alphabet.
pub const ALPHABET_SIZE: usize = 5;

/// Closed alphabet of symbols that can be tallied at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// Adenine.
    A,
    /// Cytosine.
    C,
    /// Guanine.
    G,
    /// Thymine.
    T,
    /// Alignment gap (deletion in the query).
    Gap,
}

impl Symbol {
    /// All symbols in table order.
    pub const ALL: [Symbol; ALPHABET_SIZE] =
        [Symbol::A, Symbol::C, Symbol::G, Symbol::T, Symbol::Gap];

    /// Nucleotide symbols only (no gap).
    pub const BASES: [Symbol; 4] = [Symbol::A, Symbol::C, Symbol::G, Symbol::T];

    /// Classify a query byte. Lowercase and ambiguity codes are rejected.
    pub fn from_query(byte: u8) -> Option<Self> {
        match byte {
            b'A' => Some(Symbol::A),
            b'C' => Some(Symbol::C),
            b'G' => Some(Symbol::G),
            b'T' => Some(Symbol::T),
            GAP => Some(Symbol::Gap),
            _ => None,
        }
    }

    /// Classify a reference byte; only the four nucleotides are accepted.
    pub fn from_reference(byte: u8) -> Option<Self> {
        match Self::from_query(byte) {
            Some(Symbol::Gap) | None => None,
            base => base,
        }
    }

    /// Slot of this symbol in a fixed-size per-position table.
    pub fn index(self) -> usize {
        match self {
            Symbol::A => 0,
            Symbol::C => 1,
            Symbol::G => 2,
            Symbol::T => 3,
            Symbol::Gap => 4,
        }
    }

    /// ASCII representation.
    pub fn as_byte(self) -> u8 {
        match self {
            Symbol::A => b'A',
            Symbol::C => b'C',
            Symbol::G => b'G',
            Symbol::T => b'T',
            Symbol::Gap => GAP,
        }
    }

    /// Whether the symbol is a nucleotide rather than a gap.
    pub fn is_base(self) -> bool {
        !matches!(self, Symbol::Gap)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte() as char)
    }
}

/// Identifier of a contributing query sequence (the group id in multi-alignment
/// files, the query accession in pairwise files).
///
/// Shared by reference count so one id can be appended to many position slots
/// without copying the string.
pub type GroupId = Arc<str>;
