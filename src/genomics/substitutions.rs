use super::types::{GroupId, Symbol, ALPHABET_SIZE};

/// Count and contributing ids for one symbol at one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTally {
    /// Number of pairs carrying the symbol where the reference differs.
    pub count: u64,
    /// Ids of the contributing pairs, in processing order.
    pub groups: Vec<GroupId>,
}

impl SymbolTally {
    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Fixed symbol table for one reference position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTally {
    slots: [SymbolTally; ALPHABET_SIZE],
}

impl PositionTally {
    /// Tally for a symbol.
    pub fn get(&self, symbol: Symbol) -> &SymbolTally {
        &self.slots[symbol.index()]
    }

    /// Sum of counts over the four nucleotides.
    pub fn substitution_count(&self) -> u64 {
        Symbol::BASES.iter().map(|&base| self.get(base).count).sum()
    }

    /// Count of the gap entry.
    pub fn deletion_count(&self) -> u64 {
        self.get(Symbol::Gap).count
    }

    /// Symbols with a non-zero tally, in byte order (`-` first).
    pub fn observed(&self) -> impl Iterator<Item = (Symbol, &SymbolTally)> {
        let mut symbols = Symbol::ALL;
        symbols.sort_by_key(|symbol| symbol.as_byte());
        symbols
            .into_iter()
            .map(move |symbol| (symbol, self.get(symbol)))
            .filter(|(_, tally)| !tally.is_empty())
    }

    fn observe(&mut self, symbol: Symbol, group: Option<&GroupId>) {
        let slot = &mut self.slots[symbol.index()];
        slot.count += 1;
        if let Some(group) = group {
            slot.groups.push(GroupId::clone(group));
        }
    }

    fn merge(&mut self, other: PositionTally) {
        for (slot, theirs) in self.slots.iter_mut().zip(other.slots) {
            slot.count += theirs.count;
            slot.groups.extend(theirs.groups);
        }
    }
}

/// Per-position substitution and deletion tallies over a fixed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCounts {
    positions: Vec<PositionTally>,
    track_groups: bool,
    unrecognized: u64,
}

impl PositionCounts {
    /// Empty tallies for a frame of `len` positions.
    pub fn new(len: usize, track_groups: bool) -> Self {
        Self {
            positions: vec![PositionTally::default(); len],
            track_groups,
            unrecognized: 0,
        }
    }

    /// Fold one normalized pair into the tallies.
    ///
    /// A position counts when the reference is a nucleotide, the query is a
    /// nucleotide or gap, and the two differ. Any other byte is skipped and
    /// only added to [`unrecognized`](Self::unrecognized).
    pub fn observe(&mut self, reference: &[u8], query: &[u8], group: &GroupId) {
        debug_assert_eq!(reference.len(), self.positions.len());
        debug_assert_eq!(query.len(), self.positions.len());

        let group = self.track_groups.then_some(group);
        for ((tally, &r), &q) in self.positions.iter_mut().zip(reference).zip(query) {
            if r == q {
                continue;
            }
            match (Symbol::from_reference(r), Symbol::from_query(q)) {
                (Some(_), Some(symbol)) => tally.observe(symbol, group),
                _ => self.unrecognized += 1,
            }
        }
    }

    /// Add another shard's tallies. Group lists are concatenated.
    ///
    /// # Panics
    ///
    /// Panics if the frames differ in length.
    pub fn merge(&mut self, other: PositionCounts) {
        assert_eq!(
            self.positions.len(),
            other.positions.len(),
            "cannot merge tallies over different frames"
        );
        for (mine, theirs) in self.positions.iter_mut().zip(other.positions) {
            mine.merge(theirs);
        }
        self.unrecognized += other.unrecognized;
    }

    /// Tally at a position.
    pub fn get(&self, position: usize) -> Option<&PositionTally> {
        self.positions.get(position)
    }

    /// Tallies in position order.
    pub fn iter(&self) -> impl Iterator<Item = &PositionTally> {
        self.positions.iter()
    }

    /// Frame length.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Differing columns skipped because a symbol was outside the alphabet.
    pub fn unrecognized(&self) -> u64 {
        self.unrecognized
    }
}
