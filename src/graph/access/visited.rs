//! Dense visited sets for graph traversals.
//!
//! One bit per node (or arc) index, word-packed. Traversals size the set to
//! the graph's index bound up front, so no resizing happens mid-walk.

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-size, word-packed bitset.
#[derive(Debug, Clone, Default)]
pub(crate) struct VisitedSet {
    words: Vec<u64>,
    len: usize,
}

impl VisitedSet {
    pub(crate) fn new(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
            len: bits,
        }
    }

    /// Marks `index`; returns `true` iff it was not marked before.
    #[inline]
    pub(crate) fn insert(&mut self, index: usize) -> bool {
        debug_assert!(index < self.len, "visited index {index} out of bounds for {}", self.len);
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    #[inline]
    pub(crate) fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (index % WORD_BITS)) != 0)
    }
}
