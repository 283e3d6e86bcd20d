//! Tuning knobs for the slab-backed graph.

use serde::{Deserialize, Serialize};

/// Default lower bound on the number of slots carved out of each mapped block.
pub const DEFAULT_MIN_SLOTS_PER_BLOCK: usize = 8;

/// Configuration of a [`SlabArena`](crate::alloc::SlabArena).
///
/// Blocks are always a whole number of pages; raising `min_slots_per_block`
/// trades fewer OS calls for a larger up-front mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabConfig {
    /// Minimum number of slots each block must hold. Zero is treated as one.
    pub min_slots_per_block: usize,
}

impl SlabConfig {
    /// Returns a copy with `min_slots_per_block` replaced.
    #[must_use]
    pub fn with_min_slots_per_block(mut self, slots: usize) -> Self {
        self.min_slots_per_block = slots;
        self
    }
}

impl Default for SlabConfig {
    fn default() -> Self {
        Self {
            min_slots_per_block: DEFAULT_MIN_SLOTS_PER_BLOCK,
        }
    }
}
