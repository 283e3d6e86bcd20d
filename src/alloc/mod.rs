//! Slab allocation for the pointer-based graph backend.

pub mod slab;
pub(crate) mod teardown;

pub use slab::{SlabArena, SlabKey};
