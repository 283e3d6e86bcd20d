//! Operating-system memory plumbing used by the slab arena.

pub mod constants;
pub mod syscall;
