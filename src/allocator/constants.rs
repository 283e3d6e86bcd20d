//! Platform constants shared by the allocator.

/// The page granularity blocks are rounded up to (4KB).
pub const PAGE_SIZE: usize = 4096;
