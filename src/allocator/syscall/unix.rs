//! `mmap`-backed regions for unix targets.
#![cfg(unix)]

use libc::{c_void, mmap, munmap, sysconf, MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, _SC_PAGESIZE};
use std::ptr;

/// Maps a private anonymous region of `size` bytes.
/// Returns a pointer to the start of the region, or None if the kernel refused.
///
/// # Safety
/// `size` must be non-zero. The region must be released with [`free_region`]
/// using the same `size`.
pub unsafe fn allocate_region(size: usize) -> Option<*mut u8> {
    let ptr = mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        Some(ptr.cast::<u8>())
    }
}

/// Unmaps a region obtained from [`allocate_region`].
///
/// # Safety
/// `ptr` and `size` must describe exactly one live mapping.
pub unsafe fn free_region(ptr: *mut u8, size: usize) {
    munmap(ptr.cast::<c_void>(), size);
}

/// The kernel's page size in bytes.
pub fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { sysconf(_SC_PAGESIZE) };
    usize::try_from(size).unwrap_or(crate::allocator::constants::PAGE_SIZE)
}
