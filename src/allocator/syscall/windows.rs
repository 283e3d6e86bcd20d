//! `VirtualAlloc`-backed regions for windows targets.
#![cfg(windows)]

use windows_sys::Win32::System::Memory::{VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE};
use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};
use std::ptr;

/// Reserves and commits a read/write region of `size` bytes.
///
/// # Safety
/// `size` must be non-zero. The region must be released with [`free_region`].
pub unsafe fn allocate_region(size: usize) -> Option<*mut u8> {
    let ptr = VirtualAlloc(
        ptr::null_mut(),
        size,
        MEM_COMMIT | MEM_RESERVE,
        PAGE_READWRITE,
    );
    if ptr.is_null() {
        None
    } else {
        Some(ptr.cast::<u8>())
    }
}

/// Releases a region obtained from [`allocate_region`].
///
/// # Safety
/// `ptr` must be the base address returned by [`allocate_region`].
pub unsafe fn free_region(ptr: *mut u8, _size: usize) {
    // MEM_RELEASE frees the entire region reserved by VirtualAlloc. Size must be 0.
    VirtualFree(ptr.cast(), 0, MEM_RELEASE);
}

/// The system page size in bytes.
pub fn page_size() -> usize {
    // SAFETY: GetSystemInfo only writes into the provided struct.
    let info = unsafe {
        let mut info: SYSTEM_INFO = core::mem::zeroed();
        GetSystemInfo(&mut info);
        info
    };
    info.dwPageSize as usize
}
