//! Thin wrappers over the platform virtual-memory calls.
//!
//! Regions are mapped read/write, zero-filled and page aligned.

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
pub use windows::*;
