//! Index handles for the array-backed trees.
//!
//! A handle is a 1-based position in its record array; `0` is the permanent
//! invalid sentinel. Handles compare by value, print `*` when invalid, and
//! serialize as the bare integer. They expose no arithmetic.

use core::fmt;
use serde::{Deserialize, Serialize};

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            #[doc = concat!("The invalid ", $what, " handle.")]
            pub const INVALID: Self = Self(0);

            #[doc = concat!("Wraps a raw ", $what, " value.")]
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// The underlying raw value.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Returns `true` unless this is the sentinel.
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }

            /// Returns `true` for the sentinel.
            #[inline]
            pub const fn is_invalid(self) -> bool {
                self.0 == 0
            }

            /// Zero-based position in the record array.
            #[inline]
            pub(crate) fn slot(self) -> Option<usize> {
                (self.0 as usize).checked_sub(1)
            }

            /// # Panics
            /// Panics once more than `u32::MAX - 1` records exist.
            #[inline]
            pub(crate) fn from_slot(slot: usize) -> Self {
                match u32::try_from(slot + 1) {
                    Ok(raw) => Self(raw),
                    Err(_) => panic!(concat!($what, " handle space exhausted")),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> u32 {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_invalid() {
                    f.write_str("*")
                } else {
                    write!(f, "{}", self.0)
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

index_handle!(
    /// Handle of a node in a [`FlatTree`](crate::graph::FlatTree) or [`NaryTree`](crate::graph::NaryTree).
    NodeId,
    "node"
);

index_handle!(
    /// Handle of an arc in a [`FlatTree`](crate::graph::FlatTree).
    ArcId,
    "arc"
);
