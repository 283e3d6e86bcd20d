//! One step of a recorded walk.

use core::fmt;
use serde::{Deserialize, Serialize};

/// One step of a walk: the arc followed and the node reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transition<A, N> {
    /// The arc taken.
    pub arc: A,
    /// The arc's target.
    pub target: N,
}

impl<A, N> Transition<A, N> {
    /// Creates a transition.
    #[inline]
    pub const fn new(arc: A, target: N) -> Self {
        Self { arc, target }
    }
}

impl<A, N> From<(A, N)> for Transition<A, N> {
    fn from((arc, target): (A, N)) -> Self {
        Self { arc, target }
    }
}

impl<A: fmt::Display, N: fmt::Display> fmt::Display for Transition<A, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.arc, self.target)
    }
}
