//! Internal traversal building blocks shared by the graph algorithms.

pub(crate) mod visited;
