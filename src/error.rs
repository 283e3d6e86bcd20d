//! Error types shared by the graph backends and the archive layer.
//!
//! Handle misuse is reported through [`GraphError`] on every fallible operation.
//! Panicking accessors (`Index`, degree queries) format the same messages.

use thiserror::Error;

/// Errors raised by graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The invalid sentinel was passed where a live node was required.
    #[error("invalid node handle")]
    InvalidNode,
    /// The invalid sentinel was passed where a live arc was required.
    #[error("invalid arc handle")]
    InvalidArc,
    /// The node handle refers to an erased record or to another graph.
    #[error("stale or foreign node handle {0}")]
    StaleNode(String),
    /// The arc handle refers to an erased record or to another graph.
    #[error("stale or foreign arc handle {0}")]
    StaleArc(String),
    /// A subtree extraction (or re-root) targeted the current root.
    #[error("cannot extract a sub-tree rooted at the current root")]
    ExtractRoot,
    /// The root node and the synthetic root arc cannot be erased.
    #[error("cannot erase the root node or the root arc")]
    EraseRoot,
    /// An index-based handle points past the end of its array.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds {
        /// The offending raw index.
        index: usize,
        /// The array length at the time of the call.
        len: usize,
    },
    /// A deserialized graph violates a structural invariant.
    #[error("corrupt graph: {0}")]
    Corrupt(String),
}

/// Errors raised while saving or loading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The binary codec failed (I/O error, truncated or malformed input).
    #[error("archive codec error: {0}")]
    Codec(#[from] bincode::Error),
    /// The archive decoded but describes an inconsistent graph.
    #[error("archive rejected: {0}")]
    Invalid(#[from] GraphError),
}

/// Result alias defaulting to [`GraphError`].
pub type Result<T, E = GraphError> = core::result::Result<T, E>;
