//! Binary archives of array-backed trees.
//!
//! Trees are written with `bincode` over their serde derives: handles as bare
//! integers, records field by field in declaration order. Loading always
//! re-validates the structure, so a truncated or tampered archive is rejected
//! instead of producing a tree with dangling links.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::graph::{FlatTree, NaryTree};

/// A tree that can be archived and checked after loading.
pub trait Archived: Serialize + DeserializeOwned {
    /// Checks the structural invariants of a freshly decoded value.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    fn validate(&self) -> Result<()>;
}

impl<N, A> Archived for FlatTree<N, A>
where
    N: Serialize + DeserializeOwned,
    A: Serialize + DeserializeOwned,
{
    fn validate(&self) -> Result<()> {
        FlatTree::validate(self)
    }
}

impl<N> Archived for NaryTree<N>
where
    N: Serialize + DeserializeOwned,
{
    fn validate(&self) -> Result<()> {
        NaryTree::validate(self)
    }
}

/// Writes `tree` to `writer`.
///
/// # Errors
/// Fails on I/O or encoding errors.
pub fn save<T: Archived, W: Write>(writer: W, tree: &T) -> Result<(), ArchiveError> {
    bincode::serialize_into(writer, tree)?;
    Ok(())
}

/// Reads and validates a tree from `reader`.
///
/// # Errors
/// Fails on I/O or decoding errors, or if the decoded tree is inconsistent.
pub fn load<T: Archived, R: Read>(reader: R) -> Result<T, ArchiveError> {
    let tree: T = bincode::deserialize_from(reader)?;
    tree.validate()?;
    Ok(tree)
}

/// Encodes `tree` into a fresh buffer.
///
/// # Errors
/// Fails on encoding errors.
pub fn to_bytes<T: Archived>(tree: &T) -> Result<Vec<u8>, ArchiveError> {
    let bytes = bincode::serialize(tree)?;
    debug!(bytes = bytes.len(), "encoded archive");
    Ok(bytes)
}

/// Decodes and validates a tree from `bytes`.
///
/// # Errors
/// Fails on decoding errors, or if the decoded tree is inconsistent.
pub fn from_bytes<T: Archived>(bytes: &[u8]) -> Result<T, ArchiveError> {
    let tree: T = bincode::deserialize(bytes)?;
    tree.validate()?;
    Ok(tree)
}
