//! # `grove` - Search-Tree Toolkit
//!
//! Rooted, directed search graphs for tree-search algorithms such as
//! Monte-Carlo tree search, where one game position may be reached by more
//! than one move sequence and so may have several parents.
//!
//! ## Key Features
//!
//! - **Two multi-parent backends with one vocabulary**: a slab-backed
//!   [`AdjacencyTree`] that supports erasing, and an append-only
//!   [`FlatTree`] over two flat arrays that can be archived.
//! - **A pure n-ary tree** ([`NaryTree`]) with re-rooting and flattening.
//! - **Sub-tree extraction**: keep only what is reachable from a new root,
//!   moving payloads instead of cloning them.
//! - **Generic traversals** over any [`SearchGraph`]: BFS, DFS, arc walks,
//!   topological order.
//! - **Stale-handle detection**: slab handles carry a generation, so a handle
//!   outliving its record is an error, not undefined behaviour.
//!
//! ## Architecture
//!
//! 1. **Slab arena** ([`alloc::SlabArena`]): page-multiple blocks mapped from
//!    the OS, carved into fixed slots reused LIFO.
//! 2. **Graph backends** ([`graph`]): root node plus a synthetic root arc,
//!    per-node in/out arc sequences in insertion order.
//! 3. **Algorithms** ([`graph::algorithms`]): written once against the
//!    [`SearchGraph`] view.
//! 4. **Search helpers** ([`moves`], [`mcts`]) and **archives** ([`archive`]).
//!
//! ## Example
//!
//! ```rust
//! use grove::graph::{Bfs, FlatTree};
//!
//! let mut tree: FlatTree<&str, u8> = FlatTree::new("root");
//! let a = tree.add_node("a");
//! let b = tree.add_node("b");
//! tree.add_arc(tree.root(), a, 1)?;
//! tree.add_arc(tree.root(), b, 2)?;
//! tree.add_arc(a, b, 3)?;
//!
//! assert_eq!(tree.in_arc_num(b), 2);
//! assert_eq!(Bfs::new(&tree, tree.root()).count(), 3);
//!
//! tree.make_sub_tree(a)?;
//! assert_eq!(tree[tree.root()], "a");
//! assert_eq!(tree.node_num(), 2);
//! # Ok::<(), grove::GraphError>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod alloc;
pub mod allocator;
pub mod archive;
pub mod config;
pub mod error;
pub mod graph;
pub mod mcts;
pub mod moves;
pub mod path;

pub use alloc::{SlabArena, SlabKey};
pub use config::SlabConfig;
pub use error::{ArchiveError, GraphError, Result};
pub use graph::{AdjacencyTree, FlatTree, GrowGraph, NaryTree, SearchGraph};
pub use mcts::{Expand, MovePool};
pub use moves::Moves;
pub use path::{Path, Transition};

// Compile-time layout checks for the flat records.
const _: () = {
    use core::mem;

    // Index handles are bare `u32`s.
    assert!(mem::size_of::<graph::handle::NodeId>() == 4);
    assert!(mem::size_of::<graph::handle::ArcId>() == 4);

    // Link headers: four chain ends and two lengths per node, four links per arc.
    assert!(mem::size_of::<graph::flat::NodeRecord<()>>() == 24);
    assert!(mem::size_of::<graph::flat::ArcRecord<()>>() == 16);

    // Parent, previous sibling, tail child and arity.
    assert!(mem::size_of::<graph::ntree::NaryNode<()>>() == 16);
};
