//! Rooted search graphs.
//!
//! Three containers share one vocabulary (root, in/out arcs, leaves):
//!
//! - [`AdjacencyTree`]: slab-backed nodes and arcs with per-node adjacency
//!   lists; supports erasing.
//! - [`FlatTree`]: two flat arrays with intrusive in/out chains; append-only,
//!   serializable.
//! - [`NaryTree`]: a pure tree with parent/sibling links only.
//!
//! The multi-parent containers implement [`SearchGraph`], the read-only view
//! every generic traversal in [`algorithms`] runs on, and [`GrowGraph`], the
//! append interface the expansion helpers in [`crate::mcts`] need.

pub mod adjacency;
pub mod algorithms;
pub mod flat;
pub mod handle;
pub mod ntree;

pub(crate) mod access;

use core::fmt;

use crate::error::Result;

pub use adjacency::AdjacencyTree;
pub use algorithms::{
    topological_sort, walk_breadth_first, walk_depth_first, ArcVisit, Bfs, Dfs, ExtractionPlan,
    PlanStep,
};
pub use flat::FlatTree;
pub use ntree::NaryTree;

/// Read-only view of a rooted, multi-parent search graph.
///
/// Handles are plain `Copy` values. A graph maps each live handle to a dense
/// index in `0..node_bound()` (resp. `0..arc_bound()`), which lets
/// traversals keep bitsets instead of hash sets.
///
/// Methods taking a handle may panic when the handle does not name a live
/// record of this graph; use the `*_index` methods to test first.
pub trait SearchGraph {
    /// Node handle.
    type NodeId: Copy + Eq + fmt::Debug;
    /// Arc handle.
    type ArcId: Copy + Eq + fmt::Debug;
    /// Iterator over the arcs leaving a node, in insertion order.
    type OutArcs<'a>: Iterator<Item = Self::ArcId>
    where
        Self: 'a;
    /// Iterator over the arcs entering a node, in insertion order.
    type InArcs<'a>: Iterator<Item = Self::ArcId>
    where
        Self: 'a;

    /// The root node.
    fn root(&self) -> Self::NodeId;

    /// Arcs leaving `node`.
    fn out_arcs(&self, node: Self::NodeId) -> Self::OutArcs<'_>;

    /// Arcs entering `node`. The root's list starts with the synthetic root arc.
    fn in_arcs(&self, node: Self::NodeId) -> Self::InArcs<'_>;

    /// Source node of `arc` (invalid for the root arc).
    fn source(&self, arc: Self::ArcId) -> Self::NodeId;

    /// Target node of `arc`.
    fn target(&self, arc: Self::ArcId) -> Self::NodeId;

    /// Dense index of `node`, or `None` if it is not live here.
    fn node_index(&self, node: Self::NodeId) -> Option<usize>;

    /// Exclusive upper bound of [`SearchGraph::node_index`].
    fn node_bound(&self) -> usize;

    /// Dense index of `arc`, or `None` if it is not live here.
    fn arc_index(&self, arc: Self::ArcId) -> Option<usize>;

    /// Exclusive upper bound of [`SearchGraph::arc_index`].
    fn arc_bound(&self) -> usize;
}

/// Append and payload access shared by the multi-parent trees.
pub trait GrowGraph: SearchGraph {
    /// Per-node payload.
    type NodeData;
    /// Per-arc payload.
    type ArcData;

    /// Appends a detached node.
    fn add_node(&mut self, data: Self::NodeData) -> Self::NodeId;

    /// Appends an arc `source -> target`.
    ///
    /// # Errors
    /// Fails if either endpoint is not a live node of this graph.
    fn add_arc(
        &mut self,
        source: Self::NodeId,
        target: Self::NodeId,
        data: Self::ArcData,
    ) -> Result<Self::ArcId>;

    /// Shared access to a node payload.
    ///
    /// # Errors
    /// Fails if `node` is not live.
    fn node_data(&self, node: Self::NodeId) -> Result<&Self::NodeData>;

    /// Exclusive access to a node payload.
    ///
    /// # Errors
    /// Fails if `node` is not live.
    fn node_data_mut(&mut self, node: Self::NodeId) -> Result<&mut Self::NodeData>;
}
