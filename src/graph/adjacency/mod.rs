//! `AdjacencyTree`: a slab-backed search graph with erasable records.
//!
//! Nodes and arcs each live in their own [`SlabArena`], so a record never
//! moves once created. Every node keeps its in-arcs and out-arcs in small
//! inline vectors; most search-tree nodes have exactly one parent, so the
//! in-list rarely spills to the heap.
//!
//! Handles are generation-tagged slab keys. Erasing a record bumps its slot's
//! generation, so a handle kept past an erase is reported as stale instead of
//! silently aliasing whatever reuses the slot.
//!
//! # Performance
//! - `add_node` / `add_arc`: O(1) (amortised over block mapping)
//! - `erase_arc`: O(in-degree + out-degree) of its endpoints
//! - `erase_node`: O(sum of neighbour degrees)
//! - handle lookup: O(log blocks)

use core::fmt;
use core::iter::Copied;
use core::ops::{Index, IndexMut};
use core::slice;

use smallvec::SmallVec;
use tracing::trace;

use crate::alloc::{SlabArena, SlabKey};
use crate::config::SlabConfig;
use crate::error::{GraphError, Result};
use crate::graph::algorithms::{ExtractionPlan, PlanStep};
use crate::graph::flat::FlatTree;
use crate::graph::handle;
use crate::graph::{GrowGraph, SearchGraph};
use crate::path::Transition;

macro_rules! slab_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(SlabKey);

        impl $name {
            /// The handle that never resolves.
            pub const INVALID: Self = Self(SlabKey::INVALID);

            /// Wraps a raw slab key.
            #[inline]
            pub const fn from_key(key: SlabKey) -> Self {
                Self(key)
            }

            /// The underlying slab key.
            #[inline]
            pub const fn key(self) -> SlabKey {
                self.0
            }

            /// Returns `true` unless this is [`Self::INVALID`].
            #[inline]
            pub fn is_valid(self) -> bool {
                !self.0.is_invalid()
            }

            /// Returns `true` for [`Self::INVALID`].
            #[inline]
            pub fn is_invalid(self) -> bool {
                self.0.is_invalid()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_invalid() {
                    f.write_str("*")
                } else {
                    write!(f, "{}", self.0.addr())
                }
            }
        }
    };
}

slab_handle!(
    /// Handle of a node in an [`AdjacencyTree`].
    NodeId
);

slab_handle!(
    /// Handle of an arc in an [`AdjacencyTree`].
    ArcId
);

type InList = SmallVec<[ArcId; 1]>;
type OutList = SmallVec<[ArcId; 4]>;

struct NodeRecord<N> {
    in_arcs: InList,
    out_arcs: OutList,
    data: N,
}

struct ArcRecord<A> {
    source: NodeId,
    target: NodeId,
    data: A,
}

/// Iterator over a node's arc list, front to back or back to front.
pub type Arcs<'a> = Copied<slice::Iter<'a, ArcId>>;

/// Rooted search graph over slab-allocated nodes and arcs.
pub struct AdjacencyTree<N, A> {
    nodes: SlabArena<NodeRecord<N>>,
    arcs: SlabArena<ArcRecord<A>>,
    root: NodeId,
    root_arc: ArcId,
    config: SlabConfig,
}

impl<N, A: Default> AdjacencyTree<N, A> {
    /// Creates a tree holding only `root`, with a default root-arc payload.
    pub fn new(root: N) -> Self {
        Self::with_root_arc(root, A::default())
    }
}

impl<N, A> AdjacencyTree<N, A> {
    /// Creates a tree holding only `root`, entered by a root arc carrying `arc`.
    pub fn with_root_arc(root: N, arc: A) -> Self {
        Self::with_config(root, arc, SlabConfig::default())
    }

    /// Like [`AdjacencyTree::with_root_arc`] with explicit arena tuning.
    pub fn with_config(root: N, arc: A, config: SlabConfig) -> Self {
        let mut nodes = SlabArena::with_config(config);
        let mut arcs = SlabArena::with_config(config);
        let root_id = NodeId(nodes.insert(NodeRecord {
            in_arcs: InList::new(),
            out_arcs: OutList::new(),
            data: root,
        }));
        let root_arc = ArcId(arcs.insert(ArcRecord {
            source: NodeId::INVALID,
            target: root_id,
            data: arc,
        }));
        let mut tree = Self {
            nodes,
            arcs,
            root: root_id,
            root_arc,
            config,
        };
        tree.node_rec_mut(root_id).in_arcs.push(root_arc);
        tree
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The synthetic arc entering the root.
    #[inline]
    pub fn root_arc(&self) -> ArcId {
        self.root_arc
    }

    /// Arena tuning this tree was built with.
    pub fn config(&self) -> SlabConfig {
        self.config
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn node_num(&self) -> usize {
        self.nodes.len()
    }

    /// Number of arcs, root arc excluded.
    #[inline]
    pub fn arc_num(&self) -> usize {
        self.arcs.len() - 1
    }

    fn check_node(&self, id: NodeId) -> Result<&NodeRecord<N>> {
        if id.is_invalid() {
            return Err(GraphError::InvalidNode);
        }
        self.nodes
            .get(id.0)
            .ok_or_else(|| GraphError::StaleNode(id.to_string()))
    }

    fn check_arc(&self, id: ArcId) -> Result<&ArcRecord<A>> {
        if id.is_invalid() {
            return Err(GraphError::InvalidArc);
        }
        self.arcs
            .get(id.0)
            .ok_or_else(|| GraphError::StaleArc(id.to_string()))
    }

    fn node_rec(&self, id: NodeId) -> &NodeRecord<N> {
        match self.check_node(id) {
            Ok(record) => record,
            Err(err) => panic!("{err}"),
        }
    }

    fn node_rec_mut(&mut self, id: NodeId) -> &mut NodeRecord<N> {
        match self.nodes.get_mut(id.0) {
            Some(record) => record,
            None => panic!("{}", GraphError::StaleNode(id.to_string())),
        }
    }

    fn arc_rec(&self, id: ArcId) -> &ArcRecord<A> {
        match self.check_arc(id) {
            Ok(record) => record,
            Err(err) => panic!("{err}"),
        }
    }

    /// Appends a detached node.
    pub fn add_node(&mut self, data: N) -> NodeId {
        NodeId(self.nodes.insert(NodeRecord {
            in_arcs: InList::new(),
            out_arcs: OutList::new(),
            data,
        }))
    }

    /// Appends an arc `source -> target` to both endpoint lists.
    ///
    /// Parallel arcs and self-loops are accepted.
    ///
    /// # Errors
    /// Fails if either endpoint is invalid or stale.
    pub fn add_arc(&mut self, source: NodeId, target: NodeId, data: A) -> Result<ArcId> {
        self.check_node(source)?;
        self.check_node(target)?;
        let id = ArcId(self.arcs.insert(ArcRecord {
            source,
            target,
            data,
        }));
        self.node_rec_mut(source).out_arcs.push(id);
        self.node_rec_mut(target).in_arcs.push(id);
        Ok(id)
    }

    /// Removes `arc` from both endpoint lists and returns its payload.
    ///
    /// # Errors
    /// [`GraphError::EraseRoot`] for the root arc; otherwise fails if `arc`
    /// is invalid or stale.
    pub fn erase_arc(&mut self, arc: ArcId) -> Result<A> {
        if arc == self.root_arc {
            return Err(GraphError::EraseRoot);
        }
        self.check_arc(arc)?;
        Ok(self.detach_arc(arc))
    }

    /// `arc` must be live.
    fn detach_arc(&mut self, arc: ArcId) -> A {
        let record = match self.arcs.remove(arc.0) {
            Some(record) => record,
            None => panic!("{}", GraphError::StaleArc(arc.to_string())),
        };
        if let Some(node) = self.nodes.get_mut(record.source.0) {
            remove_first(&mut node.out_arcs, arc);
        }
        if let Some(node) = self.nodes.get_mut(record.target.0) {
            remove_first(&mut node.in_arcs, arc);
        }
        record.data
    }

    /// Erases every arc touching `node`, then `node` itself, returning its payload.
    ///
    /// # Errors
    /// [`GraphError::EraseRoot`] for the root; otherwise fails if `node` is
    /// invalid or stale.
    pub fn erase_node(&mut self, node: NodeId) -> Result<N> {
        if node == self.root {
            return Err(GraphError::EraseRoot);
        }
        let record = self.check_node(node)?;
        let incident: SmallVec<[ArcId; 8]> = record
            .in_arcs
            .iter()
            .chain(record.out_arcs.iter())
            .copied()
            .collect();
        for arc in incident {
            // a self-loop sits in both lists
            if self.arcs.contains(arc.0) {
                self.detach_arc(arc);
            }
        }
        match self.nodes.remove(node.0) {
            Some(record) => Ok(record.data),
            None => Err(GraphError::StaleNode(node.to_string())),
        }
    }

    /// The first arc `source -> target`, as `(arc, target)`.
    ///
    /// Returns `None` when no such arc exists or `target` is not live.
    pub fn link(&self, source: NodeId, target: NodeId) -> Option<Transition<ArcId, NodeId>> {
        self.nodes
            .get(target.0)?
            .in_arcs
            .iter()
            .copied()
            .find(|&arc| self.arcs.get(arc.0).is_some_and(|a| a.source == source))
            .map(|arc| Transition::new(arc, target))
    }

    /// `(arc, target(arc))`.
    ///
    /// # Errors
    /// Fails if `arc` is invalid or stale.
    pub fn link_arc(&self, arc: ArcId) -> Result<Transition<ArcId, NodeId>> {
        Ok(Transition::new(arc, self.check_arc(arc)?.target))
    }

    /// Arcs leaving `node`, oldest first; `.rev()` walks newest first.
    ///
    /// # Panics
    /// Panics if `node` is invalid or stale.
    pub fn out_arcs(&self, node: NodeId) -> Arcs<'_> {
        self.node_rec(node).out_arcs.iter().copied()
    }

    /// Arcs entering `node`, oldest first; `.rev()` walks newest first.
    ///
    /// # Panics
    /// Panics if `node` is invalid or stale.
    pub fn in_arcs(&self, node: NodeId) -> Arcs<'_> {
        self.node_rec(node).in_arcs.iter().copied()
    }

    /// Targets of the arcs leaving `node`, oldest first.
    ///
    /// # Panics
    /// Panics if `node` is invalid or stale.
    pub fn children(&self, node: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.out_arcs(node).map(move |arc| self.arc_rec(arc).target)
    }

    /// Source of `arc`; invalid for the root arc.
    ///
    /// # Panics
    /// Panics if `arc` is invalid or stale.
    pub fn source(&self, arc: ArcId) -> NodeId {
        self.arc_rec(arc).source
    }

    /// Target of `arc`.
    ///
    /// # Panics
    /// Panics if `arc` is invalid or stale.
    pub fn target(&self, arc: ArcId) -> NodeId {
        self.arc_rec(arc).target
    }

    /// Number of arcs entering `node`; the root counts its root arc.
    pub fn in_arc_num(&self, node: NodeId) -> usize {
        self.node_rec(node).in_arcs.len()
    }

    /// Number of arcs leaving `node`.
    pub fn out_arc_num(&self, node: NodeId) -> usize {
        self.node_rec(node).out_arcs.len()
    }

    /// `true` if `node` has in-arcs.
    pub fn has_in_arc(&self, node: NodeId) -> bool {
        self.in_arc_num(node) != 0
    }

    /// `true` if `node` has out-arcs.
    pub fn has_out_arc(&self, node: NodeId) -> bool {
        self.out_arc_num(node) != 0
    }

    /// `true` if `node` has no out-arcs.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        !self.has_out_arc(node)
    }

    /// `true` if `node` has out-arcs.
    pub fn is_internal(&self, node: NodeId) -> bool {
        self.has_out_arc(node)
    }

    /// `true` if `node` is live in this tree.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    /// `true` if `arc` is live in this tree.
    pub fn contains_arc(&self, arc: ArcId) -> bool {
        self.arcs.contains(arc.0)
    }

    /// Payload of `node`.
    ///
    /// # Errors
    /// Fails if `node` is invalid or stale.
    pub fn node(&self, node: NodeId) -> Result<&N> {
        self.check_node(node).map(|record| &record.data)
    }

    /// Mutable payload of `node`.
    ///
    /// # Errors
    /// Fails if `node` is invalid or stale.
    pub fn node_mut(&mut self, node: NodeId) -> Result<&mut N> {
        self.check_node(node)?;
        self.nodes
            .get_mut(node.0)
            .map(|record| &mut record.data)
            .ok_or_else(|| GraphError::StaleNode(node.to_string()))
    }

    /// Payload of `arc`.
    ///
    /// # Errors
    /// Fails if `arc` is invalid or stale.
    pub fn arc(&self, arc: ArcId) -> Result<&A> {
        self.check_arc(arc).map(|record| &record.data)
    }

    /// Mutable payload of `arc`.
    ///
    /// # Errors
    /// Fails if `arc` is invalid or stale.
    pub fn arc_mut(&mut self, arc: ArcId) -> Result<&mut A> {
        self.check_arc(arc)?;
        self.arcs
            .get_mut(arc.0)
            .map(|record| &mut record.data)
            .ok_or_else(|| GraphError::StaleArc(arc.to_string()))
    }

    /// Every live `(node, payload)` pair, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes.iter().map(|(key, record)| (NodeId(key), &record.data))
    }

    /// Every live `(arc, payload)` pair, in arena order, root arc included.
    pub fn arcs(&self) -> impl Iterator<Item = (ArcId, &A)> + '_ {
        self.arcs.iter().map(|(key, record)| (ArcId(key), &record.data))
    }

    /// Replaces the tree by the sub-graph reachable from `new_root`.
    ///
    /// Payloads are moved into fresh arenas, never cloned. The new root arc
    /// carries the old root arc's payload. Everything unreachable from
    /// `new_root` is dropped with the old arenas.
    ///
    /// # Errors
    /// [`GraphError::ExtractRoot`] if `new_root` is the current root; fails
    /// if it is invalid or stale. On these errors the tree is left untouched.
    pub fn make_sub_tree(&mut self, new_root: NodeId) -> Result<()> {
        self.check_node(new_root)?;
        let plan = ExtractionPlan::build(&*self, new_root)?;

        let root_data = self.take_node(new_root)?;
        let root_arc_data = self.take_arc(self.root_arc)?;
        let mut tree = Self::with_config(root_data, root_arc_data, self.config);

        let mut remap = Vec::with_capacity(plan.node_count());
        remap.push(tree.root);
        for step in plan.into_steps() {
            match step {
                PlanStep::Node(old) => {
                    let data = self.take_node(old)?;
                    remap.push(tree.add_node(data));
                }
                PlanStep::Arc { arc, source, target } => {
                    let data = self.take_arc(arc)?;
                    tree.add_arc(remap[source], remap[target], data)?;
                }
            }
        }

        trace!(
            nodes = tree.node_num(),
            arcs = tree.arc_num(),
            dropped_nodes = self.nodes.len(),
            "extracted adjacency sub-tree"
        );
        *self = tree;
        Ok(())
    }

    fn take_node(&mut self, node: NodeId) -> Result<N> {
        self.nodes
            .remove(node.0)
            .map(|record| record.data)
            .ok_or_else(|| GraphError::StaleNode(node.to_string()))
    }

    fn take_arc(&mut self, arc: ArcId) -> Result<A> {
        self.arcs
            .remove(arc.0)
            .map(|record| record.data)
            .ok_or_else(|| GraphError::StaleArc(arc.to_string()))
    }
}

fn remove_first<L: smallvec::Array<Item = ArcId>>(list: &mut SmallVec<L>, arc: ArcId) {
    if let Some(at) = list.iter().position(|&a| a == arc) {
        list.remove(at);
    }
}

impl<N, A> TryFrom<FlatTree<N, A>> for AdjacencyTree<N, A> {
    type Error = GraphError;

    /// Replays the flat tree's nodes and arcs in handle order, so every
    /// adjacency list keeps its order.
    fn try_from(flat: FlatTree<N, A>) -> Result<Self> {
        flat.validate()?;
        let (nodes, arcs) = flat.into_records();
        let mut nodes = nodes.into_iter();
        let mut arcs = arcs.into_iter();
        let (Some(root), Some(root_arc)) = (nodes.next(), arcs.next()) else {
            return Err(GraphError::Corrupt("missing root".into()));
        };

        let mut tree = Self::with_root_arc(root.into_data(), root_arc.into_data());
        let mut remap = Vec::with_capacity(nodes.len() + 1);
        remap.push(tree.root);
        for node in nodes {
            remap.push(tree.add_node(node.into_data()));
        }

        let resolve = |remap: &[NodeId], id: handle::NodeId| {
            id.slot()
                .and_then(|slot| remap.get(slot).copied())
                .ok_or_else(|| GraphError::Corrupt(format!("dangling node {id}")))
        };
        for arc in arcs {
            let source = resolve(&remap, arc.source())?;
            let target = resolve(&remap, arc.target())?;
            tree.add_arc(source, target, arc.into_data())?;
        }
        Ok(tree)
    }
}

impl<N, A> Index<NodeId> for AdjacencyTree<N, A> {
    type Output = N;

    fn index(&self, node: NodeId) -> &N {
        &self.node_rec(node).data
    }
}

impl<N, A> IndexMut<NodeId> for AdjacencyTree<N, A> {
    fn index_mut(&mut self, node: NodeId) -> &mut N {
        &mut self.node_rec_mut(node).data
    }
}

impl<N, A> Index<ArcId> for AdjacencyTree<N, A> {
    type Output = A;

    fn index(&self, arc: ArcId) -> &A {
        &self.arc_rec(arc).data
    }
}

impl<N, A> IndexMut<ArcId> for AdjacencyTree<N, A> {
    fn index_mut(&mut self, arc: ArcId) -> &mut A {
        match self.arc_mut(arc) {
            Ok(data) => data,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<N, A> fmt::Debug for AdjacencyTree<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdjacencyTree")
            .field("root", &self.root)
            .field("nodes", &self.node_num())
            .field("arcs", &self.arc_num())
            .finish_non_exhaustive()
    }
}

impl<N, A> SearchGraph for AdjacencyTree<N, A> {
    type NodeId = NodeId;
    type ArcId = ArcId;
    type OutArcs<'a> = Arcs<'a> where Self: 'a;
    type InArcs<'a> = Arcs<'a> where Self: 'a;

    fn root(&self) -> NodeId {
        self.root
    }

    fn out_arcs(&self, node: NodeId) -> Arcs<'_> {
        AdjacencyTree::out_arcs(self, node)
    }

    fn in_arcs(&self, node: NodeId) -> Arcs<'_> {
        AdjacencyTree::in_arcs(self, node)
    }

    fn source(&self, arc: ArcId) -> NodeId {
        AdjacencyTree::source(self, arc)
    }

    fn target(&self, arc: ArcId) -> NodeId {
        AdjacencyTree::target(self, arc)
    }

    fn node_index(&self, node: NodeId) -> Option<usize> {
        self.nodes.ordinal(node.0)
    }

    fn node_bound(&self) -> usize {
        self.nodes.ordinal_bound()
    }

    fn arc_index(&self, arc: ArcId) -> Option<usize> {
        self.arcs.ordinal(arc.0)
    }

    fn arc_bound(&self) -> usize {
        self.arcs.ordinal_bound()
    }
}

impl<N, A> GrowGraph for AdjacencyTree<N, A> {
    type NodeData = N;
    type ArcData = A;

    fn add_node(&mut self, data: N) -> NodeId {
        AdjacencyTree::add_node(self, data)
    }

    fn add_arc(&mut self, source: NodeId, target: NodeId, data: A) -> Result<ArcId> {
        AdjacencyTree::add_arc(self, source, target, data)
    }

    fn node_data(&self, node: NodeId) -> Result<&N> {
        self.node(node)
    }

    fn node_data_mut(&mut self, node: NodeId) -> Result<&mut N> {
        self.node_mut(node)
    }
}
