//! `FlatTree`: an append-only search graph stored in two flat arrays.
//!
//! Nodes and arcs live in `Vec`s addressed by 1-based [`NodeId`] / [`ArcId`]
//! handles. Each node keeps the head and tail of two singly linked chains
//! threaded through the arc array: its in-arcs (via `next_in`) and its
//! out-arcs (via `next_out`). Appending to either chain touches only the
//! tail, so `add_arc` is O(1) and never moves a record.
//!
//! Node `1` is the root; arc `1` is the synthetic root arc, whose source is
//! the invalid handle and whose target is the root.
//!
//! # Performance
//! - `add_node` / `add_arc`: amortised O(1)
//! - `in_arcs` / `out_arcs`: O(degree)
//! - `link(source, target)`: O(in-degree of `target`)
//! - `make_sub_tree`: O(V + E) of the old graph, payloads moved

mod iter;

pub use iter::{InArcs, OutArcs};

use core::mem;
use core::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::graph::algorithms::{ExtractionPlan, PlanStep};
use crate::graph::handle::{ArcId, NodeId};
use crate::graph::{GrowGraph, SearchGraph};
use crate::path::Transition;

/// Raw node record: chain heads and tails, chain lengths, payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord<N> {
    head_in: ArcId,
    tail_in: ArcId,
    head_out: ArcId,
    tail_out: ArcId,
    in_size: u32,
    out_size: u32,
    data: N,
}

impl<N> NodeRecord<N> {
    fn new(data: N) -> Self {
        Self {
            head_in: ArcId::INVALID,
            tail_in: ArcId::INVALID,
            head_out: ArcId::INVALID,
            tail_out: ArcId::INVALID,
            in_size: 0,
            out_size: 0,
            data,
        }
    }

    /// First in-arc.
    pub fn head_in(&self) -> ArcId {
        self.head_in
    }

    /// Last in-arc.
    pub fn tail_in(&self) -> ArcId {
        self.tail_in
    }

    /// First out-arc.
    pub fn head_out(&self) -> ArcId {
        self.head_out
    }

    /// Last out-arc.
    pub fn tail_out(&self) -> ArcId {
        self.tail_out
    }

    /// Length of the in-chain.
    pub fn in_size(&self) -> u32 {
        self.in_size
    }

    /// Length of the out-chain.
    pub fn out_size(&self) -> u32 {
        self.out_size
    }

    /// The payload.
    pub fn data(&self) -> &N {
        &self.data
    }

    pub(crate) fn into_data(self) -> N {
        self.data
    }
}

/// Raw arc record: endpoints, chain links, payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcRecord<A> {
    source: NodeId,
    target: NodeId,
    next_in: ArcId,
    next_out: ArcId,
    data: A,
}

impl<A> ArcRecord<A> {
    /// Source node (invalid for the root arc).
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Target node.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Next arc in the target's in-chain.
    pub fn next_in(&self) -> ArcId {
        self.next_in
    }

    /// Next arc in the source's out-chain.
    pub fn next_out(&self) -> ArcId {
        self.next_out
    }

    /// The payload.
    pub fn data(&self) -> &A {
        &self.data
    }

    pub(crate) fn into_data(self) -> A {
        self.data
    }
}

/// Append-only rooted search graph over two flat arrays.
///
/// Handle `k` is stored at array position `k - 1`; the invalid handle `0`
/// needs no storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTree<N, A> {
    nodes: Vec<NodeRecord<N>>,
    arcs: Vec<ArcRecord<A>>,
}

const ROOT: NodeId = NodeId::new(1);
const ROOT_ARC: ArcId = ArcId::new(1);

impl<N, A: Default> FlatTree<N, A> {
    /// Creates a tree holding only `root`, with a default root-arc payload.
    pub fn new(root: N) -> Self {
        Self::with_root_arc(root, A::default())
    }
}

impl<N, A> FlatTree<N, A> {
    /// Creates a tree holding only `root`, entered by a root arc carrying `arc`.
    pub fn with_root_arc(root: N, arc: A) -> Self {
        Self::with_capacity(root, arc, 1, 1)
    }

    /// Like [`FlatTree::with_root_arc`], preallocating room for `nodes` nodes
    /// and `arcs` arcs (root and root arc included).
    pub fn with_capacity(root: N, arc: A, nodes: usize, arcs: usize) -> Self {
        let mut root_record = NodeRecord::new(root);
        root_record.head_in = ROOT_ARC;
        root_record.tail_in = ROOT_ARC;
        root_record.in_size = 1;

        let mut tree = Self {
            nodes: Vec::with_capacity(nodes.max(1)),
            arcs: Vec::with_capacity(arcs.max(1)),
        };
        tree.nodes.push(root_record);
        tree.arcs.push(ArcRecord {
            source: NodeId::INVALID,
            target: ROOT,
            next_in: ArcId::INVALID,
            next_out: ArcId::INVALID,
            data: arc,
        });
        tree
    }

    /// Reserves room for `nodes` more nodes and `arcs` more arcs.
    pub fn reserve(&mut self, nodes: usize, arcs: usize) {
        self.nodes.reserve(nodes);
        self.arcs.reserve(arcs);
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// The synthetic arc entering the root.
    #[inline]
    pub fn root_arc(&self) -> ArcId {
        ROOT_ARC
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

    fn node_slot(&self, id: NodeId) -> Result<usize> {
        let slot = id.slot().ok_or(GraphError::InvalidNode)?;
        if slot < self.nodes.len() {
            Ok(slot)
        } else {
            Err(GraphError::OutOfBounds {
                index: id.get() as usize,
                len: self.nodes.len() + 1,
            })
        }
    }

    fn arc_slot(&self, id: ArcId) -> Result<usize> {
        let slot = id.slot().ok_or(GraphError::InvalidArc)?;
        if slot < self.arcs.len() {
            Ok(slot)
        } else {
            Err(GraphError::OutOfBounds {
                index: id.get() as usize,
                len: self.arcs.len() + 1,
            })
        }
    }

    fn node_ref(&self, id: NodeId) -> &NodeRecord<N> {
        match self.node_slot(id) {
            Ok(slot) => &self.nodes[slot],
            Err(err) => panic!("node {id}: {err}"),
        }
    }

    fn arc_ref(&self, id: ArcId) -> &ArcRecord<A> {
        match self.arc_slot(id) {
            Ok(slot) => &self.arcs[slot],
            Err(err) => panic!("arc {id}: {err}"),
        }
    }

    /// Appends a detached node.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::from_slot(self.nodes.len());
        self.nodes.push(NodeRecord::new(data));
        id
    }

    /// Appends an arc `source -> target` at the tail of both chains.
    ///
    /// Parallel arcs and self-loops are accepted.
    ///
    /// # Errors
    /// Fails if either endpoint is not a node of this tree.
    pub fn add_arc(&mut self, source: NodeId, target: NodeId, data: A) -> Result<ArcId> {
        let source_slot = self.node_slot(source)?;
        let target_slot = self.node_slot(target)?;
        let id = ArcId::from_slot(self.arcs.len());
        self.arcs.push(ArcRecord {
            source,
            target,
            next_in: ArcId::INVALID,
            next_out: ArcId::INVALID,
            data,
        });

        let node = &mut self.nodes[source_slot];
        let tail = node.tail_out;
        node.tail_out = id;
        node.out_size += 1;
        match tail.slot() {
            Some(slot) => self.arcs[slot].next_out = id,
            None => self.nodes[source_slot].head_out = id,
        }

        let node = &mut self.nodes[target_slot];
        let tail = node.tail_in;
        node.tail_in = id;
        node.in_size += 1;
        match tail.slot() {
            Some(slot) => self.arcs[slot].next_in = id,
            None => self.nodes[target_slot].head_in = id,
        }

        Ok(id)
    }

    /// The first arc `source -> target`, as `(arc, target)`.
    ///
    /// Returns `None` when no such arc exists or `target` is not a node.
    pub fn link(&self, source: NodeId, target: NodeId) -> Option<Transition<ArcId, NodeId>> {
        let slot = self.node_slot(target).ok()?;
        let node = &self.nodes[slot];
        InArcs::new(&self.arcs, node.head_in, node.in_size)
            .find(|&arc| self.arcs[arc.get() as usize - 1].source == source)
            .map(|arc| Transition::new(arc, target))
    }

    /// `(arc, target(arc))`.
    ///
    /// # Errors
    /// Fails if `arc` is not an arc of this tree.
    pub fn link_arc(&self, arc: ArcId) -> Result<Transition<ArcId, NodeId>> {
        let slot = self.arc_slot(arc)?;
        Ok(Transition::new(arc, self.arcs[slot].target))
    }

    /// Arcs leaving `node`, oldest first.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn out_arcs(&self, node: NodeId) -> OutArcs<'_, A> {
        let record = self.node_ref(node);
        OutArcs::new(&self.arcs, record.head_out, record.out_size)
    }

    /// Arcs entering `node`, oldest first.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn in_arcs(&self, node: NodeId) -> InArcs<'_, A> {
        let record = self.node_ref(node);
        InArcs::new(&self.arcs, record.head_in, record.in_size)
    }

    /// Targets of the arcs leaving `node`, oldest first.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_arcs(node).map(move |arc| self.arcs[arc.get() as usize - 1].target)
    }

    /// Source of `arc`; invalid for the root arc.
    ///
    /// # Panics
    /// Panics if `arc` is not an arc of this tree.
    pub fn source(&self, arc: ArcId) -> NodeId {
        self.arc_ref(arc).source
    }

    /// Target of `arc`.
    ///
    /// # Panics
    /// Panics if `arc` is not an arc of this tree.
    pub fn target(&self, arc: ArcId) -> NodeId {
        self.arc_ref(arc).target
    }

    /// Number of arcs entering `node`.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn in_arc_num(&self, node: NodeId) -> usize {
        self.node_ref(node).in_size as usize
    }

    /// Number of arcs leaving `node`.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn out_arc_num(&self, node: NodeId) -> usize {
        self.node_ref(node).out_size as usize
    }

    /// `true` if `node` has in-arcs. Always `true` for the root.
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

    /// `true` if `node` names a node of this tree.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.node_slot(node).is_ok()
    }

    /// `true` if `arc` names an arc of this tree.
    pub fn contains_arc(&self, arc: ArcId) -> bool {
        self.arc_slot(arc).is_ok()
    }

    /// Payload of `node`.
    ///
    /// # Errors
    /// Fails if `node` is not a node of this tree.
    pub fn node(&self, node: NodeId) -> Result<&N> {
        let slot = self.node_slot(node)?;
        Ok(&self.nodes[slot].data)
    }

    /// Mutable payload of `node`.
    ///
    /// # Errors
    /// Fails if `node` is not a node of this tree.
    pub fn node_mut(&mut self, node: NodeId) -> Result<&mut N> {
        let slot = self.node_slot(node)?;
        Ok(&mut self.nodes[slot].data)
    }

    /// Payload of `arc`.
    ///
    /// # Errors
    /// Fails if `arc` is not an arc of this tree.
    pub fn arc(&self, arc: ArcId) -> Result<&A> {
        let slot = self.arc_slot(arc)?;
        Ok(&self.arcs[slot].data)
    }

    /// Mutable payload of `arc`.
    ///
    /// # Errors
    /// Fails if `arc` is not an arc of this tree.
    pub fn arc_mut(&mut self, arc: ArcId) -> Result<&mut A> {
        let slot = self.arc_slot(arc)?;
        Ok(&mut self.arcs[slot].data)
    }

    /// The raw record of `node`.
    pub fn node_record(&self, node: NodeId) -> Option<&NodeRecord<N>> {
        self.nodes.get(node.slot()?)
    }

    /// The raw record of `arc`.
    pub fn arc_record(&self, arc: ArcId) -> Option<&ArcRecord<A>> {
        self.arcs.get(arc.slot()?)
    }

    /// Every `(node, payload)` pair in handle order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(slot, record)| (NodeId::from_slot(slot), &record.data))
    }

    /// Every `(arc, payload)` pair in handle order, root arc first.
    pub fn arcs(&self) -> impl ExactSizeIterator<Item = (ArcId, &A)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .map(|(slot, record)| (ArcId::from_slot(slot), &record.data))
    }

    /// Consumes the tree, yielding its raw records in handle order.
    pub(crate) fn into_records(self) -> (Vec<NodeRecord<N>>, Vec<ArcRecord<A>>) {
        (self.nodes, self.arcs)
    }

    /// Replaces the tree by the sub-graph reachable from `new_root`.
    ///
    /// Nodes and arcs are renumbered densely from the new root; payloads are
    /// moved, never cloned. The new root arc carries the old root arc's
    /// payload. Everything unreachable from `new_root` is dropped.
    ///
    /// # Errors
    /// [`GraphError::ExtractRoot`] if `new_root` is the current root;
    /// [`GraphError::InvalidNode`] or [`GraphError::OutOfBounds`] if it is
    /// not a node of this tree. On these errors the tree is left untouched.
    pub fn make_sub_tree(&mut self, new_root: NodeId) -> Result<()> {
        let root_slot = self.node_slot(new_root)?;
        let plan = ExtractionPlan::build(&*self, new_root)?;

        let mut nodes: Vec<Option<N>> = mem::take(&mut self.nodes)
            .into_iter()
            .map(|n| Some(n.data))
            .collect();
        let mut arcs: Vec<Option<A>> = mem::take(&mut self.arcs)
            .into_iter()
            .map(|a| Some(a.data))
            .collect();

        let mut tree = Self::with_capacity(
            take(&mut nodes, root_slot)?,
            take(&mut arcs, 0)?,
            plan.node_count(),
            plan.arc_count() + 1,
        );
        for step in plan.into_steps() {
            match step {
                PlanStep::Node(old) => {
                    let data = take(&mut nodes, old.get() as usize - 1)?;
                    tree.add_node(data);
                }
                PlanStep::Arc { arc, source, target } => {
                    let data = take(&mut arcs, arc.get() as usize - 1)?;
                    tree.add_arc(NodeId::from_slot(source), NodeId::from_slot(target), data)?;
                }
            }
        }

        trace!(
            nodes = tree.node_num(),
            arcs = tree.arc_num(),
            "extracted flat sub-tree"
        );
        *self = tree;
        Ok(())
    }

    /// Checks every structural invariant of a tree that did not come from
    /// the append API (for example one produced by a deserializer).
    ///
    /// # Errors
    /// Returns [`GraphError::Corrupt`] naming the first violation found.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(GraphError::Corrupt(msg));

        if self.nodes.is_empty() {
            return corrupt("no root node".into());
        }
        match self.arcs.first() {
            Some(arc) if arc.source.is_invalid() && arc.target == ROOT => {}
            _ => return corrupt("missing root arc".into()),
        }

        let node_ok = |id: NodeId| id.slot().is_some_and(|s| s < self.nodes.len());
        let arc_link_ok = |id: ArcId| id.slot().map_or(true, |s| s < self.arcs.len());

        for (slot, arc) in self.arcs.iter().enumerate() {
            let id = ArcId::from_slot(slot);
            if slot != 0 && !node_ok(arc.source) {
                return corrupt(format!("arc {id} has source {} out of bounds", arc.source));
            }
            if !node_ok(arc.target) {
                return corrupt(format!("arc {id} has target {} out of bounds", arc.target));
            }
            if !arc_link_ok(arc.next_in) || !arc_link_ok(arc.next_out) {
                return corrupt(format!("arc {id} links out of bounds"));
            }
        }

        let (mut in_total, mut out_total) = (0usize, 0usize);
        for (slot, node) in self.nodes.iter().enumerate() {
            let id = NodeId::from_slot(slot);
            for (head, tail, size, incoming) in [
                (node.head_in, node.tail_in, node.in_size, true),
                (node.head_out, node.tail_out, node.out_size, false),
            ] {
                let side = if incoming { "in" } else { "out" };
                if !arc_link_ok(head) || !arc_link_ok(tail) {
                    return corrupt(format!("node {id} {side}-chain out of bounds"));
                }
                let mut len = 0usize;
                let mut last = ArcId::INVALID;
                let mut cursor = head;
                while let Some(s) = cursor.slot() {
                    len += 1;
                    if len > self.arcs.len() {
                        return corrupt(format!("node {id} {side}-chain does not terminate"));
                    }
                    let arc = &self.arcs[s];
                    let end = if incoming { arc.target } else { arc.source };
                    if end != id {
                        return corrupt(format!("arc {cursor} in {side}-chain of node {id} belongs to {end}"));
                    }
                    last = cursor;
                    cursor = if incoming { arc.next_in } else { arc.next_out };
                }
                if last != tail || len != size as usize {
                    return corrupt(format!("node {id} {side}-chain length or tail mismatch"));
                }
            }
            in_total += node.in_size as usize;
            out_total += node.out_size as usize;
        }

        if in_total != self.arcs.len() || out_total != self.arcs.len() - 1 {
            return corrupt("arcs missing from chains".into());
        }
        Ok(())
    }
}

fn take<T>(slots: &mut [Option<T>], slot: usize) -> Result<T> {
    slots
        .get_mut(slot)
        .and_then(Option::take)
        .ok_or_else(|| GraphError::Corrupt(format!("record {} moved twice", slot + 1)))
}

impl<N, A> Index<NodeId> for FlatTree<N, A> {
    type Output = N;

    fn index(&self, node: NodeId) -> &N {
        &self.node_ref(node).data
    }
}

impl<N, A> IndexMut<NodeId> for FlatTree<N, A> {
    fn index_mut(&mut self, node: NodeId) -> &mut N {
        match self.node_mut(node) {
            Ok(data) => data,
            Err(err) => panic!("node {node}: {err}"),
        }
    }
}

impl<N, A> Index<ArcId> for FlatTree<N, A> {
    type Output = A;

    fn index(&self, arc: ArcId) -> &A {
        &self.arc_ref(arc).data
    }
}

impl<N, A> IndexMut<ArcId> for FlatTree<N, A> {
    fn index_mut(&mut self, arc: ArcId) -> &mut A {
        match self.arc_mut(arc) {
            Ok(data) => data,
            Err(err) => panic!("arc {arc}: {err}"),
        }
    }
}

impl<N, A> SearchGraph for FlatTree<N, A> {
    type NodeId = NodeId;
    type ArcId = ArcId;
    type OutArcs<'a> = OutArcs<'a, A> where Self: 'a;
    type InArcs<'a> = InArcs<'a, A> where Self: 'a;

    fn root(&self) -> NodeId {
        ROOT
    }

    fn out_arcs(&self, node: NodeId) -> OutArcs<'_, A> {
        FlatTree::out_arcs(self, node)
    }

    fn in_arcs(&self, node: NodeId) -> InArcs<'_, A> {
        FlatTree::in_arcs(self, node)
    }

    fn source(&self, arc: ArcId) -> NodeId {
        FlatTree::source(self, arc)
    }

    fn target(&self, arc: ArcId) -> NodeId {
        FlatTree::target(self, arc)
    }

    fn node_index(&self, node: NodeId) -> Option<usize> {
        self.node_slot(node).ok()
    }

    fn node_bound(&self) -> usize {
        self.nodes.len()
    }

    fn arc_index(&self, arc: ArcId) -> Option<usize> {
        self.arc_slot(arc).ok()
    }

    fn arc_bound(&self) -> usize {
        self.arcs.len()
    }
}

impl<N, A> GrowGraph for FlatTree<N, A> {
    type NodeData = N;
    type ArcData = A;

    fn add_node(&mut self, data: N) -> NodeId {
        FlatTree::add_node(self, data)
    }

    fn add_arc(&mut self, source: NodeId, target: NodeId, data: A) -> Result<ArcId> {
        FlatTree::add_arc(self, source, target, data)
    }

    fn node_data(&self, node: NodeId) -> Result<&N> {
        self.node(node)
    }

    fn node_data_mut(&mut self, node: NodeId) -> Result<&mut N> {
        self.node_mut(node)
    }
}
