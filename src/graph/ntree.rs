//! `NaryTree`: a pure tree with parent and sibling links only.
//!
//! Each node stores its parent (`up`), its previous sibling (`prev`), its
//! newest child (`tail`) and its arity. Children are walked newest first by
//! following `tail`, then `prev`. There are no arcs and no multi-parent
//! nodes; the cost is one 16-byte header per node.

use core::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::graph::handle::NodeId;

/// Raw node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaryNode<N> {
    up: NodeId,
    prev: NodeId,
    tail: NodeId,
    size: u32,
    data: N,
}

impl<N> NaryNode<N> {
    fn new(up: NodeId, prev: NodeId, data: N) -> Self {
        Self {
            up,
            prev,
            tail: NodeId::INVALID,
            size: 0,
            data,
        }
    }

    /// Parent (invalid for the root).
    pub fn up(&self) -> NodeId {
        self.up
    }

    /// Previous (older) sibling.
    pub fn prev(&self) -> NodeId {
        self.prev
    }

    /// Newest child.
    pub fn tail(&self) -> NodeId {
        self.tail
    }

    /// Number of children.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The payload.
    pub fn data(&self) -> &N {
        &self.data
    }
}

/// Iterator over a node's children, newest first.
#[derive(Debug, Clone)]
pub struct Children<'a, N> {
    nodes: &'a [NaryNode<N>],
    next: NodeId,
    remaining: usize,
}

impl<N> Iterator for Children<'_, N> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next;
        self.next = self.nodes.get(id.slot()?)?.prev;
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// A rooted n-ary tree over one flat array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaryTree<N> {
    nodes: Vec<NaryNode<N>>,
}

const ROOT: NodeId = NodeId::new(1);

#[allow(clippy::len_without_is_empty)]
impl<N> NaryTree<N> {
    /// Creates a tree holding only `root`.
    pub fn new(root: N) -> Self {
        Self::with_capacity(1, root)
    }

    /// Creates a tree holding only `root`, with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize, root: N) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(NaryNode::new(NodeId::INVALID, NodeId::INVALID, root));
        Self { nodes }
    }

    /// Reserves room for `additional` more nodes.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    /// The root node.
    #[inline]
    pub fn root_node(&self) -> NodeId {
        ROOT
    }

    /// Number of nodes, root included. Never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn slot(&self, id: NodeId) -> Result<usize> {
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

    fn record(&self, id: NodeId) -> &NaryNode<N> {
        match self.slot(id) {
            Ok(slot) => &self.nodes[slot],
            Err(err) => panic!("node {id}: {err}"),
        }
    }

    /// Appends `data` as the newest child of `parent`.
    ///
    /// # Errors
    /// Fails if `parent` is not a node of this tree.
    pub fn add_node(&mut self, parent: NodeId, data: N) -> Result<NodeId> {
        let slot = self.slot(parent)?;
        Ok(self.push_child(slot, data))
    }

    fn push_child(&mut self, parent_slot: usize, data: N) -> NodeId {
        let id = NodeId::from_slot(self.nodes.len());
        let parent = &mut self.nodes[parent_slot];
        let prev = parent.tail;
        parent.tail = id;
        parent.size += 1;
        self.nodes
            .push(NaryNode::new(NodeId::from_slot(parent_slot), prev, data));
        id
    }

    /// Children of `node`, newest first.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn children(&self, node: NodeId) -> Children<'_, N> {
        let record = self.record(node);
        Children {
            nodes: &self.nodes,
            next: record.tail,
            remaining: record.size as usize,
        }
    }

    /// Parent of `node`; `None` for the root and for unknown handles.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let up = self.nodes.get(node.slot()?)?.up;
        up.is_valid().then_some(up)
    }

    /// Number of children of `node`.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this tree.
    pub fn arity(&self, node: NodeId) -> usize {
        self.record(node).size as usize
    }

    /// `true` if `node` has no children.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.arity(node) == 0
    }

    /// `true` if `node` has children.
    pub fn is_internal(&self, node: NodeId) -> bool {
        !self.is_leaf(node)
    }

    /// Payload of `node`, if it exists.
    pub fn get(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.slot()?).map(|n| &n.data)
    }

    /// Mutable payload of `node`, if it exists.
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.slot()?).map(|n| &mut n.data)
    }

    /// The raw record of `node`.
    pub fn node_record(&self, node: NodeId) -> Option<&NaryNode<N>> {
        self.nodes.get(node.slot()?)
    }

    /// Every `(node, payload)` pair in handle order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(slot, n)| (NodeId::from_slot(slot), &n.data))
    }

    /// Makes `new_root` the root, discarding everything outside its subtree.
    ///
    /// Payloads are moved, sibling order is kept and nodes are renumbered
    /// depth first.
    ///
    /// # Errors
    /// [`GraphError::ExtractRoot`] if `new_root` is the current root; fails
    /// if it is not a node of this tree. The tree is unchanged on error.
    pub fn root(&mut self, new_root: NodeId) -> Result<()> {
        let slot = self.slot(new_root)?;
        if new_root == ROOT {
            return Err(GraphError::ExtractRoot);
        }
        let mut old = Drained::new(core::mem::take(&mut self.nodes));
        let root_data = old.take(slot)?;
        *self = Self::with_capacity(old.len(), root_data);
        let kids = old.children(slot);
        self.graft(&mut old, &kids, 0)?;

        trace!(nodes = self.len(), "re-rooted n-ary tree");
        Ok(())
    }

    /// Lifts every grandchild of the root to a direct child of the root,
    /// keeping each grandchild's subtree and discarding the children level.
    pub fn flatten(&mut self) {
        let mut old = Drained::new(core::mem::take(&mut self.nodes));
        let grandchildren: Vec<usize> = old
            .children(0)
            .into_iter()
            .flat_map(|child| old.children(child))
            .collect();
        let root_data = match old.take(0) {
            Ok(data) => data,
            Err(err) => panic!("flatten: {err}"),
        };
        *self = Self::with_capacity(old.len(), root_data);
        if let Err(err) = self.graft(&mut old, &grandchildren, 0) {
            panic!("flatten: {err}");
        }

        trace!(nodes = self.len(), "flattened n-ary tree");
    }

    /// Moves the subtrees rooted at `seeds` (old slots, oldest first) under
    /// `parent` (new slot), preserving sibling order at every level.
    fn graft(&mut self, old: &mut Drained<N>, seeds: &[usize], parent: usize) -> Result<()> {
        let mut stack: Vec<(usize, usize)> = seeds.iter().rev().map(|&s| (s, parent)).collect();
        while let Some((from, to)) = stack.pop() {
            let data = old.take(from)?;
            let placed = self.push_child(to, data);
            let new_slot = placed.get() as usize - 1;
            stack.extend(old.children(from).into_iter().rev().map(|c| (c, new_slot)));
        }
        Ok(())
    }

    /// Checks the parent, sibling and arity links of a deserialized tree.
    ///
    /// # Errors
    /// Returns [`GraphError::Corrupt`] naming the first violation found.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.nodes.first() else {
            return Err(GraphError::Corrupt("no root node".into()));
        };
        if root.up.is_valid() || root.prev.is_valid() {
            return Err(GraphError::Corrupt("root has a parent or sibling".into()));
        }
        let mut seen = 0usize;
        for (slot, node) in self.nodes.iter().enumerate() {
            let id = NodeId::from_slot(slot);
            let mut count = 0usize;
            let mut cursor = node.tail;
            while let Some(child) = cursor.slot() {
                count += 1;
                let Some(record) = self.nodes.get(child).filter(|_| count < self.nodes.len()) else {
                    return Err(GraphError::Corrupt(format!("child chain of node {id} is broken")));
                };
                if record.up != id {
                    return Err(GraphError::Corrupt(format!("node {cursor} is not a child of {id}")));
                }
                cursor = record.prev;
            }
            if count != node.size as usize {
                return Err(GraphError::Corrupt(format!("node {id} arity mismatch")));
            }
            seen += count;
        }
        if seen + 1 != self.nodes.len() {
            return Err(GraphError::Corrupt("unreachable nodes".into()));
        }
        Ok(())
    }
}

/// The old node array during a rebuild: topology stays readable while
/// payloads are moved out one by one.
struct Drained<N> {
    links: Vec<(NodeId, NodeId, u32)>,
    data: Vec<Option<N>>,
}

impl<N> Drained<N> {
    fn new(nodes: Vec<NaryNode<N>>) -> Self {
        let mut links = Vec::with_capacity(nodes.len());
        let mut data = Vec::with_capacity(nodes.len());
        for node in nodes {
            links.push((node.tail, node.prev, node.size));
            data.push(Some(node.data));
        }
        Self { links, data }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn take(&mut self, slot: usize) -> Result<N> {
        self.data
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or_else(|| GraphError::Corrupt(format!("node {} moved twice", slot + 1)))
    }

    /// Child slots of `slot`, oldest first.
    fn children(&self, slot: usize) -> Vec<usize> {
        let Some(&(tail, _, size)) = self.links.get(slot) else {
            return Vec::new();
        };
        let mut kids = Vec::with_capacity(size as usize);
        let mut cursor = tail;
        while let Some(child) = cursor.slot() {
            if kids.len() == size as usize {
                break;
            }
            kids.push(child);
            cursor = self.links.get(child).map_or(NodeId::INVALID, |l| l.1);
        }
        kids.reverse();
        kids
    }
}

impl<N> Index<NodeId> for NaryTree<N> {
    type Output = N;

    fn index(&self, node: NodeId) -> &N {
        &self.record(node).data
    }
}

impl<N> IndexMut<NodeId> for NaryTree<N> {
    fn index_mut(&mut self, node: NodeId) -> &mut N {
        match self.slot(node) {
            Ok(slot) => &mut self.nodes[slot].data,
            Err(err) => panic!("node {node}: {err}"),
        }
    }
}
