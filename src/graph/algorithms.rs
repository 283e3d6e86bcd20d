//! Traversals and whole-graph rewrites over any [`SearchGraph`].
//!
//! Every routine sizes its bookkeeping to the graph's dense index bounds and
//! walks with an explicit queue or stack, so depth is limited by memory only.
//!
//! # Performance
//! - `Bfs` / `Dfs`: O(V + E) time, O(V) bits of visited state
//! - `topological_sort`: O(V + E · in-degree), in-degree ≈ 1 for search trees
//! - `ExtractionPlan::build`: O(V + E) over the reachable part

use core::fmt;
use std::collections::VecDeque;

use tracing::trace;

use super::access::visited::VisitedSet;
use super::SearchGraph;
use crate::error::{GraphError, Result};

/// Breadth-first iterator over the nodes reachable from a start node.
///
/// Yields the start node first and every reachable node exactly once.
pub struct Bfs<'g, G: SearchGraph> {
    graph: &'g G,
    visited: VisitedSet,
    queue: VecDeque<G::NodeId>,
}

impl<'g, G: SearchGraph> Bfs<'g, G> {
    /// Starts a walk at `start`. A dead `start` yields nothing.
    pub fn new(graph: &'g G, start: G::NodeId) -> Self {
        let mut visited = VisitedSet::new(graph.node_bound());
        let mut queue = VecDeque::new();

        if let Some(index) = graph.node_index(start) {
            visited.insert(index);
            queue.push_back(start);
        }

        Self {
            graph,
            visited,
            queue,
        }
    }
}

impl<G: SearchGraph> Iterator for Bfs<'_, G> {
    type Item = G::NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.queue.pop_front()?;

        for arc in self.graph.out_arcs(u) {
            let v = self.graph.target(arc);
            if let Some(index) = self.graph.node_index(v) {
                if self.visited.insert(index) {
                    self.queue.push_back(v);
                }
            }
        }

        Some(u)
    }
}

/// Depth-first iterator over the nodes reachable from a start node.
///
/// Uses an explicit stack; the last out-arc of a node is descended first.
pub struct Dfs<'g, G: SearchGraph> {
    graph: &'g G,
    visited: VisitedSet,
    stack: Vec<G::NodeId>,
}

impl<'g, G: SearchGraph> Dfs<'g, G> {
    /// Starts a walk at `start`. A dead `start` yields nothing.
    pub fn new(graph: &'g G, start: G::NodeId) -> Self {
        let mut visited = VisitedSet::new(graph.node_bound());
        let mut stack = Vec::new();

        if let Some(index) = graph.node_index(start) {
            visited.insert(index);
            stack.push(start);
        }

        Self {
            graph,
            visited,
            stack,
        }
    }
}

impl<G: SearchGraph> Iterator for Dfs<'_, G> {
    type Item = G::NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.stack.pop()?;

        for arc in self.graph.out_arcs(u) {
            let v = self.graph.target(arc);
            if let Some(index) = self.graph.node_index(v) {
                if self.visited.insert(index) {
                    self.stack.push(v);
                }
            }
        }

        Some(u)
    }
}

/// One arc crossed by a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcVisit<N, A> {
    /// Node the walk is expanding.
    pub parent: N,
    /// Arc being crossed.
    pub arc: A,
    /// Target of `arc`.
    pub child: N,
    /// `true` if this arc is the first to reach `child`.
    pub discovered: bool,
}

#[derive(Clone, Copy)]
enum Frontier {
    Queue,
    Stack,
}

fn walk<G, F>(graph: &G, start: G::NodeId, frontier: Frontier, mut visit: F) -> usize
where
    G: SearchGraph,
    F: FnMut(ArcVisit<G::NodeId, G::ArcId>),
{
    let Some(start_index) = graph.node_index(start) else {
        return 0;
    };
    let mut visited = VisitedSet::new(graph.node_bound());
    visited.insert(start_index);
    let mut pending = VecDeque::from([start]);
    let mut expanded = 0;

    loop {
        let next = match frontier {
            Frontier::Queue => pending.pop_front(),
            Frontier::Stack => pending.pop_back(),
        };
        let Some(parent) = next else { break };
        expanded += 1;

        for arc in graph.out_arcs(parent) {
            let child = graph.target(arc);
            let discovered = graph
                .node_index(child)
                .is_some_and(|index| visited.insert(index));
            if discovered {
                pending.push_back(child);
            }
            visit(ArcVisit {
                parent,
                arc,
                child,
                discovered,
            });
        }
    }

    expanded
}

/// Breadth-first walk from `start`, reporting every arc crossed.
///
/// Each reachable node is expanded once; every out-arc of an expanded node is
/// reported, including arcs back to already-seen nodes. Returns the number
/// of nodes expanded.
pub fn walk_breadth_first<G, F>(graph: &G, start: G::NodeId, visit: F) -> usize
where
    G: SearchGraph,
    F: FnMut(ArcVisit<G::NodeId, G::ArcId>),
{
    walk(graph, start, Frontier::Queue, visit)
}

/// Depth-first counterpart of [`walk_breadth_first`].
pub fn walk_depth_first<G, F>(graph: &G, start: G::NodeId, visit: F) -> usize
where
    G: SearchGraph,
    F: FnMut(ArcVisit<G::NodeId, G::ArcId>),
{
    walk(graph, start, Frontier::Stack, visit)
}

/// Orders the nodes reachable from the root so every arc points forward.
///
/// A node becomes ready once all of its in-arcs have been consumed, which is
/// checked by rescanning its in-arcs every time one of them is consumed.
///
/// The graph must be acyclic with the root as its only source. Nodes with an
/// in-arc from outside the root's reach never become ready and are omitted;
/// on a cyclic graph every node is still emitted at most once.
pub fn topological_sort<G: SearchGraph>(graph: &G) -> Vec<G::NodeId> {
    let mut consumed = VisitedSet::new(graph.arc_bound());
    let mut emitted = VisitedSet::new(graph.node_bound());
    let mut ready = vec![graph.root()];
    let mut order = Vec::new();

    if let Some(root_arc) = graph.in_arcs(graph.root()).next() {
        if let Some(index) = graph.arc_index(root_arc) {
            consumed.insert(index);
        }
    }

    while let Some(node) = ready.pop() {
        match graph.node_index(node) {
            Some(index) if emitted.insert(index) => order.push(node),
            _ => continue,
        }

        for arc in graph.out_arcs(node) {
            if let Some(index) = graph.arc_index(arc) {
                consumed.insert(index);
            }
            let target = graph.target(arc);
            let all_consumed = graph
                .in_arcs(target)
                .all(|a| graph.arc_index(a).is_some_and(|i| consumed.contains(i)));
            if all_consumed {
                ready.push(target);
            }
        }
    }

    order
}

/// One instruction of an [`ExtractionPlan`].
///
/// New nodes are numbered by ordinal: `0` is the new root, `k` the `k`-th
/// [`PlanStep::Node`] in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStep<N, A> {
    /// Move node `old` into the new graph as the next ordinal.
    Node(N),
    /// Move arc `arc` into the new graph between two ordinals.
    Arc {
        /// Arc in the old graph.
        arc: A,
        /// Ordinal of the new source.
        source: usize,
        /// Ordinal of the new target.
        target: usize,
    },
}

/// A recipe for rebuilding the sub-graph reachable from a node.
///
/// Built by an explicit-stack DFS over out-arcs from the new root with a
/// dense old-to-new remap. Every reachable node appears once, before any arc
/// that touches it; every arc leaving a reachable node appears exactly once,
/// in its source's out-arc order. The old root arc never appears.
#[derive(Debug, Clone)]
pub struct ExtractionPlan<N, A> {
    new_root: N,
    steps: Vec<PlanStep<N, A>>,
    nodes: usize,
    arcs: usize,
}

const UNVISITED: usize = usize::MAX;

impl<N: Copy + Eq, A: Copy + fmt::Debug> ExtractionPlan<N, A> {
    /// Plans the extraction of everything reachable from `new_root`.
    ///
    /// # Errors
    /// [`GraphError::ExtractRoot`] if `new_root` is the current root,
    /// [`GraphError::InvalidNode`] if it is not a live node, and
    /// [`GraphError::Corrupt`] if an arc targets a dead node.
    pub fn build<G>(graph: &G, new_root: N) -> Result<Self>
    where
        G: SearchGraph<NodeId = N, ArcId = A>,
    {
        if new_root == graph.root() {
            return Err(GraphError::ExtractRoot);
        }
        let root_index = graph.node_index(new_root).ok_or(GraphError::InvalidNode)?;

        let mut remap = vec![UNVISITED; graph.node_bound()];
        remap[root_index] = 0;
        let mut stack = vec![(new_root, 0)];
        let mut steps = Vec::new();
        let mut nodes = 1;
        let mut arcs = 0;

        while let Some((node, source)) = stack.pop() {
            for arc in graph.out_arcs(node) {
                let child = graph.target(arc);
                let index = graph
                    .node_index(child)
                    .ok_or_else(|| GraphError::Corrupt(format!("arc {arc:?} targets a dead node")))?;
                if remap[index] == UNVISITED {
                    remap[index] = nodes;
                    steps.push(PlanStep::Node(child));
                    stack.push((child, nodes));
                    nodes += 1;
                }
                steps.push(PlanStep::Arc {
                    arc,
                    source,
                    target: remap[index],
                });
                arcs += 1;
            }
        }

        trace!(nodes, arcs, "planned sub-tree extraction");
        Ok(Self {
            new_root,
            steps,
            nodes,
            arcs,
        })
    }

    /// The node that becomes ordinal `0`.
    pub fn new_root(&self) -> N {
        self.new_root
    }

    /// Number of nodes in the extracted graph, new root included.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Number of arcs in the extracted graph, root arc excluded.
    pub fn arc_count(&self) -> usize {
        self.arcs
    }

    /// The steps in replay order.
    pub fn steps(&self) -> &[PlanStep<N, A>] {
        &self.steps
    }

    /// Consumes the plan, yielding its steps in replay order.
    pub fn into_steps(self) -> Vec<PlanStep<N, A>> {
        self.steps
    }
}
