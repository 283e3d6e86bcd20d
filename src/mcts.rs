//! Tree-growth helpers for Monte-Carlo tree search.
//!
//! A node's payload is its pool of untried moves; an arc's payload is the
//! move that produced it. Expanding a node draws one move from its pool and
//! records it on a new arc.

use rand::Rng;

use crate::error::Result;
use crate::graph::GrowGraph;
use crate::moves::Moves;

/// A supply of untried moves stored as a node payload.
pub trait MovePool {
    /// The move type, stored on arcs.
    type Move;

    /// Removes and returns a uniformly random move.
    fn take_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Self::Move>;

    /// `true` if no moves are left.
    fn is_exhausted(&self) -> bool;
}

impl<T: Copy + Default, const CAP: usize> MovePool for Moves<T, CAP> {
    type Move = T;

    fn take_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        Moves::take_one(self, rng)
    }

    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

/// Growth operations for graphs whose nodes hold a [`MovePool`] and whose
/// arcs hold that pool's moves.
///
/// Implemented for every such [`GrowGraph`], i.e. for both `AdjacencyTree`
/// and `FlatTree`.
pub trait Expand: GrowGraph {
    /// Draws a move from `source`'s pool and hangs a new node holding `fresh`
    /// off `source` by an arc carrying that move.
    ///
    /// Returns `None` (and adds nothing) when `source` has no moves left.
    ///
    /// # Errors
    /// Fails if `source` is not a live node.
    fn expand<R: Rng + ?Sized>(
        &mut self,
        source: Self::NodeId,
        fresh: Self::NodeData,
        rng: &mut R,
    ) -> Result<Option<Self::NodeId>>;

    /// Draws a move from `source`'s pool and records it on a new arc
    /// `source -> target` (a transposition).
    ///
    /// # Errors
    /// Fails if either endpoint is not a live node.
    fn connect<R: Rng + ?Sized>(
        &mut self,
        source: Self::NodeId,
        target: Self::NodeId,
        rng: &mut R,
    ) -> Result<Option<Self::ArcId>>;

    /// A uniformly random child of `source`, or `None` for a leaf or a dead
    /// node.
    fn select_child<R: Rng + ?Sized>(&self, source: Self::NodeId, rng: &mut R) -> Option<Self::NodeId>;

    /// `true` if `node` still has untried moves.
    ///
    /// # Errors
    /// Fails if `node` is not a live node.
    fn has_moves(&self, node: Self::NodeId) -> Result<bool>;
}

impl<G> Expand for G
where
    G: GrowGraph,
    G::NodeData: MovePool<Move = G::ArcData>,
{
    fn expand<R: Rng + ?Sized>(
        &mut self,
        source: G::NodeId,
        fresh: G::NodeData,
        rng: &mut R,
    ) -> Result<Option<G::NodeId>> {
        let Some(mv) = self.node_data_mut(source)?.take_one(rng) else {
            return Ok(None);
        };
        let target = self.add_node(fresh);
        self.add_arc(source, target, mv)?;
        Ok(Some(target))
    }

    fn connect<R: Rng + ?Sized>(
        &mut self,
        source: G::NodeId,
        target: G::NodeId,
        rng: &mut R,
    ) -> Result<Option<G::ArcId>> {
        self.node_data(target)?;
        let Some(mv) = self.node_data_mut(source)?.take_one(rng) else {
            return Ok(None);
        };
        self.add_arc(source, target, mv).map(Some)
    }

    fn select_child<R: Rng + ?Sized>(&self, source: G::NodeId, rng: &mut R) -> Option<G::NodeId> {
        self.node_index(source)?;
        let count = self.out_arcs(source).count();
        if count == 0 {
            return None;
        }
        let pick = rng.gen_range(0..count);
        self.out_arcs(source).nth(pick).map(|arc| self.target(arc))
    }

    fn has_moves(&self, node: G::NodeId) -> Result<bool> {
        Ok(!self.node_data(node)?.is_exhausted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AdjacencyTree, FlatTree};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Pool = Moves<u8, 3>;

    fn pool() -> Pool {
        Moves::full(|i| i as u8)
    }

    #[test]
    fn test_expand_consumes_source_moves() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tree: FlatTree<Pool, u8> = FlatTree::new(pool());
        let root = tree.root();
        let mut drawn = Vec::new();
        while let Some(child) = tree.expand(root, pool(), &mut rng).unwrap() {
            drawn.push(tree[tree.in_arcs(child).next().unwrap()]);
        }
        drawn.sort_unstable();
        assert_eq!(drawn, vec![0, 1, 2]);
        assert_eq!(tree.out_arc_num(root), 3);
        assert!(!tree.has_moves(root).unwrap());
    }

    #[test]
    fn test_connect_and_select_on_adjacency_tree() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut tree: AdjacencyTree<Pool, u8> = AdjacencyTree::new(pool());
        let root = tree.root();
        assert_eq!(tree.select_child(root, &mut rng), None);

        let a = tree.expand(root, pool(), &mut rng).unwrap().unwrap();
        let b = tree.expand(root, pool(), &mut rng).unwrap().unwrap();
        let arc = tree.connect(a, b, &mut rng).unwrap().unwrap();
        assert_eq!(tree.source(arc), a);
        assert_eq!(tree.in_arc_num(b), 2);

        for _ in 0..20 {
            let pick = tree.select_child(root, &mut rng).unwrap();
            assert!(pick == a || pick == b);
        }
        assert!(tree.has_moves(a).unwrap());
    }
}
