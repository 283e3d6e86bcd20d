use std::collections::{HashMap, HashSet};

use grove::graph::{topological_sort, Bfs, Dfs};
use grove::{AdjacencyTree, FlatTree};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs as PetBfs;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    AddNode,
    AddArc(usize, usize),
    EraseArc(usize),
    EraseNode(usize),
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => Just(Operation::AddNode),
        4 => (any::<usize>(), any::<usize>()).prop_map(|(s, t)| Operation::AddArc(s, t)),
        1 => any::<usize>().prop_map(Operation::EraseArc),
        1 => any::<usize>().prop_map(Operation::EraseNode),
    ]
}

/// Arc list over `0..nodes`; node 0 is the root.
fn arc_list() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..40).prop_flat_map(|nodes| {
        let arcs = proptest::collection::vec((0..nodes, 0..nodes), 0..120);
        (Just(nodes), arcs)
    })
}

fn build_flat(nodes: usize, arcs: &[(usize, usize)]) -> FlatTree<usize, usize> {
    let mut tree = FlatTree::new(0);
    let mut ids = vec![tree.root()];
    ids.extend((1..nodes).map(|i| tree.add_node(i)));
    for (i, &(s, t)) in arcs.iter().enumerate() {
        tree.add_arc(ids[s], ids[t], i).unwrap();
    }
    tree
}

fn petgraph_reachable(nodes: usize, arcs: &[(usize, usize)], start: usize) -> HashSet<usize> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let ids: Vec<NodeIndex> = (0..nodes).map(|i| graph.add_node(i)).collect();
    for &(s, t) in arcs {
        graph.add_edge(ids[s], ids[t], ());
    }
    let mut bfs = PetBfs::new(&graph, ids[start]);
    let mut seen = HashSet::new();
    while let Some(n) = bfs.next(&graph) {
        seen.insert(graph[n]);
    }
    seen
}

proptest! {
    #[test]
    fn test_adjacency_degrees_match_arc_endpoints(ops in proptest::collection::vec(operation(), 1..200)) {
        let mut tree: AdjacencyTree<u32, u32> = AdjacencyTree::new(0);
        let mut nodes = vec![tree.root()];
        let mut arcs = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Operation::AddNode => nodes.push(tree.add_node(step as u32)),
                Operation::AddArc(s, t) => {
                    let (s, t) = (nodes[s % nodes.len()], nodes[t % nodes.len()]);
                    arcs.push(tree.add_arc(s, t, step as u32).unwrap());
                }
                Operation::EraseArc(i) if !arcs.is_empty() => {
                    let arc = arcs.swap_remove(i % arcs.len());
                    prop_assert!(tree.erase_arc(arc).is_ok());
                }
                Operation::EraseNode(i) if nodes.len() > 1 => {
                    let node = nodes.swap_remove(1 + i % (nodes.len() - 1));
                    prop_assert!(tree.erase_node(node).is_ok());
                    prop_assert!(!tree.contains_node(node));
                    arcs.retain(|&a| tree.contains_arc(a));
                }
                _ => {}
            }
        }

        prop_assert_eq!(tree.node_num(), nodes.len());
        prop_assert_eq!(tree.arc_num(), arcs.len());
        let mut out_degree: HashMap<_, usize> = HashMap::new();
        let mut in_degree: HashMap<_, usize> = HashMap::new();
        for (arc, _) in tree.arcs() {
            if tree.source(arc).is_valid() {
                *out_degree.entry(tree.source(arc)).or_default() += 1;
            }
            *in_degree.entry(tree.target(arc)).or_default() += 1;
        }
        for &node in &nodes {
            prop_assert_eq!(tree.out_arc_num(node), out_degree.get(&node).copied().unwrap_or(0));
            prop_assert_eq!(tree.in_arc_num(node), in_degree.get(&node).copied().unwrap_or(0));
        }
        prop_assert!(tree.in_arc_num(tree.root()) >= 1);
    }

    #[test]
    fn test_flat_degrees_and_validation((nodes, arcs) in arc_list()) {
        let tree = build_flat(nodes, &arcs);
        prop_assert!(tree.validate().is_ok());
        prop_assert_eq!(tree.arc_num(), arcs.len());
        for (id, &i) in tree.nodes() {
            let out = arcs.iter().filter(|&&(s, _)| s == i).count();
            let inc = arcs.iter().filter(|&&(_, t)| t == i).count() + usize::from(i == 0);
            prop_assert_eq!(tree.out_arc_num(id), out);
            prop_assert_eq!(tree.in_arc_num(id), inc);
        }
    }

    #[test]
    fn test_traversals_match_petgraph_reachability((nodes, arcs) in arc_list()) {
        let tree = build_flat(nodes, &arcs);
        let expected = petgraph_reachable(nodes, &arcs, 0);

        let bfs: Vec<usize> = Bfs::new(&tree, tree.root()).map(|n| tree[n]).collect();
        let dfs: Vec<usize> = Dfs::new(&tree, tree.root()).map(|n| tree[n]).collect();
        prop_assert_eq!(bfs.len(), expected.len());
        prop_assert_eq!(dfs.len(), expected.len());
        prop_assert_eq!(bfs.iter().copied().collect::<HashSet<_>>(), expected.clone());
        prop_assert_eq!(dfs.into_iter().collect::<HashSet<_>>(), expected);
        prop_assert_eq!(bfs[0], 0);
    }

    #[test]
    fn test_extraction_keeps_exactly_the_reachable_part(
        (nodes, arcs) in arc_list(),
        pick in any::<usize>(),
    ) {
        prop_assume!(nodes > 1);
        let start = 1 + pick % (nodes - 1);
        let reachable = petgraph_reachable(nodes, &arcs, start);
        let kept_arcs = arcs.iter().filter(|(s, _)| reachable.contains(s)).count();

        let flat = build_flat(nodes, &arcs);
        let flat_root = flat.nodes().nth(start).unwrap().0;
        let adjacency: AdjacencyTree<usize, usize> = AdjacencyTree::try_from(flat.clone()).unwrap();
        let adjacency_root = adjacency.nodes().find(|&(_, &p)| p == start).unwrap().0;

        let mut sub = flat;
        sub.make_sub_tree(flat_root).unwrap();
        prop_assert!(sub.validate().is_ok());
        prop_assert_eq!(sub.node_num(), reachable.len());
        prop_assert_eq!(sub.arc_num(), kept_arcs);
        prop_assert_eq!(sub[sub.root()], start);
        prop_assert_eq!(sub.nodes().map(|(_, &p)| p).collect::<HashSet<_>>(), reachable.clone());

        let mut sub = adjacency;
        sub.make_sub_tree(adjacency_root).unwrap();
        prop_assert_eq!(sub.node_num(), reachable.len());
        prop_assert_eq!(sub.arc_num(), kept_arcs);
        prop_assert_eq!(sub.nodes().map(|(_, &p)| p).collect::<HashSet<_>>(), reachable);
    }

    #[test]
    fn test_topological_order_on_random_dags((nodes, arcs) in arc_list()) {
        // forward arcs only, so the graph is acyclic
        let arcs: Vec<(usize, usize)> = arcs.into_iter().filter(|(s, t)| s < t).collect();
        let tree = build_flat(nodes, &arcs);
        let order: Vec<usize> = topological_sort(&tree).into_iter().map(|n| tree[n]).collect();

        let position: HashMap<usize, usize> = order.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        prop_assert_eq!(position.len(), order.len());
        prop_assert_eq!(order[0], 0);
        for &(s, t) in &arcs {
            if let (Some(ps), Some(pt)) = (position.get(&s), position.get(&t)) {
                prop_assert!(ps < pt, "arc {} -> {} points backwards", s, t);
            }
            if position.contains_key(&t) {
                prop_assert!(position.contains_key(&s), "{} emitted before its parent {}", t, s);
            }
        }
    }
}
