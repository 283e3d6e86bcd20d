use grove::graph::{walk_breadth_first, Bfs};
use grove::{AdjacencyTree, FlatTree, GrowGraph, SearchGraph};

/// Root `1` with children `2, 3, 4`; grandchild `5` under `2`, also reached from `3`.
fn build<G>(graph: &mut G) -> [G::NodeId; 4]
where
    G: GrowGraph<NodeData = u32, ArcData = u32>,
{
    let root = graph.root();
    let n2 = graph.add_node(2);
    let n3 = graph.add_node(3);
    let n4 = graph.add_node(4);
    let n5 = graph.add_node(5);
    graph.add_arc(root, n2, 12).unwrap();
    graph.add_arc(root, n3, 13).unwrap();
    graph.add_arc(root, n4, 14).unwrap();
    graph.add_arc(n2, n5, 25).unwrap();
    graph.add_arc(n3, n5, 35).unwrap();
    [n2, n3, n4, n5]
}

fn payloads<G>(graph: &G, nodes: impl Iterator<Item = G::NodeId>) -> Vec<u32>
where
    G: GrowGraph<NodeData = u32, ArcData = u32>,
{
    let mut seen: Vec<u32> = nodes.map(|n| *graph.node_data(n).unwrap()).collect();
    seen.sort_unstable();
    seen
}

fn check_bfs<G>(graph: &G, grandchild: G::NodeId)
where
    G: GrowGraph<NodeData = u32, ArcData = u32>,
{
    assert_eq!(payloads(graph, Bfs::new(graph, graph.root())), vec![1, 2, 3, 4, 5]);

    let mut discoveries = 0;
    let mut arcs_into_grandchild = 0;
    walk_breadth_first(graph, graph.root(), |visit| {
        if visit.child == grandchild {
            arcs_into_grandchild += 1;
            if visit.discovered {
                discoveries += 1;
            }
        }
    });
    assert_eq!(arcs_into_grandchild, 2);
    assert_eq!(discoveries, 1);
}

#[test]
fn test_scenario_on_adjacency_tree() {
    let mut tree: AdjacencyTree<u32, u32> = AdjacencyTree::new(1);
    let [n2, _, _, n5] = build(&mut tree);

    assert_eq!(tree.node_num(), 5);
    assert_eq!(tree.arc_num(), 5);
    assert_eq!(tree.in_arc_num(n5), 2);
    assert_eq!(tree.out_arc_num(tree.root()), 3);
    check_bfs(&tree, n5);

    tree.make_sub_tree(n2).unwrap();
    let sub = tree;
    assert_eq!(sub.node_num(), 2);
    assert_eq!(sub.arc_num(), 1);
    assert_eq!(sub[sub.root()], 2);
    let child = sub.children(sub.root()).next().unwrap();
    assert_eq!(sub[child], 5);
    assert_eq!(sub.in_arc_num(child), 1);
    assert_eq!(sub[sub.in_arcs(child).next().unwrap()], 25);
}

#[test]
fn test_scenario_on_flat_tree() {
    let mut tree: FlatTree<u32, u32> = FlatTree::new(1);
    let [n2, _, _, n5] = build(&mut tree);

    assert_eq!(tree.node_num(), 5);
    assert_eq!(tree.arc_num(), 5);
    assert_eq!(tree.in_arc_num(n5), 2);
    assert_eq!(tree.out_arc_num(tree.root()), 3);
    check_bfs(&tree, n5);

    tree.make_sub_tree(n2).unwrap();
    let sub = tree;
    assert_eq!(sub.node_num(), 2);
    assert_eq!(sub.arc_num(), 1);
    assert_eq!(sub[sub.root()], 2);
    let child = sub.children(sub.root()).next().unwrap();
    assert_eq!(sub[child], 5);
    assert_eq!(sub.in_arc_num(child), 1);
    sub.validate().unwrap();
}

#[test]
fn test_root_in_arc_invariant() {
    let adjacency: AdjacencyTree<u32, u32> = AdjacencyTree::new(1);
    let arcs: Vec<_> = adjacency.in_arcs(adjacency.root()).collect();
    assert_eq!(arcs.len(), 1);
    assert!(adjacency.source(arcs[0]).is_invalid());

    let flat: FlatTree<u32, u32> = FlatTree::new(1);
    let arcs: Vec<_> = flat.in_arcs(flat.root()).collect();
    assert_eq!(arcs.len(), 1);
    assert!(flat.source(arcs[0]).is_invalid());
}
