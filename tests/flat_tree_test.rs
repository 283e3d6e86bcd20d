use grove::graph::handle::{ArcId, NodeId};
use grove::{FlatTree, GraphError};

fn chain(len: u32) -> FlatTree<u32, u32> {
    let mut tree = FlatTree::new(0);
    let mut parent = tree.root();
    for i in 1..len {
        let child = tree.add_node(i);
        tree.add_arc(parent, child, i).unwrap();
        parent = child;
    }
    tree
}

#[test]
fn test_handles_are_dense_from_two() {
    let mut tree: FlatTree<u8, u8> = FlatTree::new(0);
    assert_eq!(tree.root(), NodeId::new(1));
    assert_eq!(tree.root_arc(), ArcId::new(1));
    let a = tree.add_node(1);
    let arc = tree.add_arc(tree.root(), a, 1).unwrap();
    assert_eq!(a.get(), 2);
    assert_eq!(arc.get(), 2);
    assert_eq!(a.to_string(), "2");
}

#[test]
fn test_counts_track_records() {
    let tree = chain(10);
    assert_eq!(tree.node_num(), 10);
    assert_eq!(tree.arc_num(), 9);
    assert_eq!(tree.nodes().len(), 10);
    assert_eq!(tree.arcs().len(), 10);
    let total_out: usize = tree.nodes().map(|(n, _)| tree.out_arc_num(n)).sum();
    assert_eq!(total_out, tree.arc_num());
}

#[test]
fn test_in_and_out_chains() {
    let mut tree: FlatTree<&str, u32> = FlatTree::new("r");
    let root = tree.root();
    let a = tree.add_node("a");
    let b = tree.add_node("b");
    for w in [1, 2, 3] {
        tree.add_arc(root, a, w).unwrap();
    }
    tree.add_arc(a, b, 4).unwrap();
    tree.add_arc(b, a, 5).unwrap();

    let out_root: Vec<u32> = tree.out_arcs(root).map(|arc| tree[arc]).collect();
    assert_eq!(out_root, vec![1, 2, 3]);
    let in_a: Vec<u32> = tree.in_arcs(a).map(|arc| tree[arc]).collect();
    assert_eq!(in_a, vec![1, 2, 3, 5]);
    assert!(tree.has_in_arc(a) && tree.has_out_arc(a));
    assert!(tree.is_internal(b));
    tree.validate().unwrap();
}

#[test]
fn test_sub_tree_renumbers_densely() {
    let mut sub = chain(6);
    sub.make_sub_tree(NodeId::new(3)).unwrap();
    assert_eq!(sub.node_num(), 4);
    assert_eq!(sub.arc_num(), 3);
    let payloads: Vec<u32> = sub.nodes().map(|(_, &p)| p).collect();
    assert_eq!(payloads, vec![2, 3, 4, 5]);
    let arcs: Vec<u32> = sub.arcs().map(|(_, &p)| p).collect();
    // root arc keeps the old root arc's payload
    assert_eq!(arcs, vec![0, 3, 4, 5]);
    sub.validate().unwrap();
}

#[test]
fn test_sub_tree_of_a_leaf() {
    let mut sub = chain(3);
    sub.make_sub_tree(NodeId::new(3)).unwrap();
    assert_eq!(sub.node_num(), 1);
    assert_eq!(sub.arc_num(), 0);
    assert_eq!(sub[sub.root()], 2);
}

#[test]
fn test_sub_tree_rejects_root_and_bad_handles() {
    let mut tree = chain(3);
    assert_eq!(tree.make_sub_tree(NodeId::new(1)), Err(GraphError::ExtractRoot));
    assert_eq!(tree.make_sub_tree(NodeId::INVALID), Err(GraphError::InvalidNode));
    assert_eq!(
        tree.make_sub_tree(NodeId::new(8)),
        Err(GraphError::OutOfBounds { index: 8, len: 4 })
    );
}

#[test]
fn test_rejected_sub_tree_leaves_tree_intact() {
    let mut tree = chain(4);
    let before = tree.clone();
    assert!(tree.make_sub_tree(tree.root()).is_err());
    assert!(tree.make_sub_tree(NodeId::new(40)).is_err());
    assert_eq!(tree, before);
    tree.validate().unwrap();

    tree.make_sub_tree(NodeId::new(2)).unwrap();
    assert_eq!(tree.node_num(), 3);
}

#[test]
fn test_handles_serialize_as_integers() {
    assert_eq!(serde_json::to_string(&NodeId::new(7)).unwrap(), "7");
    assert_eq!(serde_json::to_string(&ArcId::INVALID).unwrap(), "0");
    let back: NodeId = serde_json::from_str("12").unwrap();
    assert_eq!(back, NodeId::new(12));
}

#[test]
fn test_json_round_trip_keeps_structure() {
    let tree = chain(4);
    let json = serde_json::to_string(&tree).unwrap();
    let back: FlatTree<u32, u32> = serde_json::from_str(&json).unwrap();
    back.validate().unwrap();
    assert_eq!(back, tree);
}
