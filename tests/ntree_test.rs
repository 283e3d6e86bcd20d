use grove::graph::handle::NodeId;
use grove::NaryTree;

/// r -> {a -> {a1, a2 -> {x}}, b -> {b1}}
fn sample() -> (NaryTree<&'static str>, [NodeId; 6]) {
    let mut tree = NaryTree::new("r");
    let r = tree.root_node();
    let a = tree.add_node(r, "a").unwrap();
    let b = tree.add_node(r, "b").unwrap();
    let a1 = tree.add_node(a, "a1").unwrap();
    let a2 = tree.add_node(a, "a2").unwrap();
    let x = tree.add_node(a2, "x").unwrap();
    let b1 = tree.add_node(b, "b1").unwrap();
    (tree, [a, b, a1, a2, x, b1])
}

fn names(tree: &NaryTree<&'static str>, node: NodeId) -> Vec<&'static str> {
    tree.children(node).map(|c| tree[c]).collect()
}

#[test]
fn test_structure_queries() {
    let (tree, [a, b, a1, a2, x, b1]) = sample();
    assert_eq!(tree.len(), 7);
    assert_eq!(names(&tree, tree.root_node()), vec!["b", "a"]);
    assert_eq!(tree.arity(a), 2);
    assert_eq!(tree.parent(x), Some(a2));
    assert_eq!(tree.parent(b1), Some(b));
    assert!(tree.is_leaf(a1));
    assert!(tree.is_internal(a));
    assert_eq!(tree.get(NodeId::new(99)), None);
    assert_eq!(tree.iter().map(|(_, &n)| n).collect::<Vec<_>>(), vec!["r", "a", "b", "a1", "a2", "x", "b1"]);
}

#[test]
fn test_reroot_moves_subtree_and_keeps_order() {
    let (mut tree, [a, ..]) = sample();
    tree.root(a).unwrap();

    assert_eq!(tree.len(), 4);
    let root = tree.root_node();
    assert_eq!(tree[root], "a");
    assert_eq!(tree.parent(root), None);
    assert_eq!(names(&tree, root), vec!["a2", "a1"]);
    let a2 = tree.children(root).next().unwrap();
    assert_eq!(names(&tree, a2), vec!["x"]);
    tree.validate().unwrap();
}

#[test]
fn test_reroot_at_leaf_leaves_single_node() {
    let (mut tree, [.., x, _]) = sample();
    tree.root(x).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[tree.root_node()], "x");
    assert!(tree.is_leaf(tree.root_node()));
}

#[test]
fn test_reroot_rejects_unknown_node() {
    let (mut tree, _) = sample();
    assert!(tree.root(NodeId::new(50)).is_err());
    assert!(tree.root(NodeId::INVALID).is_err());
    assert_eq!(tree.len(), 7);
}

#[test]
fn test_flatten_drops_children_level() {
    let (mut tree, _) = sample();
    tree.flatten();

    let root = tree.root_node();
    assert_eq!(tree.len(), 5);
    assert_eq!(names(&tree, root), vec!["b1", "a2", "a1"]);
    let a2 = tree.children(root).nth(1).unwrap();
    assert_eq!(names(&tree, a2), vec!["x"]);
    tree.validate().unwrap();
}

#[test]
fn test_flatten_without_grandchildren_empties_tree() {
    let mut tree = NaryTree::new(0u32);
    let r = tree.root_node();
    tree.add_node(r, 1).unwrap();
    tree.add_node(r, 2).unwrap();
    tree.flatten();
    assert_eq!(tree.len(), 1);
    assert!(tree.is_leaf(tree.root_node()));
}
