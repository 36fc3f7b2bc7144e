mod common;

use common::{assert_snapshot, chain, handle_of, preorder_values, sample_tree};
use test_case::test_case;
use vigil::{FaultKind, NodeId, Registry, Side, Stack, Tree, TreeConfig, TreeError};

#[test]
fn sample_structure() {
    let (_, tree) = sample_tree();
    let root = tree.root_node().unwrap();
    assert_eq!(*root.data(), 1);

    let two = tree.node(root.right().unwrap()).unwrap();
    let five = tree.node(root.left().unwrap()).unwrap();
    assert_eq!(*two.data(), 2);
    assert_eq!(*five.data(), 5);
    assert!(five.is_leaf());

    assert_eq!(*tree.node(two.right().unwrap()).unwrap().data(), 3);
    assert_eq!(*tree.node(two.left().unwrap()).unwrap().data(), 4);
    assert_eq!(tree.len(), 5);
}

#[test]
fn serialize_snapshot() {
    let (_, tree) = sample_tree();
    assert_snapshot("sample_tree.txt", &tree.serialize().unwrap());
}

#[test]
fn dot_snapshot() {
    let (_, tree) = sample_tree();
    assert_snapshot("sample_tree.dot", &tree.to_dot());
}

#[test]
fn serialized_form_parses_back() {
    let (mut registry, tree) = sample_tree();
    let text = tree.serialize().unwrap();
    let back: Tree<i32> = registry.parse_tree("back", &text).unwrap();

    assert!(back.structurally_eq(&tree));
    assert_eq!(back.serialize().unwrap(), text);
}

#[test]
fn deep_chain_roundtrip() {
    let mut registry = Registry::new();
    let tree = chain(&mut registry, 200);
    let back: Tree<i32> = registry.parse_tree("back", &tree.serialize().unwrap()).unwrap();

    assert!(back.structurally_eq(&tree));
    assert_eq!(preorder_values(&back), (0..200).collect::<Vec<_>>());
}

const DEEP: usize = 10_000;

/// Right-leaning chain `0 -> ... -> n-1` written the way the writer does with no indent
fn deep_chain_text(n: usize) -> String {
    let mut text = String::from("[\n");
    for value in 0..n {
        text.push_str(&format!("{}\n", value));
        if value + 1 < n {
            text.push_str("[\n");
        }
    }
    text.push_str(&"]\n".repeat(n));
    text
}

fn deep_registry() -> Registry {
    Registry::new().with_tree_config(TreeConfig::default().with_indent_width(0))
}

#[test]
fn ten_thousand_deep_chain() {
    let mut registry = deep_registry();
    let text = deep_chain_text(DEEP);
    let mut tree: Tree<i32> = registry.parse_tree("deep", &text).unwrap();

    tree.check().unwrap();
    assert_eq!(tree.len(), DEEP);

    let written = tree.serialize().unwrap();
    assert_eq!(written, text);
    let back: Tree<i32> = registry.parse_tree("back", &written).unwrap();
    assert!(back.structurally_eq(&tree));

    let mut path = registry.stack::<NodeId>("path").unwrap();
    assert!(tree.find_path(&mut path, &(DEEP as i32 - 1)).unwrap());
    assert_eq!(path.len(), DEEP);
    assert_eq!(*tree.path_values(&path).unwrap()[DEEP - 1], DEEP as i32 - 1);
}

#[test]
fn ten_thousand_deep_fault_path() {
    let mut registry = deep_registry();
    let mut tree: Tree<i32> = registry.parse_tree("deep", &deep_chain_text(DEEP)).unwrap();
    let deepest = handle_of(&tree, DEEP as i32 - 1);
    let above = handle_of(&tree, DEEP as i32 - 2);
    tree.set_parent(deepest, None).unwrap();

    let (kind, node, path) = match tree.check() {
        Err(TreeError::StructuralFault { kind, node, path }) => (kind, node, path),
        other => panic!("expected structural fault, got {:?}", other),
    };
    assert_eq!(node, deepest);
    assert_eq!(
        kind,
        FaultKind::WrongParent {
            expected: Some(above),
            found: None
        }
    );
    assert_eq!(path.len(), DEEP);
    assert_eq!(path[0], "0");
    assert_eq!(path[DEEP - 1], (DEEP - 1).to_string());
    assert_eq!(tree.fault_path().len(), DEEP);
}

#[test_case("[\n1\n" => 2 ; "unexpected end")]
#[test_case("1\n[\n]" => 1 ; "missing open bracket")]
#[test_case("[\n1\n2\n]" => 3 ; "two payloads")]
#[test_case("[\n1\n]\nextra" => 4 ; "trailing payload")]
#[test_case("[\n1\n[oops]\n]" => 3 ; "payload of the wrong type")]
fn syntax_error_line(text: &str) -> usize {
    let mut registry = Registry::new();
    match registry.parse_tree::<i32>("bad", text) {
        Err(TreeError::Syntax(err)) => err.line,
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn syntax_error_context_window() {
    let text = "[\n1\n[\n2\n3\n]\n]\n";
    let config = TreeConfig::default().with_context_radius(1);
    let mut registry = Registry::new().with_tree_config(config);

    let err = registry.parse_tree::<i32>("bad", text).unwrap_err();
    let TreeError::Syntax(syntax) = &err else {
        panic!("expected syntax error, got {:?}", err);
    };
    assert_eq!(syntax.line, 5);
    assert_eq!(
        syntax.context,
        vec![(4, "2".to_string()), (5, "3".to_string()), (6, "]".to_string())]
    );
    assert!(err.to_string().contains(">     5 | 3"));
}

#[test]
fn fault_path_runs_from_fault_to_root() {
    let (_, mut tree) = sample_tree();
    let four = handle_of(&tree, 4);
    tree.set_parent(four, None).unwrap();

    let err = tree.check().unwrap_err();
    assert_eq!(
        err,
        TreeError::StructuralFault {
            kind: FaultKind::WrongParent {
                expected: Some(handle_of(&tree, 2)),
                found: None,
            },
            node: four,
            path: vec!["1".into(), "2".into(), "4".into()],
        }
    );
    assert_eq!(tree.fault_path().to_vec(), vec![4, 2, 1]);
    assert_eq!(tree.fault_path().peek(), Ok(&1));
    assert_eq!(
        err.to_string(),
        format!(
            "wrong pointer to previous node (expected {}, found none) at node {} (path: 1 -> 2 -> 4)",
            handle_of(&tree, 2),
            four
        )
    );

    tree.recount_parents().unwrap();
    assert!(tree.check().is_ok());
    assert!(tree.fault_path().is_empty());
}

#[test]
fn graft_needs_depth_recount() {
    let (mut registry, mut tree) = sample_tree();
    let donor: Tree<i32> = registry.parse_tree("donor", "[\n7\n[8]\n[9]\n]").unwrap();
    let five = handle_of(&tree, 5);

    tree.graft(five, Side::Left, &donor).unwrap();
    assert!(matches!(
        tree.check(),
        Err(TreeError::StructuralFault {
            kind: FaultKind::WrongDepth { expected: 2, found: 0 },
            ..
        })
    ));

    tree.recount_depth().unwrap();
    assert!(tree.check().is_ok());
    assert_eq!(preorder_values(&tree), vec![1, 2, 3, 4, 5, 7, 8, 9]);

    let nine = handle_of(&tree, 9);
    assert_eq!(tree.node(nine).unwrap().depth(), 3);
    // the donor is untouched
    assert_eq!(preorder_values(&donor), vec![7, 8, 9]);
}

#[test]
fn recount_is_idempotent_on_healthy_tree() {
    let (mut registry, mut tree) = sample_tree();
    let copy = registry.clone_tree(&tree, "copy").unwrap();

    tree.recount_depth().unwrap();
    tree.recount_parents().unwrap();

    assert!(tree.check().is_ok());
    assert!(tree.structurally_eq(&copy));
    for id in tree.preorder() {
        let node = tree.node(id).unwrap();
        let twin = copy.node(id).unwrap();
        assert_eq!(node.depth(), twin.depth());
        assert_eq!(node.parent(), twin.parent());
    }
}

#[test_case(3 => vec![1, 2, 3] ; "right leaf")]
#[test_case(4 => vec![1, 2, 4] ; "left leaf")]
#[test_case(5 => vec![1, 5] ; "shallow leaf")]
fn find_path_to_leaf(target: i32) -> Vec<i32> {
    let (mut registry, tree) = sample_tree();
    let mut path: Stack<NodeId> = registry.stack("path").unwrap();

    assert!(tree.find_path(&mut path, &target).unwrap());
    tree.path_values(&path).unwrap().into_iter().copied().collect()
}

#[test_case(1 ; "root is not a leaf")]
#[test_case(2 ; "inner node")]
#[test_case(42 ; "absent")]
fn find_path_misses_leave_stack_empty(target: i32) {
    let (mut registry, tree) = sample_tree();
    let mut path: Stack<NodeId> = registry.stack("path").unwrap();
    path.push(handle_of(&tree, 5)).unwrap();

    assert!(!tree.find_path(&mut path, &target).unwrap());
    assert!(path.is_empty());
    assert!(path.self_check().is_ok());
}

#[test]
fn find_path_grows_the_stack() {
    let mut registry = Registry::new();
    let tree = chain(&mut registry, 30);
    let mut path: Stack<NodeId> = registry.stack("path").unwrap();

    assert!(tree.find_path(&mut path, &29).unwrap());
    assert_eq!(path.len(), 30);
    assert_eq!(path.capacity(), 32);
}

#[test]
fn clone_tree_is_deep() {
    let (mut registry, tree) = sample_tree();
    let mut copy = registry.clone_tree(&tree, "copy").unwrap();

    let three = handle_of(&copy, 3);
    copy.set_data(three, 33).unwrap();
    copy.remove_subtree(handle_of(&copy, 5)).unwrap();

    assert_eq!(preorder_values(&tree), vec![1, 2, 3, 4, 5]);
    assert_eq!(preorder_values(&copy), vec![1, 2, 33, 4]);
    assert!(!tree.structurally_eq(&copy));
    assert_eq!(registry.list().len(), 2);
}

#[test]
fn text_payloads() {
    let mut registry = Registry::new();
    let text = "[\nis it alive?\n[\nis it a cat?\n[meow]\n[woof]\n]\n[rock]\n]";
    let tree: Tree<String> = registry.parse_tree("guess", text).unwrap();

    assert!(tree.root_node().unwrap().is_heap_backed());
    let mut path = registry.stack("path").unwrap();
    assert!(tree.find_path(&mut path, &"woof".to_string()).unwrap());
    let route: Vec<&String> = tree.path_values(&path).unwrap();
    assert_eq!(route, vec!["is it alive?", "is it a cat?", "woof"]);
}

#[test]
fn float_payloads_roundtrip() {
    let mut registry = Registry::new();
    let tree: Tree<f64> = registry.parse_tree("floats", "[\n0.1\n[\n-2.5e10\n]\n]").unwrap();
    let back: Tree<f64> = registry.parse_tree("back", &tree.serialize().unwrap()).unwrap();
    assert!(back.structurally_eq(&tree));
}

#[test]
fn destroyed_tree_refuses_everything() {
    let (mut registry, mut tree) = sample_tree();
    let root = tree.root().unwrap();
    tree.destroy().unwrap();

    let mut path = registry.stack("path").unwrap();
    assert_eq!(tree.check(), Err(TreeError::Destructed));
    assert_eq!(tree.serialize(), Err(TreeError::Destructed));
    assert_eq!(tree.find_path(&mut path, &3), Err(TreeError::Destructed));
    assert_eq!(tree.add_child(root, Side::Left, 9), Err(TreeError::Destructed));
    assert_eq!(tree.destroy(), Err(TreeError::DestructorRepeated));
}

#[test]
fn default_tree_is_unconstructed() {
    let mut tree: Tree<i32> = Tree::default();
    assert_eq!(tree.check(), Err(TreeError::NotConstructed));
    assert_eq!(tree.set_root(1), Err(TreeError::NotConstructed));
}

#[test]
fn empty_document() {
    let mut registry = Registry::new();
    let mut tree: Tree<i32> = registry.parse_tree("empty", "[\n]").unwrap();
    assert!(tree.is_empty());
    assert!(tree.check().is_ok());
    assert_eq!(tree.serialize().unwrap(), "[\n]\n");
}
