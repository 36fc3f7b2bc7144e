#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use vigil::{Registry, Side, Stack, Tree};

/// Root 1, right child 2 (right 3, left 4), left child 5
pub const SAMPLE: &str = "[\n1\n[2\n[3]\n[4]\n]\n[5]\n]";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("VIGIL_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set VIGIL_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path, expected, actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Fresh registry plus the sample tree (always instance `#1`)
pub fn sample_tree() -> (Registry, Tree<i32>) {
    let mut registry = Registry::new();
    let tree = registry
        .parse_tree("sample", SAMPLE)
        .expect("sample tree parses");
    (registry, tree)
}

/// Payloads in preorder (node, right, left)
pub fn preorder_values<T: vigil::Payload>(tree: &Tree<T>) -> Vec<T> {
    tree.values().into_iter().cloned().collect()
}

/// Handle of the first node (preorder) holding `value`
pub fn handle_of(tree: &Tree<i32>, value: i32) -> vigil::NodeId {
    tree.preorder()
        .into_iter()
        .find(|&id| *tree.node(id).expect("live node").data() == value)
        .unwrap_or_else(|| panic!("no node holding {}", value))
}

/// Right-leaning chain `0 -> 1 -> ... -> n-1`
pub fn chain(registry: &mut Registry, n: i32) -> Tree<i32> {
    let mut tree = registry.tree("chain").expect("tree");
    if n == 0 {
        return tree;
    }
    let mut tip = tree.set_root(0).expect("root");
    for value in 1..n {
        tip = tree.add_child(tip, Side::Right, value).expect("child");
    }
    tree
}

/// Stack holding `values` bottom to top
pub fn filled_stack(registry: &mut Registry, values: &[i32]) -> Stack<i32> {
    let mut stack = registry.stack("filled").expect("stack");
    for &value in values {
        stack.push(value).expect("push");
    }
    stack
}
