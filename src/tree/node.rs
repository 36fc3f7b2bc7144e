//! Tree node representation
//!
//! Nodes live in the tree's arena and refer to each other by [`NodeId`]:
//! - `left` / `right`: owning handles, followed when freeing a subtree
//! - `parent`: observer handle, only read for validation and upward walks
//!
//! `depth` and `parent` are derived data; they are kept in sync by the tree
//! and can be rebuilt with `recount_depth` / `recount_parents`.

use std::fmt;

use crate::types::{Element, Payload};

/// Handle of a node inside a tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena slot index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl Element for NodeId {
    const TYPE_NAME: &'static str = "NodeId";

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.0 as u64).to_le_bytes());
    }
}

/// Which child slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Left child (written second)
    Left,
    /// Right child (written first)
    Right,
}

impl Side {
    /// Edge label used in graph dumps
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Binary tree node
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    data: T,
    heap_backed: bool,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: usize,
}

impl<T: Payload> Node<T> {
    pub(crate) fn new(data: T, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            data,
            heap_backed: T::HEAP_BACKED,
            left: None,
            right: None,
            parent,
            depth,
        }
    }

    /// Replace the payload
    pub fn set_data(&mut self, data: T) {
        self.heap_backed = T::HEAP_BACKED;
        self.data = data;
    }

    /// Whether the payload owns separate heap storage
    pub fn is_heap_backed(&self) -> bool {
        self.heap_backed
    }
}

impl<T> Node<T> {
    /// Payload
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Left child
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Child on `side`
    pub fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    /// Children in traversal order: right first, then left
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        [self.right, self.left].into_iter().flatten()
    }

    /// Parent back-reference
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Cached depth (root = 0)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// No children
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
