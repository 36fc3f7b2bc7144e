//! Binary tree with bracketed-text persistence and structural self-checks
//!
//! Nodes are stored in an arena owned by the tree:
//! - children are owning [`NodeId`] handles
//! - the parent is an observer handle, never followed to free anything
//! - depth and parent are cached, derived data
//!
//! Trees are built by hand, parsed from the bracketed grammar (see
//! [`parser`](self::parser)), or deep-copied. Every mutation through the
//! public API runs [`Tree::check`] before and after; a failed check pushes
//! the root-to-fault payload path onto the tree's diagnostic stack.

mod check;
mod config;
mod dot;
mod error;
mod node;
mod parser;
mod writer;

pub use config::{TreeConfig, DEFAULT_CONTEXT_RADIUS, DEFAULT_INDENT_WIDTH};
pub use error::{FaultKind, SyntaxError, TreeError};
pub use node::{Node, NodeId, Side};

use std::collections::HashMap;

use crate::registry::{InstanceId, Lifecycle};
use crate::stack::{Stack, StackConfig};
use crate::types::Payload;
use parser::Parser;

/// Binary tree of payloads
#[derive(Debug)]
pub struct Tree<T: Payload> {
    name: String,
    id: InstanceId,
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    lifecycle: Lifecycle,
    last_error: Option<TreeError>,
    config: TreeConfig,
    /// Payloads from a faulty node up to the root, filled by `check`
    fault_path: Stack<T>,
}

/// Unconstructed placeholder; every operation reports `NotConstructed`
impl<T: Payload> Default for Tree<T> {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: InstanceId::default(),
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            lifecycle: Lifecycle::Unconstructed,
            last_error: None,
            config: TreeConfig::default(),
            fault_path: Stack::default(),
        }
    }
}

impl<T: Payload> Tree<T> {
    /// Create an empty tree
    pub fn new(id: InstanceId, name: impl Into<String>) -> Result<Self, TreeError> {
        Self::with_config(id, name, TreeConfig::default())
    }

    /// Create an empty tree with explicit configuration
    pub fn with_config(
        id: InstanceId,
        name: impl Into<String>,
        config: TreeConfig,
    ) -> Result<Self, TreeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TreeError::EmptyName);
        }

        let path_config = StackConfig::default().with_capacity(config.path_capacity.max(1));
        let fault_path = Stack::with_config(id, format!("{}.fault_path", name), path_config)?;

        Ok(Self {
            name,
            id,
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            lifecycle: Lifecycle::Live,
            last_error: None,
            config,
            fault_path,
        })
    }

    /// Create a tree holding a single root node
    pub fn with_root(id: InstanceId, name: impl Into<String>, value: T) -> Result<Self, TreeError> {
        let mut tree = Self::new(id, name)?;
        tree.set_root(value)?;
        Ok(tree)
    }

    /// Parse bracketed text (split into lines here)
    pub fn parse(id: InstanceId, name: impl Into<String>, text: &str) -> Result<Self, TreeError> {
        let lines: Vec<&str> = text.lines().collect();
        Self::from_lines(id, name, &lines)
    }

    /// Parse already-split lines
    pub fn from_lines<S: AsRef<str>>(
        id: InstanceId,
        name: impl Into<String>,
        lines: &[S],
    ) -> Result<Self, TreeError> {
        Self::from_lines_with_config(id, name, lines, TreeConfig::default())
    }

    /// Parse already-split lines with explicit configuration
    pub fn from_lines_with_config<S: AsRef<str>>(
        id: InstanceId,
        name: impl Into<String>,
        lines: &[S],
        config: TreeConfig,
    ) -> Result<Self, TreeError> {
        let mut tree = Self::with_config(id, name, config)?;

        let parsed = Parser::<S, T>::new(lines, tree.config.context_radius)
            .parse_document()
            .map_err(|err| {
                tracing::error!(tree = %tree.name, id = %tree.id, line = err.line, "syntax error\n{}", err);
                TreeError::Syntax(err)
            })?;

        tree.nodes = parsed.nodes;
        tree.root = parsed.root;
        tracing::debug!(tree = %tree.name, id = %tree.id, nodes = tree.len(), "tree parsed");

        tree.check()?;
        Ok(tree)
    }

    /// Deep copy under a new identity; the copy never aliases this tree
    pub fn deep_clone(&self, id: InstanceId, name: impl Into<String>) -> Result<Self, TreeError> {
        self.ensure_live()?;
        let mut copy = Self::with_config(id, name, self.config.clone())?;
        copy.nodes = self.nodes.clone();
        copy.free = self.free.clone();
        copy.root = self.root;
        Ok(copy)
    }

    /// Copy the subtree under `node` into a new, compact tree rooted at depth 0
    pub fn subtree(
        &self,
        node: NodeId,
        id: InstanceId,
        name: impl Into<String>,
    ) -> Result<Self, TreeError> {
        self.ensure_live()?;
        let mut copy = Self::with_config(id, name, self.config.clone())?;
        let root = copy.import(self, node)?;
        copy.root = Some(root);
        if let Some(root_node) = copy.slot_mut(root) {
            root_node.parent = None;
        }
        copy.recount_depth()?;
        Ok(copy)
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the tree
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), TreeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return self.record(Err(TreeError::EmptyName));
        }
        self.ensure_live()?;
        self.fault_path.set_name(format!("{}.fault_path", name))?;
        self.name = name;
        Ok(())
    }

    /// Instance identity
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Lifecycle state
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Configuration in use
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Error of the most recent mutating operation or check
    pub fn last_error(&self) -> Option<&TreeError> {
        self.last_error.as_ref()
    }

    /// Diagnostic stack: after a failed check, fault payload at the bottom,
    /// root payload on top
    pub fn fault_path(&self) -> &Stack<T> {
        &self.fault_path
    }

    /// Root handle
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Root node
    pub fn root_node(&self) -> Option<&Node<T>> {
        self.root.and_then(|id| self.slot(id))
    }

    /// Node behind a handle
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slot(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// No root
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Handles in serialization order: node, right subtree, left subtree
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();

        while let Some(id) = pending.pop() {
            let Some(node) = self.slot(id) else { continue };
            order.push(id);
            // left pushed first so the right subtree is visited first
            pending.extend(node.left);
            pending.extend(node.right);
        }

        order
    }

    /// Payloads in [`Tree::preorder`] order
    pub fn values(&self) -> Vec<&T> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.slot(id).map(Node::data))
            .collect()
    }

    /// Same shape and equal payloads (handles and cached fields ignored)
    pub fn structurally_eq(&self, other: &Tree<T>) -> bool {
        let mut pending = vec![(self.root, other.root)];

        while let Some((mine, theirs)) = pending.pop() {
            match (mine.and_then(|id| self.slot(id)), theirs.and_then(|id| other.slot(id))) {
                (None, None) if mine.is_none() && theirs.is_none() => {}
                (Some(a), Some(b)) if a.data() == b.data() => {
                    pending.push((a.left, b.left));
                    pending.push((a.right, b.right));
                }
                _ => return false,
            }
        }
        true
    }

    /// Create the root of an empty tree
    #[track_caller]
    pub fn set_root(&mut self, value: T) -> Result<NodeId, TreeError> {
        let result = self.set_root_inner(value);
        self.record(result)
    }

    #[track_caller]
    fn set_root_inner(&mut self, value: T) -> Result<NodeId, TreeError> {
        self.ensure_live()?;
        if self.root.is_some() {
            return Err(TreeError::RootOccupied);
        }
        let id = self.alloc(Node::new(value, None, 0));
        self.root = Some(id);
        self.check()?;
        Ok(id)
    }

    /// Attach a new leaf under `parent`
    #[track_caller]
    pub fn add_child(&mut self, parent: NodeId, side: Side, value: T) -> Result<NodeId, TreeError> {
        let result = self.add_child_inner(parent, side, value);
        self.record(result)
    }

    #[track_caller]
    fn add_child_inner(&mut self, parent: NodeId, side: Side, value: T) -> Result<NodeId, TreeError> {
        self.ensure_live()?;
        self.check()?;

        let parent_node = self.slot(parent).ok_or(TreeError::UnknownNode(parent))?;
        if parent_node.child(side).is_some() {
            return Err(TreeError::ChildOccupied { parent, side });
        }
        let depth = parent_node.depth + 1;

        let id = self.alloc(Node::new(value, Some(parent), depth));
        self.slot_mut(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .set_child(side, Some(id));

        self.check()?;
        Ok(id)
    }

    /// Replace a node's payload
    #[track_caller]
    pub fn set_data(&mut self, node: NodeId, value: T) -> Result<(), TreeError> {
        let result = self.set_data_inner(node, value);
        self.record(result)
    }

    #[track_caller]
    fn set_data_inner(&mut self, node: NodeId, value: T) -> Result<(), TreeError> {
        self.ensure_live()?;
        self.check()?;
        self.slot_mut(node)
            .ok_or(TreeError::UnknownNode(node))?
            .set_data(value);
        Ok(())
    }

    /// Detach and free the subtree under `node`; returns the number of nodes freed
    #[track_caller]
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<usize, TreeError> {
        let result = self.remove_subtree_inner(node);
        self.record(result)
    }

    #[track_caller]
    fn remove_subtree_inner(&mut self, node: NodeId) -> Result<usize, TreeError> {
        self.ensure_live()?;
        self.check()?;

        let owner = self.slot(node).ok_or(TreeError::UnknownNode(node))?.parent;
        match owner {
            None => self.root = None,
            Some(parent) => {
                let parent_node = self.slot_mut(parent).ok_or(TreeError::UnknownNode(parent))?;
                if parent_node.left == Some(node) {
                    parent_node.left = None;
                } else if parent_node.right == Some(node) {
                    parent_node.right = None;
                }
            }
        }

        let freed = self.free_subtree(node);
        tracing::debug!(tree = %self.name, id = %self.id, %node, freed, "subtree removed");

        self.check()?;
        Ok(freed)
    }

    /// Copy `donor` in under `parent` as its `side` child
    ///
    /// Parent handles inside the copy are remapped and the copy's root is
    /// re-parented to `parent`, but cached depths are carried over verbatim
    /// from the donor: run [`Tree::recount_depth`] afterwards to make the
    /// tree consistent again. Returns the handle of the grafted root.
    pub fn graft(
        &mut self,
        parent: NodeId,
        side: Side,
        donor: &Tree<T>,
    ) -> Result<Option<NodeId>, TreeError> {
        let result = self.graft_inner(parent, side, donor);
        self.record(result)
    }

    fn graft_inner(
        &mut self,
        parent: NodeId,
        side: Side,
        donor: &Tree<T>,
    ) -> Result<Option<NodeId>, TreeError> {
        self.ensure_live()?;
        donor.ensure_live()?;

        let parent_node = self.slot(parent).ok_or(TreeError::UnknownNode(parent))?;
        if parent_node.child(side).is_some() {
            return Err(TreeError::ChildOccupied { parent, side });
        }

        let Some(donor_root) = donor.root else {
            return Ok(None);
        };

        let root = self.import(donor, donor_root)?;
        if let Some(root_node) = self.slot_mut(root) {
            root_node.parent = Some(parent);
        }
        self.slot_mut(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .set_child(side, Some(root));

        Ok(Some(root))
    }

    /// Overwrite a node's parent back-reference without any validation
    ///
    /// Leaves the tree inconsistent until [`Tree::recount_parents`] runs;
    /// meant for manual restructuring and for exercising [`Tree::check`].
    pub fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        self.ensure_live()?;
        self.slot_mut(node).ok_or(TreeError::UnknownNode(node))?.parent = parent;
        Ok(())
    }

    /// Drop every node, keep identity and configuration
    pub fn clean(&mut self) -> Result<(), TreeError> {
        self.ensure_live()?;
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.fault_path.clean()?;
        Ok(())
    }

    /// Destroy every node; the tree is unusable afterwards
    ///
    /// A second call reports [`TreeError::DestructorRepeated`].
    pub fn destroy(&mut self) -> Result<(), TreeError> {
        let result = match self.lifecycle {
            Lifecycle::Unconstructed => Err(TreeError::NotConstructed),
            Lifecycle::Destroyed => {
                tracing::warn!(tree = %self.name, id = %self.id, "repeated destroy");
                Err(TreeError::DestructorRepeated)
            }
            Lifecycle::Live => {
                if let Some(root) = self.root.take() {
                    self.free_subtree(root);
                }
                self.nodes = Vec::new();
                self.free = Vec::new();
                self.lifecycle = Lifecycle::Destroyed;
                self.fault_path.destroy().map_err(TreeError::from)
            }
        };
        self.record(result)
    }

    pub(crate) fn ensure_live(&self) -> Result<(), TreeError> {
        match self.lifecycle {
            Lifecycle::Live => Ok(()),
            Lifecycle::Unconstructed => Err(TreeError::NotConstructed),
            Lifecycle::Destroyed => Err(TreeError::Destructed),
        }
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                NodeId::new(index)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId::new(self.nodes.len() - 1)
            }
        }
    }

    /// Free `root` and everything it owns, following child handles only
    fn free_subtree(&mut self, root: NodeId) -> usize {
        let mut freed = 0;
        let mut pending = vec![root];

        while let Some(id) = pending.pop() {
            let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
                continue;
            };
            pending.extend(node.children());
            self.free.push(id.index());
            freed += 1;
        }

        freed
    }

    /// Copy the subtree of `source` under `from` into this arena
    ///
    /// Child and parent handles are remapped; depths are copied as-is.
    /// Returns the handle of the copied root (its parent handle still
    /// points into `source`'s numbering and must be fixed by the caller).
    fn import(&mut self, source: &Tree<T>, from: NodeId) -> Result<NodeId, TreeError> {
        let mut order = Vec::new();
        let mut pending = vec![from];
        while let Some(id) = pending.pop() {
            let node = source.slot(id).ok_or(TreeError::UnknownNode(id))?;
            order.push(id);
            pending.extend(node.children());
        }

        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        for &old in &order {
            let node = source.slot(old).ok_or(TreeError::UnknownNode(old))?.clone();
            let new = self.alloc(node);
            remap.insert(old, new);
        }

        for &new in remap.values() {
            if let Some(node) = self.slot_mut(new) {
                node.left = node.left.and_then(|id| remap.get(&id).copied());
                node.right = node.right.and_then(|id| remap.get(&id).copied());
                node.parent = node.parent.and_then(|id| remap.get(&id).copied());
            }
        }

        remap.get(&from).copied().ok_or(TreeError::UnknownNode(from))
    }

    fn record<R>(&mut self, result: Result<R, TreeError>) -> Result<R, TreeError> {
        self.last_error = result.as_ref().err().cloned();
        result
    }
}
