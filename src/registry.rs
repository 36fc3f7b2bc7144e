//! Instance identities and the registry that hands them out
//!
//! Every stack and tree carries an [`InstanceId`] so that dumps and log
//! records can tell instances apart. Ids come from a [`Registry`] owned by
//! whoever creates the containers; a registry never issues the same id twice.

use std::fmt;

use crate::stack::{Stack, StackConfig, StackError};
use crate::tree::{Tree, TreeConfig, TreeError};
use crate::types::{Element, Payload};

/// Distinguishing identity of a container instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a container instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Placeholder value, never constructed
    #[default]
    Unconstructed,

    /// Constructed and usable
    Live,

    /// Explicitly destroyed
    Destroyed,
}

impl Lifecycle {
    /// Label used in dumps
    pub fn label(self) -> &'static str {
        match self {
            Lifecycle::Unconstructed => "unconstructed",
            Lifecycle::Live => "live",
            Lifecycle::Destroyed => "destroyed",
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            Lifecycle::Unconstructed => 0,
            Lifecycle::Live => 1,
            Lifecycle::Destroyed => 2,
        }
    }
}

/// Kind of container an id was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    /// A [`Stack`]
    Stack,
    /// A [`Tree`]
    Tree,
}

/// Metadata describing an issued instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Identity handed out
    pub id: InstanceId,
    /// Container kind
    pub kind: InstanceKind,
    /// Name at creation time
    pub name: String,
}

/// Factory owning the identity counter
#[derive(Debug, Default)]
pub struct Registry {
    next: u64,
    stack_config: StackConfig,
    tree_config: TreeConfig,
    issued: Vec<InstanceInfo>,
}

impl Registry {
    /// Create an empty registry with default configurations
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration applied to stacks created through this registry
    pub fn with_stack_config(mut self, config: StackConfig) -> Self {
        self.stack_config = config;
        self
    }

    /// Configuration applied to trees created through this registry
    pub fn with_tree_config(mut self, config: TreeConfig) -> Self {
        self.tree_config = config;
        self
    }

    /// Take the next unused id (starts at 1)
    pub fn next_id(&mut self) -> InstanceId {
        self.next += 1;
        InstanceId(self.next)
    }

    /// Create a stack with the registry's stack configuration
    pub fn stack<T: Element>(&mut self, name: &str) -> Result<Stack<T>, StackError> {
        let config = self.stack_config.clone();
        self.stack_with_config(name, config)
    }

    /// Create a stack with an explicit initial capacity
    pub fn stack_with_capacity<T: Element>(
        &mut self,
        name: &str,
        capacity: usize,
    ) -> Result<Stack<T>, StackError> {
        let config = self.stack_config.clone().with_capacity(capacity);
        self.stack_with_config(name, config)
    }

    fn stack_with_config<T: Element>(
        &mut self,
        name: &str,
        config: StackConfig,
    ) -> Result<Stack<T>, StackError> {
        let id = self.next_id();
        let stack = Stack::with_config(id, name, config)?;
        self.note(id, InstanceKind::Stack, name);
        Ok(stack)
    }

    /// Copy of `source` under a fresh identity
    pub fn clone_stack<T: Element>(
        &mut self,
        source: &Stack<T>,
        name: &str,
    ) -> Result<Stack<T>, StackError> {
        let id = self.next_id();
        let stack = source.duplicate(id, name)?;
        self.note(id, InstanceKind::Stack, name);
        Ok(stack)
    }

    /// Create an empty tree
    pub fn tree<T: Payload>(&mut self, name: &str) -> Result<Tree<T>, TreeError> {
        let id = self.next_id();
        let tree = Tree::with_config(id, name, self.tree_config.clone())?;
        self.note(id, InstanceKind::Tree, name);
        Ok(tree)
    }

    /// Parse a tree from bracketed text
    pub fn parse_tree<T: Payload>(&mut self, name: &str, text: &str) -> Result<Tree<T>, TreeError> {
        let id = self.next_id();
        let lines: Vec<&str> = text.lines().collect();
        let tree = Tree::from_lines_with_config(id, name, &lines, self.tree_config.clone())?;
        self.note(id, InstanceKind::Tree, name);
        Ok(tree)
    }

    /// Deep copy of `source` under a fresh identity
    pub fn clone_tree<T: Payload>(
        &mut self,
        source: &Tree<T>,
        name: &str,
    ) -> Result<Tree<T>, TreeError> {
        let id = self.next_id();
        let tree = source.deep_clone(id, name)?;
        self.note(id, InstanceKind::Tree, name);
        Ok(tree)
    }

    /// Every instance created through this registry, in creation order
    pub fn list(&self) -> &[InstanceInfo] {
        &self.issued
    }

    fn note(&mut self, id: InstanceId, kind: InstanceKind, name: &str) {
        self.issued.push(InstanceInfo {
            id,
            kind,
            name: name.to_string(),
        });
    }
}
