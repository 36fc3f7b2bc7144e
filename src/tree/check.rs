//! Structural validation, path finding and recount passes

use std::panic::Location;

use super::error::{FaultKind, TreeError};
use super::node::NodeId;
use super::Tree;
use crate::stack::{Stack, StackError};
use crate::types::Payload;

/// Fault found during the walk, before the path is rendered
struct Fault {
    kind: FaultKind,
    node: NodeId,
}

impl<T: Payload> Tree<T> {
    /// Validate parent back-references, cached depths and child handles
    ///
    /// The diagnostic stack ([`Tree::fault_path`]) is cleared first. On a
    /// fault it holds the faulty node's payload at the bottom and the root's
    /// on top; the returned [`TreeError::StructuralFault`] carries the same
    /// path rendered root-first.
    #[track_caller]
    pub fn check(&mut self) -> Result<(), TreeError> {
        let caller = Location::caller();
        let result = self.check_inner(caller);
        self.record(result)
    }

    fn check_inner(&mut self, caller: &Location<'_>) -> Result<(), TreeError> {
        self.ensure_live()?;

        let mut path = std::mem::take(&mut self.fault_path);
        let outcome = match path.clean() {
            Err(err) => Err(TreeError::from(err)),
            Ok(()) => match self.root {
                None => Ok(()),
                Some(root) => self
                    .validate(root, &mut path)
                    .map_err(|fault| self.structural_error(fault, &path)),
            },
        };
        self.fault_path = path;

        if let Err(err) = &outcome {
            tracing::error!(
                tree = %self.name,
                id = %self.id,
                %caller,
                error = %err,
                "tree validation failed\n{}",
                self.to_dot()
            );
        }
        outcome
    }

    /// Depth-first walk from `root`, right subtrees first
    ///
    /// Work items carry the node we came from and the depth it implies, so
    /// each node is judged against its actual owner rather than its own
    /// back-reference.
    fn validate(&self, root: NodeId, path: &mut Stack<T>) -> Result<(), Fault> {
        let mut pending: Vec<(NodeId, Option<NodeId>, usize)> = vec![(root, None, 0)];

        while let Some((id, owner, expected_depth)) = pending.pop() {
            let node = match self.slot(id) {
                Some(node) => node,
                None => {
                    self.trace_path(None, owner, path);
                    return Err(Fault {
                        kind: FaultKind::DanglingNode,
                        node: id,
                    });
                }
            };

            let kind = if node.parent != owner {
                FaultKind::WrongParent {
                    expected: owner,
                    found: node.parent,
                }
            } else if node.depth != expected_depth {
                FaultKind::WrongDepth {
                    expected: expected_depth,
                    found: node.depth,
                }
            } else {
                // left pushed first so the right subtree is walked first
                pending.extend(node.left.map(|child| (child, Some(id), expected_depth + 1)));
                pending.extend(node.right.map(|child| (child, Some(id), expected_depth + 1)));
                continue;
            };

            self.trace_path(Some(node.data()), owner, path);
            return Err(Fault { kind, node: id });
        }
        Ok(())
    }

    /// Push the faulty payload (if any), then every ancestor up to the root
    ///
    /// Ancestors already passed the parent check, so their back-references
    /// are the walk's actual owners.
    fn trace_path(&self, faulty: Option<&T>, owner: Option<NodeId>, path: &mut Stack<T>) {
        let ancestors = std::iter::successors(owner, |&id| self.slot(id).and_then(|node| node.parent));
        let payloads = faulty.into_iter().chain(
            ancestors.filter_map(|id| self.slot(id).map(|node| node.data())),
        );

        for payload in payloads {
            if let Err(err) = path.push(payload.clone()) {
                tracing::warn!(tree = %self.name, error = %err, "fault path truncated");
                break;
            }
        }
    }

    fn structural_error(&self, fault: Fault, path: &Stack<T>) -> TreeError {
        let mut rendered: Vec<String> = path.iter().map(ToString::to_string).collect();
        rendered.reverse();
        TreeError::StructuralFault {
            kind: fault.kind,
            node: fault.node,
            path: rendered,
        }
    }

    /// Fill `path` with the handles from the root down to a leaf holding `target`
    ///
    /// The stack is cleaned first. Children are searched right before left
    /// and only leaves are compared. Returns `false` (and leaves the stack
    /// empty) when no leaf matches.
    pub fn find_path(&self, path: &mut Stack<NodeId>, target: &T) -> Result<bool, TreeError> {
        self.ensure_live()?;
        path.clean()?;

        let found = match self.root {
            None => false,
            Some(root) => self.search(root, path, target)?,
        };
        Ok(found)
    }

    /// Depth-first search mirrored on `path`
    ///
    /// `branches` runs parallel to `path` and holds the children of each
    /// path entry that are still to be tried.
    fn search(&self, root: NodeId, path: &mut Stack<NodeId>, target: &T) -> Result<bool, StackError> {
        let mut branches: Vec<Vec<NodeId>> = Vec::new();
        let mut next = Some(root);

        loop {
            if let Some(id) = next.take() {
                if let Some(node) = self.slot(id) {
                    path.push(id)?;
                    if node.is_leaf() && node.data() == target {
                        return Ok(true);
                    }
                    // popped from the back: left last
                    branches.push(node.left.into_iter().chain(node.right).collect());
                }
            }

            match branches.last_mut() {
                None => return Ok(false),
                Some(untried) => match untried.pop() {
                    Some(child) => next = Some(child),
                    None => {
                        branches.pop();
                        path.pop()?;
                    }
                },
            }
        }
    }

    /// Payloads behind a path of handles, bottom of the stack first
    pub fn path_values(&self, path: &Stack<NodeId>) -> Result<Vec<&T>, TreeError> {
        path.iter()
            .map(|&id| {
                self.slot(id)
                    .map(|node| node.data())
                    .ok_or(TreeError::UnknownNode(id))
            })
            .collect()
    }

    /// Recompute every cached depth from the root
    pub fn recount_depth(&mut self) -> Result<(), TreeError> {
        self.ensure_live()?;

        let mut pending: Vec<(NodeId, usize)> = self.root.map(|id| (id, 0)).into_iter().collect();
        let mut visited = 0usize;

        while let Some((id, depth)) = pending.pop() {
            let Some(node) = self.slot_mut(id) else { continue };
            node.depth = depth;
            pending.extend(node.children().map(|child| (child, depth + 1)));
            visited += 1;
        }

        tracing::debug!(tree = %self.name, id = %self.id, nodes = visited, "depths recounted");
        Ok(())
    }

    /// Recompute every parent back-reference from the root
    pub fn recount_parents(&mut self) -> Result<(), TreeError> {
        self.ensure_live()?;

        let mut pending: Vec<(NodeId, Option<NodeId>)> =
            self.root.map(|id| (id, None)).into_iter().collect();
        let mut visited = 0usize;

        while let Some((id, owner)) = pending.pop() {
            let Some(node) = self.slot_mut(id) else { continue };
            node.parent = owner;
            pending.extend(node.children().map(|child| (child, Some(id))));
            visited += 1;
        }

        tracing::debug!(tree = %self.name, id = %self.id, nodes = visited, "parents recounted");
        Ok(())
    }
}
