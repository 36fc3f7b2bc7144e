use std::fmt;

use thiserror::Error;

use super::{NodeId, Side};
use crate::stack::StackError;

/// Errors reported by [`Tree`](super::Tree) construction, mutation and checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// Tree name was empty.
    #[error("wrong input tree name")]
    EmptyName,

    /// Operation on a tree that was never constructed.
    #[error("tree is not constructed, operation is impossible")]
    NotConstructed,

    /// Operation on a destroyed tree.
    #[error("tree already destructed")]
    Destructed,

    /// `destroy` called twice.
    #[error("tree destructor repeated")]
    DestructorRepeated,

    /// Handle does not refer to a live node of this tree.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// Tried to attach where a child already exists.
    #[error("node {parent} already has a {side} child")]
    ChildOccupied {
        /// Node whose slot is taken.
        parent: NodeId,
        /// The occupied slot.
        side: Side,
    },

    /// Tried to set a root on a non-empty tree.
    #[error("tree already has a root")]
    RootOccupied,

    /// Depth or parent/child linkage is inconsistent.
    #[error("{kind} at node {node} (path: {})", .path.join(" -> "))]
    StructuralFault {
        /// What was violated.
        kind: FaultKind,
        /// First faulty node found.
        node: NodeId,
        /// Payloads from the root down to the faulty node.
        path: Vec<String>,
    },

    /// Malformed bracketed input.
    #[error("{0}")]
    Syntax(SyntaxError),

    /// Payload text cannot be written back as one grammar line.
    #[error("payload '{text}' cannot be written as a single bracket-free line")]
    UnserializablePayload {
        /// Offending payload text.
        text: String,
    },

    /// Diagnostic stack failure.
    #[error("diagnostic stack error: {0}")]
    Stack(#[from] StackError),

    /// Writing output failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        TreeError::Io(err.to_string())
    }
}

impl From<SyntaxError> for TreeError {
    fn from(err: SyntaxError) -> Self {
        TreeError::Syntax(err)
    }
}

/// Kind of structural fault found by `check`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Cached depth differs from owner depth + 1 (or 0 at the root)
    WrongDepth {
        /// Depth implied by the owner
        expected: usize,
        /// Depth stored in the node
        found: usize,
    },

    /// Parent back-reference does not point to the owning node
    WrongParent {
        /// Actual owner
        expected: Option<NodeId>,
        /// Stored back-reference
        found: Option<NodeId>,
    },

    /// Child handle refers to a freed or foreign slot
    DanglingNode,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::WrongDepth { expected, found } => {
                write!(f, "wrong node depth (expected {}, found {})", expected, found)
            }
            FaultKind::WrongParent { expected, found } => write!(
                f,
                "wrong pointer to previous node (expected {}, found {})",
                show_handle(*expected),
                show_handle(*found)
            ),
            FaultKind::DanglingNode => f.write_str("dangling child reference"),
        }
    }
}

fn show_handle(handle: Option<NodeId>) -> String {
    handle.map_or_else(|| "none".to_string(), |id| id.to_string())
}

/// Syntax error in bracketed input, with surrounding lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line of the offending token
    pub line: usize,
    /// What the grammar expected
    pub expected: String,
    /// What was found instead
    pub found: String,
    /// `(line number, text)` window around the error
    pub context: Vec<(usize, String)>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrong syntax of input base at line {}: expected {}, found {}",
            self.line, self.expected, self.found
        )?;
        for (number, text) in &self.context {
            let marker = if *number == self.line { '>' } else { ' ' };
            write!(f, "\n{} {:>5} | {}", marker, number, text)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_fault_message() {
        let err = TreeError::StructuralFault {
            kind: FaultKind::WrongDepth {
                expected: 2,
                found: 7,
            },
            node: NodeId::new(4),
            path: vec!["1".into(), "2".into(), "4".into()],
        };
        assert_eq!(
            err.to_string(),
            "wrong node depth (expected 2, found 7) at node n4 (path: 1 -> 2 -> 4)"
        );
    }

    #[test]
    fn test_syntax_error_marks_line() {
        let err = SyntaxError {
            line: 3,
            expected: "']'".into(),
            found: "payload 'x'".into(),
            context: vec![(2, "1".into()), (3, "x".into()), (4, "]".into())],
        };
        let text = err.to_string();
        assert!(text.starts_with("wrong syntax of input base at line 3"));
        assert!(text.contains(">     3 | x"));
        assert!(text.contains("      2 | 1"));
    }
}
