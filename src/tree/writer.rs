//! Bracketed text writer
//!
//! Layout for `[1, right [2, [3], [4]], left [5]]` with an indent of 4:
//! ```text
//! [
//! 1
//! [
//!     2
//!     [
//!         3
//!     ]
//!     [
//!         4
//!     ]
//! ]
//! [
//!     5
//! ]
//! ]
//! ```
//! A payload sits at its depth, the brackets of a child block at the
//! depth of the node that owns them. A node with only a left child writes
//! an empty right block first so the reader can tell the sides apart.

use std::io::{self, Write};

use super::error::TreeError;
use super::node::NodeId;
use super::Tree;
use crate::types::Payload;

/// Pending output, in reverse
#[derive(Debug, Clone, Copy)]
enum Step {
    /// `[` of a child block owned by a node at this level
    Open(usize),
    /// `]` of a child block owned by a node at this level
    Close(usize),
    /// Payload line, followed by the node's child blocks
    Node(NodeId, usize),
}

/// Whether `text` survives tokenization as one payload token
fn is_writable(text: &str) -> bool {
    !text.is_empty()
        && !text.contains(['\n', '\r'])
        && text.trim() == text
        && !text.starts_with('[')
        && !text.ends_with(']')
}

impl<T: Payload> Tree<T> {
    /// Serialize to bracketed text
    pub fn serialize(&self) -> Result<String, TreeError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        String::from_utf8(out).map_err(|err| TreeError::Io(err.to_string()))
    }

    /// Serialize to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TreeError> {
        self.ensure_live()?;

        writeln!(writer, "[")?;
        if let Some(root) = self.root {
            self.write_node(writer, root)?;
        }
        writeln!(writer, "]")?;
        Ok(())
    }

    fn write_node<W: Write>(&self, writer: &mut W, root: NodeId) -> Result<(), TreeError> {
        let mut pending = vec![Step::Node(root, 0)];

        while let Some(step) = pending.pop() {
            match step {
                Step::Open(level) => {
                    self.indent(writer, level)?;
                    writeln!(writer, "[")?;
                }
                Step::Close(level) => {
                    self.indent(writer, level)?;
                    writeln!(writer, "]")?;
                }
                Step::Node(id, level) => {
                    let node = self.slot(id).ok_or(TreeError::UnknownNode(id))?;

                    let text = node.data().to_string();
                    if !is_writable(&text) {
                        return Err(TreeError::UnserializablePayload { text });
                    }
                    self.indent(writer, level)?;
                    writeln!(writer, "{}", text)?;

                    if node.is_leaf() {
                        continue;
                    }

                    // reversed: right block comes out first
                    if let Some(left) = node.left() {
                        pending.extend([Step::Close(level), Step::Node(left, level + 1), Step::Open(level)]);
                    }
                    pending.push(Step::Close(level));
                    pending.extend(node.right().map(|right| Step::Node(right, level + 1)));
                    pending.push(Step::Open(level));
                }
            }
        }
        Ok(())
    }

    fn indent<W: Write>(&self, writer: &mut W, level: usize) -> io::Result<()> {
        write!(writer, "{:width$}", "", width = level * self.config.indent_width)
    }
}
