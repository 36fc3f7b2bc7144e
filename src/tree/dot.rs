//! Graphviz description of the arena
//!
//! Walks arena slots rather than edges, so a corrupted tree (dangling
//! handles, bad back-references) still renders: child edges are solid and
//! labelled with their side, parent back-references are dotted, and a child
//! handle to a missing slot points at a red placeholder.

use std::io::Write;

use super::error::TreeError;
use super::node::NodeId;
use super::Tree;
use crate::types::Payload;

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl<T: Payload> Tree<T> {
    /// Graphviz `digraph` as a string
    pub fn to_dot(&self) -> String {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_dot(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Write a Graphviz `digraph` to `writer`
    pub fn write_dot<W: Write>(&self, writer: &mut W) -> Result<(), TreeError> {
        writeln!(writer, "digraph \"{}\" {{", escape(&self.name))?;
        writeln!(writer, "    label=\"{} {} ({})\";", T::TYPE_NAME, escape(&self.name), self.id)?;
        writeln!(writer, "    node [shape=box];")?;

        let mut missing: Vec<NodeId> = Vec::new();

        for (index, slot) in self.nodes.iter().enumerate() {
            let Some(node) = slot else { continue };
            let id = NodeId::new(index);
            let root = if self.root == Some(id) { ", penwidth=2" } else { "" };

            writeln!(
                writer,
                "    {id} [label=\"{id} | depth {} | {}\"{root}];",
                node.depth(),
                escape(&node.data().to_string())
            )?;

            for (side, child) in [("right", node.right()), ("left", node.left())] {
                let Some(child) = child else { continue };
                writeln!(writer, "    {id} -> {child} [label=\"{side}\"];")?;
                if self.slot(child).is_none() && !missing.contains(&child) {
                    missing.push(child);
                }
            }

            if let Some(parent) = node.parent() {
                writeln!(writer, "    {id} -> {parent} [style=dotted, arrowhead=empty];")?;
            }
        }

        for id in missing {
            writeln!(writer, "    {id} [label=\"{id} | missing\", color=red];")?;
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}
