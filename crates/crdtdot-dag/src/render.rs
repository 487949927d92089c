//! Graphviz DOT rendering.
//!
//! Records are written one line at a time to the sink: first every vertex
//! sorted by identifier, then every edge sorted by (child, parent). Heads
//! are filled, holes are dashed, and edges along which the priority
//! decreases are drawn in red.

use crate::graph::{Edge, Graph, Vertex};
use std::collections::BTreeSet;
use std::io::{self, Write};

const HEAD_FILL: &str = "lightblue";

/// Writes a [`Graph`] as a DOT digraph.
#[derive(Clone, Debug)]
pub struct DotRenderer {
    name: String,
}

impl Default for DotRenderer {
    fn default() -> Self {
        DotRenderer {
            name: "crdt".to_string(),
        }
    }
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the emitted digraph.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn render<W: Write>(&self, graph: &Graph, out: &mut W) -> io::Result<()> {
        writeln!(out, "digraph {} {{", quote(&self.name))?;
        writeln!(out, "  rankdir=TB;")?;
        writeln!(out, "  node [shape=box, fontname=\"monospace\"];")?;

        for (cid, vertex) in graph.vertices() {
            let head = graph.is_head(cid);
            let short = cid.short();
            match vertex {
                Vertex::Delta(node) => {
                    let label = format!(
                        "{}\n{} | +{} -{}",
                        short, node.priority, node.summary.added, node.summary.removed
                    );
                    if head {
                        writeln!(
                            out,
                            "  \"{}\" [label={}, kind=head, style=\"filled,bold\", fillcolor=\"{}\"];",
                            cid,
                            quote(&label),
                            HEAD_FILL
                        )?;
                    } else {
                        writeln!(out, "  \"{}\" [label={}, kind=interior];", cid, quote(&label))?;
                    }
                }
                Vertex::Hole(reason) => {
                    let label = format!("{}\n{}", short, reason.tag());
                    let color = if reason.detail().is_some() { "red" } else { "gray" };
                    let style = if head { "dashed,bold" } else { "dashed" };
                    write!(
                        out,
                        "  \"{}\" [label={}, kind=hole, style=\"{}\", color={}",
                        cid,
                        quote(&label),
                        style,
                        color
                    )?;
                    if let Some(detail) = reason.detail() {
                        write!(out, ", tooltip={}", quote(detail))?;
                    }
                    writeln!(out, "];")?;
                }
            }
        }

        let violations: BTreeSet<Edge> = graph.priority_violations().into_iter().collect();
        for edge in graph.edges() {
            if violations.contains(edge) {
                writeln!(
                    out,
                    "  \"{}\" -> \"{}\" [color=red, label=\"priority\"];",
                    edge.child, edge.parent
                )?;
            } else {
                writeln!(out, "  \"{}\" -> \"{}\";", edge.child, edge.parent)?;
            }
        }

        writeln!(out, "}}")?;
        Ok(())
    }
}

/// Quote `s` as a DOT string literal. Newlines become the `\n` escape.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
