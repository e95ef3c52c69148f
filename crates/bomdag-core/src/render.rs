//! Graphviz DOT rendering of a [`DependencyGraph`].
//!
//! Edges keep the graph's direction (dependent → dependency) and the layout
//! uses `rankdir=BT`, so dependencies are drawn at the top and the things
//! that need them below.

use std::io::{self, Write};

use crate::graph::DependencyGraph;
use crate::sbom::Describe;

/// Write `graph` as a `digraph dependencies { ... }` block.
///
/// One node statement per node (sorted by ref) labeled `name\nversion`, or
/// just `name` when there is no version, then one edge statement per stored
/// edge.
///
/// # Errors
///
/// Propagates write failures from `w`.
pub fn write_dot(graph: &DependencyGraph<'_>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "digraph dependencies {{")?;
    writeln!(w, "  rankdir=BT;")?;
    writeln!(w, "  node [shape=box];")?;
    writeln!(w)?;

    for (id, entity) in graph.nodes() {
        let label = match entity.version() {
            Some(version) => format!("{}\\n{}", escape(entity.name()), escape(version)),
            None => escape(entity.name()),
        };
        writeln!(w, "  \"{}\" [label=\"{label}\"];", escape(id))?;
    }
    writeln!(w)?;

    for (from, to) in graph.edges() {
        writeln!(w, "  \"{}\" -> \"{}\";", escape(from), escape(to))?;
    }

    writeln!(w, "}}")
}

/// Render `graph` to a DOT string.
#[must_use]
pub fn to_dot(graph: &DependencyGraph<'_>) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_dot(graph, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Escape a string for use inside a double-quoted DOT ID.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
