//! Cycle detection for dependency graphs.
//!
//! # Edge Direction
//!
//! Edges point from a dependent to its dependency. A cycle is any path that
//! returns to its start by following dependency edges; a node that depends
//! on itself is a cycle of length one.

#![allow(clippy::module_name_repetitions)]

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::sbom::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the current DFS path.
    Gray,
    /// Fully explored.
    Black,
}

/// Return `true` if any cycle is reachable via outgoing edges.
///
/// Iterative three-color DFS: reaching a gray node means the edge closes a
/// path back onto the current stack. Runs in `O(V + E)` and never recurses,
/// so long dependency chains cannot overflow the call stack.
#[must_use]
pub fn has_cycle<N, E>(graph: &DiGraph<N, E>) -> bool {
    let mut color = vec![Color::White; graph.node_count()];

    // Each stack entry: (node, its successors, index of next successor).
    let mut call_stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();

    for start in graph.node_indices() {
        if color[start.index()] != Color::White {
            continue;
        }

        color[start.index()] = Color::Gray;
        call_stack.push((start, successors(graph, start), 0));

        while let Some(frame) = call_stack.last_mut() {
            let (current, neighbors, next) = frame;

            if *next < neighbors.len() {
                let neighbor = neighbors[*next];
                *next += 1;

                match color[neighbor.index()] {
                    Color::Gray => return true,
                    Color::White => {
                        color[neighbor.index()] = Color::Gray;
                        let next_neighbors = successors(graph, neighbor);
                        call_stack.push((neighbor, next_neighbors, 0));
                    }
                    Color::Black => {}
                }
            } else {
                color[current.index()] = Color::Black;
                call_stack.pop();
            }
        }
    }

    false
}

fn successors<N, E>(graph: &DiGraph<N, E>, node: NodeIndex) -> Vec<NodeIndex> {
    graph.neighbors_directed(node, Direction::Outgoing).collect()
}

/// Find every group of nodes that participates in a cycle.
///
/// Each entry is the sorted list of refs in one strongly connected component
/// with more than one member, or a single node with a self-loop. Entries are
/// sorted, so the result is deterministic.
#[must_use]
pub fn find_cycles(graph: &DiGraph<Entity<'_>, ()>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .map(|idx| graph[idx].bom_ref().to_string())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    cycles
}
