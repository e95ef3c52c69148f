//! Basic statistics for a dependency graph.
//!
//! # Statistics Provided
//!
//! - **node_count**: Components and services in the graph.
//! - **edge_count**: Stored dependency edges (parallel edges counted).
//! - **root_count**: Nodes with no dependencies at build time.
//! - **service_count**: Nodes whose payload is a service.
//! - **isolated_node_count**: Nodes with neither dependencies nor dependents.
//! - **max_dependencies** / **max_dependents**: Highest out- / in-degree.
//! - **density**: `edge_count / (node_count * (node_count - 1))`, zero for
//!   graphs with fewer than two nodes.

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::graph::DependencyGraph;

/// Summary statistics for a [`DependencyGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub root_count: usize,
    pub service_count: usize,
    pub isolated_node_count: usize,
    pub max_dependencies: usize,
    pub max_dependents: usize,
    pub density: f64,
}

impl GraphStats {
    /// Compute statistics for `graph`.
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph<'_>) -> Self {
        let inner = graph.inner();
        let node_count = inner.node_count();
        let edge_count = inner.edge_count();

        let degree = |idx: NodeIndex, dir: Direction| inner.edges_directed(idx, dir).count();

        let mut isolated_node_count = 0;
        let mut max_dependencies = 0;
        let mut max_dependents = 0;
        for idx in inner.node_indices() {
            let out = degree(idx, Direction::Outgoing);
            let inc = degree(idx, Direction::Incoming);
            if out == 0 && inc == 0 {
                isolated_node_count += 1;
            }
            max_dependencies = max_dependencies.max(out);
            max_dependents = max_dependents.max(inc);
        }

        Self {
            node_count,
            edge_count,
            root_count: graph.roots().len(),
            service_count: inner.node_weights().filter(|e| e.is_service()).count(),
            isolated_node_count,
            max_dependencies,
            max_dependents,
            density: compute_density(node_count, edge_count),
        }
    }
}

/// `edge_count / (n * (n - 1))`. Parallel edges can push this above 1.0.
#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    let max_edges = node_count * (node_count - 1);
    edge_count as f64 / max_edges as f64
}
