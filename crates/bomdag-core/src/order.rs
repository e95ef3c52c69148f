//! Deployment ordering over a [`DependencyGraph`].
//!
//! All three orderings share one leveled Kahn traversal:
//!
//! - a node's in-degree is the number of its dependency edges;
//! - the first frontier is every node with in-degree zero;
//! - each frontier is emitted as one level, and every dependent whose
//!   in-degree drops to zero joins the *next* frontier.
//!
//! Frontier members are sorted by ref before they are emitted, so output is
//! deterministic. The in-degree map and frontier are allocated per call and
//! the graph is only read, so concurrent calls on one graph are independent.
//!
//! If fewer nodes are emitted than the graph holds, the rest sit on a cycle
//! and the call fails with [`SbomError::Cycle`]. Graphs from
//! [`DependencyGraph::build`] never reach that branch.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::SbomError;
use crate::graph::{DependencyGraph, cycles};
use crate::sbom::{Describe, Entity};

/// One entry of a deployment or teardown sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentStep {
    /// 1-based step number. Entries sharing a step can run in parallel in
    /// deployment order; in teardown order every entry has its own step.
    pub step: usize,
    /// Display name of the component or service.
    pub name: String,
    /// The entity's `bom-ref`.
    #[serde(rename = "ref")]
    pub bom_ref: String,
}

/// A set of entities that can be deployed in parallel, rendered as
/// `"name (version)"` or `"name"`.
pub type DeploymentGroup = Vec<String>;

impl<'a> DependencyGraph<'a> {
    /// Deployment order: dependencies first, one step per level.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if some nodes can never be reached.
    #[instrument(skip(self), fields(nodes = self.node_count()))]
    pub fn topological_sort(&self) -> Result<Vec<DeploymentStep>, SbomError> {
        let levels = self.levels()?;
        let inner = self.inner();

        let order = levels
            .iter()
            .enumerate()
            .flat_map(|(level, members)| {
                members.iter().map(move |&idx| {
                    let entity = inner[idx];
                    DeploymentStep {
                        step: level + 1,
                        name: entity.name().to_string(),
                        bom_ref: entity.bom_ref().to_string(),
                    }
                })
            })
            .collect();
        Ok(order)
    }

    /// Teardown order: the deployment order reversed, renumbered `1..=N`.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if some nodes can never be reached.
    pub fn reverse_topological_sort(&self) -> Result<Vec<DeploymentStep>, SbomError> {
        let mut order = self.topological_sort()?;
        order.reverse();
        for (i, entry) in order.iter_mut().enumerate() {
            entry.step = i + 1;
        }
        Ok(order)
    }

    /// Parallel deployment groups, one per level, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if some nodes can never be reached.
    #[instrument(skip(self), fields(nodes = self.node_count()))]
    pub fn deployment_groups(&self) -> Result<Vec<DeploymentGroup>, SbomError> {
        let levels = self.levels()?;
        let inner = self.inner();

        Ok(levels
            .into_iter()
            .map(|members| {
                members
                    .into_iter()
                    .map(|idx| inner[idx].display_label())
                    .collect()
            })
            .collect())
    }

    /// Like [`deployment_groups`](Self::deployment_groups) but yields the
    /// entities themselves instead of rendered labels.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if some nodes can never be reached.
    pub fn entity_levels(&self) -> Result<Vec<Vec<Entity<'a>>>, SbomError> {
        let inner = self.inner();
        Ok(self
            .levels()?
            .into_iter()
            .map(|members| members.into_iter().map(|idx| inner[idx]).collect())
            .collect())
    }

    /// Leveled Kahn traversal shared by every ordering.
    fn levels(&self) -> Result<Vec<Vec<NodeIndex>>, SbomError> {
        let graph = self.inner();

        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|idx| (idx, graph.edges_directed(idx, Direction::Outgoing).count()))
            .collect();

        let mut frontier: Vec<NodeIndex> = in_degree
            .iter()
            .filter_map(|(&idx, &deg)| (deg == 0).then_some(idx))
            .collect();
        self.sort_by_ref(&mut frontier);

        let mut levels: Vec<Vec<NodeIndex>> = Vec::new();
        let mut emitted = 0;

        while !frontier.is_empty() {
            let current = std::mem::take(&mut frontier);
            let mut next: Vec<NodeIndex> = Vec::new();

            for &idx in &current {
                for edge in graph.edges_directed(idx, Direction::Incoming) {
                    let dependent = edge.source();
                    if let Some(deg) = in_degree.get_mut(&dependent)
                        && *deg > 0
                    {
                        *deg -= 1;
                        if *deg == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }

            emitted += current.len();
            levels.push(current);

            self.sort_by_ref(&mut next);
            frontier = next;
        }

        if emitted != graph.node_count() {
            let members = cycles::find_cycles(graph);
            debug!(
                emitted,
                total = graph.node_count(),
                "ordering stalled on unresolved nodes"
            );
            return Err(SbomError::Cycle { members });
        }

        Ok(levels)
    }

    fn sort_by_ref(&self, nodes: &mut [NodeIndex]) {
        let graph = self.inner();
        nodes.sort_unstable_by(|a, b| graph[*a].bom_ref().cmp(graph[*b].bom_ref()));
    }
}
