//! Graph construction from a resolved SBOM.
//!
//! # Overview
//!
//! One node is created per component in the [`RefMap`], then one per service
//! in it. A service whose ref collides with a component takes over
//! that node's payload; the node itself is not duplicated.
//!
//! Dependency declarations are then applied in document order:
//!
//! - if the declaring `ref` is unknown, the whole declaration is skipped,
//!   including targets that would have resolved;
//! - if a single `dependsOn` target is unknown, only that edge is skipped.
//!
//! Neither case is an error. Duplicate declarations produce parallel edges,
//! which are kept and counted by [`DependencyGraph::edge_count`].
//!
//! ## Cycle Check
//!
//! After all edges are in place the graph is checked once for cycles
//! (including self-loops). A cyclic graph is discarded and
//! [`SbomError::Cycle`] is returned instead.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument, warn};

use crate::error::SbomError;
use crate::graph::cycles;
use crate::resolve::RefMap;
use crate::sbom::{Bom, Entity};

/// Knobs for graph construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Log dropped dependency references at WARN instead of DEBUG.
    pub warn_on_dangling: bool,
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// An acyclic dependency graph over the entities of one SBOM.
///
/// The graph borrows its payloads from the [`Bom`] it was built from and
/// exposes no mutating methods, so a built graph can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    graph: DiGraph<Entity<'a>, ()>,
    node_map: BTreeMap<&'a str, NodeIndex>,
    roots: Vec<&'a str>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph for `bom` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if the declared dependencies form a cycle.
    pub fn build(bom: &'a Bom, refs: &RefMap<'a>) -> Result<Self, SbomError> {
        Self::build_with(bom, refs, BuildOptions::default())
    }

    /// Build the graph for `bom`.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Cycle`] if the declared dependencies form a cycle.
    #[instrument(skip_all, fields(components = refs.component_count(), services = refs.service_count()))]
    pub fn build_with(
        bom: &'a Bom,
        refs: &RefMap<'a>,
        options: BuildOptions,
    ) -> Result<Self, SbomError> {
        let graph = Self::assemble(bom, refs, options);

        if cycles::has_cycle(&graph.graph) {
            let members = cycles::find_cycles(&graph.graph);
            debug!(cycles = members.len(), "rejecting cyclic dependency graph");
            return Err(SbomError::Cycle { members });
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            roots = graph.roots.len(),
            "built dependency graph"
        );
        Ok(graph)
    }

    /// Construct nodes, edges and the root snapshot without the cycle check.
    pub(crate) fn assemble(bom: &'a Bom, refs: &RefMap<'a>, options: BuildOptions) -> Self {
        let mut graph = DiGraph::<Entity<'a>, ()>::new();
        let mut node_map: BTreeMap<&'a str, NodeIndex> = BTreeMap::new();

        for (id, component) in refs.components() {
            let idx = graph.add_node(Entity::Component(component));
            node_map.insert(id, idx);
        }

        for (id, service) in refs.services() {
            let entity = Entity::Service(service);
            match node_map.get(id) {
                Some(&idx) => graph[idx] = entity,
                None => {
                    let idx = graph.add_node(entity);
                    node_map.insert(id, idx);
                }
            }
        }

        for dep in &bom.dependencies {
            let Some(&source) = node_map.get(dep.bom_ref.as_str()) else {
                report_gap(options, &dep.bom_ref, None);
                continue;
            };

            for target_ref in &dep.depends_on {
                let Some(&target) = node_map.get(target_ref.as_str()) else {
                    report_gap(options, &dep.bom_ref, Some(target_ref));
                    continue;
                };
                graph.add_edge(source, target, ());
            }
        }

        let roots = node_map
            .iter()
            .filter(|&(_, &idx)| {
                graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|(&id, _)| id)
            .collect();

        Self {
            graph,
            node_map,
            roots,
        }
    }

    /// Number of nodes (resolved components and services).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of stored dependency edges, duplicates included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// IDs of nodes that had no dependencies when the graph was built,
    /// sorted.
    #[must_use]
    pub fn roots(&self) -> &[&'a str] {
        &self.roots
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// The entity stored at `id`.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<Entity<'a>> {
        self.node_map.get(id).map(|&idx| self.graph[idx])
    }

    /// All node IDs in lexicographic order.
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.node_map.keys().copied()
    }

    /// All nodes as `(id, entity)` in lexicographic ID order.
    pub fn nodes(&self) -> impl Iterator<Item = (&'a str, Entity<'a>)> + '_ {
        self.node_map.iter().map(|(&id, &idx)| (id, self.graph[idx]))
    }

    /// IDs that `id` depends on, in declaration order.
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&'a str> {
        self.adjacent(id, Direction::Outgoing)
    }

    /// IDs that depend on `id`, in declaration order.
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&'a str> {
        self.adjacent(id, Direction::Incoming)
    }

    /// Every stored edge as `(dependent, dependency)`, grouped by source ID
    /// and in declaration order within a source.
    #[must_use]
    pub fn edges(&self) -> Vec<(&'a str, &'a str)> {
        self.node_map
            .iter()
            .flat_map(|(&id, &idx)| {
                ordered_edges(&self.graph, idx, Direction::Outgoing)
                    .into_iter()
                    .map(move |(_, target)| (id, self.graph[target].bom_ref()))
            })
            .collect()
    }

    fn adjacent(&self, id: &str, direction: Direction) -> Vec<&'a str> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        ordered_edges(&self.graph, idx, direction)
            .into_iter()
            .map(|(_, other)| self.graph[other].bom_ref())
            .collect()
    }

    pub(crate) const fn inner(&self) -> &DiGraph<Entity<'a>, ()> {
        &self.graph
    }
}

/// Edges touching `idx` in insertion order, paired with the far endpoint.
///
/// petgraph walks adjacency lists newest-first, so sort by edge index.
pub(crate) fn ordered_edges<N>(
    graph: &DiGraph<N, ()>,
    idx: NodeIndex,
    direction: Direction,
) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut edges: Vec<(EdgeIndex, NodeIndex)> = graph
        .edges_directed(idx, direction)
        .map(|edge| {
            let other = match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            (edge.id(), other)
        })
        .collect();
    edges.sort_unstable_by_key(|(edge, _)| *edge);
    edges
}

fn report_gap(options: BuildOptions, source: &str, target: Option<&String>) {
    match (target, options.warn_on_dangling) {
        (None, true) => warn!(source, "skipping dependencies of unknown ref"),
        (None, false) => debug!(source, "skipping dependencies of unknown ref"),
        (Some(target), true) => warn!(source, target = %target, "skipping edge to unknown ref"),
        (Some(target), false) => debug!(source, target = %target, "skipping edge to unknown ref"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::sbom::{Component, Dependency, Describe, Service};

    fn component(id: &str) -> Component {
        Component {
            kind: "library".into(),
            bom_ref: id.into(),
            name: format!("Component {id}"),
            version: "1.0.0".into(),
            ..Component::default()
        }
    }

    fn dep(id: &str, on: &[&str]) -> Dependency {
        Dependency {
            bom_ref: id.into(),
            depends_on: on.iter().map(ToString::to_string).collect(),
        }
    }

    fn bom(ids: &[&str], deps: Vec<Dependency>) -> Bom {
        Bom {
            bom_format: "CycloneDX".into(),
            spec_version: "1.6".into(),
            components: ids.iter().map(|id| component(id)).collect(),
            dependencies: deps,
            ..Bom::default()
        }
    }

    #[test]
    fn empty_bom_produces_empty_graph() {
        let bom = Bom::default();
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn chain_builds_mutual_adjacency() {
        let bom = bom(
            &["a", "b", "c"],
            vec![dep("a", &["b"]), dep("b", &["c"]), dep("c", &[])],
        );
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependencies("a"), vec!["b"]);
        assert_eq!(graph.dependents("b"), vec!["a"]);
        assert_eq!(graph.dependencies("b"), vec!["c"]);
        assert_eq!(graph.dependents("c"), vec!["b"]);
        assert_eq!(graph.roots(), &["c"]);
    }

    #[test]
    fn adjacency_preserves_declaration_order() {
        let bom = bom(&["a", "b", "c", "d"], vec![dep("a", &["d", "b", "c"])]);
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert_eq!(graph.dependencies("a"), vec!["d", "b", "c"]);
        assert_eq!(graph.edges(), vec![("a", "d"), ("a", "b"), ("a", "c")]);
    }

    #[test]
    fn unknown_source_skips_whole_declaration() {
        let bom = bom(&["a", "b"], vec![dep("ghost", &["a", "b"])]);
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains("ghost"));
    }

    #[test]
    fn unknown_target_skips_single_edge() {
        let bom = bom(&["a", "b"], vec![dep("a", &["missing", "b"])]);
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies("a"), vec!["b"]);
        assert!(!graph.contains("missing"));
    }

    #[test]
    fn duplicate_declarations_keep_parallel_edges() {
        let bom = bom(&["a", "b"], vec![dep("a", &["b"]), dep("a", &["b"])]);
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.dependencies("a"), vec!["b", "b"]);
        assert_eq!(graph.dependents("b"), vec!["a", "a"]);
    }

    #[test]
    fn services_become_nodes() {
        let mut bom = bom(&["app"], vec![dep("app", &["svc-db"])]);
        bom.services = vec![
            Service {
                bom_ref: "svc-db".into(),
                name: "Database".into(),
                ..Service::default()
            },
            Service {
                name: "no-ref".into(),
                ..Service::default()
            },
        ];
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");

        assert_eq!(graph.node_count(), 2);
        let svc = graph.entity("svc-db").expect("service node");
        assert!(svc.is_service());
        assert_eq!(svc.name(), "Database");
        assert_eq!(graph.roots(), &["svc-db"]);
    }

    #[test]
    fn service_overwrites_colliding_component_node() {
        let mut bom = bom(&["shared", "a"], vec![dep("a", &["shared"])]);
        bom.services = vec![Service {
            bom_ref: "shared".into(),
            name: "Shared Service".into(),
            ..Service::default()
        }];
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");

        assert_eq!(graph.node_count(), 2);
        let shared = graph.entity("shared").expect("shared node");
        assert!(shared.is_service());
        assert_eq!(graph.dependents("shared"), vec!["a"]);
    }

    #[test]
    fn nodes_come_from_the_ref_map() {
        let mut with_service = bom(&["app"], vec![dep("app", &["svc"])]);
        with_service.services = vec![Service {
            bom_ref: "svc".into(),
            name: "Unresolved".into(),
            ..Service::default()
        }];
        let components_only = bom(&["app"], Vec::new());
        let refs = resolve(&components_only);

        let graph = DependencyGraph::build(&with_service, &refs).expect("build");
        assert_eq!(graph.node_count(), 1);
        assert!(!graph.contains("svc"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn duplicate_service_refs_share_one_node() {
        let mut bom = bom(&["app"], vec![dep("app", &["svc"])]);
        bom.services = ["Old", "New"]
            .into_iter()
            .map(|name| Service {
                bom_ref: "svc".into(),
                name: name.into(),
                ..Service::default()
            })
            .collect();
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.entity("svc").map(|e| e.name().to_string()), Some("New".into()));
    }

    #[test]
    fn self_loop_is_rejected() {
        let bom = bom(&["a"], vec![dep("a", &["a"])]);
        let refs = resolve(&bom);
        let err = DependencyGraph::build(&bom, &refs).expect_err("cycle");
        match err {
            SbomError::Cycle { members } => assert_eq!(members, vec![vec!["a".to_string()]]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let bom = bom(
            &["a", "b", "c"],
            vec![dep("a", &["b"]), dep("b", &["a"]), dep("c", &["a"])],
        );
        let refs = resolve(&bom);
        let err = DependencyGraph::build(&bom, &refs).expect_err("cycle");
        assert!(err.is_cycle());
        assert!(err.to_string().contains("[a, b]"));
    }

    #[test]
    fn roots_are_a_sorted_snapshot() {
        let bom = bom(
            &["z", "y", "x", "w"],
            vec![dep("w", &["x"]), dep("x", &["z"])],
        );
        let refs = resolve(&bom);
        let graph = DependencyGraph::build(&bom, &refs).expect("build");
        assert_eq!(graph.roots(), &["y", "z"]);
    }

    #[test]
    fn graph_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DependencyGraph<'static>>();
    }
}
