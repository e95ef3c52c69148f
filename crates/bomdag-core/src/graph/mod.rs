//! Dependency graph over resolved SBOM entities.
//!
//! # Overview
//!
//! Nodes are owned by a single petgraph arena; adjacency is stored as edge
//! records between `NodeIndex` handles, so a node's dependency list
//! (outgoing edges) and dependent list (incoming edges) are two views of the
//! same edge set and can never disagree.
//!
//! ## Pipeline
//!
//! ```text
//! Bom
//!   ↓  resolve::resolve()
//! RefMap (ref → component / service)
//!   ↓  build::DependencyGraph::build()
//! DependencyGraph (acyclic, immutable)
//!   ├─ order: topological_sort / reverse_topological_sort / deployment_groups
//!   ├─ stats::GraphStats::from_graph()
//!   └─ render::write_dot()
//! ```
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A depends on B": B must be deployed before A.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use bomdag_core::{graph::DependencyGraph, resolve::resolve, sbom::Bom};
//!
//! let bom = Bom::from_path(path)?;
//! let refs = resolve(&bom);
//! let graph = DependencyGraph::build(&bom, &refs)?;
//! for group in graph.deployment_groups()? {
//!     println!("{}", group.join(", "));
//! }
//! ```

pub mod build;
pub mod cycles;
pub mod stats;

pub use build::{BuildOptions, DependencyGraph};
pub use cycles::{find_cycles, has_cycle};
pub use stats::GraphStats;
