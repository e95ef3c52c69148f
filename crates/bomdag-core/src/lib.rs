#![forbid(unsafe_code)]
//! bomdag-core library.
//!
//! Derives deployment and teardown order from a CycloneDX SBOM.
//!
//! # Conventions
//!
//! - **Errors**: Library functions return [`error::SbomError`] (`thiserror`).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod order;
pub mod render;
pub mod resolve;
pub mod sbom;

pub use error::{ErrorCode, SbomError};
pub use graph::{BuildOptions, DependencyGraph, GraphStats};
pub use order::{DeploymentGroup, DeploymentStep};
pub use resolve::{RefMap, resolve};
pub use sbom::{Bom, Describe, Entity};
