//! CycloneDX document model and JSON decoder.
//!
//! # Overview
//!
//! The records here mirror the subset of the CycloneDX 1.6 JSON schema that
//! the dependency engine reads: nested components, services, the metadata
//! subject component and the flat `dependencies` list. Everything is plain
//! data; the records are decoded once and then only borrowed.
//!
//! Missing optional fields decode to their defaults (empty string, empty
//! list, `None`) and unknown fields are ignored, so partially-populated
//! documents still load. The only structural check beyond JSON shape is the
//! top-level `bomFormat` tag, which must be `"CycloneDX"`.

#![allow(clippy::module_name_repetitions)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::SbomError;

/// The only accepted value of the top-level `bomFormat` field.
pub const BOM_FORMAT: &str = "CycloneDX";

/// A decoded CycloneDX document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    #[serde(default)]
    pub bom_format: String,
    #[serde(default)]
    pub spec_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compositions: Vec<Composition>,
}

/// Document-level metadata. Only `component` matters to the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    /// The primary subject of the BOM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Supplier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vendor: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// A component, possibly carrying nested sub-components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "bom-ref", default)]
    pub bom_ref: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purl: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

/// A service entry (CycloneDX 1.4+).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "bom-ref", default)]
    pub bom_ref: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A declared dependency: `ref` requires every entry of `depends_on`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(rename = "ref", default)]
    pub bom_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(default)]
    pub aggregate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assemblies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Bom {
    /// Decode a document from a JSON reader and check its format tag.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Decode`] for malformed JSON and
    /// [`SbomError::InvalidFormat`] when `bomFormat` is not `CycloneDX`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SbomError> {
        let bom: Self = serde_json::from_reader(reader)?;
        bom.check_format()?;
        Ok(bom)
    }

    /// Open and decode the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SbomError::Io`] if the file cannot be opened, otherwise the
    /// same errors as [`Bom::from_reader`].
    #[instrument]
    pub fn from_path(path: &Path) -> Result<Self, SbomError> {
        let file = File::open(path).map_err(|source| SbomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bom = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(
            spec_version = %bom.spec_version,
            components = bom.components.len(),
            services = bom.services.len(),
            dependencies = bom.dependencies.len(),
            "decoded SBOM"
        );
        Ok(bom)
    }

    fn check_format(&self) -> Result<(), SbomError> {
        if self.bom_format == BOM_FORMAT {
            Ok(())
        } else {
            Err(SbomError::InvalidFormat(self.bom_format.clone()))
        }
    }
}

impl FromStr for Bom {
    type Err = SbomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Identity and display capabilities shared by components and services.
pub trait Describe {
    /// Unique reference (`bom-ref`).
    fn id(&self) -> &str;
    /// Human-readable name. May be empty for malformed entries.
    fn name(&self) -> &str;
    /// Version, if one is declared and non-empty.
    fn version(&self) -> Option<&str>;
}

impl Describe for Component {
    fn id(&self) -> &str {
        &self.bom_ref
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        non_empty(&self.version)
    }
}

impl Describe for Service {
    fn id(&self) -> &str {
        &self.bom_ref
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> Option<&str> {
        non_empty(&self.version)
    }
}

/// A deployable unit: one graph node's payload, borrowed from the [`Bom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Component(&'a Component),
    Service(&'a Service),
}

impl<'a> Entity<'a> {
    /// The ref, borrowed for the document's lifetime rather than `&self`'s.
    #[must_use]
    pub fn bom_ref(self) -> &'a str {
        match self {
            Self::Component(c) => &c.bom_ref,
            Self::Service(s) => &s.bom_ref,
        }
    }

    /// `"name (version)"` when a version exists, else `"name"`.
    #[must_use]
    pub fn display_label(&self) -> String {
        match self.version() {
            Some(version) => format!("{} ({version})", self.name()),
            None => self.name().to_string(),
        }
    }

    #[must_use]
    pub const fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}

impl Describe for Entity<'_> {
    fn id(&self) -> &str {
        match self {
            Self::Component(c) => c.id(),
            Self::Service(s) => s.id(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Component(c) => c.name(),
            Self::Service(s) => s.name(),
        }
    }

    fn version(&self) -> Option<&str> {
        match self {
            Self::Component(c) => c.version(),
            Self::Service(s) => s.version(),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
