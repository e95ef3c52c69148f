//! Reference resolution: flatten a [`Bom`] into ref-keyed lookup tables.
//!
//! Components are visited depth-first, pre-order, in document order, so a
//! `bom-ref` that appears more than once resolves to its last occurrence.
//! The metadata component is visited after the top-level list. Entries with an
//! empty `bom-ref` are skipped; entries with an empty name pass through as-is.

use std::collections::BTreeMap;

use crate::sbom::{Bom, Component, Service};

/// Ref-keyed views over the components and services of one document.
///
/// Both maps iterate in lexicographic ref order.
#[derive(Debug, Clone, Default)]
pub struct RefMap<'a> {
    components: BTreeMap<&'a str, &'a Component>,
    services: BTreeMap<&'a str, &'a Service>,
}

/// Build the [`RefMap`] for `bom`.
#[must_use]
pub fn resolve(bom: &Bom) -> RefMap<'_> {
    let mut components = BTreeMap::new();
    for component in &bom.components {
        add_component(component, &mut components);
    }
    if let Some(primary) = bom.metadata.as_ref().and_then(|m| m.component.as_ref()) {
        add_component(primary, &mut components);
    }

    let services = bom
        .services
        .iter()
        .filter(|s| !s.bom_ref.is_empty())
        .map(|s| (s.bom_ref.as_str(), s))
        .collect();

    RefMap {
        components,
        services,
    }
}

fn add_component<'a>(component: &'a Component, map: &mut BTreeMap<&'a str, &'a Component>) {
    if !component.bom_ref.is_empty() {
        map.insert(component.bom_ref.as_str(), component);
    }
    for child in &component.components {
        add_component(child, map);
    }
}

impl<'a> RefMap<'a> {
    /// Components in ref order.
    pub fn components(&self) -> impl Iterator<Item = (&'a str, &'a Component)> + '_ {
        self.components.iter().map(|(k, v)| (*k, *v))
    }

    /// Services in ref order.
    pub fn services(&self) -> impl Iterator<Item = (&'a str, &'a Service)> + '_ {
        self.services.iter().map(|(k, v)| (*k, *v))
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
