//! Proptest generators for synthetic SBOM documents.

#![allow(dead_code)]

use bomdag_core::sbom::{Bom, Component, Dependency, Service};
use proptest::prelude::*;

pub fn node_id(i: usize) -> String {
    format!("n{i:03}")
}

/// Build a document with `nodes` entities (every third one a service) and
/// the given `(dependent, dependency)` index pairs.
pub fn document(nodes: usize, edges: &[(usize, usize)]) -> Bom {
    let mut bom = Bom {
        bom_format: "CycloneDX".into(),
        spec_version: "1.6".into(),
        ..Bom::default()
    };

    for i in 0..nodes {
        if i % 3 == 2 {
            bom.services.push(Service {
                bom_ref: node_id(i),
                name: format!("service-{i}"),
                ..Service::default()
            });
        } else {
            bom.components.push(Component {
                kind: "library".into(),
                bom_ref: node_id(i),
                name: format!("component-{i}"),
                version: if i % 2 == 0 { format!("{i}.0.0") } else { String::new() },
                ..Component::default()
            });
        }
    }

    for &(from, to) in edges {
        bom.dependencies.push(Dependency {
            bom_ref: node_id(from),
            depends_on: vec![node_id(to)],
        });
    }

    bom
}

/// A random acyclic document: edges only point from higher to lower index.
pub fn arb_dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (0usize..24).prop_flat_map(|n| {
        let upper = n.max(1);
        let edges = prop::collection::vec((0..upper, 0..upper), 0..64).prop_map(|pairs| {
            pairs
                .into_iter()
                .filter(|(from, to)| from > to)
                .collect::<Vec<_>>()
        });
        (Just(n), edges)
    })
}
