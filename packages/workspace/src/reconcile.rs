//! # Load-time reconciliation
//!
//! Two steps, kept apart so the engine never decides on its own:
//!
//! ```text
//! detect_discrepancy(doc components, library)  → ids    (pure)
//! caller's decision function                   → policy (human in the loop)
//! resolve(doc, library, ids, policy)           → doc | Aborted
//! ```
//!
//! Under `Overwrite` the library's copy replaces the document's. The library
//! always wins.

use arbor_library::LibraryStore;
use arbor_model::{ComponentDefinition, ComponentId, ComponentMap, Document};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Decides whether a document's copy of a component diverges from the library's
pub trait ComponentComparator: Send + Sync {
    fn name(&self) -> &'static str;

    fn differs(&self, document: &ComponentDefinition, library: &ComponentDefinition) -> bool;
}

/// Compares node and edge counts only. Two components with the same counts
/// but different content are reported equal; this is a known gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeComparator;

impl ComponentComparator for ShapeComparator {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn differs(&self, document: &ComponentDefinition, library: &ComponentDefinition) -> bool {
        Shape::of(document) != Shape::of(library)
    }
}

/// Node and edge count of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub nodes: usize,
    pub edges: usize,
}

impl Shape {
    pub fn of(component: &ComponentDefinition) -> Self {
        Self {
            nodes: component.graph.node_count(),
            edges: component.graph.edge_count(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} nodes, {} edges", self.nodes, self.edges)
    }
}

/// Ids present both in `components` and in the library whose copies differ
pub fn detect_discrepancy(
    components: &ComponentMap,
    library: &LibraryStore,
    comparator: &dyn ComponentComparator,
) -> BTreeSet<ComponentId> {
    components
        .values()
        .filter(|component| {
            library
                .get(&component.id)
                .map(|canonical| comparator.differs(component, canonical))
                .unwrap_or(false)
        })
        .map(|component| component.id.clone())
        .collect()
}

/// One diverging component, for presenting to whoever decides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub id: ComponentId,
    pub document: Shape,
    pub library: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscrepancyReport {
    pub discrepancies: Vec<Discrepancy>,
}

impl DiscrepancyReport {
    pub fn new(document: &Document, library: &LibraryStore, ids: &BTreeSet<ComponentId>) -> Self {
        let discrepancies = ids
            .iter()
            .filter_map(|id| {
                let ours = document.embedded_components.get(id)?;
                let theirs = library.get(id)?;
                Some(Discrepancy {
                    id: id.clone(),
                    document: Shape::of(ours),
                    library: Shape::of(theirs),
                })
            })
            .collect();
        Self { discrepancies }
    }

    pub fn ids(&self) -> BTreeSet<ComponentId> {
        self.discrepancies.iter().map(|d| d.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// What to do with a document whose components disagree with the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Replace the document's copies with the library's
    Overwrite,
    /// Do not open the document
    Abort,
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(ReconcilePolicy::Overwrite),
            "abort" => Ok(ReconcilePolicy::Abort),
            other => Err(format!("unknown policy '{}', expected overwrite or abort", other)),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Reconciliation aborted for {} component(s)", ids.len())]
pub struct Aborted {
    pub ids: BTreeSet<ComponentId>,
}

/// Apply a policy to the discrepant ids of a document
pub fn resolve(
    mut document: Document,
    library: &LibraryStore,
    discrepant: &BTreeSet<ComponentId>,
    policy: ReconcilePolicy,
) -> Result<Document, Aborted> {
    match policy {
        ReconcilePolicy::Abort => Err(Aborted {
            ids: discrepant.clone(),
        }),
        ReconcilePolicy::Overwrite => {
            for id in discrepant {
                if let Some(canonical) = library.checkout(id) {
                    info!(component = %id, "Replacing embedded component with library copy");
                    document.replace_component(canonical);
                }
            }
            Ok(document)
        }
    }
}
