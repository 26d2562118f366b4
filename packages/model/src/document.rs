//! # Documents and Components
//!
//! A Document is one file's worth of authored content: a main graph plus the
//! components it embeds. Components are owned by value. Anything crossing a
//! container boundary (library → document, document → library, document →
//! document) is cloned, never shared.
//!
//! ## Edit tracking
//!
//! ```text
//! apply(mutation) on main graph       → dirty
//! apply(mutation) on embedded comp C  → dirty, modified += C
//! mark_saved()                        → clean, modified = {}
//! ```

use crate::errors::{MutationError, NamingConflictError, StructuralError};
use crate::graph::Graph;
use crate::id_generator::IDGenerator;
use crate::types::{ComponentId, NodeCategory, NodeModel, PortSpec, Variable};
use crate::variables::derive_variables;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::iter;

/// Components keyed by id, in document order
pub type ComponentMap = IndexMap<ComponentId, ComponentDefinition>;

/// A named, reusable tree fragment with its own port contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: ComponentId,
    pub graph: Graph,
    /// Variables as declared by the editor. The codec fills this from
    /// `derive_variables`; a variable without a write node does not survive a
    /// round trip.
    pub local_variables: Vec<Variable>,
    pub ports: Vec<PortSpec>,
    pub description: Option<String>,
}

impl ComponentDefinition {
    /// A component whose graph holds only a root node
    pub fn new(id: impl Into<ComponentId>) -> Self {
        let id = id.into();
        let mut ids = IDGenerator::new(&id);
        Self {
            graph: Graph::with_root(ids.new_id()),
            id,
            local_variables: Vec::new(),
            ports: Vec::new(),
            description: None,
        }
    }

    pub fn from_graph(id: impl Into<ComponentId>, graph: Graph) -> Self {
        Self {
            id: id.into(),
            graph,
            local_variables: Vec::new(),
            ports: Vec::new(),
            description: None,
        }
    }

    pub fn with_ports(mut self, ports: Vec<PortSpec>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Variables written by the current graph
    pub fn derived_variables(&self) -> Vec<Variable> {
        derive_variables(&self.graph)
    }

    pub fn validate(&self) -> Result<(), StructuralError> {
        self.graph.validate()
    }
}

/// Which graph of a document a mutation targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum GraphTarget {
    Main,
    Component(ComponentId),
}

/// Editable behavior document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Entry point; its id is the document's main tree id
    pub main_graph: ComponentDefinition,
    pub embedded_components: ComponentMap,
    /// Model section entries that are not ports of an embedded component
    #[serde(default)]
    pub node_models: Vec<NodeModel>,
    pub dirty: bool,
    pub modified_component_ids: BTreeSet<ComponentId>,
}

impl Document {
    pub fn new(main_graph: ComponentDefinition) -> Self {
        Self {
            main_graph,
            embedded_components: IndexMap::new(),
            node_models: Vec::new(),
            dirty: false,
            modified_component_ids: BTreeSet::new(),
        }
    }

    pub fn main_id(&self) -> &str {
        &self.main_graph.id
    }

    /// Main graph first, then embedded components in document order
    pub fn components(&self) -> impl Iterator<Item = &ComponentDefinition> {
        iter::once(&self.main_graph).chain(self.embedded_components.values())
    }

    pub fn component(&self, id: &str) -> Option<&ComponentDefinition> {
        if self.main_graph.id == id {
            Some(&self.main_graph)
        } else {
            self.embedded_components.get(id)
        }
    }

    pub fn target(&self, target: &GraphTarget) -> Option<&ComponentDefinition> {
        match target {
            GraphTarget::Main => Some(&self.main_graph),
            GraphTarget::Component(id) => self.embedded_components.get(id),
        }
    }

    pub(crate) fn target_mut(&mut self, target: &GraphTarget) -> Option<&mut ComponentDefinition> {
        match target {
            GraphTarget::Main => Some(&mut self.main_graph),
            GraphTarget::Component(id) => self.embedded_components.get_mut(id),
        }
    }

    /// True if `id` names the main graph or an embedded component
    pub fn has_component(&self, id: &str) -> bool {
        self.main_graph.id == id || self.embedded_components.contains_key(id)
    }

    /// Embed a new component. Fails if the id is already taken in this document.
    pub fn insert_component(&mut self, component: ComponentDefinition) -> Result<(), NamingConflictError> {
        if self.has_component(&component.id) {
            return Err(NamingConflictError::new(component.id));
        }
        self.embedded_components.insert(component.id.clone(), component);
        self.dirty = true;
        Ok(())
    }

    /// Overwrite an embedded component wholesale. Returns the previous value.
    pub fn replace_component(&mut self, component: ComponentDefinition) -> Option<ComponentDefinition> {
        self.dirty = true;
        self.embedded_components.insert(component.id.clone(), component)
    }

    /// Embedded ids plus every component named by a subtree node anywhere in
    /// the document
    pub fn referenced_component_ids(&self) -> BTreeSet<ComponentId> {
        let mut ids: BTreeSet<ComponentId> = self.embedded_components.keys().cloned().collect();
        for component in self.components() {
            ids.extend(component.graph.component_refs().map(str::to_string));
        }
        ids
    }

    /// Record that an embedded component changed
    pub fn mark_modified(&mut self, id: impl Into<ComponentId>) {
        self.dirty = true;
        self.modified_component_ids.insert(id.into());
    }

    /// Clear edit tracking after a successful save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.modified_component_ids.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Validate every graph, naming the first offending component
    pub fn validate(&self) -> Result<(), (ComponentId, StructuralError)> {
        for component in self.components() {
            component
                .validate()
                .map_err(|e| (component.id.clone(), e))?;
        }
        check_tag_categories(&self.node_models, self.components())
    }

    /// Check that `component`, added or replacing the one with its id, keeps
    /// every type tag of the document on a single category
    pub fn check_tag_categories_with(&self, component: &ComponentDefinition) -> Result<(), StructuralError> {
        let others = self.components().filter(|c| c.id != component.id);
        check_tag_categories(&self.node_models, others.chain(iter::once(component))).map_err(|(_, e)| e)
    }

    pub(crate) fn remove_component(&mut self, id: &str) -> Result<ComponentDefinition, MutationError> {
        if self.main_graph.id == id {
            return Err(MutationError::CannotRemoveMain);
        }
        let removed = self
            .embedded_components
            .shift_remove(id)
            .ok_or_else(|| MutationError::ComponentNotFound(id.to_string()))?;
        self.modified_component_ids.remove(id);
        self.dirty = true;
        Ok(removed)
    }
}

/// A type tag is written once per document, so every node and model using it
/// must agree on its category. Root and subtree nodes are exempt.
fn check_tag_categories<'a>(
    models: &'a [NodeModel],
    components: impl IntoIterator<Item = &'a ComponentDefinition>,
) -> Result<(), (ComponentId, StructuralError)> {
    let mut seen: HashMap<&str, NodeCategory> = models
        .iter()
        .filter(|m| !matches!(m.category, NodeCategory::Root | NodeCategory::Subtree))
        .map(|m| (m.type_tag.as_str(), m.category))
        .collect();

    for component in components {
        for node in component.graph.preorder() {
            if matches!(node.category, NodeCategory::Root | NodeCategory::Subtree) {
                continue;
            }
            match seen.entry(node.type_tag.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(node.category);
                }
                Entry::Occupied(slot) if *slot.get() != node.category => {
                    return Err((
                        component.id.clone(),
                        StructuralError::ConflictingCategory {
                            tag: node.type_tag.clone(),
                            expected: *slot.get(),
                            found: node.category,
                        },
                    ));
                }
                Entry::Occupied(_) => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, NodeInstance};

    fn with_subtree(id: &str, component: &str) -> ComponentDefinition {
        let mut def = ComponentDefinition::new(id);
        let root = def.graph.nodes[0].id.clone();
        def.graph.nodes.push(NodeInstance::subtree("call", component));
        def.graph.edges.push(Edge::new(root, "call"));
        def
    }

    #[test]
    fn test_new_component_has_single_root() {
        let def = ComponentDefinition::new("Patrol");
        assert_eq!(def.graph.node_count(), 1);
        assert_eq!(def.graph.edge_count(), 0);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_insert_component_conflicts() {
        let mut doc = Document::new(ComponentDefinition::new("Main"));
        assert!(doc.insert_component(ComponentDefinition::new("A")).is_ok());
        assert_eq!(
            doc.insert_component(ComponentDefinition::new("A")),
            Err(NamingConflictError::new("A"))
        );
        assert_eq!(
            doc.insert_component(ComponentDefinition::new("Main")),
            Err(NamingConflictError::new("Main"))
        );
    }

    #[test]
    fn test_referenced_ids_include_refs_and_embedded() {
        let mut doc = Document::new(with_subtree("Main", "Remote"));
        doc.insert_component(with_subtree("Local", "Nested")).unwrap();

        let refs = doc.referenced_component_ids();
        let expected: BTreeSet<ComponentId> = ["Local", "Nested", "Remote"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(refs, expected);
    }

    fn with_leaf(id: &str, tag: &str, category: NodeCategory) -> ComponentDefinition {
        let mut def = ComponentDefinition::new(id);
        let root = def.graph.nodes[0].id.clone();
        def.graph.nodes.push(NodeInstance::new("leaf", tag, category));
        def.graph.edges.push(Edge::new(root, "leaf"));
        def
    }

    #[test]
    fn test_one_category_per_tag() {
        let mut doc = Document::new(with_leaf("Main", "Check", NodeCategory::Action));
        doc.insert_component(with_leaf("Other", "Check", NodeCategory::Condition))
            .unwrap();

        let (id, err) = doc.validate().unwrap_err();
        assert_eq!(id, "Other");
        assert_eq!(
            err,
            StructuralError::ConflictingCategory {
                tag: "Check".to_string(),
                expected: NodeCategory::Action,
                found: NodeCategory::Condition,
            }
        );

        let replacement = with_leaf("Other", "Check", NodeCategory::Action);
        assert!(doc.check_tag_categories_with(&replacement).is_ok());
    }

    #[test]
    fn test_node_models_fix_categories() {
        let mut doc = Document::new(with_leaf("Main", "MoveBase", NodeCategory::Action));
        doc.node_models.push(NodeModel::new("MoveBase", NodeCategory::Control));
        assert!(matches!(
            doc.validate(),
            Err((_, StructuralError::ConflictingCategory { .. }))
        ));

        doc.node_models[0].category = NodeCategory::Action;
        assert!(doc.validate().is_ok());

        doc.node_models.push(NodeModel::new("MoveBase", NodeCategory::Subtree));
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_mark_saved_clears_tracking() {
        let mut doc = Document::new(ComponentDefinition::new("Main"));
        doc.mark_modified("A");
        assert!(doc.is_dirty());
        doc.mark_saved();
        assert!(!doc.is_dirty());
        assert!(doc.modified_component_ids.is_empty());
    }
}
