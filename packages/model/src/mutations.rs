//! # Mutations
//!
//! The contract through which an editor changes a document.
//!
//! Every graph mutation is applied to a copy of the target component, the
//! copy is validated, and only a valid copy replaces the original. A failed
//! mutation leaves the document untouched.
//!
//! ### AddNode
//! - Inserts a node under an existing parent at a sibling index
//! - Fails if the node id is taken or the parent cannot take another child
//!
//! ### MoveNode
//! - Atomic relocation to a new parent
//! - Fails if the new parent is inside the moved subtree
//!
//! ### RemoveNode
//! - Removes the node and all descendants

use crate::document::{ComponentDefinition, Document, GraphTarget};
use crate::errors::MutationError;
use crate::types::{ComponentId, FieldBinding, NodeId, NodeInstance, PortSpec, Variable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    AddNode {
        target: GraphTarget,
        parent_id: NodeId,
        index: Option<usize>,
        node: NodeInstance,
    },

    RemoveNode {
        target: GraphTarget,
        node_id: NodeId,
    },

    MoveNode {
        target: GraphTarget,
        node_id: NodeId,
        new_parent_id: NodeId,
        index: Option<usize>,
    },

    /// Insert or replace a field by name
    SetField {
        target: GraphTarget,
        node_id: NodeId,
        field: FieldBinding,
    },

    RemoveField {
        target: GraphTarget,
        node_id: NodeId,
        name: String,
    },

    SetLabel {
        target: GraphTarget,
        node_id: NodeId,
        label: Option<String>,
    },

    SetPorts {
        target: GraphTarget,
        ports: Vec<PortSpec>,
    },

    SetDescription {
        target: GraphTarget,
        description: Option<String>,
    },

    SetLocalVariables {
        target: GraphTarget,
        variables: Vec<Variable>,
    },

    AddComponent {
        component: ComponentDefinition,
    },

    RemoveComponent {
        component_id: ComponentId,
    },
}

impl Mutation {
    /// The graph this mutation edits, if any
    pub fn target(&self) -> Option<&GraphTarget> {
        match self {
            Mutation::AddNode { target, .. }
            | Mutation::RemoveNode { target, .. }
            | Mutation::MoveNode { target, .. }
            | Mutation::SetField { target, .. }
            | Mutation::RemoveField { target, .. }
            | Mutation::SetLabel { target, .. }
            | Mutation::SetPorts { target, .. }
            | Mutation::SetDescription { target, .. }
            | Mutation::SetLocalVariables { target, .. } => Some(target),
            Mutation::AddComponent { .. } | Mutation::RemoveComponent { .. } => None,
        }
    }

    /// Apply to a component copy. The caller validates and commits.
    fn apply_to(&self, component: &mut ComponentDefinition) -> Result<(), MutationError> {
        let graph = &mut component.graph;
        match self {
            Mutation::AddNode {
                parent_id,
                index,
                node,
                ..
            } => {
                if !graph.contains(parent_id) {
                    return Err(MutationError::ParentNotFound(parent_id.clone()));
                }
                graph.nodes.push(node.clone());
                graph.insert_edge(parent_id, &node.id, *index);
            }

            Mutation::RemoveNode { node_id, .. } => {
                let node = graph
                    .node(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                if graph.root().map(|r| r.id == node.id).unwrap_or(false) {
                    return Err(MutationError::RootImmovable);
                }
                let removed = graph.descendants_of(node_id);
                graph.nodes.retain(|n| !removed.contains(&n.id));
                graph
                    .edges
                    .retain(|e| !removed.contains(&e.child) && !removed.contains(&e.parent));
            }

            Mutation::MoveNode {
                node_id,
                new_parent_id,
                index,
                ..
            } => {
                if !graph.contains(node_id) {
                    return Err(MutationError::NodeNotFound(node_id.clone()));
                }
                if !graph.contains(new_parent_id) {
                    return Err(MutationError::ParentNotFound(new_parent_id.clone()));
                }
                if graph.root().map(|r| &r.id == node_id).unwrap_or(false) {
                    return Err(MutationError::RootImmovable);
                }
                if graph.descendants_of(node_id).contains(new_parent_id) {
                    return Err(MutationError::CycleDetected);
                }
                graph.edges.retain(|e| &e.child != node_id);
                graph.insert_edge(new_parent_id, node_id, *index);
            }

            Mutation::SetField { node_id, field, .. } => {
                let node = graph
                    .node_mut(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                match node.fields.iter_mut().find(|f| f.name == field.name) {
                    Some(existing) => *existing = field.clone(),
                    None => node.fields.push(field.clone()),
                }
            }

            Mutation::RemoveField { node_id, name, .. } => {
                let node = graph
                    .node_mut(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                node.fields.retain(|f| &f.name != name);
            }

            Mutation::SetLabel { node_id, label, .. } => {
                let node = graph
                    .node_mut(node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                node.label = label.clone();
            }

            Mutation::SetPorts { ports, .. } => {
                component.ports = ports.clone();
            }

            Mutation::SetDescription { description, .. } => {
                component.description = description.clone();
            }

            Mutation::SetLocalVariables { variables, .. } => {
                component.local_variables = variables.clone();
            }

            Mutation::AddComponent { .. } | Mutation::RemoveComponent { .. } => {}
        }
        Ok(())
    }
}

impl Document {
    /// Apply a mutation, keeping every graph invariant
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), MutationError> {
        match &mutation {
            Mutation::AddComponent { component } => {
                component.validate()?;
                self.check_tag_categories_with(component)?;
                self.insert_component(component.clone())?;
                self.mark_modified(component.id.clone());
                return Ok(());
            }
            Mutation::RemoveComponent { component_id } => {
                self.remove_component(component_id)?;
                return Ok(());
            }
            _ => {}
        }

        let Some(target) = mutation.target().cloned() else {
            return Ok(());
        };

        let current = self.target(&target).ok_or_else(|| match &target {
            GraphTarget::Component(id) => MutationError::ComponentNotFound(id.clone()),
            GraphTarget::Main => MutationError::ComponentNotFound(self.main_graph.id.clone()),
        })?;

        let mut candidate = current.clone();
        mutation.apply_to(&mut candidate)?;
        candidate.validate()?;
        self.check_tag_categories_with(&candidate)?;

        if let Some(slot) = self.target_mut(&target) {
            *slot = candidate;
        }

        match target {
            GraphTarget::Main => self.dirty = true,
            GraphTarget::Component(id) => self.mark_modified(id),
        }
        Ok(())
    }
}
