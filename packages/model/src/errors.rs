//! Error types for the document model

use crate::types::{ComponentId, NodeCategory, NodeId};
use thiserror::Error;

/// A graph violates one of the tree invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("Graph has no root node")]
    MissingRoot,

    #[error("Graph has {} root nodes: {}", .0.len(), .0.join(", "))]
    MultipleRoots(Vec<NodeId>),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("Edge {parent} -> {child} references an unknown node")]
    DanglingEdge { parent: NodeId, child: NodeId },

    #[error("Root node {0} has a parent")]
    RootHasParent(NodeId),

    #[error("Node {0} has more than one parent")]
    MultipleParents(NodeId),

    #[error("Node {node} ({category}) has {count} children, at most {max} allowed")]
    TooManyChildren {
        node: NodeId,
        category: NodeCategory,
        count: usize,
        max: usize,
    },

    #[error("Node {0} is not reachable from the root")]
    Unreachable(NodeId),

    #[error("Subtree node {0} does not name a component")]
    MissingComponentRef(NodeId),

    #[error("Node {0} names a component but is not a subtree node")]
    UnexpectedComponentRef(NodeId),

    #[error("Node {node} has more than one field named '{field}'")]
    DuplicateField { node: NodeId, field: String },

    #[error("Node {node} uses reserved attribute '{field}' as a field")]
    ReservedField { node: NodeId, field: String },

    #[error("Node {node} uses reserved type '{tag}' with category {category}")]
    ReservedTypeTag {
        node: NodeId,
        tag: String,
        category: NodeCategory,
    },

    #[error("Type '{tag}' is used as {found} but elsewhere in the document as {expected}")]
    ConflictingCategory {
        tag: String,
        expected: NodeCategory,
        found: NodeCategory,
    },
}

/// A component id is already taken
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Component '{id}' already exists")]
pub struct NamingConflictError {
    pub id: ComponentId,
}

impl NamingConflictError {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("The root node cannot be removed or moved")]
    RootImmovable,

    #[error("The main graph cannot be removed")]
    CannotRemoveMain,

    #[error("Invalid structure: {0}")]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    NamingConflict(#[from] NamingConflictError),
}
