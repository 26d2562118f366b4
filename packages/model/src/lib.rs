//! # Arbor Model
//!
//! In-memory representation of behavior documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Document                                    │
//! │  - main graph (entry point component)       │
//! │  - embedded components, by value            │
//! │  - dirty flag + modified component ids      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ComponentDefinition                         │
//! │  - Graph: nodes + parent→child edges        │
//! │  - ports, local variables, description      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every graph is a tree under exactly one root node. `Graph::validate`
//! enforces this and `Document::apply` never commits a graph that fails it.

mod document;
mod errors;
mod graph;
mod id_generator;
mod mutations;
mod types;
mod variables;

pub use document::{ComponentDefinition, ComponentMap, Document, GraphTarget};
pub use errors::{MutationError, NamingConflictError, StructuralError};
pub use graph::{Graph, RESERVED_ID_ATTRIBUTE, RESERVED_LABEL_ATTRIBUTE};
pub use id_generator::{get_component_seed, IDGenerator};
pub use mutations::Mutation;
pub use types::{
    BindingKind, ComponentId, Edge, FieldBinding, NodeCategory, NodeId, NodeInstance, NodeModel,
    PortDirection, PortSpec, ValueKind, Variable, ROOT_TAG, SUBTREE_TAG,
};
pub use variables::{derive_variables, VARIABLE_NAME_FIELD, VARIABLE_VALUE_FIELD, VARIABLE_WRITE_TAG};
