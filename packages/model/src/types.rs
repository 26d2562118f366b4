use serde::{Deserialize, Serialize};

/// Opaque identifier of a reusable component ("subtree")
pub type ComponentId = String;

/// Identifier of a node within one graph
pub type NodeId = String;

/// Direction of a component port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    InOut,
}

/// Kind of value carried by a port or field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
}

impl ValueKind {
    /// Infer the kind of a literal from its raw text
    pub fn infer(raw: &str) -> Self {
        if raw == "true" || raw == "false" {
            ValueKind::Boolean
        } else if raw.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
            ValueKind::Number
        } else {
            ValueKind::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }
}

/// External contract of a component: one data slot it exchanges with its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub name: String,
    pub direction: PortDirection,
    pub value_kind: ValueKind,
    pub default_value: Option<String>,
    pub required: bool,
    pub description: Option<String>,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, direction: PortDirection, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            direction,
            value_kind,
            default_value: None,
            required: false,
            description: None,
        }
    }

    pub fn input(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(name, PortDirection::Input, value_kind)
    }

    pub fn output(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(name, PortDirection::Output, value_kind)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A caller must bind this port explicitly
    pub fn needs_binding(&self) -> bool {
        self.required && self.default_value.is_none() && self.direction != PortDirection::Output
    }
}

/// Whether a field holds a literal or names an external variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Literal,
    Reference,
}

/// An editable parameter of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBinding {
    pub name: String,
    pub value_kind: ValueKind,
    pub binding_kind: BindingKind,
    /// For references this is the variable name, without delimiters
    pub raw_value: String,
    pub description: Option<String>,
}

impl FieldBinding {
    pub fn literal(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        Self {
            name: name.into(),
            value_kind: ValueKind::infer(&raw_value),
            binding_kind: BindingKind::Literal,
            raw_value,
            description: None,
        }
    }

    pub fn reference(name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_kind: ValueKind::String,
            binding_kind: BindingKind::Reference,
            raw_value: variable.into(),
            description: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.binding_kind == BindingKind::Reference
    }
}

/// Node category; decides how many children a node may have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Root,
    Control,
    Decorator,
    Action,
    Condition,
    Subtree,
}

impl NodeCategory {
    /// Maximum number of outgoing edges, `None` when unbounded
    pub fn max_children(&self) -> Option<usize> {
        match self {
            NodeCategory::Control => None,
            _ => Some(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeCategory::Root => "root",
            NodeCategory::Control => "control",
            NodeCategory::Decorator => "decorator",
            NodeCategory::Action => "action",
            NodeCategory::Condition => "condition",
            NodeCategory::Subtree => "subtree",
        }
    }
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: NodeId,
    pub type_tag: String,
    pub category: NodeCategory,
    pub fields: Vec<FieldBinding>,
    pub label: Option<String>,
    /// Only set on `Subtree` nodes
    pub component_ref: Option<ComponentId>,
}

impl NodeInstance {
    pub fn new(id: impl Into<NodeId>, type_tag: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            category,
            fields: Vec::new(),
            label: None,
            component_ref: None,
        }
    }

    pub fn root(id: impl Into<NodeId>) -> Self {
        Self::new(id, ROOT_TAG, NodeCategory::Root)
    }

    pub fn subtree(id: impl Into<NodeId>, component: impl Into<ComponentId>) -> Self {
        let mut node = Self::new(id, SUBTREE_TAG, NodeCategory::Subtree);
        node.component_ref = Some(component.into());
        node
    }

    pub fn with_field(mut self, field: FieldBinding) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldBinding> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A node type declared in a document's model section. Declarations are
/// kept even when no tree in the document uses the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeModel {
    pub type_tag: String,
    /// `Subtree` models carry the ports of a tree defined in another file
    pub category: NodeCategory,
    pub ports: Vec<PortSpec>,
}

impl NodeModel {
    pub fn new(type_tag: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            type_tag: type_tag.into(),
            category,
            ports: Vec::new(),
        }
    }

    pub fn with_ports(mut self, ports: Vec<PortSpec>) -> Self {
        self.ports = ports;
        self
    }
}

/// Directed parent → child relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
}

impl Edge {
    pub fn new(parent: impl Into<NodeId>, child: impl Into<NodeId>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// A variable surfaced from the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Type tag of the root-category node
pub const ROOT_TAG: &str = "Root";

/// Type tag of component instantiation nodes
pub const SUBTREE_TAG: &str = "SubTree";
