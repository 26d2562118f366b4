//! Variables are not stored on the wire. They are a projection over the
//! graph: every `SetBlackboard` node writes one variable.

use crate::graph::Graph;
use crate::types::Variable;
use std::collections::HashSet;

/// Type tag of the node that writes a variable
pub const VARIABLE_WRITE_TAG: &str = "SetBlackboard";

/// Field holding the variable name on a write node
pub const VARIABLE_NAME_FIELD: &str = "output_key";

/// Field holding the written value on a write node
pub const VARIABLE_VALUE_FIELD: &str = "value";

/// Derive the flat variable list of a graph. The first write of a name wins.
pub fn derive_variables(graph: &Graph) -> Vec<Variable> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();

    for node in graph.preorder() {
        if node.type_tag != VARIABLE_WRITE_TAG {
            continue;
        }
        let Some(name) = node.field(VARIABLE_NAME_FIELD) else {
            continue;
        };
        if name.raw_value.is_empty() || !seen.insert(name.raw_value.clone()) {
            continue;
        }
        let value = node
            .field(VARIABLE_VALUE_FIELD)
            .map(|f| f.raw_value.clone())
            .unwrap_or_default();
        variables.push(Variable::new(name.raw_value.clone(), value));
    }

    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, FieldBinding, NodeCategory, NodeInstance};

    fn write(id: &str, key: FieldBinding, value: &str) -> NodeInstance {
        NodeInstance::new(id, VARIABLE_WRITE_TAG, NodeCategory::Action)
            .with_field(key)
            .with_field(FieldBinding::literal(VARIABLE_VALUE_FIELD, value))
    }

    #[test]
    fn test_derive_from_write_nodes() {
        let graph = Graph {
            nodes: vec![
                NodeInstance::root("r"),
                NodeInstance::new("s", "Sequence", NodeCategory::Control),
                write("w1", FieldBinding::reference(VARIABLE_NAME_FIELD, "speed"), "3"),
                write("w2", FieldBinding::literal(VARIABLE_NAME_FIELD, "mode"), "idle"),
                write("w3", FieldBinding::literal(VARIABLE_NAME_FIELD, "speed"), "9"),
            ],
            edges: vec![
                Edge::new("r", "s"),
                Edge::new("s", "w1"),
                Edge::new("s", "w2"),
                Edge::new("s", "w3"),
            ],
        };

        let vars = derive_variables(&graph);
        assert_eq!(
            vars,
            vec![Variable::new("speed", "3"), Variable::new("mode", "idle")]
        );
    }

    #[test]
    fn test_write_without_key_is_ignored() {
        let graph = Graph {
            nodes: vec![
                NodeInstance::root("r"),
                NodeInstance::new("w", VARIABLE_WRITE_TAG, NodeCategory::Action),
            ],
            edges: vec![Edge::new("r", "w")],
        };
        assert!(derive_variables(&graph).is_empty());
    }
}
