//! # Graphs
//!
//! A graph is a flat list of nodes plus parent → child edges. Sibling order is
//! the order in which a parent's edges appear in `edges`.
//!
//! Every graph must form a tree under the unique root node; `validate` checks
//! that and is run by the codec after decoding and by every mutation before
//! it is committed.

use crate::errors::StructuralError;
use crate::types::{Edge, NodeCategory, NodeId, NodeInstance, ROOT_TAG, SUBTREE_TAG};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Attribute names the wire format reserves on every node
pub const RESERVED_LABEL_ATTRIBUTE: &str = "name";

/// Attribute name reserved on root and subtree nodes for the component id
pub const RESERVED_ID_ATTRIBUTE: &str = "ID";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<NodeInstance>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding only a root node
    pub fn with_root(root_id: impl Into<NodeId>) -> Self {
        Self {
            nodes: vec![NodeInstance::root(root_id)],
            edges: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn root(&self) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.category == NodeCategory::Root)
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeInstance> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Children of a node, in sibling order
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a NodeInstance> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.parent == id)
            .filter_map(move |e| self.node(&e.child))
    }

    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.edges.iter().find(|e| e.child == id).map(|e| &e.parent)
    }

    /// Nodes reachable from the root, parents before children
    pub fn preorder(&self) -> Vec<&NodeInstance> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root() else {
            return out;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            out.push(node);
            let children: Vec<_> = self.children(&node.id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Ids of the node and all of its descendants
    pub fn descendants_of(&self, id: &str) -> HashSet<NodeId> {
        let mut out = HashSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if !out.insert(current.clone()) {
                continue;
            }
            for edge in self.edges.iter().filter(|e| e.parent == current) {
                stack.push(edge.child.clone());
            }
        }
        out
    }

    /// Component ids named by subtree nodes, in preorder
    pub fn component_refs(&self) -> impl Iterator<Item = &str> {
        self.preorder()
            .into_iter()
            .filter_map(|n| n.component_ref.as_deref())
    }

    /// Insert an edge so that `child` becomes the `index`-th child of `parent`.
    /// Appends when `index` is past the last sibling.
    pub fn insert_edge(&mut self, parent: &str, child: &str, index: Option<usize>) {
        let edge = Edge::new(parent, child);
        let position = index.and_then(|index| {
            self.edges
                .iter()
                .enumerate()
                .filter(|(_, e)| e.parent == parent)
                .nth(index)
                .map(|(pos, _)| pos)
        });

        match position {
            Some(pos) => self.edges.insert(pos, edge),
            None => self.edges.push(edge),
        }
    }

    /// Check every tree invariant
    pub fn validate(&self) -> Result<(), StructuralError> {
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.category == NodeCategory::Root)
            .map(|n| n.id.clone())
            .collect();

        let root_id = match roots.as_slice() {
            [] => return Err(StructuralError::MissingRoot),
            [root] => root.clone(),
            _ => return Err(StructuralError::MultipleRoots(roots)),
        };

        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(StructuralError::DuplicateNodeId(node.id.clone()));
            }
            validate_node(node)?;
        }

        let mut incoming: HashMap<&str, usize> = HashMap::new();
        let mut outgoing: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            if !ids.contains(edge.parent.as_str()) || !ids.contains(edge.child.as_str()) {
                return Err(StructuralError::DanglingEdge {
                    parent: edge.parent.clone(),
                    child: edge.child.clone(),
                });
            }
            *incoming.entry(edge.child.as_str()).or_default() += 1;
            *outgoing.entry(edge.parent.as_str()).or_default() += 1;
        }

        if incoming.contains_key(root_id.as_str()) {
            return Err(StructuralError::RootHasParent(root_id));
        }

        for node in &self.nodes {
            if incoming.get(node.id.as_str()).copied().unwrap_or(0) > 1 {
                return Err(StructuralError::MultipleParents(node.id.clone()));
            }

            let count = outgoing.get(node.id.as_str()).copied().unwrap_or(0);
            if let Some(max) = node.category.max_children() {
                if count > max {
                    return Err(StructuralError::TooManyChildren {
                        node: node.id.clone(),
                        category: node.category,
                        count,
                        max,
                    });
                }
            }
        }

        let reachable = self.descendants_of(&root_id);
        if let Some(orphan) = self.nodes.iter().find(|n| !reachable.contains(&n.id)) {
            return Err(StructuralError::Unreachable(orphan.id.clone()));
        }

        Ok(())
    }
}

fn validate_node(node: &NodeInstance) -> Result<(), StructuralError> {
    match (node.category, &node.component_ref) {
        (NodeCategory::Subtree, None) => {
            return Err(StructuralError::MissingComponentRef(node.id.clone()));
        }
        (category, Some(_)) if category != NodeCategory::Subtree => {
            return Err(StructuralError::UnexpectedComponentRef(node.id.clone()));
        }
        _ => {}
    }

    let reserved_tag = match node.category {
        NodeCategory::Root => node.type_tag != ROOT_TAG,
        NodeCategory::Subtree => node.type_tag != SUBTREE_TAG,
        _ => node.type_tag == ROOT_TAG || node.type_tag == SUBTREE_TAG,
    };
    if reserved_tag {
        return Err(StructuralError::ReservedTypeTag {
            node: node.id.clone(),
            tag: node.type_tag.clone(),
            category: node.category,
        });
    }

    let mut names = HashSet::with_capacity(node.fields.len());
    for field in &node.fields {
        let reserved = field.name == RESERVED_LABEL_ATTRIBUTE
            || (matches!(node.category, NodeCategory::Root | NodeCategory::Subtree)
                && field.name == RESERVED_ID_ATTRIBUTE);
        if reserved {
            return Err(StructuralError::ReservedField {
                node: node.id.clone(),
                field: field.name.clone(),
            });
        }
        if !names.insert(field.name.as_str()) {
            return Err(StructuralError::DuplicateField {
                node: node.id.clone(),
                field: field.name.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldBinding;

    fn sequence(id: &str) -> NodeInstance {
        NodeInstance::new(id, "Sequence", NodeCategory::Control)
    }

    fn action(id: &str) -> NodeInstance {
        NodeInstance::new(id, "SaySomething", NodeCategory::Action)
    }

    fn sample() -> Graph {
        Graph {
            nodes: vec![
                NodeInstance::root("r"),
                sequence("s"),
                action("a"),
                action("b"),
            ],
            edges: vec![Edge::new("r", "s"), Edge::new("s", "a"), Edge::new("s", "b")],
        }
    }

    #[test]
    fn test_valid_tree() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_zero_roots() {
        let graph = Graph {
            nodes: vec![sequence("s")],
            edges: vec![],
        };
        assert_eq!(graph.validate(), Err(StructuralError::MissingRoot));
    }

    #[test]
    fn test_two_roots() {
        let mut graph = sample();
        graph.nodes.push(NodeInstance::root("r2"));
        assert!(matches!(graph.validate(), Err(StructuralError::MultipleRoots(ids)) if ids.len() == 2));
    }

    #[test]
    fn test_node_with_two_parents() {
        let mut graph = sample();
        graph.nodes.push(sequence("s2"));
        graph.edges.push(Edge::new("s", "s2"));
        graph.edges.push(Edge::new("s2", "a"));
        assert_eq!(
            graph.validate(),
            Err(StructuralError::MultipleParents("a".to_string()))
        );
    }

    #[test]
    fn test_non_control_child_limit() {
        let graph = Graph {
            nodes: vec![NodeInstance::root("r"), action("a"), action("b")],
            edges: vec![Edge::new("r", "a"), Edge::new("r", "b")],
        };
        assert!(matches!(
            graph.validate(),
            Err(StructuralError::TooManyChildren { count: 2, max: 1, .. })
        ));
    }

    #[test]
    fn test_root_with_parent() {
        let mut graph = sample();
        graph.edges.push(Edge::new("a", "r"));
        assert_eq!(
            graph.validate(),
            Err(StructuralError::RootHasParent("r".to_string()))
        );
    }

    #[test]
    fn test_unreachable_node() {
        let mut graph = sample();
        graph.nodes.push(action("orphan"));
        assert_eq!(
            graph.validate(),
            Err(StructuralError::Unreachable("orphan".to_string()))
        );
    }

    #[test]
    fn test_dangling_edge() {
        let mut graph = sample();
        graph.edges.push(Edge::new("a", "ghost"));
        assert!(matches!(graph.validate(), Err(StructuralError::DanglingEdge { .. })));
    }

    #[test]
    fn test_subtree_requires_component_ref() {
        let mut graph = sample();
        graph.nodes[2] = NodeInstance::new("a", "SubTree", NodeCategory::Subtree);
        assert_eq!(
            graph.validate(),
            Err(StructuralError::MissingComponentRef("a".to_string()))
        );
    }

    #[test]
    fn test_reserved_type_tags_need_their_category() {
        let mut graph = sample();
        graph.nodes[2] = NodeInstance::new("a", "SubTree", NodeCategory::Action);
        assert!(matches!(
            graph.validate(),
            Err(StructuralError::ReservedTypeTag { ref tag, .. }) if tag == "SubTree"
        ));

        graph.nodes[2] = NodeInstance::new("a", "Root", NodeCategory::Condition);
        assert!(matches!(graph.validate(), Err(StructuralError::ReservedTypeTag { .. })));

        let mut call = NodeInstance::new("a", "RunTree", NodeCategory::Subtree);
        call.component_ref = Some("GoTo".to_string());
        graph.nodes[2] = call;
        assert!(matches!(graph.validate(), Err(StructuralError::ReservedTypeTag { .. })));
    }

    #[test]
    fn test_component_refs_follow_preorder() {
        let graph = Graph {
            nodes: vec![
                NodeInstance::root("r"),
                NodeInstance::subtree("late", "Second"),
                sequence("s"),
                NodeInstance::subtree("early", "First"),
            ],
            edges: vec![Edge::new("r", "s"), Edge::new("s", "early"), Edge::new("s", "late")],
        };
        let refs: Vec<_> = graph.component_refs().collect();
        assert_eq!(refs, vec!["First", "Second"]);
    }

    #[test]
    fn test_reserved_and_duplicate_fields() {
        let mut graph = sample();
        graph.nodes[2] = action("a").with_field(FieldBinding::literal("name", "x"));
        assert!(matches!(graph.validate(), Err(StructuralError::ReservedField { .. })));

        graph.nodes[2] = action("a")
            .with_field(FieldBinding::literal("msg", "x"))
            .with_field(FieldBinding::literal("msg", "y"));
        assert!(matches!(graph.validate(), Err(StructuralError::DuplicateField { .. })));
    }

    #[test]
    fn test_preorder_follows_sibling_order() {
        let graph = sample();
        let ids: Vec<_> = graph.preorder().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["r", "s", "a", "b"]);
    }

    #[test]
    fn test_insert_edge_at_index() {
        let mut graph = sample();
        graph.nodes.push(action("c"));
        graph.insert_edge("s", "c", Some(1));
        let children: Vec<_> = graph.children("s").map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["a", "c", "b"]);

        graph.nodes.push(action("d"));
        graph.insert_edge("s", "d", Some(10));
        let children: Vec<_> = graph.children("s").map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["a", "c", "b", "d"]);
    }
}
