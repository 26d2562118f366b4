use arbor_model::{ComponentDefinition, Document, FieldBinding, NodeInstance, PortSpec};

/// Visitor pattern for traversing documents immutably
///
/// The default implementations walk every component (main graph first),
/// its ports, then its nodes in preorder and each node's fields. Override
/// specific visit_* methods to act on the parts you care about.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_component(&mut self, component: &ComponentDefinition) {
        walk_component(self, component);
    }

    fn visit_port(&mut self, _component: &ComponentDefinition, _port: &PortSpec) {
        // Leaf, no children to walk
    }

    fn visit_node(&mut self, component: &ComponentDefinition, node: &NodeInstance) {
        walk_node(self, component, node);
    }

    fn visit_field(&mut self, _node: &NodeInstance, _field: &FieldBinding) {
        // Leaf, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for component in doc.components() {
        visitor.visit_component(component);
    }
}

pub fn walk_component<V: Visitor>(visitor: &mut V, component: &ComponentDefinition) {
    for port in &component.ports {
        visitor.visit_port(component, port);
    }
    for node in component.graph.preorder() {
        visitor.visit_node(component, node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, _component: &ComponentDefinition, node: &NodeInstance) {
    for field in &node.fields {
        visitor.visit_field(node, field);
    }
}
