use crate::catalog::{declaration_element, inferred_category};
use crate::markup::{escape_attribute, escape_text};
use crate::parser::{
    FORMAT_ATTRIBUTE, MAIN_TREE_ATTRIBUTE, MODEL_ELEMENT, ROOT_ELEMENT, SUPPORTED_FORMAT,
    TREE_ELEMENT,
};
use arbor_model::{
    BindingKind, ComponentDefinition, Document, FieldBinding, Graph, NodeCategory, NodeInstance,
    NodeModel, PortDirection, PortSpec, RESERVED_ID_ATTRIBUTE, RESERVED_LABEL_ATTRIBUTE, SUBTREE_TAG,
};
use indexmap::IndexMap;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serializer converts documents back to wire text.
///
/// Output is deterministic: components in document order, each preceded by
/// its description comment, nodes nested depth-first, then the
/// `TreeNodesModel` section: tree ports, the document's own node models,
/// then category declarations for undeclared tags.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_indent(2)
    }

    /// Indent with `width` spaces per level
    pub fn with_indent(width: usize) -> Self {
        Self {
            indent_level: 0,
            indent_string: " ".repeat(width),
        }
    }

    /// Serialize a document, main graph first
    pub fn serialize(&mut self, doc: &Document) -> String {
        self.write_root(Some(doc.main_id()), doc.components(), &doc.node_models)
    }

    /// Serialize components without a main tree, as the library file does
    pub fn serialize_components<'a>(
        &mut self,
        components: impl IntoIterator<Item = &'a ComponentDefinition>,
    ) -> String {
        self.write_root(None, components, &[])
    }

    fn write_root<'a>(
        &mut self,
        main_id: Option<&str>,
        components: impl IntoIterator<Item = &'a ComponentDefinition>,
        models: &[NodeModel],
    ) -> String {
        let components: Vec<&ComponentDefinition> = components.into_iter().collect();
        // Ports of a tree written here come from the tree itself
        let models: Vec<(&'static str, &NodeModel)> = models
            .iter()
            .filter(|m| m.category != NodeCategory::Subtree || !components.iter().any(|c| c.id == m.type_tag))
            .filter_map(|m| Some((model_element(m.category)?, m)))
            .collect();
        let mut output = String::new();
        output.push_str(XML_DECLARATION);
        output.push('\n');

        output.push_str(&format!(
            "<{} {}=\"{}\"",
            ROOT_ELEMENT, FORMAT_ATTRIBUTE, SUPPORTED_FORMAT
        ));
        if let Some(main_id) = main_id {
            write_attribute(&mut output, MAIN_TREE_ATTRIBUTE, main_id);
        }

        let declarations = category_declarations(&components, &models);
        let has_ports = components.iter().any(|c| !c.ports.is_empty());
        if components.is_empty() && models.is_empty() && declarations.is_empty() {
            output.push_str("/>\n");
            return output;
        }
        output.push_str(">\n");

        self.indent_level = 1;
        for component in &components {
            self.serialize_component(component, &mut output);
        }

        if has_ports || !models.is_empty() || !declarations.is_empty() {
            self.serialize_model(&components, &models, &declarations, &mut output);
        }

        self.indent_level = 0;
        output.push_str(&format!("</{}>\n", ROOT_ELEMENT));
        output
    }

    fn serialize_component(&mut self, component: &ComponentDefinition, output: &mut String) {
        if let Some(description) = component.description.as_deref().filter(|d| !d.trim().is_empty()) {
            self.write_indent(output);
            output.push_str(&format!("<!-- {} -->\n", comment_safe(description)));
        }

        self.write_indent(output);
        output.push_str(&format!("<{}", TREE_ELEMENT));
        write_attribute(output, RESERVED_ID_ATTRIBUTE, &component.id);

        let graph = &component.graph;
        let Some(root) = graph.root() else {
            output.push_str("/>\n");
            return;
        };
        self.write_node_attributes(root, output);

        let children: Vec<&NodeInstance> = graph.children(&root.id).collect();
        if children.is_empty() {
            output.push_str("/>\n");
            return;
        }
        output.push_str(">\n");

        self.indent_level += 1;
        for child in children {
            self.serialize_node(graph, child, output);
        }
        self.indent_level -= 1;

        self.write_indent(output);
        output.push_str(&format!("</{}>\n", TREE_ELEMENT));
    }

    fn serialize_node(&mut self, graph: &Graph, node: &NodeInstance, output: &mut String) {
        let tag = element_name(node);

        self.write_indent(output);
        output.push('<');
        output.push_str(tag);
        self.write_node_attributes(node, output);

        let children: Vec<&NodeInstance> = graph.children(&node.id).collect();
        if children.is_empty() {
            output.push_str("/>\n");
            return;
        }
        output.push_str(">\n");

        self.indent_level += 1;
        for child in children {
            self.serialize_node(graph, child, output);
        }
        self.indent_level -= 1;

        self.write_indent(output);
        output.push_str(&format!("</{}>\n", tag));
    }

    /// Label first, then the component reference, then fields in order
    fn write_node_attributes(&self, node: &NodeInstance, output: &mut String) {
        if let Some(label) = &node.label {
            write_attribute(output, RESERVED_LABEL_ATTRIBUTE, label);
        }
        if node.category == NodeCategory::Subtree {
            if let Some(component_ref) = &node.component_ref {
                write_attribute(output, RESERVED_ID_ATTRIBUTE, component_ref);
            }
        }
        for field in &node.fields {
            write_attribute(output, &field.name, &encode_field(field));
        }
    }

    fn serialize_model(
        &mut self,
        components: &[&ComponentDefinition],
        models: &[(&str, &NodeModel)],
        declarations: &IndexMap<String, NodeCategory>,
        output: &mut String,
    ) {
        self.write_indent(output);
        output.push_str(&format!("<{}>\n", MODEL_ELEMENT));
        self.indent_level += 1;

        for component in components.iter().filter(|c| !c.ports.is_empty()) {
            self.serialize_declaration(SUBTREE_TAG, &component.id, &component.ports, output);
        }

        for (element, model) in models {
            self.serialize_declaration(element, &model.type_tag, &model.ports, output);
        }

        for (tag, category) in declarations {
            let Some(element) = declaration_element(*category) else {
                continue;
            };
            self.serialize_declaration(element, tag, &[], output);
        }

        self.indent_level -= 1;
        self.write_indent(output);
        output.push_str(&format!("</{}>\n", MODEL_ELEMENT));
    }

    fn serialize_declaration(&mut self, element: &str, id: &str, ports: &[PortSpec], output: &mut String) {
        self.write_indent(output);
        output.push_str(&format!("<{}", element));
        write_attribute(output, RESERVED_ID_ATTRIBUTE, id);
        if ports.is_empty() {
            output.push_str("/>\n");
            return;
        }
        output.push_str(">\n");

        self.indent_level += 1;
        for port in ports {
            self.serialize_port(port, output);
        }
        self.indent_level -= 1;

        self.write_indent(output);
        output.push_str(&format!("</{}>\n", element));
    }

    fn serialize_port(&self, port: &PortSpec, output: &mut String) {
        let element = match port.direction {
            PortDirection::Input => "input_port",
            PortDirection::Output => "output_port",
            PortDirection::InOut => "inout_port",
        };

        self.write_indent(output);
        output.push('<');
        output.push_str(element);
        write_attribute(output, "name", &port.name);
        write_attribute(output, "type", port.value_kind.as_str());
        if let Some(default) = &port.default_value {
            write_attribute(output, "default", default);
        }
        write_attribute(output, "required", if port.required { "true" } else { "false" });

        match &port.description {
            Some(description) if !description.trim().is_empty() => {
                output.push('>');
                output.push_str(&escape_text(description.trim()));
                output.push_str(&format!("</{}>\n", element));
            }
            _ => output.push_str("/>\n"),
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

fn write_attribute(output: &mut String, name: &str, value: &str) {
    output.push(' ');
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(&escape_attribute(value));
    output.push('"');
}

fn element_name(node: &NodeInstance) -> &str {
    if node.category == NodeCategory::Subtree {
        SUBTREE_TAG
    } else {
        &node.type_tag
    }
}

fn model_element(category: NodeCategory) -> Option<&'static str> {
    match category {
        NodeCategory::Subtree => Some(SUBTREE_TAG),
        category => declaration_element(category),
    }
}

/// Reference fields are wrapped in braces; literals are written as is
fn encode_field(field: &FieldBinding) -> String {
    match field.binding_kind {
        BindingKind::Reference => format!("{{{}}}", field.raw_value),
        BindingKind::Literal => field.raw_value.clone(),
    }
}

fn comment_safe(text: &str) -> String {
    let mut text = text.trim().to_string();
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    text
}

/// Tags whose category differs from what a reader would infer without a
/// declaration, in first-use order. Tags with a node model are already declared.
fn category_declarations(
    components: &[&ComponentDefinition],
    models: &[(&str, &NodeModel)],
) -> IndexMap<String, NodeCategory> {
    let modeled = |tag: &str| {
        models
            .iter()
            .any(|(_, m)| m.category != NodeCategory::Subtree && m.type_tag == tag)
    };

    let mut declarations = IndexMap::new();
    for component in components {
        for node in component.graph.preorder() {
            if matches!(node.category, NodeCategory::Root | NodeCategory::Subtree) {
                continue;
            }
            if node.category != inferred_category(&node.type_tag) && !modeled(&node.type_tag) {
                declarations
                    .entry(node.type_tag.clone())
                    .or_insert(node.category);
            }
        }
    }
    declarations
}

/// Convenience function to serialize a document
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Convenience function to serialize a component map
pub fn serialize_components<'a>(
    components: impl IntoIterator<Item = &'a ComponentDefinition>,
) -> String {
    Serializer::new().serialize_components(components)
}
