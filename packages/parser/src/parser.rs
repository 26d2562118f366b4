//! Decoder from wire text to the document model.
//!
//! ```text
//! text ──tokenize──> tokens ──parse_markup──> Element tree ──Decoder──> components
//! ```
//!
//! The decoder makes two passes over the children of `<root>`: the first
//! collects `TreeNodesModel` declarations (ports and node categories), the
//! second decodes every `BehaviorTree` with those declarations in hand.

use crate::catalog::{declared_category, inferred_category, port_value_kind};
use crate::error::{CodecError, ParseError, ParseResult};
use crate::markup::{parse_markup, Element, Node};
use arbor_model::{
    derive_variables, ComponentDefinition, ComponentId, ComponentMap, Document, Edge, FieldBinding,
    Graph, IDGenerator, NodeCategory, NodeId, NodeInstance, NodeModel, PortDirection, PortSpec,
    StructuralError, RESERVED_ID_ATTRIBUTE, RESERVED_LABEL_ATTRIBUTE, SUBTREE_TAG,
};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const ROOT_ELEMENT: &str = "root";
pub const FORMAT_ATTRIBUTE: &str = "BTCPP_format";
pub const SUPPORTED_FORMAT: &str = "4";
pub const MAIN_TREE_ATTRIBUTE: &str = "main_tree_to_execute";
pub const TREE_ELEMENT: &str = "BehaviorTree";
pub const MODEL_ELEMENT: &str = "TreeNodesModel";

/// Parse the wire text of one document
pub fn parse(source: &str) -> Result<Document, CodecError> {
    let decoded = Decoder::new(source)?.decode()?;

    let mut components = decoded.components;
    let main_id = match decoded.main_id {
        Some(id) => id,
        None => match components.keys().next() {
            Some(first) => first.clone(),
            None => return Err(CodecError::structural("(none)", StructuralError::MissingRoot)),
        },
    };

    let Some(main_graph) = components.shift_remove(&main_id) else {
        return Err(CodecError::structural(main_id, StructuralError::MissingRoot));
    };

    let mut document = Document::new(main_graph);
    document.embedded_components = components;
    document.node_models = decoded.node_models;
    Ok(document)
}

/// Parse wire text into a bare component map. Used for the library file,
/// which has no main tree and may hold no trees at all.
pub fn parse_components(source: &str) -> Result<ComponentMap, CodecError> {
    Ok(Decoder::new(source)?.decode()?.components)
}

struct Decoded {
    main_id: Option<ComponentId>,
    components: ComponentMap,
    node_models: Vec<NodeModel>,
}

/// Declarations gathered from `TreeNodesModel`
#[derive(Default)]
struct Declarations {
    categories: HashMap<String, NodeCategory>,
    models: Vec<NodeModel>,
}

impl Declarations {
    /// A later declaration of the same type replaces the earlier one in place
    fn declare(&mut self, model: NodeModel) {
        let is_subtree = model.category == NodeCategory::Subtree;
        if !is_subtree {
            self.categories.insert(model.type_tag.clone(), model.category);
        }

        let existing = self
            .models
            .iter_mut()
            .find(|m| m.type_tag == model.type_tag && (m.category == NodeCategory::Subtree) == is_subtree);
        match existing {
            Some(slot) => *slot = model,
            None => self.models.push(model),
        }
    }
}

struct Decoder {
    root: Element,
}

impl Decoder {
    fn new(source: &str) -> ParseResult<Self> {
        let root = parse_markup(source)?;
        if root.name != ROOT_ELEMENT {
            return Err(ParseError::unexpected_token(
                root.pos,
                format!("<{}>", ROOT_ELEMENT),
                format!("<{}>", root.name),
            ));
        }

        match root.attribute(FORMAT_ATTRIBUTE) {
            Some(format) if format.value == SUPPORTED_FORMAT => {}
            Some(format) => {
                return Err(ParseError::UnsupportedFormat {
                    pos: format.pos,
                    found: format.value.clone(),
                });
            }
            None => {
                return Err(ParseError::invalid_syntax(
                    root.pos,
                    format!("Missing {} attribute", FORMAT_ATTRIBUTE),
                ));
            }
        }

        Ok(Self { root })
    }

    fn decode(&self) -> Result<Decoded, CodecError> {
        let declarations = self.collect_declarations()?;
        let mut components = ComponentMap::new();
        let mut description: Option<String> = None;

        for child in &self.root.children {
            match child {
                Node::Comment(body) => {
                    let body = body.trim();
                    description = (!body.is_empty()).then(|| body.to_string());
                }
                Node::Text(_) => {}
                Node::Element(element) if element.name == TREE_ELEMENT => {
                    let component = decode_tree(element, &declarations, description.take())?;
                    if components.contains_key(&component.id) {
                        return Err(ParseError::DuplicateTree {
                            pos: element.pos,
                            id: component.id,
                        }
                        .into());
                    }
                    components.insert(component.id.clone(), component);
                }
                Node::Element(element) => {
                    if element.name != MODEL_ELEMENT {
                        warn!(element = %element.name, "Skipping unknown top-level element");
                    }
                    description = None;
                }
            }
        }

        let mut node_models = Vec::new();
        for model in declarations.models {
            if model.category == NodeCategory::Subtree {
                if let Some(component) = components.get_mut(&model.type_tag) {
                    component.ports = model.ports;
                    continue;
                }
                debug!(component = %model.type_tag, "Keeping ports declared for an absent tree");
            }
            node_models.push(model);
        }

        for component in components.values_mut() {
            component
                .validate()
                .map_err(|e| CodecError::structural(component.id.clone(), e))?;
            component.local_variables = derive_variables(&component.graph);
        }

        let main_id = match self.root.attribute(MAIN_TREE_ATTRIBUTE) {
            Some(main) if !components.contains_key(&main.value) => {
                return Err(ParseError::invalid_syntax(
                    main.pos,
                    format!("Main tree '{}' is not defined", main.value),
                )
                .into());
            }
            Some(main) => Some(main.value.clone()),
            None => None,
        };

        Ok(Decoded {
            main_id,
            components,
            node_models,
        })
    }

    fn collect_declarations(&self) -> ParseResult<Declarations> {
        let mut declarations = Declarations::default();

        for model in self.root.elements().filter(|e| e.name == MODEL_ELEMENT) {
            for entry in model.elements() {
                let id = required_attribute(entry, RESERVED_ID_ATTRIBUTE)?;
                let category = if entry.name == SUBTREE_TAG {
                    NodeCategory::Subtree
                } else if let Some(category) = declared_category(&entry.name) {
                    category
                } else {
                    warn!(element = %entry.name, "Skipping unknown model declaration");
                    continue;
                };

                let ports = entry
                    .elements()
                    .map(decode_port)
                    .collect::<ParseResult<Vec<_>>>()?;
                declarations.declare(NodeModel::new(id, category).with_ports(ports));
            }
        }

        Ok(declarations)
    }
}

fn required_attribute<'a>(element: &'a Element, name: &str) -> ParseResult<&'a str> {
    element.attribute_value(name).ok_or_else(|| {
        ParseError::invalid_syntax(
            element.pos,
            format!("<{}> is missing the '{}' attribute", element.name, name),
        )
    })
}

fn decode_port(element: &Element) -> ParseResult<PortSpec> {
    let direction = match element.name.as_str() {
        "input_port" => PortDirection::Input,
        "output_port" => PortDirection::Output,
        "inout_port" => PortDirection::InOut,
        other => {
            return Err(ParseError::unexpected_token(
                element.pos,
                "input_port, output_port or inout_port",
                format!("<{}>", other),
            ));
        }
    };

    let name = required_attribute(element, "name")?;
    let value_kind = element
        .attribute_value("type")
        .map(port_value_kind)
        .unwrap_or(arbor_model::ValueKind::String);

    let mut port = PortSpec::new(name, direction, value_kind);
    port.default_value = element.attribute_value("default").map(str::to_string);
    port.required = element.attribute_value("required") == Some("true");

    let description = element.text();
    if !description.is_empty() {
        port.description = Some(description);
    }
    Ok(port)
}

fn decode_tree(
    element: &Element,
    declarations: &Declarations,
    description: Option<String>,
) -> ParseResult<ComponentDefinition> {
    let id = required_attribute(element, RESERVED_ID_ATTRIBUTE)?.to_string();
    let mut builder = GraphBuilder {
        ids: IDGenerator::new(&id),
        graph: Graph::new(),
        declarations,
    };

    let root_id = builder.ids.new_id();
    let mut root = NodeInstance::root(root_id.clone());
    for attribute in &element.attributes {
        match attribute.name.as_str() {
            RESERVED_ID_ATTRIBUTE => {}
            RESERVED_LABEL_ATTRIBUTE => root.label = Some(attribute.value.clone()),
            _ => root.fields.push(decode_field(&attribute.name, &attribute.value)),
        }
    }
    builder.graph.nodes.push(root);

    for child in element.elements() {
        builder.decode_node(child, &root_id);
    }

    let mut component = ComponentDefinition::from_graph(id, builder.graph);
    component.description = description;
    Ok(component)
}

/// Flattens nested node elements into nodes and edges, numbering nodes in preorder
struct GraphBuilder<'a> {
    ids: IDGenerator,
    graph: Graph,
    declarations: &'a Declarations,
}

impl<'a> GraphBuilder<'a> {
    fn decode_node(&mut self, element: &Element, parent: &NodeId) {
        let id = self.ids.new_id();
        let category = if element.name == SUBTREE_TAG {
            NodeCategory::Subtree
        } else {
            self.declarations
                .categories
                .get(&element.name)
                .copied()
                .unwrap_or_else(|| inferred_category(&element.name))
        };

        let mut node = NodeInstance::new(id.clone(), element.name.clone(), category);
        for attribute in &element.attributes {
            match attribute.name.as_str() {
                RESERVED_LABEL_ATTRIBUTE => node.label = Some(attribute.value.clone()),
                RESERVED_ID_ATTRIBUTE if category == NodeCategory::Subtree => {
                    node.component_ref = Some(attribute.value.clone());
                }
                _ => node.fields.push(decode_field(&attribute.name, &attribute.value)),
            }
        }

        self.graph.nodes.push(node);
        self.graph.edges.push(Edge::new(parent.clone(), id.clone()));

        for child in element.elements() {
            self.decode_node(child, &id);
        }
    }
}

/// A value wrapped in braces names a variable; anything else is a literal
fn decode_field(name: &str, value: &str) -> FieldBinding {
    match value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        Some(variable) => FieldBinding::reference(name, variable),
        None => FieldBinding::literal(name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::{BindingKind, ValueKind};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root BTCPP_format="4" main_tree_to_execute="Main">
  <!-- Entry point -->
  <BehaviorTree ID="Main">
    <Sequence name="patrol">
      <SetBlackboard output_key="speed" value="1.5"/>
      <SubTree ID="GoTo" target="{goal}"/>
      <IsBatteryLow/>
    </Sequence>
  </BehaviorTree>
  <BehaviorTree ID="GoTo">
    <MoveBase goal="{target}" retries="3"/>
  </BehaviorTree>
  <TreeNodesModel>
    <SubTree ID="GoTo">
      <input_port name="target" type="std::string" required="true">Where to go</input_port>
      <output_port name="reached" type="bool"/>
    </SubTree>
    <Condition ID="IsBatteryLow"/>
  </TreeNodesModel>
</root>
"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.main_id(), "Main");
        assert_eq!(doc.main_graph.description.as_deref(), Some("Entry point"));
        assert_eq!(doc.main_graph.graph.node_count(), 5);
        assert_eq!(doc.main_graph.graph.edge_count(), 4);
        assert!(doc.embedded_components.contains_key("GoTo"));
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_categories_follow_declarations() {
        let doc = parse(SAMPLE).unwrap();
        let graph = &doc.main_graph.graph;
        let categories: Vec<_> = graph.preorder().iter().map(|n| n.category).collect();
        assert_eq!(
            categories,
            vec![
                NodeCategory::Root,
                NodeCategory::Control,
                NodeCategory::Action,
                NodeCategory::Subtree,
                NodeCategory::Condition,
            ]
        );
    }

    #[test]
    fn test_label_fields_and_references() {
        let doc = parse(SAMPLE).unwrap();
        let graph = &doc.main_graph.graph;
        let sequence = graph.preorder()[1];
        assert_eq!(sequence.label.as_deref(), Some("patrol"));
        assert!(sequence.fields.is_empty());

        let call = graph.preorder()[3];
        assert_eq!(call.component_ref.as_deref(), Some("GoTo"));
        let target = call.field("target").unwrap();
        assert_eq!(target.binding_kind, BindingKind::Reference);
        assert_eq!(target.raw_value, "goal");

        let goto = &doc.embedded_components["GoTo"].graph;
        let retries = goto.preorder()[1].field("retries").unwrap();
        assert_eq!(retries.binding_kind, BindingKind::Literal);
        assert_eq!(retries.value_kind, ValueKind::Number);
    }

    #[test]
    fn test_ports_are_merged() {
        let doc = parse(SAMPLE).unwrap();
        let ports = &doc.embedded_components["GoTo"].ports;
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].name, "target");
        assert_eq!(ports[0].value_kind, ValueKind::String);
        assert!(ports[0].required);
        assert_eq!(ports[0].description.as_deref(), Some("Where to go"));
        assert_eq!(ports[1].direction, PortDirection::Output);
        assert_eq!(ports[1].value_kind, ValueKind::Boolean);
        assert!(!ports[1].required);
    }

    #[test]
    fn test_variables_are_derived() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.main_graph.local_variables.len(), 1);
        assert_eq!(doc.main_graph.local_variables[0].name, "speed");
        assert_eq!(doc.main_graph.local_variables[0].value, "1.5");
    }

    #[test]
    fn test_node_ids_are_stable() {
        let a = parse(SAMPLE).unwrap();
        let b = parse(SAMPLE).unwrap();
        assert_eq!(a, b);
        let seed = arbor_model::get_component_seed("Main");
        assert_eq!(a.main_graph.graph.nodes[0].id, format!("{}-1", seed));
    }

    #[test]
    fn test_first_tree_is_main_without_attribute() {
        let doc = parse(
            r#"<root BTCPP_format="4"><BehaviorTree ID="A"/><BehaviorTree ID="B"/></root>"#,
        )
        .unwrap();
        assert_eq!(doc.main_id(), "A");
        assert_eq!(doc.embedded_components.len(), 1);
    }

    #[test]
    fn test_missing_main_tree() {
        let err = parse(r#"<root BTCPP_format="4" main_tree_to_execute="X"><BehaviorTree ID="A"/></root>"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::Parse(ParseError::InvalidSyntax { .. })));
    }

    #[test]
    fn test_format_version() {
        let err = parse(r#"<root BTCPP_format="3"><BehaviorTree ID="A"/></root>"#).unwrap_err();
        assert!(matches!(err, CodecError::Parse(ParseError::UnsupportedFormat { .. })));

        let err = parse(r#"<root><BehaviorTree ID="A"/></root>"#).unwrap_err();
        assert!(matches!(err, CodecError::Parse(ParseError::InvalidSyntax { .. })));
    }

    #[test]
    fn test_duplicate_tree() {
        let err = parse(r#"<root BTCPP_format="4"><BehaviorTree ID="A"/><BehaviorTree ID="A"/></root>"#)
            .unwrap_err();
        assert!(matches!(err, CodecError::Parse(ParseError::DuplicateTree { .. })));
    }

    #[test]
    fn test_no_trees_is_missing_root() {
        let err = parse(r#"<root BTCPP_format="4"/>"#).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Structural { source: StructuralError::MissingRoot, .. }
        ));
        assert!(parse_components(r#"<root BTCPP_format="4"/>"#).unwrap().is_empty());
    }

    #[test]
    fn test_nested_root_is_structural() {
        let err = parse(r#"<root BTCPP_format="4"><BehaviorTree ID="A"><Root/></BehaviorTree></root>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Structural { source: StructuralError::MultipleRoots(_), .. }
        ));
    }

    #[test]
    fn test_two_children_under_tree_is_structural() {
        let err = parse(r#"<root BTCPP_format="4"><BehaviorTree ID="A"><Walk/><Walk/></BehaviorTree></root>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Structural { source: StructuralError::TooManyChildren { .. }, .. }
        ));
    }

    #[test]
    fn test_subtree_without_id_is_structural() {
        let err = parse(r#"<root BTCPP_format="4"><BehaviorTree ID="A"><SubTree/></BehaviorTree></root>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::Structural { source: StructuralError::MissingComponentRef(_), .. }
        ));
    }

    #[test]
    fn test_description_must_precede_tree() {
        let doc = parse(
            r#"<root BTCPP_format="4"><!-- lost --><TreeNodesModel/><BehaviorTree ID="A"/></root>"#,
        )
        .unwrap();
        assert_eq!(doc.main_graph.description, None);
    }

    #[test]
    fn test_model_entries_are_kept() {
        let doc = parse(
            r#"<root BTCPP_format="4" main_tree_to_execute="Main">
  <BehaviorTree ID="Main"><SubTree ID="Remote"/></BehaviorTree>
  <TreeNodesModel>
    <Action ID="MoveBase"><input_port name="goal" type="string"/></Action>
    <Condition ID="IsDocked"/>
    <SubTree ID="Remote"><output_port name="done" type="bool"/></SubTree>
    <Action ID="MoveBase"><input_port name="pose" type="string"/></Action>
  </TreeNodesModel>
</root>"#,
        )
        .unwrap();

        let tags: Vec<_> = doc.node_models.iter().map(|m| m.type_tag.as_str()).collect();
        assert_eq!(tags, vec!["MoveBase", "IsDocked", "Remote"]);
        assert_eq!(doc.node_models[0].category, NodeCategory::Action);
        assert_eq!(doc.node_models[0].ports[0].name, "pose");
        assert_eq!(doc.node_models[1].category, NodeCategory::Condition);
        assert_eq!(doc.node_models[2].category, NodeCategory::Subtree);
        assert_eq!(doc.node_models[2].ports[0].direction, PortDirection::Output);
    }

    #[test]
    fn test_tree_ports_are_not_kept_as_models() {
        let doc = parse(SAMPLE).unwrap();
        let tags: Vec<_> = doc.node_models.iter().map(|m| m.type_tag.as_str()).collect();
        assert_eq!(tags, vec!["IsBatteryLow"]);
    }

    #[test]
    fn test_ports_for_absent_tree_are_dropped() {
        let components = parse_components(
            r#"<root BTCPP_format="4"><TreeNodesModel><SubTree ID="Ghost"><input_port name="x"/></SubTree></TreeNodesModel></root>"#,
        )
        .unwrap();
        assert!(components.is_empty());
    }
}
