/// Round-trip tests: parse(serialize(doc)) must preserve component ids,
/// graph shape, field bindings and ports
use crate::*;
use arbor_model::{
    BindingKind, ComponentDefinition, Document, Edge, FieldBinding, Graph, NodeCategory,
    NodeInstance, NodeModel, PortDirection, PortSpec, StructuralError, ValueKind, Variable,
};

/// Preorder outline of a graph that ignores node ids
fn outline(graph: &Graph) -> Vec<String> {
    let order = graph.preorder();
    order
        .iter()
        .map(|node| {
            let parent = graph
                .parent_of(&node.id)
                .and_then(|p| order.iter().position(|n| &n.id == p));
            let fields: Vec<String> = node
                .fields
                .iter()
                .map(|f| format!("{}:{:?}:{}", f.name, f.binding_kind, f.raw_value))
                .collect();
            format!(
                "{:?} {} {:?} {:?} {:?} [{}]",
                parent,
                node.type_tag,
                node.category,
                node.label,
                node.component_ref,
                fields.join(", ")
            )
        })
        .collect()
}

fn assert_equivalent(a: &Document, b: &Document) {
    let ids_a: Vec<_> = a.components().map(|c| c.id.clone()).collect();
    let ids_b: Vec<_> = b.components().map(|c| c.id.clone()).collect();
    assert_eq!(ids_a, ids_b);

    for (ca, cb) in a.components().zip(b.components()) {
        assert_eq!(outline(&ca.graph), outline(&cb.graph), "graph of {}", ca.id);
        assert_eq!(ca.ports, cb.ports, "ports of {}", ca.id);
        assert_eq!(ca.description, cb.description, "description of {}", ca.id);
    }
}

fn build(id: &str, nodes: Vec<NodeInstance>, edges: Vec<(&str, &str)>) -> ComponentDefinition {
    let graph = Graph {
        nodes,
        edges: edges.into_iter().map(|(p, c)| Edge::new(p, c)).collect(),
    };
    ComponentDefinition::from_graph(id, graph)
}

fn sample_document() -> Document {
    let main = build(
        "Main",
        vec![
            NodeInstance::root("r").with_label("Entry"),
            NodeInstance::new("seq", "Sequence", NodeCategory::Control).with_label("steps"),
            NodeInstance::new("say", "SaySomething", NodeCategory::Action)
                .with_field(FieldBinding::literal("message", "hello & <goodbye>"))
                .with_field(FieldBinding::reference("volume", "loudness")),
            NodeInstance::subtree("call", "Patrol")
                .with_field(FieldBinding::reference("route", "route_a")),
            NodeInstance::new("inv", "Inverter", NodeCategory::Decorator),
            NodeInstance::new("low", "IsBatteryLow", NodeCategory::Condition),
        ],
        vec![
            ("r", "seq"),
            ("seq", "say"),
            ("seq", "call"),
            ("seq", "inv"),
            ("inv", "low"),
        ],
    )
    .with_description("Main entry point");

    let patrol = build(
        "Patrol",
        vec![
            NodeInstance::root("p"),
            NodeInstance::new("walk", "Walk", NodeCategory::Action)
                .with_field(FieldBinding::reference("path", "route")),
        ],
        vec![("p", "walk")],
    )
    .with_ports(vec![
        PortSpec::input("route", ValueKind::String)
            .required()
            .with_description("Waypoints to visit"),
        PortSpec::output("visited", ValueKind::Number).with_default("0"),
        PortSpec::new("state", PortDirection::InOut, ValueKind::Boolean),
    ]);

    let mut doc = Document::new(main);
    doc.insert_component(patrol).unwrap();
    doc
}

#[test]
fn test_roundtrip_preserves_structure() {
    let doc = sample_document();
    let text = serialize(&doc);
    let reparsed = parse(&text).unwrap();
    assert_equivalent(&doc, &reparsed);
}

#[test]
fn test_serialize_is_stable() {
    let text = serialize(&sample_document());
    let again = serialize(&parse(&text).unwrap());
    assert_eq!(text, again);
}

#[test]
fn test_custom_categories_are_declared() {
    let text = serialize(&sample_document());
    assert!(text.contains(r#"<Condition ID="IsBatteryLow"/>"#));
    assert!(!text.contains(r#"<Action ID="SaySomething"/>"#));
    assert!(!text.contains(r#"ID="Sequence""#));
}

#[test]
fn test_description_comment_is_escaped() {
    let mut doc = sample_document();
    doc.main_graph.description = Some("Main entry -- runs the patrol".to_string());
    let text = serialize(&doc);
    assert!(text.contains("<!-- Main entry - - runs the patrol -->"));
    let reparsed = parse(&text).unwrap();
    assert_eq!(
        reparsed.main_graph.description.as_deref(),
        Some("Main entry - - runs the patrol")
    );
}

#[test]
fn test_reference_encoding() {
    let text = serialize(&sample_document());
    assert!(text.contains(r#"volume="{loudness}""#));
    assert!(text.contains(r#"<SubTree ID="Patrol" route="{route_a}"/>"#));
}

#[test]
fn test_brace_shaped_literal_reads_back_as_reference() {
    let main = build(
        "Main",
        vec![
            NodeInstance::root("r"),
            NodeInstance::new("a", "Log", NodeCategory::Action)
                .with_field(FieldBinding::literal("text", "{x}")),
        ],
        vec![("r", "a")],
    );
    let doc = Document::new(main);

    let text = serialize(&doc);
    assert!(text.contains(r#"text="{x}""#));

    let reparsed = parse(&text).unwrap();
    let field = &reparsed.main_graph.graph.preorder()[1].fields[0];
    assert_eq!(field.binding_kind, BindingKind::Reference);
    assert_eq!(field.raw_value, "x");
}

#[test]
fn test_variables_without_write_node_are_lost() {
    let mut main = build(
        "Main",
        vec![
            NodeInstance::root("r"),
            NodeInstance::new("seq", "Sequence", NodeCategory::Control),
            NodeInstance::new("w", "SetBlackboard", NodeCategory::Action)
                .with_field(FieldBinding::literal("output_key", "speed"))
                .with_field(FieldBinding::literal("value", "2")),
        ],
        vec![("r", "seq"), ("seq", "w")],
    );
    main.local_variables = vec![Variable::new("speed", "2"), Variable::new("ghost", "1")];
    let doc = Document::new(main);

    let reparsed = parse(&serialize(&doc)).unwrap();
    assert_eq!(reparsed.main_graph.local_variables, vec![Variable::new("speed", "2")]);
}

#[test]
fn test_attribute_escaping_round_trips() {
    let main = build(
        "Main",
        vec![
            NodeInstance::root("r"),
            NodeInstance::new("a", "Log", NodeCategory::Action)
                .with_label("say \"hi\"")
                .with_field(FieldBinding::literal("text", "line one\nline two\t'quoted' & more")),
        ],
        vec![("r", "a")],
    );
    let doc = Document::new(main);
    let text = serialize(&doc);
    assert!(text.contains("&#10;"));

    let reparsed = parse(&text).unwrap();
    assert_equivalent(&doc, &reparsed);
}

#[test]
fn test_empty_library_text() {
    let text = serialize_components(std::iter::empty());
    assert_eq!(
        text,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root BTCPP_format=\"4\"/>\n"
    );
    assert!(parse_components(&text).unwrap().is_empty());
}

#[test]
fn test_library_has_no_main_tree() {
    let doc = sample_document();
    let text = serialize_components(doc.embedded_components.values());
    assert!(!text.contains("main_tree_to_execute"));
    let components = parse_components(&text).unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components["Patrol"].ports.len(), 3);
}

#[test]
fn test_custom_indent() {
    let doc = sample_document();
    let text = Serializer::with_indent(4).serialize(&doc);
    assert!(text.contains("\n    <BehaviorTree ID=\"Main\""));
    assert!(text.contains("\n        <Sequence"));
}

const MODELED: &str = r#"<root BTCPP_format="4" main_tree_to_execute="Main">
  <BehaviorTree ID="Main">
    <MoveBase goal="{target}"/>
  </BehaviorTree>
  <TreeNodesModel>
    <Action ID="MoveBase">
      <input_port name="goal" type="string"/>
    </Action>
    <Condition ID="IsDocked"/>
    <SubTree ID="Dock">
      <input_port name="station" type="number"/>
    </SubTree>
  </TreeNodesModel>
</root>
"#;

#[test]
fn test_node_models_survive_serialization() {
    let doc = parse(MODELED).unwrap();
    let text = serialize(&doc);
    assert!(text.contains(r#"<Action ID="MoveBase">"#));
    assert!(text.contains(r#"<input_port name="goal" type="string" required="false"/>"#));
    assert!(text.contains(r#"<Condition ID="IsDocked"/>"#));
    assert!(text.contains(r#"<SubTree ID="Dock">"#));

    let reparsed = parse(&text).unwrap();
    assert_eq!(reparsed.node_models, doc.node_models);
    assert_eq!(serialize(&reparsed), text);
}

#[test]
fn test_embedded_tree_ports_replace_its_model() {
    let mut doc = parse(MODELED).unwrap();
    let dock = build("Dock", vec![NodeInstance::root("d")], vec![])
        .with_ports(vec![PortSpec::input("bay", ValueKind::String)]);
    doc.replace_component(dock);

    let text = serialize(&doc);
    assert_eq!(text.matches(r#"<SubTree ID="Dock">"#).count(), 1);
    assert!(text.contains(r#"name="bay""#));
    assert!(!text.contains(r#"name="station""#));
}

#[test]
fn test_library_text_ignores_node_models() {
    let mut doc = sample_document();
    doc.node_models.push(NodeModel::new("Unused", NodeCategory::Condition));
    let text = serialize_components(doc.embedded_components.values());
    assert!(!text.contains("Unused"));
}

#[test]
fn test_tag_with_two_categories_is_rejected() {
    let main = build(
        "Main",
        vec![
            NodeInstance::root("r"),
            NodeInstance::new("check", "Check", NodeCategory::Action),
        ],
        vec![("r", "check")],
    );
    let other = build(
        "Other",
        vec![
            NodeInstance::root("o"),
            NodeInstance::new("check", "Check", NodeCategory::Condition),
        ],
        vec![("o", "check")],
    );
    let mut doc = Document::new(main);
    doc.insert_component(other).unwrap();

    assert!(matches!(
        doc.validate(),
        Err((id, StructuralError::ConflictingCategory { .. })) if id == "Other"
    ));

    doc.main_graph.graph.nodes[1].category = NodeCategory::Condition;
    assert!(doc.validate().is_ok());
    let reparsed = parse(&serialize(&doc)).unwrap();
    assert_equivalent(&doc, &reparsed);
}

#[test]
fn test_ordinary_node_cannot_use_subtree_tag() {
    let main = build(
        "Main",
        vec![
            NodeInstance::root("r"),
            NodeInstance::new("x", "SubTree", NodeCategory::Action),
        ],
        vec![("r", "x")],
    );
    let doc = Document::new(main);

    assert!(matches!(
        doc.validate(),
        Err((_, StructuralError::ReservedTypeTag { ref tag, .. })) if tag == "SubTree"
    ));
}
