//! Built-in node library: categories of the standard tags, and port type names.

use arbor_model::{NodeCategory, ValueKind, ROOT_TAG, SUBTREE_TAG};

const CONTROL_TAGS: &[&str] = &[
    "Sequence",
    "SequenceWithMemory",
    "ReactiveSequence",
    "Fallback",
    "ReactiveFallback",
    "Parallel",
    "ParallelAll",
    "IfThenElse",
    "WhileDoElse",
    "Switch2",
    "Switch3",
    "Switch4",
    "Switch5",
    "Switch6",
    "ManualSelector",
];

const DECORATOR_TAGS: &[&str] = &[
    "Inverter",
    "ForceSuccess",
    "ForceFailure",
    "Repeat",
    "RetryUntilSuccessful",
    "KeepRunningUntilFailure",
    "Timeout",
    "Delay",
    "RunOnce",
    "Precondition",
    "LoopInt",
    "LoopDouble",
    "LoopString",
    "LoopBool",
    "SkipUnlessUpdated",
    "WaitValueUpdate",
];

const ACTION_TAGS: &[&str] = &[
    "AlwaysSuccess",
    "AlwaysFailure",
    "SetBlackboard",
    "Sleep",
    "Script",
    "UnsetBlackboard",
];

const CONDITION_TAGS: &[&str] = &["ScriptCondition", "WasEntryUpdated"];

/// Category of a tag in the standard library, if it is one
pub fn builtin_category(tag: &str) -> Option<NodeCategory> {
    if tag == ROOT_TAG {
        Some(NodeCategory::Root)
    } else if tag == SUBTREE_TAG {
        Some(NodeCategory::Subtree)
    } else if CONTROL_TAGS.contains(&tag) {
        Some(NodeCategory::Control)
    } else if DECORATOR_TAGS.contains(&tag) {
        Some(NodeCategory::Decorator)
    } else if ACTION_TAGS.contains(&tag) {
        Some(NodeCategory::Action)
    } else if CONDITION_TAGS.contains(&tag) {
        Some(NodeCategory::Condition)
    } else {
        None
    }
}

/// Category assumed for a tag nobody declared
pub fn inferred_category(tag: &str) -> NodeCategory {
    builtin_category(tag).unwrap_or(NodeCategory::Action)
}

/// Element name of a `TreeNodesModel` declaration for a category.
/// Root and subtree are never declared this way.
pub fn declaration_element(category: NodeCategory) -> Option<&'static str> {
    match category {
        NodeCategory::Action => Some("Action"),
        NodeCategory::Condition => Some("Condition"),
        NodeCategory::Control => Some("Control"),
        NodeCategory::Decorator => Some("Decorator"),
        NodeCategory::Root | NodeCategory::Subtree => None,
    }
}

/// Inverse of `declaration_element`
pub fn declared_category(element: &str) -> Option<NodeCategory> {
    match element {
        "Action" => Some(NodeCategory::Action),
        "Condition" => Some(NodeCategory::Condition),
        "Control" => Some(NodeCategory::Control),
        "Decorator" => Some(NodeCategory::Decorator),
        _ => None,
    }
}

/// Map a port `type` attribute onto a value kind. Unknown types are strings.
pub fn port_value_kind(type_name: &str) -> ValueKind {
    match type_name.trim() {
        "number" | "double" | "float" | "int" | "unsigned" | "unsigned int" | "long"
        | "int32_t" | "int64_t" | "uint32_t" | "uint64_t" | "size_t" => ValueKind::Number,
        "boolean" | "bool" => ValueKind::Boolean,
        _ => ValueKind::String,
    }
}
