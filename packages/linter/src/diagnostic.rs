use arbor_model::{ComponentId, NodeId};
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// A diagnostic message from the linter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// The severity level
    pub level: DiagnosticLevel,

    /// The rule that generated this diagnostic
    pub rule: String,

    /// Human-readable message
    pub message: String,

    /// Component whose graph holds the offending node
    pub component: ComponentId,

    pub node: Option<NodeId>,

    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

impl Diagnostic {
    fn new(
        level: DiagnosticLevel,
        rule: impl Into<String>,
        message: impl Into<String>,
        component: impl Into<ComponentId>,
    ) -> Self {
        Self {
            level,
            rule: rule.into(),
            message: message.into(),
            component: component.into(),
            node: None,
            suggestion: None,
        }
    }

    pub fn error(rule: impl Into<String>, message: impl Into<String>, component: impl Into<ComponentId>) -> Self {
        Self::new(DiagnosticLevel::Error, rule, message, component)
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>, component: impl Into<ComponentId>) -> Self {
        Self::new(DiagnosticLevel::Warning, rule, message, component)
    }

    pub fn at_node(mut self, node: impl Into<NodeId>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}
