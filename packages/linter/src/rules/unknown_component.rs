use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::LintRule;
use arbor_model::{ComponentDefinition, NodeInstance};

pub struct UnknownComponentRule;

impl LintRule for UnknownComponentRule {
    fn name(&self) -> &'static str {
        "unknown-component"
    }

    fn description(&self) -> &'static str {
        "Flag subtree nodes whose component is neither embedded nor in the library"
    }

    fn check_node(
        &self,
        context: &LintContext<'_>,
        component: &ComponentDefinition,
        node: &NodeInstance,
    ) -> Vec<Diagnostic> {
        match node.component_ref.as_deref() {
            Some(id) if context.resolve(id).is_none() => vec![Diagnostic::warning(
                self.name(),
                format!("Component '{}' is not defined", id),
                component.id.clone(),
            )
            .at_node(node.id.clone())],
            _ => Vec::new(),
        }
    }
}
