use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::LintRule;
use arbor_model::{ComponentDefinition, NodeCategory, NodeInstance};

/// A subtree node must bind every required input that has no default
pub struct RequiredPortRule;

impl LintRule for RequiredPortRule {
    fn name(&self) -> &'static str {
        "required-port"
    }

    fn description(&self) -> &'static str {
        "Require bindings for required component inputs without a default"
    }

    fn check_node(
        &self,
        context: &LintContext<'_>,
        component: &ComponentDefinition,
        node: &NodeInstance,
    ) -> Vec<Diagnostic> {
        if node.category != NodeCategory::Subtree {
            return Vec::new();
        }
        let Some(callee) = node.component_ref.as_deref().and_then(|id| context.resolve(id)) else {
            return Vec::new();
        };

        callee
            .ports
            .iter()
            .filter(|port| port.needs_binding() && node.field(&port.name).is_none())
            .map(|port| {
                Diagnostic::error(
                    self.name(),
                    format!(
                        "Port '{}' of '{}' is required but not bound",
                        port.name, callee.id
                    ),
                    component.id.clone(),
                )
                .at_node(node.id.clone())
                .with_suggestion(format!("Add a '{}' attribute to the SubTree node", port.name))
            })
            .collect()
    }
}
