use crate::diagnostic::Diagnostic;
use crate::linter::LintContext;
use crate::rules::LintRule;
use arbor_model::{ComponentDefinition, NodeCategory, NodeInstance};

/// A subtree node field must name a declared port, once the component
/// declares any ports at all
pub struct UnknownPortRule;

impl LintRule for UnknownPortRule {
    fn name(&self) -> &'static str {
        "unknown-port"
    }

    fn description(&self) -> &'static str {
        "Flag bindings to ports the component does not declare"
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
        if callee.ports.is_empty() {
            return Vec::new();
        }

        node.fields
            .iter()
            .filter(|field| callee.port(&field.name).is_none())
            .map(|field| {
                let known: Vec<&str> = callee.ports.iter().map(|p| p.name.as_str()).collect();
                Diagnostic::warning(
                    self.name(),
                    format!("'{}' declares no port named '{}'", callee.id, field.name),
                    component.id.clone(),
                )
                .at_node(node.id.clone())
                .with_suggestion(format!("Declared ports: {}", known.join(", ")))
            })
            .collect()
    }
}
