use crate::diagnostic::Diagnostic;
use crate::rules::RuleRegistry;
use arbor_common::{walk_node, Visitor};
use arbor_model::{ComponentDefinition, ComponentMap, Document, NodeInstance};

/// Options for configuring the linter
#[derive(Debug, Default)]
pub struct LintOptions<'a> {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,

    /// Library components, consulted when a document does not embed a
    /// component it instantiates
    pub library: Option<&'a ComponentMap>,
}

/// What a rule can see besides the node under check
pub struct LintContext<'a> {
    pub document: &'a Document,
    pub library: Option<&'a ComponentMap>,
}

impl<'a> LintContext<'a> {
    /// Resolve a component id, document first, then library
    pub fn resolve(&self, id: &str) -> Option<&'a ComponentDefinition> {
        self.document
            .component(id)
            .or_else(|| self.library.and_then(|library| library.get(id)))
    }
}

/// Lint a document and return diagnostics
pub fn lint_document(document: &Document, options: LintOptions<'_>) -> Vec<Diagnostic> {
    let registry = options.registry.unwrap_or_default();
    let mut linter = Linter {
        context: LintContext {
            document,
            library: options.library,
        },
        registry: &registry,
        diagnostics: Vec::new(),
    };

    linter.visit_document(document);
    linter.diagnostics
}

struct Linter<'a> {
    context: LintContext<'a>,
    registry: &'a RuleRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Visitor for Linter<'a> {
    fn visit_node(&mut self, component: &ComponentDefinition, node: &NodeInstance) {
        for rule in self.registry.rules() {
            self.diagnostics
                .extend(rule.check_node(&self.context, component, node));
        }
        walk_node(self, component, node);
    }
}
