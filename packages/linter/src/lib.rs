mod diagnostic;
mod linter;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use linter::{lint_document, LintContext, LintOptions};
pub use rules::{LintRule, RequiredPortRule, RuleRegistry, UnknownComponentRule, UnknownPortRule};
