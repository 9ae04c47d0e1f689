//! Diagnostic rule engine
//!
//! Walks each unit's tree once and hands every node to the rules registered
//! for its kind. Units are independent, so they are analyzed in parallel and
//! the results concatenated in unit order.

pub mod rules;

use rayon::prelude::*;

use crate::models::config::{AnalyzerConfig, NamingConfig, SharpfixConfig};
use crate::models::diagnostic::{Diagnostic, DiagnosticDescriptor};
use crate::models::program::{ProgramSnapshot, SourceUnit};
use crate::models::syntax::{NodeId, SyntaxKind, SyntaxTree};

pub use rules::{ShortForeachRule, ShortLocalRule, TypeSuffixRule, SHORT_IDENTIFIER, TYPE_SUFFIX};

/// Node category a rule subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    LocalDeclaration,
    ForEach,
    TypeDeclaration,
}

impl RuleTarget {
    /// Every kind is listed so that new kinds must be routed explicitly
    pub fn of(kind: SyntaxKind) -> Option<Self> {
        match kind {
            SyntaxKind::LocalDeclarationStatement => Some(Self::LocalDeclaration),
            SyntaxKind::ForEachStatement => Some(Self::ForEach),
            SyntaxKind::ClassDeclaration | SyntaxKind::RecordDeclaration => {
                Some(Self::TypeDeclaration)
            }
            SyntaxKind::CompilationUnit
            | SyntaxKind::NamespaceDeclaration
            | SyntaxKind::FileScopedNamespaceDeclaration
            | SyntaxKind::UsingDirective
            | SyntaxKind::StructDeclaration
            | SyntaxKind::InterfaceDeclaration
            | SyntaxKind::EnumDeclaration
            | SyntaxKind::DeclarationList
            | SyntaxKind::BaseList
            | SyntaxKind::AttributeList
            | SyntaxKind::Attribute
            | SyntaxKind::PropertyDeclaration
            | SyntaxKind::FieldDeclaration
            | SyntaxKind::MethodDeclaration
            | SyntaxKind::ConstructorDeclaration
            | SyntaxKind::LocalFunctionStatement
            | SyntaxKind::LambdaExpression
            | SyntaxKind::ParameterList
            | SyntaxKind::Parameter
            | SyntaxKind::Block
            | SyntaxKind::VariableDeclaration
            | SyntaxKind::VariableDeclarator
            | SyntaxKind::MemberAccessExpression
            | SyntaxKind::QualifiedName
            | SyntaxKind::AliasQualifiedName
            | SyntaxKind::GenericName
            | SyntaxKind::PredefinedType
            | SyntaxKind::NullableType
            | SyntaxKind::ImplicitType
            | SyntaxKind::Identifier
            | SyntaxKind::Comment
            | SyntaxKind::Error
            | SyntaxKind::Other => None,
        }
    }
}

/// Read-only inputs available to a rule
pub struct AnalysisContext<'a> {
    pub program: &'a ProgramSnapshot,
    pub unit: &'a SourceUnit,
    pub tree: &'a SyntaxTree,
    pub naming: &'a NamingConfig,
}

impl AnalysisContext<'_> {
    /// Diagnostic located at a node
    pub fn report(&self, descriptor: &DiagnosticDescriptor, node: NodeId, args: &[&str]) -> Diagnostic {
        let syntax = self.tree.node(node);
        descriptor.create(
            self.unit.id,
            self.unit.path.clone(),
            syntax.range,
            syntax.span,
            args,
        )
    }
}

pub trait Rule: Send + Sync {
    /// Stable name used to toggle the rule; several rules may share a diagnostic id
    fn name(&self) -> &'static str;

    fn descriptor(&self) -> &'static DiagnosticDescriptor;

    fn target(&self) -> RuleTarget;

    /// Pure check of one node of the rule's target kind
    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Diagnostic>;
}

/// All built-in rules
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ShortLocalRule),
        Box::new(ShortForeachRule),
        Box::new(TypeSuffixRule),
    ]
}

pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
    analyzer: AnalyzerConfig,
    naming: NamingConfig,
}

impl RuleEngine {
    pub fn new(config: &SharpfixConfig) -> Self {
        Self::with_rules(builtin_rules(), config.analyzer.clone(), config.naming.clone())
    }

    /// Engine over an explicit rule set; disabled rules are dropped here
    pub fn with_rules(
        rules: Vec<Box<dyn Rule>>,
        analyzer: AnalyzerConfig,
        naming: NamingConfig,
    ) -> Self {
        let rules: Vec<_> = rules
            .into_iter()
            .filter(|r| r.descriptor().enabled_by_default && analyzer.is_rule_enabled(r.name()))
            .collect();
        tracing::debug!(
            "Rule engine with {} rules: {:?}",
            rules.len(),
            rules.iter().map(|r| r.name()).collect::<Vec<_>>()
        );
        Self {
            rules,
            analyzer,
            naming,
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Analyze every parsed unit; output order is unit order, then span, then id
    pub fn analyze(&self, program: &ProgramSnapshot) -> Vec<Diagnostic> {
        let per_unit: Vec<Vec<Diagnostic>> = program
            .units()
            .par_iter()
            .map(|unit| self.analyze_unit(program, unit))
            .collect();
        per_unit.into_iter().flatten().collect()
    }

    pub fn analyze_unit(&self, program: &ProgramSnapshot, unit: &SourceUnit) -> Vec<Diagnostic> {
        let Some(tree) = unit.tree() else {
            return Vec::new();
        };
        if !self.analyzer.analyze_generated && is_generated(unit) {
            tracing::trace!("Skipping generated unit {}", unit.path.display());
            return Vec::new();
        }

        let ctx = AnalysisContext {
            program,
            unit,
            tree,
            naming: &self.naming,
        };

        let mut diagnostics = Vec::new();
        for node in tree.descendants(tree.root()) {
            let Some(target) = RuleTarget::of(tree.kind(node)) else {
                continue;
            };
            for rule in self.rules.iter().filter(|r| r.target() == target) {
                diagnostics.extend(rule.check(node, &ctx));
            }
        }

        diagnostics.sort_by(|a, b| {
            (a.span.start_line, a.span.start_col, &a.id).cmp(&(
                b.span.start_line,
                b.span.start_col,
                &b.id,
            ))
        });
        diagnostics
    }
}

/// Generated sources are excluded from analysis by default
pub fn is_generated(unit: &SourceUnit) -> bool {
    let name = unit.file_name().to_lowercase();
    if [".g.cs", ".generated.cs", ".designer.cs"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        return true;
    }
    unit.text
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with("// <auto-generated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::program::SourceText;
    use crate::services::parse::ParseService;

    fn program(sources: &[(&str, &str)]) -> ProgramSnapshot {
        ParseService::default().parse_program(
            sources
                .iter()
                .map(|(path, text)| SourceText::new(*path, *text))
                .collect(),
        )
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(&SharpfixConfig::default())
    }

    #[test]
    fn test_every_kind_routes() {
        assert_eq!(
            RuleTarget::of(SyntaxKind::ForEachStatement),
            Some(RuleTarget::ForEach)
        );
        assert_eq!(RuleTarget::of(SyntaxKind::Block), None);
        assert_eq!(
            RuleTarget::of(SyntaxKind::RecordDeclaration),
            Some(RuleTarget::TypeDeclaration)
        );
    }

    #[test]
    fn test_empty_source_has_no_diagnostics() {
        let program = program(&[("Empty.cs", "")]);
        assert!(engine().analyze(&program).is_empty());
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let source = "class C { void M(int[] xs) { var a = 1; foreach (var b in xs) {} } }";
        let program = program(&[("C.cs", source)]);

        let all = engine().analyze(&program);
        assert_eq!(all.len(), 2);

        let analyzer = AnalyzerConfig {
            disabled_rules: vec!["short-foreach".to_string()],
            ..Default::default()
        };
        let engine = RuleEngine::with_rules(builtin_rules(), analyzer, NamingConfig::default());
        assert_eq!(engine.rule_names(), vec!["short-local", "type-suffix"]);
        let local_only = engine.analyze(&program);
        assert_eq!(local_only.len(), 1);
        assert_eq!(local_only[0].message, "Identifier 'a' is too short");
    }

    #[test]
    fn test_generated_units_are_skipped() {
        let source = "class C { void M() { var a = 1; } }";
        let headed = format!("// <auto-generated/>\n{source}");
        let program = program(&[
            ("Model.g.cs", source),
            ("Other.cs", headed.as_str()),
            ("Plain.cs", source),
        ]);
        let diagnostics = engine().analyze(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].file_path.to_str(), Some("Plain.cs"));

        let analyzer = AnalyzerConfig {
            analyze_generated: true,
            ..Default::default()
        };
        let engine = RuleEngine::with_rules(builtin_rules(), analyzer, NamingConfig::default());
        assert_eq!(engine.analyze(&program).len(), 3);
    }

    #[test]
    fn test_output_is_ordered_by_unit_then_position() {
        let program = program(&[
            ("B.cs", "class B { void M() { var z = 1; var y = 2; } }"),
            ("A.cs", "class A { void M() { var q = 1; } }"),
        ]);
        let names: Vec<String> = engine()
            .analyze(&program)
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(
            names,
            vec![
                "Identifier 'z' is too short",
                "Identifier 'y' is too short",
                "Identifier 'q' is too short",
            ]
        );
    }

    #[test]
    fn test_unparsed_unit_contributes_nothing() {
        let program = ParseService::new(8).parse_program(vec![
            SourceText::new("Big.cs", "class C { void M() { var a = 1; } }"),
        ]);
        assert!(engine().analyze(&program).is_empty());
    }
}
