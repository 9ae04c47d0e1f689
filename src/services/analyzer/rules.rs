//! Built-in rules

use super::{AnalysisContext, Rule, RuleTarget};
use crate::models::diagnostic::{Diagnostic, DiagnosticDescriptor, DiagnosticSeverity};
use crate::models::syntax::{NodeId, SyntaxKind, SyntaxTree};
use crate::services::semantic::foreach_binding;

pub const SHORT_IDENTIFIER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "Demo001",
    title: "Identifier is too short",
    message_format: "Identifier '{0}' is too short",
    category: "Naming",
    severity: DiagnosticSeverity::Warning,
    enabled_by_default: true,
};

pub const TYPE_SUFFIX: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "Lab001",
    title: "Type name does not carry the required suffix",
    message_format: "Type name '{0}' does not end with '{1}'",
    category: "Naming",
    severity: DiagnosticSeverity::Error,
    enabled_by_default: true,
};

/// One-character identifier, or `None` for missing tokens and longer names
fn short_identifier<'t>(tree: &'t SyntaxTree, ident: NodeId) -> Option<&'t str> {
    let token = tree.token(ident)?;
    if token.is_missing {
        return None;
    }
    let name = token.value_text();
    // length in UTF-16 code units, as C# compilers count it
    (name.encode_utf16().count() == 1).then_some(name)
}

/// `var x = ...;` declarations
pub struct ShortLocalRule;

impl Rule for ShortLocalRule {
    fn name(&self) -> &'static str {
        "short-local"
    }

    fn descriptor(&self) -> &'static DiagnosticDescriptor {
        &SHORT_IDENTIFIER
    }

    fn target(&self) -> RuleTarget {
        RuleTarget::LocalDeclaration
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Diagnostic> {
        let tree = ctx.tree;
        let Some(declaration) = tree.first_child_of_kind(node, SyntaxKind::VariableDeclaration) else {
            return Vec::new();
        };

        tree.children_of_kind(declaration, SyntaxKind::VariableDeclarator)
            .filter_map(|declarator| tree.name_token(declarator))
            .filter_map(|ident| {
                short_identifier(tree, ident)
                    .map(|name| ctx.report(&SHORT_IDENTIFIER, ident, &[name]))
            })
            .collect()
    }
}

/// `foreach (var x in ...)` bindings
pub struct ShortForeachRule;

impl Rule for ShortForeachRule {
    fn name(&self) -> &'static str {
        "short-foreach"
    }

    fn descriptor(&self) -> &'static DiagnosticDescriptor {
        &SHORT_IDENTIFIER
    }

    fn target(&self) -> RuleTarget {
        RuleTarget::ForEach
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Diagnostic> {
        foreach_binding(ctx.tree, node)
            .and_then(|ident| {
                short_identifier(ctx.tree, ident)
                    .map(|name| ctx.report(&SHORT_IDENTIFIER, ident, &[name]))
            })
            .into_iter()
            .collect()
    }
}

/// Types deriving from a configured base must end with the configured suffix
pub struct TypeSuffixRule;

impl Rule for TypeSuffixRule {
    fn name(&self) -> &'static str {
        "type-suffix"
    }

    fn descriptor(&self) -> &'static DiagnosticDescriptor {
        &TYPE_SUFFIX
    }

    fn target(&self) -> RuleTarget {
        RuleTarget::TypeDeclaration
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Diagnostic> {
        let tree = ctx.tree;
        let Some(name_token) = tree.name_token(node) else {
            return Vec::new();
        };
        let Some(token) = tree.token(name_token).filter(|t| !t.is_missing) else {
            return Vec::new();
        };

        let Some(base) = tree
            .first_child_of_kind(node, SyntaxKind::BaseList)
            .and_then(|list| tree.children(list).first().copied())
            .and_then(|entry| simple_type_name(tree, entry))
        else {
            return Vec::new();
        };

        let naming = ctx.naming;
        let name = token.value_text();
        if naming.base_types.iter().any(|b| b == base) && !name.ends_with(&naming.required_suffix) {
            return vec![ctx.report(
                &TYPE_SUFFIX,
                name_token,
                &[name, naming.required_suffix.as_str()],
            )];
        }
        Vec::new()
    }
}

/// Rightmost identifier of a base-list entry (`Ns.Base<T>` gives `Base`)
fn simple_type_name(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    match tree.kind(node) {
        SyntaxKind::Identifier => tree
            .token(node)
            .filter(|t| !t.is_missing)
            .map(|t| t.value_text()),
        SyntaxKind::GenericName => tree
            .name_token(node)
            .and_then(|n| simple_type_name(tree, n)),
        SyntaxKind::QualifiedName | SyntaxKind::AliasQualifiedName => tree
            .children(node)
            .last()
            .and_then(|&n| simple_type_name(tree, n)),
        // record primary-constructor bases wrap the type
        _ => tree
            .children(node)
            .first()
            .and_then(|&n| simple_type_name(tree, n)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::RuleEngine;
    use crate::models::config::SharpfixConfig;
    use crate::models::diagnostic::DiagnosticSeverity;
    use crate::models::program::{ProgramSnapshot, SourceText, SourceUnit, UnitId};
    use crate::models::syntax::{ByteRange, SyntaxKind, SyntaxTreeBuilder};
    use crate::services::parse::ParseService;

    fn analyze(source: &str) -> Vec<crate::models::diagnostic::Diagnostic> {
        let program: ProgramSnapshot =
            ParseService::default().parse_program(vec![SourceText::new("Test.cs", source)]);
        RuleEngine::new(&SharpfixConfig::default()).analyze(&program)
    }

    /// `var a = 1;` built by hand, with the declarator name optionally missing
    fn built_local(is_missing: bool) -> ProgramSnapshot {
        let source = "var a = 1;";
        let mut b = SyntaxTreeBuilder::new(source);
        b.start_node(
            SyntaxKind::CompilationUnit,
            "compilation_unit",
            None,
            ByteRange::new(0, source.len()),
        );
        b.start_node(
            SyntaxKind::LocalDeclarationStatement,
            "local_declaration_statement",
            None,
            ByteRange::new(0, 10),
        );
        b.start_node(
            SyntaxKind::VariableDeclaration,
            "variable_declaration",
            None,
            ByteRange::new(0, 9),
        );
        b.token(
            SyntaxKind::ImplicitType,
            "implicit_type",
            Some("type"),
            ByteRange::new(0, 3),
            false,
        );
        b.start_node(
            SyntaxKind::VariableDeclarator,
            "variable_declarator",
            None,
            ByteRange::new(4, 9),
        );
        b.token(
            SyntaxKind::Identifier,
            "identifier",
            Some("name"),
            ByteRange::new(4, 5),
            is_missing,
        );
        b.finish_node();
        b.finish_node();
        b.finish_node();
        b.finish_node();
        let tree = b.finish().unwrap();

        let unit = SourceUnit::new(UnitId(0), "Test.cs".into(), source.to_string(), Ok(tree));
        ProgramSnapshot::new(vec![Arc::new(unit)])
    }

    #[test]
    fn test_missing_identifier_is_never_diagnosed() {
        let engine = RuleEngine::new(&SharpfixConfig::default());
        assert_eq!(engine.analyze(&built_local(false)).len(), 1);
        assert!(engine.analyze(&built_local(true)).is_empty());
    }

    #[test]
    fn test_single_astral_letter_is_not_short() {
        // one scalar value, two UTF-16 code units
        assert!(analyze("class A { void M() { var \u{10400} = 1; } }").is_empty());
        assert_eq!(analyze("class A { void M() { var \u{00e9} = 1; } }").len(), 1);
    }

    #[test]
    fn test_short_local_reports_at_identifier() {
        let source = "\nclass Program\n{\n\tstatic void Main()\n\t{\n\t\tvar x = 1;\n\t}\n}";
        let diagnostics = analyze(source);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.id, "Demo001");
        assert_eq!(d.severity, DiagnosticSeverity::Warning);
        assert_eq!(d.message, "Identifier 'x' is too short");
        assert_eq!(
            (d.span.start_line, d.span.start_col, d.span.end_line, d.span.end_col),
            (6, 7, 6, 8)
        );
    }

    #[test]
    fn test_each_declarator_is_checked() {
        let diagnostics = analyze("class C { void M() { int a = 1, bb = 2, c = 3; } }");
        let names: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            names,
            vec!["Identifier 'a' is too short", "Identifier 'c' is too short"]
        );
    }

    #[test]
    fn test_longer_identifiers_are_ignored() {
        assert!(analyze("class C { void M() { var xy = 1; foreach (var item in xs) {} } }").is_empty());
    }

    #[test]
    fn test_verbatim_identifier_uses_value_text() {
        let diagnostics = analyze("class C { void M() { var @x = 1; } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Identifier 'x' is too short");
    }

    #[test]
    fn test_foreach_binding() {
        let source = "class C\n{\n    void M(int[] xs)\n    {\n        foreach (var i in xs) { }\n    }\n}";
        let diagnostics = analyze(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Identifier 'i' is too short");
        assert_eq!(
            (diagnostics[0].span.start_line, diagnostics[0].span.start_col),
            (5, 22)
        );
    }

    #[test]
    fn test_fields_and_parameters_are_not_locals() {
        assert!(analyze("class C { int f; void M(int p) { } }").is_empty());
    }

    #[test]
    fn test_type_suffix_rule() {
        let source = "class Home : Controller { }\nclass UsersController : Controller { }\nclass Api : ApiController { }\nclass Plain : Base { }";
        let diagnostics = analyze(source);
        let lab: Vec<_> = diagnostics.iter().filter(|d| d.id == "Lab001").collect();
        assert_eq!(lab.len(), 2);
        assert_eq!(lab[0].message, "Type name 'Home' does not end with 'Controller'");
        assert_eq!(lab[0].severity, DiagnosticSeverity::Error);
        assert_eq!((lab[0].span.start_line, lab[0].span.start_col), (1, 7));
        assert_eq!(lab[1].message, "Type name 'Api' does not end with 'Controller'");
    }

    #[test]
    fn test_type_suffix_qualified_base() {
        let diagnostics = analyze("class Shop : Microsoft.AspNetCore.Mvc.Controller { }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, "Lab001");
    }

    #[test]
    fn test_type_suffix_is_case_sensitive() {
        let diagnostics = analyze("class Homecontroller : Controller { }");
        assert_eq!(diagnostics.len(), 1);
    }
}
