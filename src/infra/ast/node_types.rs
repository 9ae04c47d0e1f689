//! Tree-sitter Node Type Mappings
//!
//! Verified node types from the tree-sitter-c-sharp grammar
//! (`src/node-types.json`), mapped onto [`SyntaxKind`].

use crate::models::syntax::SyntaxKind;

/// Node type mapping entry
#[derive(Debug, Clone, Copy)]
pub struct NodeType {
    pub kind: SyntaxKind,
    /// Actual tree-sitter node type
    pub node_type: &'static str,
    /// Example syntax
    pub example: &'static str,
}

impl NodeType {
    const fn new(kind: SyntaxKind, node_type: &'static str, example: &'static str) -> Self {
        Self {
            kind,
            node_type,
            example,
        }
    }
}

/// Map a grammar node type onto the analyzer's kind tag
pub fn syntax_kind(node_type: &str) -> SyntaxKind {
    CSHARP
        .iter()
        .find(|n| n.node_type == node_type)
        .map(|n| n.kind)
        .unwrap_or(SyntaxKind::Other)
}

/// Kinds lowered as leaves even when the grammar gives them children
pub fn is_leaf_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::PredefinedType
            | SyntaxKind::ImplicitType
            | SyntaxKind::Comment
    )
}

pub fn node_types() -> &'static [NodeType] {
    CSHARP
}

// =============================================================================
// C# - tree-sitter-c-sharp/src/node-types.json
// =============================================================================
const CSHARP: &[NodeType] = &[
    NodeType::new(SyntaxKind::CompilationUnit, "compilation_unit", "<file>"),
    NodeType::new(SyntaxKind::NamespaceDeclaration, "namespace_declaration", "namespace N { }"),
    NodeType::new(
        SyntaxKind::FileScopedNamespaceDeclaration,
        "file_scoped_namespace_declaration",
        "namespace N;",
    ),
    NodeType::new(SyntaxKind::UsingDirective, "using_directive", "using System;"),
    NodeType::new(SyntaxKind::ClassDeclaration, "class_declaration", "class MyClass {}"),
    NodeType::new(SyntaxKind::StructDeclaration, "struct_declaration", "struct Point {}"),
    NodeType::new(SyntaxKind::InterfaceDeclaration, "interface_declaration", "interface IFoo {}"),
    NodeType::new(SyntaxKind::RecordDeclaration, "record_declaration", "record R(int X);"),
    NodeType::new(
        SyntaxKind::RecordDeclaration,
        "record_struct_declaration",
        "record struct R(int X);",
    ),
    NodeType::new(SyntaxKind::EnumDeclaration, "enum_declaration", "enum Color {}"),
    NodeType::new(SyntaxKind::DeclarationList, "declaration_list", "{ members }"),
    NodeType::new(SyntaxKind::BaseList, "base_list", ": Base, IFoo"),
    NodeType::new(SyntaxKind::AttributeList, "attribute_list", "[A, B]"),
    NodeType::new(SyntaxKind::Attribute, "attribute", "Serializable"),
    NodeType::new(SyntaxKind::PropertyDeclaration, "property_declaration", "int X { get; }"),
    NodeType::new(SyntaxKind::FieldDeclaration, "field_declaration", "int x;"),
    NodeType::new(SyntaxKind::MethodDeclaration, "method_declaration", "void M() {}"),
    NodeType::new(SyntaxKind::ConstructorDeclaration, "constructor_declaration", "C() {}"),
    NodeType::new(SyntaxKind::LocalFunctionStatement, "local_function_statement", "int F() => 1;"),
    NodeType::new(SyntaxKind::LambdaExpression, "lambda_expression", "x => x"),
    NodeType::new(
        SyntaxKind::LambdaExpression,
        "anonymous_method_expression",
        "delegate (int x) { }",
    ),
    NodeType::new(SyntaxKind::ParameterList, "parameter_list", "(int a, int b)"),
    NodeType::new(SyntaxKind::Parameter, "parameter", "int a"),
    NodeType::new(SyntaxKind::Block, "block", "{ ... }"),
    NodeType::new(
        SyntaxKind::LocalDeclarationStatement,
        "local_declaration_statement",
        "var x = 1;",
    ),
    NodeType::new(SyntaxKind::VariableDeclaration, "variable_declaration", "int x = 1, y"),
    NodeType::new(SyntaxKind::VariableDeclarator, "variable_declarator", "x = 1"),
    NodeType::new(SyntaxKind::ForEachStatement, "foreach_statement", "foreach (var x in xs)"),
    NodeType::new(SyntaxKind::MemberAccessExpression, "member_access_expression", "a.b"),
    NodeType::new(SyntaxKind::QualifiedName, "qualified_name", "System.String"),
    NodeType::new(SyntaxKind::AliasQualifiedName, "alias_qualified_name", "global::System"),
    NodeType::new(SyntaxKind::GenericName, "generic_name", "List<int>"),
    NodeType::new(SyntaxKind::PredefinedType, "predefined_type", "string"),
    NodeType::new(SyntaxKind::NullableType, "nullable_type", "string?"),
    NodeType::new(SyntaxKind::ImplicitType, "implicit_type", "var"),
    NodeType::new(SyntaxKind::Identifier, "identifier", "name"),
    NodeType::new(SyntaxKind::Identifier, "implicit_parameter", "x => x"),
    NodeType::new(SyntaxKind::Comment, "comment", "// text"),
    NodeType::new(SyntaxKind::Error, "ERROR", "<recovery>"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_node_types_map() {
        assert_eq!(syntax_kind("class_declaration"), SyntaxKind::ClassDeclaration);
        assert_eq!(syntax_kind("foreach_statement"), SyntaxKind::ForEachStatement);
        assert_eq!(syntax_kind("record_struct_declaration"), SyntaxKind::RecordDeclaration);
        assert_eq!(syntax_kind("ERROR"), SyntaxKind::Error);
        assert_eq!(syntax_kind("implicit_parameter"), SyntaxKind::Identifier);
    }

    #[test]
    fn test_unknown_node_types_are_other() {
        assert_eq!(syntax_kind("invocation_expression"), SyntaxKind::Other);
        assert_eq!(syntax_kind(""), SyntaxKind::Other);
    }

    #[test]
    fn test_node_types_have_examples() {
        assert!(node_types().iter().all(|n| !n.example.is_empty()));
    }
}
