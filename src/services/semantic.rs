//! Symbol resolution service
//!
//! [`SemanticModel`] is the capability the rule engine, the rename engine and
//! the generator receive explicitly. [`SyntacticSemanticModel`] answers from
//! syntax alone: names, scopes, namespaces and `using` directives.

use std::collections::BTreeSet;

use crate::error::ResolveError;
use crate::models::program::{ProgramSnapshot, SourceUnit, UnitId};
use crate::models::symbol::{ReferenceLocation, Symbol, SymbolId, SymbolKind, SymbolScope};
use crate::models::syntax::{NodeId, SyntaxKind, SyntaxTree};

pub trait SemanticModel: Send + Sync {
    /// Symbol declared by `node`, if it is a declaration
    fn resolve(&self, program: &ProgramSnapshot, unit: UnitId, node: NodeId) -> Option<Symbol>;

    /// Every occurrence of `symbol` in the program, declaration included
    fn find_all_references(
        &self,
        program: &ProgramSnapshot,
        symbol: &Symbol,
    ) -> Result<BTreeSet<ReferenceLocation>, ResolveError>;

    /// Whether a type syntax node denotes the built-in string type
    fn is_textual(&self, program: &ProgramSnapshot, unit: UnitId, type_node: NodeId) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticSemanticModel;

impl SemanticModel for SyntacticSemanticModel {
    fn resolve(&self, program: &ProgramSnapshot, unit_id: UnitId, node: NodeId) -> Option<Symbol> {
        let unit = program.unit(unit_id)?;
        let tree = unit.tree()?;
        tree.get(node)?;

        let kind = declaration_kind(tree, node)?;
        let name_token = declaration_name(tree, node)?;
        let token = tree.token(name_token).filter(|t| !t.is_missing)?;

        let scope = match kind {
            SymbolKind::Type => SymbolScope::Namespace(container_path(tree, &unit.text, node)),
            SymbolKind::Variable => SymbolScope::Local {
                unit: unit_id,
                node: variable_scope(tree, node),
            },
            SymbolKind::Member => SymbolScope::Member {
                unit: unit_id,
                type_node: enclosing_type(tree, node)?,
            },
        };

        Some(Symbol {
            id: SymbolId {
                unit: unit_id,
                node,
            },
            name: token.value_text().to_string(),
            kind,
            name_token,
            declaration: location(unit, tree, name_token),
            scope,
        })
    }

    fn find_all_references(
        &self,
        program: &ProgramSnapshot,
        symbol: &Symbol,
    ) -> Result<BTreeSet<ReferenceLocation>, ResolveError> {
        let unit = program
            .unit(symbol.id.unit)
            .ok_or_else(|| ResolveError::UnknownSymbol(symbol.name.clone()))?;
        let tree = unit
            .tree()
            .ok_or_else(|| ResolveError::UnitNotParsed(unit.path.clone()))?;

        let current = self
            .resolve(program, symbol.id.unit, symbol.id.node)
            .filter(|s| s.name == symbol.name && s.kind == symbol.kind)
            .ok_or_else(|| ResolveError::UnknownSymbol(symbol.name.clone()))?;

        let mut refs = BTreeSet::new();
        refs.insert(current.declaration);

        match &current.scope {
            SymbolScope::Namespace(path) => {
                type_references(program, &current, path.as_deref(), &mut refs)
            }
            SymbolScope::Local { node, .. } => {
                variable_references(unit, tree, &current, *node, &mut refs)
            }
            SymbolScope::Member { type_node, .. } => {
                member_references(program, &current, *type_node, &mut refs)
            }
        }

        tracing::debug!(
            "{} '{}' has {} references",
            current.kind,
            current.name,
            refs.len()
        );
        Ok(refs)
    }

    fn is_textual(&self, program: &ProgramSnapshot, unit_id: UnitId, type_node: NodeId) -> bool {
        let Some(unit) = program.unit(unit_id) else {
            return false;
        };
        let Some(tree) = unit.tree() else {
            return false;
        };
        if tree.get(type_node).is_none() {
            return false;
        }

        let mut node = type_node;
        while tree.kind(node) == SyntaxKind::NullableType {
            match tree.children(node).first() {
                Some(&inner) => node = inner,
                None => return false,
            }
        }

        let text = normalize(tree.text(node, &unit.text));
        match tree.kind(node) {
            SyntaxKind::PredefinedType => text == "string",
            SyntaxKind::QualifiedName | SyntaxKind::AliasQualifiedName => text == "System.String",
            SyntaxKind::Identifier => text == "String" && !declares_user_string(program),
            _ => false,
        }
    }
}

/// Innermost declaration around `offset` whose kind is accepted
pub fn find_enclosing_declaration(
    tree: &SyntaxTree,
    offset: usize,
    accept: impl Fn(SymbolKind) -> bool,
) -> Option<NodeId> {
    let token = tree.token_at(offset)?;
    tree.ancestors_and_self(token)
        .find(|&n| declaration_kind(tree, n).is_some_and(&accept))
}

/// Symbol kind introduced by a declaration node
pub fn declaration_kind(tree: &SyntaxTree, node: NodeId) -> Option<SymbolKind> {
    let kind = tree.kind(node);
    if kind.is_type_declaration() {
        return Some(SymbolKind::Type);
    }
    match kind {
        SyntaxKind::VariableDeclarator => {
            let declaration = tree.parent(node)?;
            match tree.parent(declaration).map(|p| tree.kind(p)) {
                Some(SyntaxKind::FieldDeclaration) => Some(SymbolKind::Member),
                _ => Some(SymbolKind::Variable),
            }
        }
        SyntaxKind::ForEachStatement
        | SyntaxKind::Parameter
        | SyntaxKind::LocalFunctionStatement => Some(SymbolKind::Variable),
        SyntaxKind::LambdaExpression => {
            implicit_lambda_parameter(tree, node).map(|_| SymbolKind::Variable)
        }
        SyntaxKind::PropertyDeclaration | SyntaxKind::MethodDeclaration => Some(SymbolKind::Member),
        _ => None,
    }
}

/// Identifier token naming a declaration
pub fn declaration_name(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    match tree.kind(node) {
        SyntaxKind::ForEachStatement => foreach_binding(tree, node),
        SyntaxKind::LambdaExpression => implicit_lambda_parameter(tree, node),
        _ => tree.name_token(node),
    }
}

/// Parameter of `x => ...`, written without parentheses
pub fn implicit_lambda_parameter(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.child_by_field(node, "parameters")
        .filter(|&p| tree.node(p).grammar_kind == "implicit_parameter")
}

/// Identifier bound by a foreach statement
pub fn foreach_binding(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    let by_field = tree
        .child_by_field(node, "left")
        .or_else(|| tree.child_by_field(node, "name"));
    match by_field {
        Some(id) => (tree.kind(id) == SyntaxKind::Identifier).then_some(id),
        None => tree.children(node).iter().copied().find(|&c| {
            let child = tree.node(c);
            child.kind == SyntaxKind::Identifier
                && !child.has_field("type")
                && !child.has_field("right")
        }),
    }
}

/// Dotted path of enclosing namespaces and types, outermost first
pub fn container_path(tree: &SyntaxTree, source: &str, node: NodeId) -> Option<String> {
    let mut parts = Vec::new();
    let mut saw_file_scoped = false;

    for ancestor in tree.ancestors_and_self(node).skip(1) {
        let kind = tree.kind(ancestor);
        if kind.is_namespace() {
            saw_file_scoped |= kind == SyntaxKind::FileScopedNamespaceDeclaration;
            if let Some(name) = namespace_name(tree, source, ancestor) {
                parts.push(name);
            }
        } else if kind.is_type_declaration()
            && let Some(name) = declared_name_text(tree, ancestor)
        {
            parts.push(name);
        }
    }

    if !saw_file_scoped && let Some(ns) = file_scoped_namespace(tree, source, node) {
        parts.push(ns);
    }

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

/// Namespace (block or file-scoped) enclosing a node, without containing types
pub fn enclosing_namespace(tree: &SyntaxTree, source: &str, node: NodeId) -> Option<String> {
    let mut parts: Vec<String> = tree
        .ancestors_and_self(node)
        .skip(1)
        .filter(|&a| tree.kind(a).is_namespace())
        .filter_map(|a| namespace_name(tree, source, a))
        .collect();

    let nested_in_file_scoped = tree
        .ancestors_and_self(node)
        .any(|a| tree.kind(a) == SyntaxKind::FileScopedNamespaceDeclaration);
    if !nested_in_file_scoped && let Some(ns) = file_scoped_namespace(tree, source, node) {
        parts.push(ns);
    }

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

pub fn declared_name_text(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let name = declaration_name(tree, node)?;
    tree.token(name)
        .filter(|t| !t.is_missing)
        .map(|t| t.value_text().to_string())
}

fn namespace_name(tree: &SyntaxTree, source: &str, node: NodeId) -> Option<String> {
    let name = tree.child_by_field(node, "name").or_else(|| {
        tree.children(node).iter().copied().find(|&c| {
            matches!(
                tree.kind(c),
                SyntaxKind::Identifier | SyntaxKind::QualifiedName
            )
        })
    })?;
    Some(normalize(tree.text(name, source)))
}

fn file_scoped_namespace(tree: &SyntaxTree, source: &str, node: NodeId) -> Option<String> {
    let start = tree.node(node).range.start;
    tree.children(tree.root())
        .iter()
        .copied()
        .find(|&c| {
            tree.kind(c) == SyntaxKind::FileScopedNamespaceDeclaration
                && tree.node(c).range.start <= start
        })
        .and_then(|c| namespace_name(tree, source, c))
}

fn enclosing_type(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors_and_self(node)
        .skip(1)
        .find(|&a| tree.kind(a).is_type_declaration())
}

/// Node whose subtree bounds a variable's visibility
fn variable_scope(tree: &SyntaxTree, decl: NodeId) -> NodeId {
    match tree.kind(decl) {
        SyntaxKind::ForEachStatement | SyntaxKind::LambdaExpression => decl,
        SyntaxKind::Parameter => tree
            .ancestors_and_self(decl)
            .skip(1)
            .find(|&a| tree.kind(a) != SyntaxKind::ParameterList)
            .unwrap_or(tree.root()),
        _ => tree
            .ancestors_and_self(decl)
            .skip(1)
            .find(|&a| {
                let node = tree.node(a);
                node.kind == SyntaxKind::Block
                    || node.kind == SyntaxKind::LambdaExpression
                    || matches!(
                        node.grammar_kind.as_str(),
                        "for_statement" | "using_statement" | "switch_section" | "fixed_statement"
                    )
            })
            .unwrap_or(tree.root()),
    }
}

/// Type text as written, for declarations that carry one
fn declared_type_text(tree: &SyntaxTree, source: &str, decl: NodeId) -> Option<String> {
    let typed = match tree.kind(decl) {
        SyntaxKind::VariableDeclarator => tree.parent(decl)?,
        _ => decl,
    };
    let type_node = tree.child_by_field(typed, "type")?;
    if tree.kind(type_node) != SyntaxKind::ImplicitType {
        return Some(simple_type_name(tree.text(type_node, source)));
    }

    // var x = new T(...)
    let creation = tree
        .descendants(decl)
        .find(|&n| tree.node(n).grammar_kind == "object_creation_expression")?;
    let created = tree.child_by_field(creation, "type")?;
    Some(simple_type_name(tree.text(created, source)))
}

struct VarDecl {
    decl: NodeId,
    name: String,
    scope: NodeId,
}

fn variable_declarations(tree: &SyntaxTree) -> Vec<VarDecl> {
    tree.descendants(tree.root())
        .filter(|&n| declaration_kind(tree, n) == Some(SymbolKind::Variable))
        .filter_map(|n| {
            Some(VarDecl {
                decl: n,
                name: declared_name_text(tree, n)?,
                scope: variable_scope(tree, n),
            })
        })
        .collect()
}

fn shadowed_by_variable(vars: &[VarDecl], tree: &SyntaxTree, id: NodeId, name: &str) -> bool {
    vars.iter()
        .any(|v| v.name == name && tree.is_ancestor_of(v.scope, id))
}

/// Declaration node whose name token is `ident`
fn declaring_node(tree: &SyntaxTree, ident: NodeId) -> Option<NodeId> {
    let parent = tree.parent(ident)?;
    if declaration_kind(tree, parent).is_some() && declaration_name(tree, parent) == Some(ident) {
        return Some(parent);
    }
    None
}

fn identifiers_named<'t>(
    tree: &'t SyntaxTree,
    within: NodeId,
    name: &'t str,
) -> impl Iterator<Item = NodeId> + 't {
    tree.descendants(within).filter(move |&n| {
        tree.kind(n) == SyntaxKind::Identifier
            && tree
                .token(n)
                .is_some_and(|t| !t.is_missing && t.value_text() == name)
    })
}

/// Left-hand side of `q.name`, `Q.Name` or `alias::Name` when `ident` is the name
///
/// Read from source text; keyword receivers (`this`, `base`) have no node.
fn qualifier(tree: &SyntaxTree, source: &str, ident: NodeId) -> Option<String> {
    let parent = tree.parent(ident)?;
    match tree.kind(parent) {
        SyntaxKind::MemberAccessExpression
        | SyntaxKind::QualifiedName
        | SyntaxKind::AliasQualifiedName => {
            let name = tree
                .child_by_field(parent, "name")
                .or_else(|| tree.children(parent).last().copied())?;
            if name != ident {
                return None;
            }
            let left = source
                .get(tree.node(parent).range.start..tree.node(ident).range.start)?
                .trim_end();
            let left = left
                .strip_suffix("::")
                .or_else(|| left.strip_suffix("->"))
                .or_else(|| left.strip_suffix('.'))
                .unwrap_or(left);
            let left = normalize(left);
            (!left.is_empty()).then_some(left)
        }
        SyntaxKind::GenericName if tree.name_token(parent) == Some(ident) => {
            qualifier(tree, source, parent)
        }
        _ => None,
    }
}

fn in_namespace_name(tree: &SyntaxTree, ident: NodeId) -> bool {
    let mut top = ident;
    while let Some(parent) = tree.parent(top) {
        if tree.kind(parent) != SyntaxKind::QualifiedName {
            return tree.kind(parent).is_namespace();
        }
        top = parent;
    }
    false
}

fn in_using_directive(tree: &SyntaxTree, ident: NodeId) -> bool {
    tree.ancestors_and_self(ident)
        .any(|a| tree.kind(a) == SyntaxKind::UsingDirective)
}

/// Namespaces imported by plain `using X.Y;` directives
fn imported_namespaces(tree: &SyntaxTree, source: &str) -> Vec<String> {
    tree.descendants(tree.root())
        .filter(|&n| tree.kind(n) == SyntaxKind::UsingDirective)
        .filter(|&n| {
            let text = tree.text(n, source);
            !text.contains('=') && !text.contains(" static ")
        })
        .filter_map(|n| {
            tree.children(n)
                .iter()
                .copied()
                .find(|&c| {
                    matches!(
                        tree.kind(c),
                        SyntaxKind::Identifier | SyntaxKind::QualifiedName
                    )
                })
                .map(|c| normalize(tree.text(c, source)))
        })
        .collect()
}

fn qualifier_matches(qualifier: &str, container: Option<&str>) -> bool {
    match container {
        Some(path) => qualifier == path || path.ends_with(&format!(".{qualifier}")),
        None => qualifier == "global",
    }
}

/// Lookup preference of a type container seen from a reference site;
/// lower is closer
fn visibility_rank(
    container: Option<&str>,
    site: Option<&str>,
    imports: &[String],
) -> Option<(u8, usize)> {
    let Some(path) = container else {
        return Some((3, 0));
    };
    let site = site.unwrap_or("");
    if site == path {
        Some((0, 0))
    } else if site.starts_with(path) && site[path.len()..].starts_with('.') {
        Some((1, usize::MAX - path.len()))
    } else if imports.iter().any(|i| i == path) {
        Some((2, 0))
    } else {
        None
    }
}

struct TypeDecl {
    id: SymbolId,
    name: String,
    container: Option<String>,
}

fn type_declarations(program: &ProgramSnapshot) -> Vec<TypeDecl> {
    program
        .parsed_units()
        .flat_map(|(unit, tree)| {
            tree.descendants(tree.root())
                .filter(|&n| tree.kind(n).is_type_declaration())
                .filter_map(|n| {
                    Some(TypeDecl {
                        id: SymbolId {
                            unit: unit.id,
                            node: n,
                        },
                        name: declared_name_text(tree, n)?,
                        container: container_path(tree, &unit.text, n),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Whether a type declaration carries the `partial` modifier
fn is_partial(tree: &SyntaxTree, source: &str, decl: NodeId) -> bool {
    tree.children(decl)
        .iter()
        .any(|&c| tree.node(c).grammar_kind == "modifier" && tree.text(c, source) == "partial")
}

fn type_references(
    program: &ProgramSnapshot,
    symbol: &Symbol,
    container: Option<&str>,
    refs: &mut BTreeSet<ReferenceLocation>,
) {
    let types = type_declarations(program);
    let same_name: Vec<&TypeDecl> = types.iter().filter(|t| t.name == symbol.name).collect();
    let symbol_is_partial = program
        .unit(symbol.id.unit)
        .and_then(|u| u.tree().map(|t| is_partial(t, &u.text, symbol.id.node)))
        .unwrap_or(false);

    for (unit, tree) in program.parsed_units() {
        let imports = imported_namespaces(tree, &unit.text);
        let vars = variable_declarations(tree);

        for id in identifiers_named(tree, tree.root(), &symbol.name) {
            if let Some(decl) = declaring_node(tree, id) {
                // other parts of a partial type share its name
                let other_part = symbol_is_partial
                    && tree.kind(decl).is_type_declaration()
                    && is_partial(tree, &unit.text, decl)
                    && container_path(tree, &unit.text, decl).as_deref() == container;
                if other_part {
                    refs.insert(location(unit, tree, id));
                }
                continue;
            }
            if in_namespace_name(tree, id) {
                continue;
            }
            if shadowed_by_variable(&vars, tree, id, &symbol.name) {
                continue;
            }

            let is_ours = match qualifier(tree, &unit.text, id) {
                Some(q) => qualifier_matches(&q, container),
                None if in_using_directive(tree, id) => false,
                None => {
                    let site = container_path(tree, &unit.text, id);
                    let ranked: Vec<((u8, usize), SymbolId)> = same_name
                        .iter()
                        .filter_map(|t| {
                            visibility_rank(t.container.as_deref(), site.as_deref(), &imports)
                                .map(|rank| (rank, t.id))
                        })
                        .collect();
                    let best = ranked.iter().map(|(rank, _)| *rank).min();
                    ranked
                        .iter()
                        .any(|(rank, id)| Some(*rank) == best && *id == symbol.id)
                }
            };

            if is_ours {
                refs.insert(location(unit, tree, id));
            }
        }
    }
}

fn variable_references(
    unit: &SourceUnit,
    tree: &SyntaxTree,
    symbol: &Symbol,
    scope: NodeId,
    refs: &mut BTreeSet<ReferenceLocation>,
) {
    let vars = variable_declarations(tree);

    for id in identifiers_named(tree, scope, &symbol.name) {
        if declaring_node(tree, id).is_some() || qualifier(tree, &unit.text, id).is_some() {
            continue;
        }
        let redeclared_inside = vars.iter().any(|v| {
            v.decl != symbol.id.node
                && v.name == symbol.name
                && v.scope != scope
                && tree.is_ancestor_of(scope, v.scope)
                && tree.is_ancestor_of(v.scope, id)
        });
        if !redeclared_inside {
            refs.insert(location(unit, tree, id));
        }
    }
}

fn member_references(
    program: &ProgramSnapshot,
    symbol: &Symbol,
    type_node: NodeId,
    refs: &mut BTreeSet<ReferenceLocation>,
) {
    let Some(type_name) = program
        .unit(symbol.id.unit)
        .and_then(|u| u.tree())
        .and_then(|t| declared_name_text(t, type_node))
    else {
        return;
    };

    for (unit, tree) in program.parsed_units() {
        let vars = variable_declarations(tree);
        let in_home = unit.id == symbol.id.unit;

        for id in identifiers_named(tree, tree.root(), &symbol.name) {
            if declaring_node(tree, id).is_some() {
                continue;
            }
            let inside_type = in_home && tree.is_ancestor_of(type_node, id);

            let is_ours = match qualifier(tree, &unit.text, id) {
                Some(q) if q == "this" || q == "base" => inside_type,
                Some(q) if q == type_name => true,
                Some(q) => receiver_type(tree, &unit.text, &vars, id, &q).as_deref()
                    == Some(type_name.as_str()),
                None => {
                    (inside_type && !shadowed_by_variable(&vars, tree, id, &symbol.name))
                        || initializer_target(tree, &unit.text, id).as_deref()
                            == Some(type_name.as_str())
                }
            };

            if is_ours {
                refs.insert(location(unit, tree, id));
            }
        }
    }
}

/// Declared type of the variable, field or property named `receiver` at `site`
fn receiver_type(
    tree: &SyntaxTree,
    source: &str,
    vars: &[VarDecl],
    site: NodeId,
    receiver: &str,
) -> Option<String> {
    if let Some(var) = vars
        .iter()
        .find(|v| v.name == receiver && tree.is_ancestor_of(v.scope, site))
    {
        return declared_type_text(tree, source, var.decl);
    }

    let owner = enclosing_type(tree, site)?;
    tree.descendants(owner)
        .filter(|&n| declaration_kind(tree, n) == Some(SymbolKind::Member))
        .find(|&n| declared_name_text(tree, n).as_deref() == Some(receiver))
        .and_then(|n| declared_type_text(tree, source, n))
}

/// Type created by `new T { Name = ... }` when `ident` is an initializer target
fn initializer_target(tree: &SyntaxTree, source: &str, ident: NodeId) -> Option<String> {
    let assignment = tree.parent(ident)?;
    if tree.node(assignment).grammar_kind != "assignment_expression"
        || tree.children(assignment).first() != Some(&ident)
    {
        return None;
    }
    let initializer = tree.parent(assignment)?;
    if tree.node(initializer).grammar_kind != "initializer_expression" {
        return None;
    }
    let creation = tree.parent(initializer)?;
    if tree.node(creation).grammar_kind != "object_creation_expression" {
        return None;
    }
    let created = tree.child_by_field(creation, "type")?;
    Some(simple_type_name(tree.text(created, source)))
}

fn declares_user_string(program: &ProgramSnapshot) -> bool {
    type_declarations(program)
        .iter()
        .any(|t| t.name == "String" && t.container.as_deref() != Some("System"))
}

fn location(unit: &SourceUnit, tree: &SyntaxTree, id: NodeId) -> ReferenceLocation {
    let node = tree.node(id);
    ReferenceLocation {
        unit: unit.id,
        range: node.range,
        span: node.span,
    }
}

fn normalize(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .strip_prefix("global::")
        .map(str::to_string)
        .unwrap_or(compact)
}

fn simple_type_name(text: &str) -> String {
    let compact = normalize(text);
    let base = compact.trim_end_matches('?');
    base.rsplit('.').next().unwrap_or(base).to_string()
}
