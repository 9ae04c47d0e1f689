//! Owned syntax tree model
//!
//! Parsed C# sources are lowered into an arena of [`SyntaxNode`]s addressed by
//! [`NodeId`]. Parent links are plain ids, so the tree carries no ownership
//! cycles and can be shared freely across threads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Half-open byte range into the unit's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        if self.is_empty() {
            return offset == self.start;
        }
        self.start <= offset && offset < self.end
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One-based line/column span (columns count characters, not bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// Syntax node kinds the analyzers care about
///
/// Everything else the grammar produces lands in [`SyntaxKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    CompilationUnit,
    NamespaceDeclaration,
    FileScopedNamespaceDeclaration,
    UsingDirective,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    EnumDeclaration,
    DeclarationList,
    BaseList,
    AttributeList,
    Attribute,
    PropertyDeclaration,
    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    LocalFunctionStatement,
    LambdaExpression,
    ParameterList,
    Parameter,
    Block,
    LocalDeclarationStatement,
    VariableDeclaration,
    VariableDeclarator,
    ForEachStatement,
    MemberAccessExpression,
    QualifiedName,
    AliasQualifiedName,
    GenericName,
    PredefinedType,
    NullableType,
    ImplicitType,
    Identifier,
    Comment,
    Error,
    Other,
}

impl SyntaxKind {
    /// Named type declarations (the ones that introduce a type symbol)
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration
                | Self::StructDeclaration
                | Self::InterfaceDeclaration
                | Self::RecordDeclaration
                | Self::EnumDeclaration
        )
    }

    pub fn is_namespace(self) -> bool {
        matches!(
            self,
            Self::NamespaceDeclaration | Self::FileScopedNamespaceDeclaration
        )
    }
}

/// Leaf payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Inserted by error recovery, not backed by source text
    pub is_missing: bool,
}

impl Token {
    /// Identifier text with the verbatim `@` prefix removed
    pub fn value_text(&self) -> &str {
        self.text.strip_prefix('@').unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Grammar node type, kept for diagnostics on `Other` nodes
    pub grammar_kind: String,
    /// Field name under which this node hangs in its parent
    pub field: Option<String>,
    pub range: ByteRange,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub token: Option<Token>,
}

impl SyntaxNode {
    pub fn is_missing(&self) -> bool {
        self.token.as_ref().is_some_and(|t| t.is_missing)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field.as_deref() == Some(field)
    }
}

/// Parser-reported problem inside a unit (ERROR or MISSING node)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub span: Span,
    pub message: String,
}

/// Single-rooted, acyclic syntax tree for one source unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        self.node(id).token.as_ref()
    }

    /// Source text covered by a node
    pub fn text<'s>(&self, id: NodeId, source: &'s str) -> &'s str {
        let range = self.node(id).range;
        source.get(range.start..range.end).unwrap_or("")
    }

    /// First child hanging under the given grammar field
    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).has_field(field))
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == kind)
    }

    pub fn children_of_kind(&self, id: NodeId, kind: SyntaxKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    /// Declared name of a declaration-like node: the `name` field, falling
    /// back to the first identifier child.
    pub fn name_token(&self, id: NodeId) -> Option<NodeId> {
        self.child_by_field(id, "name")
            .filter(|&n| self.kind(n) == SyntaxKind::Identifier)
            .or_else(|| self.first_child_of_kind(id, SyntaxKind::Identifier))
    }

    /// Pre-order walk of `id` and all of its descendants
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// `id` followed by each ancestor up to the root
    pub fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors_and_self(id).any(|n| n == ancestor)
    }

    /// Innermost token (leaf) whose range contains `offset`
    pub fn token_at(&self, offset: usize) -> Option<NodeId> {
        let mut current = self.root;
        if !self.node(current).range.contains(offset) {
            return None;
        }
        loop {
            let next = self
                .children(current)
                .iter()
                .copied()
                .find(|&c| self.node(c).range.contains(offset));
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        self.node(current).token.as_ref().map(|_| current)
    }

    /// Parser errors and missing tokens, in source order
    pub fn issues(&self) -> Vec<ParseIssue> {
        self.descendants(self.root)
            .filter_map(|id| {
                let node = self.node(id);
                if node.kind == SyntaxKind::Error {
                    Some(ParseIssue {
                        span: node.span,
                        message: "syntax error".to_string(),
                    })
                } else if node.is_missing() {
                    Some(ParseIssue {
                        span: node.span,
                        message: format!("missing {}", node.grammar_kind),
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Byte offset to one-based line/column conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn position(&self, source: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(source.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];
        let column = source
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - line_start);
        (line as u32 + 1, column as u32 + 1)
    }

    pub fn span(&self, source: &str, range: ByteRange) -> Span {
        let (start_line, start_col) = self.position(source, range.start);
        let (end_line, end_col) = self.position(source, range.end);
        Span::new(start_line, start_col, end_line, end_col)
    }

    /// Byte offset of a one-based line/column pair
    pub fn offset(&self, source: &str, line: u32, column: u32) -> Option<usize> {
        let line_start = *self.line_starts.get(line.checked_sub(1)? as usize)?;
        let line_end = self
            .line_starts
            .get(line as usize)
            .copied()
            .unwrap_or(source.len());
        let line_text = source.get(line_start..line_end)?;
        let col = column.checked_sub(1)? as usize;
        if col == 0 {
            return Some(line_start);
        }
        line_text
            .char_indices()
            .nth(col)
            .map(|(i, _)| line_start + i)
            .or_else(|| (line_text.chars().count() == col).then_some(line_end))
    }
}

/// Incremental tree construction
///
/// Used by the tree-sitter lowering and by hosts that bring their own parser.
pub struct SyntaxTreeBuilder<'s> {
    source: &'s str,
    lines: LineIndex,
    nodes: Vec<SyntaxNode>,
    stack: Vec<NodeId>,
}

impl<'s> SyntaxTreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn push(
        &mut self,
        kind: SyntaxKind,
        grammar_kind: &str,
        field: Option<&str>,
        range: ByteRange,
        token: Option<Token>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        self.nodes.push(SyntaxNode {
            kind,
            grammar_kind: grammar_kind.to_string(),
            field: field.map(str::to_string),
            range,
            span: self.lines.span(self.source, range),
            parent,
            children: Vec::new(),
            token,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    /// Opens an interior node; children are added until [`Self::finish_node`]
    pub fn start_node(
        &mut self,
        kind: SyntaxKind,
        grammar_kind: &str,
        field: Option<&str>,
        range: ByteRange,
    ) -> NodeId {
        let id = self.push(kind, grammar_kind, field, range, None);
        self.stack.push(id);
        id
    }

    pub fn finish_node(&mut self) {
        self.stack.pop();
    }

    /// Adds a leaf; its text is read from the source unless it is missing
    pub fn token(
        &mut self,
        kind: SyntaxKind,
        grammar_kind: &str,
        field: Option<&str>,
        range: ByteRange,
        is_missing: bool,
    ) -> NodeId {
        let text = if is_missing {
            String::new()
        } else {
            self.source
                .get(range.start..range.end)
                .unwrap_or_default()
                .to_string()
        };
        self.push(
            kind,
            grammar_kind,
            field,
            range,
            Some(Token { text, is_missing }),
        )
    }

    /// Returns `None` when no node was added
    pub fn finish(self) -> Option<SyntaxTree> {
        if self.nodes.is_empty() {
            return None;
        }
        Some(SyntaxTree {
            nodes: self.nodes,
            root: NodeId(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree(source: &str) -> SyntaxTree {
        // var ab = 1;
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
            ByteRange::new(0, 11),
        );
        b.token(
            SyntaxKind::ImplicitType,
            "implicit_type",
            Some("type"),
            ByteRange::new(0, 3),
            false,
        );
        b.token(
            SyntaxKind::Identifier,
            "identifier",
            Some("name"),
            ByteRange::new(4, 6),
            false,
        );
        b.finish_node();
        b.finish_node();
        b.finish().unwrap()
    }

    #[test]
    fn test_parent_links_and_walk_order() {
        let tree = sample_tree("var ab = 1;");
        let order: Vec<SyntaxKind> = tree.descendants(tree.root()).map(|n| tree.kind(n)).collect();
        assert_eq!(
            order,
            vec![
                SyntaxKind::CompilationUnit,
                SyntaxKind::LocalDeclarationStatement,
                SyntaxKind::ImplicitType,
                SyntaxKind::Identifier,
            ]
        );

        let ident = tree.token_at(5).unwrap();
        assert_eq!(tree.token(ident).unwrap().text, "ab");
        let chain: Vec<NodeId> = tree.ancestors_and_self(ident).collect();
        assert_eq!(chain.len(), 3);
        assert_eq!(*chain.last().unwrap(), tree.root());
    }

    #[test]
    fn test_name_token_prefers_field() {
        let tree = sample_tree("var ab = 1;");
        let stmt = tree.children(tree.root())[0];
        let name = tree.name_token(stmt).unwrap();
        assert_eq!(tree.token(name).unwrap().text, "ab");
    }

    #[test]
    fn test_line_index_counts_tabs_as_one_column() {
        let source = "\n\t\tvar x = 1;";
        let index = LineIndex::new(source);
        let offset = source.find('x').unwrap();
        assert_eq!(index.position(source, offset), (2, 7));
        assert_eq!(index.offset(source, 2, 7), Some(offset));
    }

    #[test]
    fn test_line_index_multibyte_columns() {
        let source = "é x";
        let index = LineIndex::new(source);
        let offset = source.find('x').unwrap();
        assert_eq!(index.position(source, offset), (1, 3));
    }

    #[test]
    fn test_verbatim_identifier_value_text() {
        let token = Token {
            text: "@x".to_string(),
            is_missing: false,
        };
        assert_eq!(token.value_text(), "x");
    }

    #[test]
    fn test_empty_range_contains_its_start() {
        let range = ByteRange::new(4, 4);
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }
}
