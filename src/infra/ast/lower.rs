//! Tree-sitter to arena lowering
//!
//! Keeps named nodes (plus MISSING placeholders) and drops anonymous
//! punctuation. Edits are applied to source text by byte range, so nothing
//! here needs to round-trip trivia.

use std::path::Path;

use tree_sitter::{Parser, TreeCursor};

use super::node_types::{is_leaf_kind, syntax_kind};
use crate::error::ParseError;
use crate::models::syntax::{ByteRange, SyntaxTree, SyntaxTreeBuilder};

/// C# parser producing owned [`SyntaxTree`]s
///
/// Not `Sync`; create one per worker thread.
pub struct CSharpParser {
    inner: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut inner = Parser::new();
        inner
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn parse(&mut self, path: &Path, source: &str) -> Result<SyntaxTree, ParseError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree(path.to_path_buf()))?;
        lower(tree.walk(), source).ok_or_else(|| ParseError::NoTree(path.to_path_buf()))
    }
}

fn lower(mut cursor: TreeCursor<'_>, source: &str) -> Option<SyntaxTree> {
    let mut builder = SyntaxTreeBuilder::new(source);

    'walk: loop {
        let node = cursor.node();
        let mut opened = false;

        if node.is_named() || node.is_missing() {
            let kind = syntax_kind(node.kind());
            let field = cursor.field_name();
            let range = ByteRange::new(node.start_byte(), node.end_byte());

            let is_root = cursor.depth() == 0;
            if node.is_missing() || is_leaf_kind(kind) || (node.child_count() == 0 && !is_root) {
                builder.token(kind, node.kind(), field, range, node.is_missing());
            } else {
                builder.start_node(kind, node.kind(), field, range);
                opened = true;
            }
        }

        if opened {
            if cursor.goto_first_child() {
                continue 'walk;
            }
            builder.finish_node();
        }

        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
            // only opened nodes are ever descended into
            builder.finish_node();
        }
    }

    builder.finish()
}
