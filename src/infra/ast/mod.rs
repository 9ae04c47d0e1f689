//! AST parsing infrastructure for Sharpfix
//!
//! Tree-sitter based C# parsing lowered into the owned syntax model.

pub mod lower;
pub mod node_types;

pub use lower::CSharpParser;
pub use node_types::{NodeType, is_leaf_kind, node_types, syntax_kind};
