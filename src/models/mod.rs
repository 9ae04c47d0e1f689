//! Data models for Sharpfix
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod diagnostic;
pub mod edit;
pub mod generated;
pub mod program;
pub mod symbol;
pub mod syntax;

// Re-export commonly used types
pub use config::SharpfixConfig;
pub use diagnostic::{Diagnostic, DiagnosticDescriptor, DiagnosticSeverity};
pub use edit::{FileChange, RenameEdit, RenameOptions};
pub use generated::{AnnotatedTypeDeclaration, GeneratedUnit, PropertyDescriptor, TypeClassification};
pub use program::{ProgramSnapshot, SourceText, SourceUnit, UnitId};
pub use symbol::{ReferenceLocation, Symbol, SymbolId, SymbolKind, SymbolScope};
pub use syntax::{ByteRange, NodeId, ParseIssue, Span, SyntaxKind, SyntaxNode, SyntaxTree, Token};
