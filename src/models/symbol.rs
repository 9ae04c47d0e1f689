//! Symbol model definitions
//!
//! A [`Symbol`] is the resolved identity of one declaration. Textual
//! occurrences are tracked separately as [`ReferenceLocation`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::program::UnitId;
use super::syntax::{ByteRange, NodeId, Span};

/// Declaring node of a symbol; unique per declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId {
    pub unit: UnitId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Variable,
    Type,
    Member,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Type => write!(f, "type"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// Region of the program in which a symbol's name can be referenced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolScope {
    /// Type declared in a namespace (`None` for the global namespace)
    Namespace(Option<String>),
    /// Local, foreach binding or parameter visible inside one node
    Local { unit: UnitId, node: NodeId },
    /// Field, property or method of a type body
    Member { unit: UnitId, type_node: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Identifier token naming the declaration
    pub name_token: NodeId,
    pub declaration: ReferenceLocation,
    pub scope: SymbolScope,
}

impl Symbol {
    /// Dotted name for types (`Ns.Name`), plain name otherwise
    pub fn qualified_name(&self) -> String {
        match &self.scope {
            SymbolScope::Namespace(Some(ns)) => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }
}

/// One syntactic occurrence of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceLocation {
    pub unit: UnitId,
    pub range: ByteRange,
    pub span: Span,
}
