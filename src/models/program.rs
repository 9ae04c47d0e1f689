//! Source units and whole-program snapshots

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::models::syntax::{LineIndex, SyntaxTree};

/// Position of a unit within its program, stable across snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Raw input handed to the parser
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub text: String,
    /// Set when the file could not be loaded; the unit is kept but unparsed
    pub load_error: Option<ParseError>,
}

impl SourceText {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            load_error: None,
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: ParseError) -> Self {
        Self {
            path: path.into(),
            text: String::new(),
            load_error: Some(error),
        }
    }
}

/// One parsed source file
///
/// A unit that failed to parse keeps its error; it is skipped by analysis,
/// reference search and generation without affecting other units.
#[derive(Debug)]
pub struct SourceUnit {
    pub id: UnitId,
    pub path: PathBuf,
    pub text: String,
    pub syntax: Result<SyntaxTree, ParseError>,
    lines: LineIndex,
}

impl SourceUnit {
    pub fn new(
        id: UnitId,
        path: PathBuf,
        text: String,
        syntax: Result<SyntaxTree, ParseError>,
    ) -> Self {
        let lines = LineIndex::new(&text);
        Self {
            id,
            path,
            text,
            syntax,
            lines,
        }
    }

    pub fn tree(&self) -> Option<&SyntaxTree> {
        self.syntax.as_ref().ok()
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Byte offset for a one-based line/column pair
    pub fn offset_of(&self, line: u32, column: u32) -> Option<usize> {
        self.lines.offset(&self.text, line, column)
    }
}

/// Immutable view of every unit in the program
///
/// Edits never touch a snapshot in place: they build a new one that shares
/// the unchanged units.
#[derive(Debug, Clone, Default)]
pub struct ProgramSnapshot {
    units: Vec<Arc<SourceUnit>>,
}

impl ProgramSnapshot {
    pub fn new(units: Vec<Arc<SourceUnit>>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[Arc<SourceUnit>] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units.iter().find(|u| u.id == id).map(Arc::as_ref)
    }

    pub fn unit_by_path(&self, path: &Path) -> Option<&SourceUnit> {
        self.units
            .iter()
            .find(|u| u.path == path)
            .map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units that produced a syntax tree, in input order
    pub fn parsed_units(&self) -> impl Iterator<Item = (&SourceUnit, &SyntaxTree)> {
        self.units
            .iter()
            .filter_map(|u| u.tree().map(|t| (u.as_ref(), t)))
    }

    /// Copy of this snapshot with some units swapped out
    pub fn with_replaced(&self, replacements: Vec<Arc<SourceUnit>>) -> Self {
        let units = self
            .units
            .iter()
            .map(|u| {
                replacements
                    .iter()
                    .find(|r| r.id == u.id)
                    .cloned()
                    .unwrap_or_else(|| Arc::clone(u))
            })
            .collect();
        Self { units }
    }

    /// Byte-level equality of every unit's text
    pub fn same_text(&self, other: &ProgramSnapshot) -> bool {
        self.units.len() == other.units.len()
            && self
                .units
                .iter()
                .zip(other.units.iter())
                .all(|(a, b)| a.id == b.id && a.text == b.text)
    }
}
