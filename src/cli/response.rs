//! Response types for CLI output
//!
//! Shared by several commands; all types serialize to the JSON documents
//! printed through [`super::OutputContext`].

use std::path::Path;

use serde::Serialize;

use crate::models::diagnostic::Diagnostic;
use crate::models::edit::FileChange;
use crate::models::generated::GeneratedUnit;
use crate::models::program::SourceUnit;

/// One reported diagnostic
#[derive(Debug, Serialize)]
pub struct DiagnosticOutput {
    pub id: String,
    pub severity: String,
    pub category: String,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl DiagnosticOutput {
    pub fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            id: diagnostic.id.clone(),
            severity: diagnostic.severity.to_string(),
            category: diagnostic.category.clone(),
            message: diagnostic.message.clone(),
            file: diagnostic.file_path.display().to_string(),
            line: diagnostic.span.start_line,
            column: diagnostic.span.start_col,
            end_line: diagnostic.span.end_line,
            end_column: diagnostic.span.end_col,
        }
    }
}

/// A unit that produced no syntax tree
#[derive(Debug, Serialize)]
pub struct UnparsedOutput {
    pub file: String,
    pub error: String,
}

impl UnparsedOutput {
    pub fn from_unit(unit: &SourceUnit) -> Option<Self> {
        unit.syntax.as_ref().err().map(|e| Self {
            file: unit.path.display().to_string(),
            error: e.to_string(),
        })
    }
}

/// Per-file edit summary
#[derive(Debug, Serialize)]
pub struct FileChangeOutput {
    pub file: String,
    pub edit_count: usize,
}

impl From<&FileChange> for FileChangeOutput {
    fn from(change: &FileChange) -> Self {
        Self {
            file: change.file.display().to_string(),
            edit_count: change.edit_count,
        }
    }
}

/// One generated unit; `text` is omitted once it has been written to disk
#[derive(Debug, Serialize)]
pub struct GeneratedUnitOutput {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl GeneratedUnitOutput {
    pub fn printed(unit: &GeneratedUnit) -> Self {
        Self {
            key: unit.key.clone(),
            path: None,
            text: Some(unit.text.clone()),
        }
    }

    pub fn written(unit: &GeneratedUnit, path: &Path) -> Self {
        Self {
            key: unit.key.clone(),
            path: Some(path.display().to_string()),
            text: None,
        }
    }
}
