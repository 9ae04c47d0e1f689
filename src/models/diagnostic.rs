//! Diagnostic model for analyzer rules

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::program::UnitId;
use super::syntax::{ByteRange, Span};

/// Static description of a diagnostic a rule can raise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Message with `{0}`, `{1}`, ... placeholders
    pub message_format: &'static str,
    pub category: &'static str,
    pub severity: DiagnosticSeverity,
    pub enabled_by_default: bool,
}

impl DiagnosticDescriptor {
    pub fn format_message(&self, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(self.message_format.to_string(), |message, (i, arg)| {
                message.replace(&format!("{{{i}}}"), arg)
            })
    }

    pub fn create(
        &self,
        unit: UnitId,
        file_path: PathBuf,
        range: ByteRange,
        span: Span,
        args: &[&str],
    ) -> Diagnostic {
        Diagnostic {
            id: self.id.to_string(),
            severity: self.severity,
            message: self.format_message(args),
            category: self.category.to_string(),
            unit,
            file_path,
            range,
            span,
        }
    }
}

/// A reported finding, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub category: String,
    pub unit: UnitId,
    pub file_path: PathBuf,
    pub range: ByteRange,
    pub span: Span,
}

impl Diagnostic {
    pub fn display_line(&self) -> u32 {
        self.span.start_line
    }

    pub fn display_column(&self) -> u32 {
        self.span.start_col
    }
}

/// Severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Information => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

impl std::str::FromStr for DiagnosticSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warning" | "warn" | "w" => Ok(Self::Warning),
            "info" | "information" | "i" => Ok(Self::Information),
            "hint" | "h" => Ok(Self::Hint),
            _ => Err(format!(
                "Unknown severity: '{}'. Valid: error, warning, info, hint",
                s
            )),
        }
    }
}
