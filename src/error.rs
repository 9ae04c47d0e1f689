//! Error types for Sharpfix

use std::path::PathBuf;

use thiserror::Error;

pub type SharpfixResult<T> = std::result::Result<T, SharpfixError>;

#[derive(Debug, Error)]
pub enum SharpfixError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Rename(#[from] RenameError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to produce a syntax tree for one unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Failed to initialise C# parser: {0}")]
    ParserInit(String),

    #[error("Parser produced no tree for {}", .0.display())]
    NoTree(PathBuf),

    #[error("File too large ({size_mb}MB > {limit_mb}MB limit): {}", .path.display())]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error("Cannot read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No declaration found at {location}")]
    NoDeclaration { location: String },

    #[error("Unit {} has no syntax tree", .0.display())]
    UnitNotParsed(PathBuf),

    #[error("Symbol '{0}' is not part of this program")]
    UnknownSymbol(String),
}

/// Reasons a rename or code fix was rejected; the program is left unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenameError {
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("'{0}' is not a valid identifier")]
    InvalidName(String),

    #[error("Stale reference in {}: expected '{expected}', found '{found}'", .path.display())]
    StaleReference {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Overlapping edits in {}", .0.display())]
    OverlappingEdits(PathBuf),

    #[error("Diagnostic {0} has no registered fix")]
    NotFixable(String),

    #[error("Another rename is already being applied")]
    Busy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project already initialized at: {0}")]
    AlreadyExists(PathBuf),

    #[error("No C# sources found under: {0}")]
    NoSources(PathBuf),

    #[error(
        "Failed to write {}: {source} (already written: {})",
        .failed.display(),
        join_paths(.committed)
    )]
    PartialWrite {
        failed: PathBuf,
        committed: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "none".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RenameError {
    /// Rejections caused by the source moving on since the diagnostic
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::StaleReference { .. } | Self::Resolve(ResolveError::NoDeclaration { .. })
        )
    }
}
