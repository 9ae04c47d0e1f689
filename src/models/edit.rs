//! Edit types produced by renames and code fixes

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::program::UnitId;
use super::symbol::{ReferenceLocation, Symbol};

/// Workspace rename options
///
/// Carried through rename requests unchanged; none of the flags alter which
/// occurrences are rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOptions {
    #[serde(default)]
    pub rename_in_comments: bool,
    #[serde(default)]
    pub rename_in_strings: bool,
    #[serde(default)]
    pub rename_overloads: bool,
}

/// Whole-program identifier substitution, applied all-or-nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEdit {
    pub symbol: Symbol,
    pub old_name: String,
    pub new_name: String,
    pub locations: BTreeSet<ReferenceLocation>,
}

impl RenameEdit {
    pub fn is_noop(&self) -> bool {
        self.old_name == self.new_name
    }

    /// Per-unit edit counts, in unit order
    pub fn changes_by_unit(&self) -> Vec<(UnitId, usize)> {
        let mut counts: Vec<(UnitId, usize)> = Vec::new();
        for loc in &self.locations {
            match counts.last_mut() {
                Some((unit, count)) if *unit == loc.unit => *count += 1,
                _ => counts.push((loc.unit, 1)),
            }
        }
        counts
    }
}

/// Per-file change summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub file: PathBuf,
    pub edit_count: usize,
}
