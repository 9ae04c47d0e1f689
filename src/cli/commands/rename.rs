//! Rename command - symbol-aware renaming across every source unit

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::FileChangeOutput;
use crate::error::{RenameError, ResolveError};
use crate::models::edit::{RenameEdit, RenameOptions};
use crate::models::program::ProgramSnapshot;
use crate::services::rename::RenameEngine;

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// File path with position (file:line:column)
    pub location: String,

    /// New name for the symbol
    pub new_name: String,

    /// Preview changes without applying
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct RenameResponse {
    old_name: String,
    new_name: String,
    kind: String,
    dry_run: bool,
    affected_files: usize,
    changes: Vec<FileChangeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Resolve the identifier at `loc` and rename its symbol
pub fn rename_at(
    engine: &RenameEngine,
    program: &ProgramSnapshot,
    loc: &ParsedLocation,
    new_name: &str,
    options: &RenameOptions,
) -> Result<(ProgramSnapshot, RenameEdit), RenameError> {
    let unit = program
        .unit_by_path(&loc.file)
        .ok_or_else(|| ResolveError::NoDeclaration {
            location: loc.to_string(),
        })?;
    let offset = unit
        .offset_of(loc.line, loc.column)
        .ok_or_else(|| ResolveError::NoDeclaration {
            location: loc.to_string(),
        })?;

    let symbol = engine.symbol_at(program, unit.id, offset)?;
    engine.rename(program, &symbol, new_name, options)
}

pub async fn execute(args: RenameArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let parsed = ParsedLocation::parse(&args.location)?;
    let loc = ParsedLocation {
        file: parsed.unit_path(app.root())?,
        ..parsed
    };

    let program = match app.load_program(&[]).await {
        Ok(program) => program,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let engine = app.rename_engine();
    let (snapshot, edit) =
        match rename_at(&engine, &program, &loc, &args.new_name, &app.config.rename) {
            Ok(result) => result,
            Err(e) => {
                ctx.print_error(&e.to_string());
                return Ok(());
            }
        };

    if program.same_text(&snapshot) {
        let response = RenameResponse {
            old_name: edit.old_name,
            new_name: edit.new_name,
            kind: edit.symbol.kind.to_string(),
            dry_run: args.dry_run,
            affected_files: 0,
            changes: vec![],
            message: Some("Symbol is already named the same. No changes needed.".to_string()),
        };
        ctx.print_success_flat(response);
        return Ok(());
    }

    let unit_changes = edit.changes_by_unit();
    let changes: Vec<FileChangeOutput> = if args.dry_run {
        unit_changes
            .iter()
            .filter_map(|&(unit, edit_count)| {
                snapshot.unit(unit).map(|u| FileChangeOutput {
                    file: u.path.display().to_string(),
                    edit_count,
                })
            })
            .collect()
    } else {
        match app.project.write_changes(&snapshot, &unit_changes).await {
            Ok(written) => written.iter().map(FileChangeOutput::from).collect(),
            Err(e) => {
                ctx.print_error(&e.to_string());
                return Ok(());
            }
        }
    };

    let response = RenameResponse {
        old_name: edit.old_name,
        new_name: edit.new_name,
        kind: edit.symbol.kind.to_string(),
        dry_run: args.dry_run,
        affected_files: changes.len(),
        changes,
        message: None,
    };
    ctx.print_success_flat(response);

    Ok(())
}
