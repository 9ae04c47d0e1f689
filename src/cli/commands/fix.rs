//! Fix command implementation
//!
//! Applies registered code fixes one diagnostic at a time. The program is
//! re-analyzed after every applied fix so later fixes see current text.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::cli::response::{DiagnosticOutput, FileChangeOutput};
use crate::models::diagnostic::Diagnostic;
use crate::models::program::UnitId;
use crate::services::analyzer::RuleEngine;
use crate::services::fix::{CodeAction, CodeFixProvider, FixOutcome};
use crate::services::workspace::Workspace;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Files or directories to fix (defaults to the project root)
    pub paths: Vec<PathBuf>,

    /// Only fix diagnostics with these ids
    #[arg(long, value_delimiter = ',')]
    pub id: Option<Vec<String>>,

    /// Preview changes without writing files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct FixResponse {
    dry_run: bool,
    applied: Vec<AppliedFixOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<RejectedFixOutput>,
    affected_files: usize,
    changes: Vec<FileChangeOutput>,
}

#[derive(Serialize)]
struct AppliedFixOutput {
    title: String,
    diagnostic: DiagnosticOutput,
    old_name: String,
    new_name: String,
    locations: usize,
}

#[derive(Serialize)]
struct RejectedFixOutput {
    title: String,
    diagnostic: DiagnosticOutput,
    reason: String,
}

#[derive(Debug)]
pub struct AppliedFix {
    pub action: CodeAction,
    pub old_name: String,
    pub new_name: String,
    pub locations: usize,
}

/// Outcome of fixing every fixable diagnostic in a workspace
#[derive(Debug, Default)]
pub struct FixRun {
    pub applied: Vec<AppliedFix>,
    pub rejected: Vec<(CodeAction, String)>,
    /// Edit counts per changed unit, in unit order
    pub changes: Vec<(UnitId, usize)>,
}

/// Fix diagnostics until none with a registered fix remain
pub fn fix_all(
    workspace: &Workspace,
    engine: &RuleEngine,
    providers: &[Box<dyn CodeFixProvider>],
    ids: Option<&[String]>,
) -> FixRun {
    let mut run = FixRun::default();
    let mut attempted: HashSet<(String, PathBuf, String)> = HashSet::new();
    let mut counts: BTreeMap<UnitId, usize> = BTreeMap::new();

    let wanted = |d: &Diagnostic| {
        ids.is_none_or(|ids| ids.iter().any(|id| id.eq_ignore_ascii_case(&d.id)))
            && providers
                .iter()
                .any(|p| p.fixable_diagnostic_ids().contains(&d.id.as_str()))
    };

    loop {
        let snapshot = workspace.snapshot();
        let next = engine.analyze(&snapshot).into_iter().find(|d| {
            wanted(d) && !attempted.contains(&(d.id.clone(), d.file_path.clone(), d.message.clone()))
        });
        let Some(diagnostic) = next else {
            break;
        };
        attempted.insert((
            diagnostic.id.clone(),
            diagnostic.file_path.clone(),
            diagnostic.message.clone(),
        ));

        let Some(action) = providers
            .iter()
            .flat_map(|p| p.register_fixes(&snapshot, &diagnostic))
            .next()
        else {
            continue;
        };

        match workspace.apply(&action) {
            FixOutcome::Applied { edit, .. } => {
                for (unit, count) in edit.changes_by_unit() {
                    *counts.entry(unit).or_default() += count;
                }
                run.applied.push(AppliedFix {
                    action,
                    locations: edit.locations.len(),
                    old_name: edit.old_name,
                    new_name: edit.new_name,
                });
            }
            FixOutcome::Rejected(e) => run.rejected.push((action, e.to_string())),
        }
    }

    run.changes = counts.into_iter().collect();
    run
}

pub async fn execute(args: FixArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let program = match app.load_program(&args.paths).await {
        Ok(program) => program,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let workspace = Workspace::new(program);
    let run = fix_all(
        &workspace,
        &app.rule_engine(),
        &app.fix_providers(),
        args.id.as_deref(),
    );

    let changes: Vec<FileChangeOutput> = if args.dry_run {
        let snapshot = workspace.snapshot();
        run.changes
            .iter()
            .filter_map(|&(unit, edit_count)| {
                snapshot.unit(unit).map(|u| FileChangeOutput {
                    file: u.path.display().to_string(),
                    edit_count,
                })
            })
            .collect()
    } else {
        match app.project.write_changes(&workspace.snapshot(), &run.changes).await {
            Ok(written) => written.iter().map(FileChangeOutput::from).collect(),
            Err(e) => {
                ctx.print_error(&e.to_string());
                return Ok(());
            }
        }
    };

    let response = FixResponse {
        dry_run: args.dry_run,
        applied: run
            .applied
            .iter()
            .map(|fix| AppliedFixOutput {
                title: fix.action.title.clone(),
                diagnostic: DiagnosticOutput::from_diagnostic(&fix.action.diagnostic),
                old_name: fix.old_name.clone(),
                new_name: fix.new_name.clone(),
                locations: fix.locations,
            })
            .collect(),
        rejected: run
            .rejected
            .iter()
            .map(|(action, reason)| RejectedFixOutput {
                title: action.title.clone(),
                diagnostic: DiagnosticOutput::from_diagnostic(&action.diagnostic),
                reason: reason.clone(),
            })
            .collect(),
        affected_files: changes.len(),
        changes,
    };
    ctx.print_success_flat(response);

    Ok(())
}
