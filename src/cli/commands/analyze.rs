//! Analyze command implementation
//!
//! Runs the naming rules over every source unit and reports diagnostics.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::cli::response::{DiagnosticOutput, UnparsedOutput};
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze (defaults to the project root)
    pub paths: Vec<PathBuf>,

    /// Filter by severity (error, warning, info, hint)
    #[arg(long, short = 's', value_delimiter = ',')]
    pub severity: Option<Vec<String>>,

    /// Filter by diagnostic id (e.g., Demo001, Lab001)
    #[arg(long, short = 'r', value_delimiter = ',')]
    pub rule: Option<Vec<String>>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    units: usize,
    count: usize,
    diagnostics: Vec<DiagnosticOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unparsed: Vec<UnparsedOutput>,
}

pub async fn execute(args: AnalyzeArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let program = match app.load_program(&args.paths).await {
        Ok(program) => program,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let severity_filter: Option<Vec<DiagnosticSeverity>> = args.severity.as_ref().map(|sevs| {
        sevs.iter()
            .filter_map(|s| s.parse::<DiagnosticSeverity>().ok())
            .collect()
    });

    let diagnostics: Vec<Diagnostic> = app
        .rule_engine()
        .analyze(&program)
        .into_iter()
        .filter(|d| {
            if let Some(ref filter) = severity_filter
                && !filter.contains(&d.severity)
            {
                return false;
            }
            if let Some(ref rules) = args.rule
                && !rules.iter().any(|r| r.eq_ignore_ascii_case(&d.id))
            {
                return false;
            }
            true
        })
        .collect();

    let response = AnalyzeResponse {
        units: program.len(),
        count: diagnostics.len(),
        diagnostics: diagnostics.iter().map(DiagnosticOutput::from_diagnostic).collect(),
        unparsed: program
            .units()
            .iter()
            .filter_map(|u| UnparsedOutput::from_unit(u))
            .collect(),
    };
    ctx.print_success_flat(response);

    Ok(())
}
