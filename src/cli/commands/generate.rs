//! Generate command implementation
//!
//! Runs the CSV serializer generator over the program. Without `--out` the
//! generated units are printed inline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::cli::response::GeneratedUnitOutput;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Files or directories to scan (defaults to the project root)
    pub paths: Vec<PathBuf>,

    /// Directory to write generated units into
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct GenerateResponse {
    marker: String,
    types: Vec<String>,
    units: Vec<GeneratedUnitOutput>,
}

pub async fn execute(args: GenerateArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let program = match app.load_program(&args.paths).await {
        Ok(program) => program,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let generator = app.generator();
    let declarations = generator.discover(&program);
    let units = vec![generator.marker_unit(), generator.emit(&declarations)];

    let outputs = match args.out {
        Some(ref out_dir) => match app.project.write_generated(out_dir, &units).await {
            Ok(paths) => units
                .iter()
                .zip(paths.iter())
                .map(|(unit, path)| GeneratedUnitOutput::written(unit, path))
                .collect(),
            Err(e) => {
                ctx.print_error(&e.to_string());
                return Ok(());
            }
        },
        None => units.iter().map(GeneratedUnitOutput::printed).collect(),
    };

    let response = GenerateResponse {
        marker: app.config.generator.marker.clone(),
        types: declarations.iter().map(|d| d.full_name()).collect(),
        units: outputs,
    };
    ctx.print_success_flat(response);

    Ok(())
}
