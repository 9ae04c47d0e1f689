//! CLI module for Sharpfix
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod location;
pub mod output;
pub mod response;

pub use location::ParsedLocation;
pub use output::OutputContext;

use clap::{Parser, Subcommand};

use commands::{
    analyze::AnalyzeArgs, config::ConfigArgs, fix::FixArgs, generate::GenerateArgs,
    init::InitArgs, rename::RenameArgs,
};

const LONG_ABOUT: &str = r#"
Sharpfix - naming diagnostics, renames and CSV serializers for C# sources

Sharpfix parses every .cs file under a directory, reports naming rule
violations, applies whole-program renames as code fixes and generates
CSV serialization extensions for classes marked [CsvSerializable].

QUICK START:
  1. Initialize a project:    sharpfix init
  2. Report diagnostics:      sharpfix analyze
  3. Apply available fixes:   sharpfix fix --dry-run
  4. Generate serializers:    sharpfix generate --out Generated

EXAMPLES:
  sharpfix analyze src --severity error            # Only errors
  sharpfix analyze --rule Lab001                   # One diagnostic id
  sharpfix rename src/Home.cs:3:14 HomeController  # Rename at a position
  sharpfix generate src                            # Print generated units
"#;

/// Sharpfix - naming diagnostics, renames and CSV serializers for C# sources
#[derive(Parser, Debug)]
#[command(name = "sharpfix")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'sharpfix <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json)
    #[arg(long, global = true, default_value = "json")]
    pub format: String,

    /// Verbose output (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new Sharpfix project
    Init(InitArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Run the naming rules and report diagnostics
    Analyze(AnalyzeArgs),

    /// Apply code fixes for fixable diagnostics
    Fix(FixArgs),

    /// Rename a symbol across all sources
    Rename(RenameArgs),

    /// Generate CSV serializers for annotated classes
    Generate(GenerateArgs),
}
