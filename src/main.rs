//! Sharpfix - C# naming diagnostics, renames and CSV serializer generation
//!
//! All command output is a single JSON document on stdout.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharpfix::app::App;
use sharpfix::cli::{Cli, Commands};

fn main() {
    // Quiet by default; use RUST_LOG=sharpfix=debug for verbose output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharpfix=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                r#"{{"success":false,"error":"Failed to create runtime: {}"}}"#,
                e
            );
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async_main());

    if let Err(e) = result {
        let response = serde_json::json!({
            "success": false,
            "error": e.to_string()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| { format!(r#"{{"success":false,"error":"{}"}}"#, e) })
        );
        std::process::exit(2);
    }
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = App::new()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    execute_command(cli.command, &app).await
}

async fn execute_command(command: Commands, app: &App) -> anyhow::Result<()> {
    use sharpfix::cli::commands;

    match command {
        // Project management
        Commands::Init(args) => commands::init::execute(args, app).await,
        Commands::Config(args) => commands::config::execute(args, app).await,

        // Diagnostics and fixes
        Commands::Analyze(args) => commands::analyze::execute(args, app).await,
        Commands::Fix(args) => commands::fix::execute(args, app).await,
        Commands::Rename(args) => commands::rename::execute(args, app).await,

        // Source generation
        Commands::Generate(args) => commands::generate::execute(args, app).await,
    }
}
