//! Config command implementation
//!
//! Create, show or locate the global and project config files.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::output::OutputContext;
use crate::models::config::SharpfixConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Write the global config (~/.config/sharpfix) instead of the project one
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Global file only, without project settings or env overrides
        #[arg(long)]
        global: bool,
    },

    /// Show where a config file lives
    Path {
        #[arg(long)]
        global: bool,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum ConfigResponse {
    Created {
        level: &'static str,
        path: String,
    },
    Shown {
        level: &'static str,
        config: serde_json::Value,
    },
    Located {
        level: &'static str,
        path: String,
        exists: bool,
    },
}

fn config_to_json(config: &SharpfixConfig) -> serde_json::Value {
    serde_json::to_value(config).unwrap_or_else(|_| serde_json::json!({}))
}

/// Global paths are shown absolute, project paths relative to the root
fn shown_path(ctx: &OutputContext, path: &Path, global: bool) -> String {
    if global {
        path.display().to_string()
    } else {
        ctx.relative_path(path)
    }
}

pub async fn execute(args: ConfigArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let service = &app.config_service;

    let response = match args.command {
        ConfigCommand::Init { global, force } => service
            .init(global, force)
            .await
            .map(|path| ConfigResponse::Created {
                level: if global { "global" } else { "project" },
                path: shown_path(ctx, &path, global),
            }),
        ConfigCommand::Show { global } => {
            service.load(global).await.map(|config| ConfigResponse::Shown {
                level: if global { "global" } else { "merged" },
                config: config_to_json(&config),
            })
        }
        ConfigCommand::Path { global } => {
            let path = service.config_path(global);
            Ok(ConfigResponse::Located {
                level: if global { "global" } else { "project" },
                exists: path.exists(),
                path: shown_path(ctx, &path, global),
            })
        }
    };

    match response {
        Ok(response) => ctx.print_success_flat(response),
        Err(e) => ctx.print_error(&e.to_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_json_has_every_section() {
        let json = config_to_json(&SharpfixConfig::default());
        for section in ["project", "analyzer", "naming", "generator", "rename", "output"] {
            assert!(json.get(section).is_some(), "missing section {section}");
        }
        assert!(json.get("search").is_none());
        assert_eq!(json["project"]["max_file_size_mb"], 5);
        assert_eq!(json["generator"]["marker"], "CsvSerializable");
    }

    #[test]
    fn test_located_response_is_flat() {
        let ctx = OutputContext::new(PathBuf::from("/work"));
        let response = ConfigResponse::Located {
            level: "project",
            path: shown_path(&ctx, Path::new("/work/.sharpfix/config.toml"), false),
            exists: false,
        };
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["path"], ".sharpfix/config.toml");
        assert_eq!(json["exists"], false);
    }
}
