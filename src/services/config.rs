//! Configuration service for Sharpfix

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::models::config::SharpfixConfig;

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<SharpfixConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
    global_path: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self::with_global_path(root, Self::global_config_path())
    }

    pub fn with_global_path(root: &Path, global_path: PathBuf) -> Self {
        Self {
            root: root.to_path_buf(),
            global_path,
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/sharpfix/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sharpfix")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(".sharpfix").join("config.toml")
    }

    async fn load_from_path(path: &Path) -> Result<Option<SharpfixConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let config = SharpfixConfig::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<SharpfixConfig, ConfigError> {
        let global = Self::load_from_path(&self.global_path).await?.unwrap_or_default();
        if global_only {
            return Ok(global);
        }

        let config = match Self::load_from_path(&self.project_config_path()).await? {
            Some(project) => merge_config(global, project),
            None => global,
        };
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            self.global_path.clone()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "config".to_string(),
                message: format!(
                    "Config already exists: {}. Use --force to overwrite.",
                    path.display()
                ),
            });
        }

        Self::write_default_config(&path).await?;
        Ok(path)
    }
}

/// Project sections replace global ones; the project name falls back to the global one
fn merge_config(base: SharpfixConfig, overlay: SharpfixConfig) -> SharpfixConfig {
    SharpfixConfig {
        project: crate::models::config::ProjectConfig {
            name: overlay.project.name.or(base.project.name),
            ignored_paths: overlay.project.ignored_paths,
            max_file_size_mb: overlay.project.max_file_size_mb,
        },
        analyzer: overlay.analyzer,
        naming: overlay.naming,
        generator: overlay.generator,
        rename: overlay.rename,
        output: overlay.output,
    }
}

fn apply_env_overrides(
    mut config: SharpfixConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> SharpfixConfig {
    if let Some(val) = lookup("SHARPFIX_OUTPUT_FORMAT") {
        config.output.format = val;
    }
    if let Some(val) = lookup("SHARPFIX_MAX_FILE_SIZE_MB")
        && let Ok(limit) = val.parse()
    {
        config.project.max_file_size_mb = limit;
    }
    if let Some(val) = lookup("SHARPFIX_MARKER")
        && !val.is_empty()
    {
        config.generator.marker = val;
    }
    config
}
