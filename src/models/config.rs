//! Configuration model for Sharpfix
//!
//! Every section defaults sensibly, so an empty or partial TOML file loads.

use serde::{Deserialize, Serialize};

use super::edit::RenameOptions;

/// Sharpfix configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SharpfixConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub rename: RenameOptions,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: Option<String>,

    /// Paths to ignore
    #[serde(default = "default_ignored_paths")]
    pub ignored_paths: Vec<String>,

    /// Larger sources become failed units; 0 disables the limit
    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            ignored_paths: default_ignored_paths(),
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

impl ProjectConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        if self.max_file_size_mb == 0 {
            u64::MAX
        } else {
            self.max_file_size_mb as u64 * 1024 * 1024
        }
    }
}

fn default_ignored_paths() -> Vec<String> {
    vec![
        "bin".to_string(),
        "obj".to_string(),
        ".git".to_string(),
        ".vs".to_string(),
        "packages".to_string(),
        "node_modules".to_string(),
        ".sharpfix".to_string(),
    ]
}

/// Rule engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyzerConfig {
    /// Rule names to skip (`short-local`, `short-foreach`, `type-suffix`)
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Also analyze generated files (`*.g.cs`, `<auto-generated>` headers)
    #[serde(default)]
    pub analyze_generated: bool,
}

impl AnalyzerConfig {
    pub fn is_rule_enabled(&self, rule: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == rule)
    }
}

/// Type-name suffix rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default = "defaults::base_types")]
    pub base_types: Vec<String>,

    #[serde(default = "defaults::required_suffix")]
    pub required_suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            base_types: defaults::base_types(),
            required_suffix: defaults::required_suffix(),
        }
    }
}

/// CSV serializer generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Attribute name that opts a class into generation
    #[serde(default = "defaults::marker")]
    pub marker: String,

    /// Namespace of the generated code
    #[serde(default = "defaults::namespace")]
    pub namespace: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            marker: defaults::marker(),
            namespace: defaults::namespace(),
        }
    }
}

mod defaults {
    // Naming
    pub fn base_types() -> Vec<String> {
        vec!["Controller".to_string(), "ApiController".to_string()]
    }
    pub fn required_suffix() -> String {
        "Controller".to_string()
    }

    // Generator
    pub fn marker() -> String {
        "CsvSerializable".to_string()
    }
    pub fn namespace() -> String {
        "CsvSerializer".to_string()
    }

    // Project
    pub fn max_file_size_mb() -> u32 {
        5
    }

    // Output
    pub fn format() -> String {
        "json".to_string()
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}
