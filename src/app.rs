//! Application container for Sharpfix

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::OutputContext;
use crate::error::ProjectError;
use crate::models::config::SharpfixConfig;
use crate::models::program::ProgramSnapshot;
use crate::services::analyzer::RuleEngine;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::fix::{CodeFixProvider, TypeSuffixFixProvider};
use crate::services::generator::CsvGenerator;
use crate::services::parse::ParseService;
use crate::services::project::{DefaultProjectService, ProjectService};
use crate::services::rename::RenameEngine;
use crate::services::semantic::{SemanticModel, SyntacticSemanticModel};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) project: Arc<dyn ProjectService>,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) config: SharpfixConfig,
    semantic: Arc<dyn SemanticModel>,
    parser: ParseService,
}

impl App {
    pub async fn new() -> anyhow::Result<Self> {
        let root = std::env::current_dir()?;
        Self::at(&root).await
    }

    pub async fn at(root: &Path) -> anyhow::Result<Self> {
        let root = root.to_path_buf();
        tracing::debug!("Initializing Sharpfix at {:?}", root);

        let output = OutputContext::new(root.clone());
        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                SharpfixConfig::default()
            }
        };

        let project = Arc::new(DefaultProjectService::new(&root, &config.project));
        let parser = ParseService::new(config.project.max_file_size_bytes());

        Ok(Self {
            root,
            output,
            project,
            config_service,
            config,
            semantic: Arc::new(SyntacticSemanticModel),
            parser,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SharpfixConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.project.is_initialized()
    }

    pub fn semantic(&self) -> &dyn SemanticModel {
        self.semantic.as_ref()
    }

    /// Discover, read and parse the sources under `paths`
    pub async fn load_program(&self, paths: &[PathBuf]) -> Result<ProgramSnapshot, ProjectError> {
        let files = self.project.discover_sources(paths)?;
        let sources = self.project.load_sources(&files).await;
        let parser = self.parser.clone();

        let program = tokio::task::spawn_blocking(move || parser.parse_program(sources))
            .await
            .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?;
        tracing::debug!("Parsed {} units", program.len());
        Ok(program)
    }

    pub fn rule_engine(&self) -> RuleEngine {
        RuleEngine::new(&self.config)
    }

    pub fn rename_engine(&self) -> RenameEngine {
        RenameEngine::new(Arc::clone(&self.semantic), self.parser.clone())
    }

    pub fn fix_providers(&self) -> Vec<Box<dyn CodeFixProvider>> {
        vec![Box::new(TypeSuffixFixProvider::new(
            self.rename_engine(),
            self.config.naming.required_suffix.clone(),
            self.config.rename.clone(),
        ))]
    }

    pub fn generator(&self) -> CsvGenerator<'_> {
        CsvGenerator::new(self.semantic.as_ref(), &self.config.generator)
    }
}
