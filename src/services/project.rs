//! Project service for Sharpfix
//!
//! Owns everything that touches the file system: project initialization,
//! source discovery and loading, and writing edited or generated units back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::{ParseError, ProjectError};
use crate::infra::file_filter::{CSHARP_EXTENSIONS, FileFilter, FileFilterConfig};
use crate::models::config::{ProjectConfig, SharpfixConfig};
use crate::models::edit::FileChange;
use crate::models::generated::GeneratedUnit;
use crate::models::program::{ProgramSnapshot, SourceText, UnitId};

/// Files read concurrently while loading sources
const LOAD_CONCURRENCY: usize = 32;

#[async_trait]
pub trait ProjectService: Send + Sync {
    /// Initialize a new project
    async fn init(&self, name: Option<&str>, force: bool) -> Result<ProjectInfo, ProjectError>;

    /// Check if project is initialized
    fn is_initialized(&self) -> bool;

    /// C# files under the given paths (the project root when empty), sorted
    fn discover_sources(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, ProjectError>;

    /// Read sources in input order; unreadable files become failed units
    async fn load_sources(&self, files: &[PathBuf]) -> Vec<SourceText>;

    /// Write the given units of `program` back to disk with their edit counts
    async fn write_changes(
        &self,
        program: &ProgramSnapshot,
        changes: &[(UnitId, usize)],
    ) -> Result<Vec<FileChange>, ProjectError>;

    /// Write generated units into `out_dir`, one file per key
    async fn write_generated(
        &self,
        out_dir: &Path,
        units: &[GeneratedUnit],
    ) -> Result<Vec<PathBuf>, ProjectError>;
}

/// Project information
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub name: String,
    pub root: PathBuf,
    pub source_count: usize,
    pub config_path: PathBuf,
}

/// Default project service
pub struct DefaultProjectService {
    root: PathBuf,
    ignored_paths: Vec<String>,
}

impl DefaultProjectService {
    pub fn new(root: &Path, config: &ProjectConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            ignored_paths: config.ignored_paths.clone(),
        }
    }

    fn sharpfix_dir(&self) -> PathBuf {
        self.root.join(".sharpfix")
    }

    fn config_path(&self) -> PathBuf {
        self.sharpfix_dir().join("config.toml")
    }

    fn filter_for(&self, dir: &Path) -> FileFilter {
        FileFilter::new(FileFilterConfig {
            root: dir.to_path_buf(),
            ignore_patterns: self.ignored_paths.clone(),
            ..Default::default()
        })
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Unit path as reported to users: relative to the root when possible
    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    async fn read_source(&self, path: &Path) -> SourceText {
        let display = self.display_path(path);
        let unreadable = |message: String| {
            SourceText::failed(
                display.clone(),
                ParseError::Unreadable {
                    path: display.clone(),
                    message,
                },
            )
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => SourceText::new(display.clone(), text),
                Err(_) => unreadable("not valid UTF-8".to_string()),
            },
            Err(e) => unreadable(e.to_string()),
        }
    }
}

#[async_trait]
impl ProjectService for DefaultProjectService {
    async fn init(&self, name: Option<&str>, force: bool) -> Result<ProjectInfo, ProjectError> {
        let sharpfix_dir = self.sharpfix_dir();

        if sharpfix_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(self.root.clone()));
        }

        tokio::fs::create_dir_all(&sharpfix_dir).await?;

        let project_name = name
            .map(|n| n.to_string())
            .or_else(|| {
                self.root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "unnamed".to_string());

        let config = SharpfixConfig {
            project: ProjectConfig {
                name: Some(project_name.clone()),
                ignored_paths: self.ignored_paths.clone(),
                ..Default::default()
            },
            ..Default::default()
        };

        let content = toml::to_string_pretty(&config)
            .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?;
        tokio::fs::write(self.config_path(), content).await?;

        let source_count = self.discover_sources(&[]).map(|f| f.len()).unwrap_or(0);
        Ok(ProjectInfo {
            name: project_name,
            root: self.root.clone(),
            source_count,
            config_path: self.config_path(),
        })
    }

    fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    fn discover_sources(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, ProjectError> {
        let roots: Vec<PathBuf> = if paths.is_empty() {
            vec![self.root.clone()]
        } else {
            paths.iter().map(|p| self.absolute(p)).collect()
        };

        let mut files = Vec::new();
        for root in &roots {
            if root.is_file() {
                files.push(root.clone());
            } else if root.is_dir() {
                files.extend(self.filter_for(root).discover_files(CSHARP_EXTENSIONS));
            } else {
                return Err(ProjectError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Path not found: {}", root.display()),
                )));
            }
        }
        files.sort();
        files.dedup();

        if files.is_empty() {
            return Err(ProjectError::NoSources(
                roots.first().cloned().unwrap_or_else(|| self.root.clone()),
            ));
        }
        tracing::debug!("Discovered {} C# files", files.len());
        Ok(files)
    }

    async fn load_sources(&self, files: &[PathBuf]) -> Vec<SourceText> {
        let reads: Vec<_> = files.iter().map(|path| self.read_source(path)).collect();
        stream::iter(reads)
            .buffered(LOAD_CONCURRENCY)
            .collect()
            .await
    }

    async fn write_changes(
        &self,
        program: &ProgramSnapshot,
        changes: &[(UnitId, usize)],
    ) -> Result<Vec<FileChange>, ProjectError> {
        let mut staged = Vec::new();
        for &(unit_id, edit_count) in changes {
            let Some(unit) = program.unit(unit_id) else {
                continue;
            };
            let target = self.absolute(&unit.path);
            let temp = target.with_extension("cs.sharpfix-tmp");
            if let Err(e) = tokio::fs::write(&temp, &unit.text).await {
                for (_, staged_temp, _) in &staged {
                    let _ = tokio::fs::remove_file(staged_temp).await;
                }
                return Err(e.into());
            }
            staged.push((target, temp, FileChange {
                file: unit.path.clone(),
                edit_count,
            }));
        }

        let mut committed: Vec<FileChange> = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();
        while let Some((target, temp, change)) = pending.next() {
            if let Err(source) = tokio::fs::rename(&temp, &target).await {
                let _ = tokio::fs::remove_file(&temp).await;
                for (_, rest, _) in pending {
                    let _ = tokio::fs::remove_file(&rest).await;
                }
                tracing::warn!(
                    "Write of {} failed after {} file(s) were replaced",
                    change.file.display(),
                    committed.len()
                );
                return Err(ProjectError::PartialWrite {
                    failed: change.file,
                    committed: committed.into_iter().map(|c| c.file).collect(),
                    source,
                });
            }
            committed.push(change);
        }
        Ok(committed)
    }

    async fn write_generated(
        &self,
        out_dir: &Path,
        units: &[GeneratedUnit],
    ) -> Result<Vec<PathBuf>, ProjectError> {
        let out_dir = self.absolute(out_dir);
        tokio::fs::create_dir_all(&out_dir).await?;

        let mut written = Vec::with_capacity(units.len());
        for unit in units {
            let path = out_dir.join(&unit.key);
            tokio::fs::write(&path, &unit.text).await?;
            written.push(self.display_path(&path));
        }
        Ok(written)
    }
}
