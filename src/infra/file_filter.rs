//! File filtering with .gitignore integration
//!
//! Uses the `ignore` crate (from ripgrep) for gitignore-style pattern matching.
//! Discovery results are sorted so every run sees units in the same order.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// C# source extensions
pub const CSHARP_EXTENSIONS: &[&str] = &["cs"];

/// File filter configuration
#[derive(Debug, Clone)]
pub struct FileFilterConfig {
    /// Root directory for relative path resolution
    pub root: PathBuf,
    /// Use .gitignore files for filtering
    pub respect_gitignore: bool,
    /// Use .sharpfix/ignore file for filtering
    pub respect_sharpfix_ignore: bool,
    /// Additional ignored directory or file names
    pub ignore_patterns: Vec<String>,
    /// Hidden files/directories (starting with .)
    pub include_hidden: bool,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            respect_gitignore: true,
            respect_sharpfix_ignore: true,
            ignore_patterns: Vec::new(),
            include_hidden: false,
        }
    }
}

/// File filter with gitignore integration
pub struct FileFilter {
    config: FileFilterConfig,
    gitignore: Option<Gitignore>,
    sharpfix_ignore: Option<Gitignore>,
}

impl FileFilter {
    pub fn new(config: FileFilterConfig) -> Self {
        let gitignore = if config.respect_gitignore {
            Self::load_gitignore(&config.root)
        } else {
            None
        };

        let sharpfix_ignore = if config.respect_sharpfix_ignore {
            Self::load_sharpfix_ignore(&config.root)
        } else {
            None
        };

        Self {
            config,
            gitignore,
            sharpfix_ignore,
        }
    }

    /// Create a filter that respects .gitignore in the given root
    pub fn with_gitignore(root: impl AsRef<Path>) -> Self {
        Self::new(FileFilterConfig {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    fn load_gitignore(root: &Path) -> Option<Gitignore> {
        let gitignore_path = root.join(".gitignore");
        if !gitignore_path.exists() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&gitignore_path) {
            tracing::warn!("Failed to parse .gitignore: {}", err);
        }
        builder.build().ok()
    }

    fn load_sharpfix_ignore(root: &Path) -> Option<Gitignore> {
        let ignore_path = root.join(".sharpfix").join("ignore");
        if !ignore_path.exists() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&ignore_path) {
            tracing::warn!("Failed to parse .sharpfix/ignore: {}", err);
        }
        builder.build().ok()
    }

    /// Check if a path should be ignored
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.config.root).unwrap_or(path);
        let is_dir = path.is_dir();

        for component in relative.components() {
            if let std::path::Component::Normal(name) = component
                && let Some(name_str) = name.to_str()
            {
                let configured = self.config.ignore_patterns.iter().map(String::as_str);
                for pattern in DEFAULT_IGNORE_PATTERNS.iter().copied().chain(configured) {
                    if let Some(suffix) = pattern.strip_prefix('*') {
                        if name_str.ends_with(suffix) {
                            return true;
                        }
                    } else if name_str == pattern {
                        return true;
                    }
                }

                if !self.config.include_hidden && name_str.starts_with('.') {
                    return true;
                }
            }
        }

        for ignore in [&self.sharpfix_ignore, &self.gitignore].into_iter().flatten() {
            match ignore.matched(relative, is_dir) {
                ignore::Match::Ignore(_) => return true,
                ignore::Match::Whitelist(_) => return false,
                ignore::Match::None => {}
            }
        }

        false
    }

    pub fn should_include(&self, path: &Path) -> bool {
        !self.is_ignored(path)
    }

    pub fn walk_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.config.root);
        builder
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore);
        builder
    }

    /// All matching files under the root, sorted by path
    pub fn discover_files(&self, extensions: &[&str]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .walk_builder()
            .build()
            .filter_map(|e| e.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file())
            .filter(|path| {
                extensions.is_empty()
                    || path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|ext| extensions.contains(&ext))
            })
            .filter(|path| self.should_include(path))
            .collect();
        files.sort();
        files
    }
}

/// Default ignore patterns for .NET projects
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Build outputs
    "bin",
    "obj",
    "artifacts",
    "TestResults",
    // Package caches
    "packages",
    "node_modules",
    // IDE/Editor
    ".vs",
    ".idea",
    ".vscode",
    "*.swp",
    // Sharpfix
    ".sharpfix",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_gitignore_integration() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join(".gitignore"), "Legacy/\n").unwrap();
        fs::write(root.join("Program.cs"), "class P {}").unwrap();
        fs::create_dir(root.join("Legacy")).unwrap();
        fs::write(root.join("Legacy/Old.cs"), "class O {}").unwrap();
        fs::create_dir(root.join("obj")).unwrap();
        fs::write(root.join("obj/Gen.cs"), "class G {}").unwrap();

        let filter = FileFilter::with_gitignore(root);

        assert!(filter.should_include(&root.join("Program.cs")));
        assert!(!filter.should_include(&root.join("Legacy/Old.cs")));
        assert!(!filter.should_include(&root.join("obj/Gen.cs")));
    }

    #[test]
    fn test_discover_only_csharp_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("b.cs"), "class B {}").unwrap();
        fs::write(root.join("a.cs"), "class A {}").unwrap();
        fs::write(root.join("notes.txt"), "text").unwrap();

        let files = FileFilter::with_gitignore(root).discover_files(CSHARP_EXTENSIONS);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.cs", "b.cs"]);
    }

    #[test]
    fn test_sharpfix_ignore_and_configured_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join(".sharpfix")).unwrap();
        fs::write(root.join(".sharpfix/ignore"), "*.Tests.cs\n").unwrap();

        let filter = FileFilter::new(FileFilterConfig {
            root: root.to_path_buf(),
            ignore_patterns: vec!["Migrations".to_string()],
            ..Default::default()
        });

        assert!(filter.is_ignored(&root.join("Person.Tests.cs")));
        assert!(filter.is_ignored(&root.join("Migrations/Init.cs")));
        assert!(!filter.is_ignored(&root.join("Person.cs")));
    }
}
