//! Location parsing for CLI commands

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone)]
pub struct ParsedLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl ParsedLocation {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Location cannot be empty");
        }

        let (file_part, rest) = Self::split_path_and_position(input)?;
        let file = PathBuf::from(file_part);
        let (line, column) = Self::parse_position(rest)?;

        Ok(Self { file, line, column })
    }

    fn split_path_and_position(input: &str) -> Result<(&str, &str)> {
        let is_windows = input.len() > 2
            && input.as_bytes().get(1) == Some(&b':')
            && input.as_bytes().first().map(|b| b.is_ascii_alphabetic()) == Some(true);

        let search_start = if is_windows { 2 } else { 0 };
        let search_range = &input[search_start..];

        let mut potential_splits: Vec<(usize, bool)> = Vec::new(); // (position, is_negative)
        for (byte_idx, ch) in search_range.char_indices() {
            if ch == ':' {
                let abs_pos = search_start + byte_idx;
                let after = &input[abs_pos + 1..];
                let first_char = after.chars().next();
                match first_char {
                    Some(c) if c.is_ascii_digit() => potential_splits.push((abs_pos, false)),
                    Some('-') => potential_splits.push((abs_pos, true)),
                    _ => {}
                }
            }
        }

        if potential_splits.is_empty() {
            bail!(
                "Invalid location format. Expected: file:line[:column]\nExample: src/Home.cs:10:5"
            )
        }

        let (split_pos, is_negative) = potential_splits[0];
        if is_negative {
            bail!(
                "Invalid line number: negative values not allowed. Line numbers are 1-indexed positive integers.\nExample: src/Home.cs:10:5"
            )
        }

        Ok((&input[..split_pos], &input[split_pos + 1..]))
    }

    fn parse_position(rest: &str) -> Result<(u32, u32)> {
        let parts: Vec<&str> = rest.splitn(2, ':').collect();

        let line_str = parts.first().unwrap_or(&"");
        let line: u32 = line_str.parse().map_err(|_| {
            anyhow::anyhow!(
                "Invalid line number '{}': must be a positive integer (1-indexed)",
                line_str
            )
        })?;

        let column: u32 = if let Some(col_str) = parts.get(1) {
            col_str.parse().map_err(|_| {
                anyhow::anyhow!(
                    "Invalid column number '{}': must be a positive integer (1-indexed)",
                    col_str
                )
            })?
        } else {
            1
        };

        if line == 0 {
            bail!("Line number must be >= 1 (got 0). Line numbers are 1-indexed.");
        }
        if column == 0 {
            bail!("Column number must be >= 1 (got 0). Column numbers are 1-indexed.");
        }

        Ok((line, column))
    }

    /// Path of the location relative to `root`, as units are keyed
    ///
    /// Absolute paths outside `root` are rejected; `.` components are dropped.
    pub fn unit_path(&self, root: &Path) -> Result<PathBuf> {
        let relative = if self.file.is_absolute() {
            let root = root
                .canonicalize()
                .context("Failed to resolve project root")?;
            let file = self
                .file
                .canonicalize()
                .map_err(|_| anyhow::anyhow!("File not found: {}", self.file.display()))?;
            file.strip_prefix(&root)
                .map(Path::to_path_buf)
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Access denied: {} is outside project boundary",
                        self.file.display()
                    )
                })?
        } else {
            self.file.clone()
        };

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            bail!(
                "Access denied: {} is outside project boundary",
                self.file.display()
            );
        }

        Ok(relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect())
    }
}

impl std::fmt::Display for ParsedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_location() {
        let loc = ParsedLocation::parse("src/Home.cs:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("src/Home.cs"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_parse_without_column() {
        let loc = ParsedLocation::parse("src/Home.cs:10").unwrap();
        assert_eq!(loc.file, PathBuf::from("src/Home.cs"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 1);
    }

    #[test]
    fn test_parse_absolute_path() {
        let loc = ParsedLocation::parse("/Users/test/src/Home.cs:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("/Users/test/src/Home.cs"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_parse_unicode_path() {
        let loc = ParsedLocation::parse("/tmp/한글_테스트.cs:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("/tmp/한글_테스트.cs"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ParsedLocation::parse("invalid").is_err());
        assert!(ParsedLocation::parse("File.cs").is_err());
        assert!(ParsedLocation::parse("File.cs:0:1").is_err());
        assert!(ParsedLocation::parse("").is_err());
    }

    #[test]
    fn test_parse_negative_line() {
        let err = ParsedLocation::parse("File.cs:-5:1").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_parse_negative_column() {
        let err = ParsedLocation::parse("File.cs:5:-1").unwrap_err();
        assert!(err.to_string().contains("negative") || err.to_string().contains("Invalid"));
    }

    #[test]
    fn test_display() {
        let loc = ParsedLocation::parse("src/Home.cs:10:5").unwrap();
        assert_eq!(loc.to_string(), "src/Home.cs:10:5");
    }

    #[test]
    fn test_parse_windows_path() {
        let loc = ParsedLocation::parse("C:\\Users\\test\\File.cs:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("C:\\Users\\test\\File.cs"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_unit_path_drops_current_dir() {
        let loc = ParsedLocation::parse("./src/Home.cs:3:14").unwrap();
        assert_eq!(
            loc.unit_path(Path::new("/project")).unwrap(),
            PathBuf::from("src/Home.cs")
        );
    }

    #[test]
    fn test_unit_path_rejects_parent_dir() {
        let loc = ParsedLocation::parse("../other/A.cs:1:1").unwrap();
        assert!(loc.unit_path(Path::new("/project")).is_err());
    }

    #[test]
    fn test_unit_path_for_absolute_file_in_root() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/A.cs"), "class A {}").unwrap();
        let input = format!("{}:1:7", dir.path().join("src/A.cs").display());

        let loc = ParsedLocation::parse(&input).unwrap();
        assert_eq!(loc.unit_path(dir.path()).unwrap(), PathBuf::from("src/A.cs"));
    }
}
