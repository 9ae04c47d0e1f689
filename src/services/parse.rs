//! Parse service
//!
//! Turns raw source texts into a [`ProgramSnapshot`]. Units are parsed in
//! parallel with one tree-sitter parser per worker; a failing unit keeps its
//! error and never affects its siblings.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::ParseError;
use crate::infra::ast::CSharpParser;
use crate::models::program::{ProgramSnapshot, SourceText, SourceUnit, UnitId};
use crate::models::syntax::SyntaxTree;

#[derive(Debug, Clone)]
pub struct ParseService {
    max_file_size_bytes: u64,
}

impl Default for ParseService {
    fn default() -> Self {
        Self {
            max_file_size_bytes: u64::MAX,
        }
    }
}

impl ParseService {
    pub fn new(max_file_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
        }
    }

    /// Parse every source; unit ids follow input order
    pub fn parse_program(&self, sources: Vec<SourceText>) -> ProgramSnapshot {
        let units: Vec<Arc<SourceUnit>> = sources
            .into_par_iter()
            .enumerate()
            .map_init(CSharpParser::new, |parser, (index, source)| {
                let syntax = match parser {
                    Ok(parser) => self.parse_source(parser, &source),
                    Err(e) => Err(e.clone()),
                };
                if let Err(ref e) = syntax {
                    tracing::warn!("Skipping unit {}: {}", source.path.display(), e);
                }
                Arc::new(SourceUnit::new(
                    UnitId(index as u32),
                    source.path,
                    source.text,
                    syntax,
                ))
            })
            .collect();

        tracing::debug!(
            "Parsed {} units ({} failed)",
            units.len(),
            units.iter().filter(|u| u.syntax.is_err()).count()
        );
        ProgramSnapshot::new(units)
    }

    /// Re-parse one unit with new text, keeping its id and path
    pub fn reparse(&self, unit: &SourceUnit, text: String) -> SourceUnit {
        let source = SourceText::new(unit.path.clone(), text);
        let syntax = CSharpParser::new().and_then(|mut p| self.parse_source(&mut p, &source));
        SourceUnit::new(unit.id, source.path, source.text, syntax)
    }

    fn parse_source(
        &self,
        parser: &mut CSharpParser,
        source: &SourceText,
    ) -> Result<SyntaxTree, ParseError> {
        if let Some(ref e) = source.load_error {
            return Err(e.clone());
        }
        let size = source.text.len() as u64;
        if size > self.max_file_size_bytes {
            return Err(ParseError::FileTooLarge {
                path: source.path.clone(),
                size_mb: size / 1024 / 1024,
                limit_mb: self.max_file_size_bytes / 1024 / 1024,
            });
        }
        parser.parse(&source.path, &source.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_units_keep_input_order() {
        let program = ParseService::default().parse_program(vec![
            SourceText::new("b.cs", "class B {}"),
            SourceText::new("a.cs", "class A {}"),
            SourceText::new("c.cs", "class C {}"),
        ]);
        let paths: Vec<_> = program.units().iter().map(|u| u.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("b.cs"), PathBuf::from("a.cs"), PathBuf::from("c.cs")]
        );
        assert_eq!(program.units()[2].id, UnitId(2));
    }

    #[test]
    fn test_failed_unit_is_isolated() {
        let program = ParseService::new(16).parse_program(vec![
            SourceText::new("small.cs", "class A {}"),
            SourceText::new("large.cs", "class SomethingRatherLong {}"),
            SourceText::failed(
                "gone.cs",
                ParseError::Unreadable {
                    path: PathBuf::from("gone.cs"),
                    message: "permission denied".to_string(),
                },
            ),
        ]);
        assert!(program.units()[0].tree().is_some());
        assert!(matches!(
            program.units()[1].syntax,
            Err(ParseError::FileTooLarge { .. })
        ));
        assert!(matches!(
            program.units()[2].syntax,
            Err(ParseError::Unreadable { .. })
        ));
        assert_eq!(program.parsed_units().count(), 1);
    }

    #[test]
    fn test_empty_source_parses() {
        let program = ParseService::default().parse_program(vec![SourceText::new("e.cs", "")]);
        assert!(program.units()[0].tree().is_some());
    }

    #[test]
    fn test_reparse_keeps_identity() {
        let service = ParseService::default();
        let program = service.parse_program(vec![SourceText::new("a.cs", "class A {}")]);
        let unit = service.reparse(&program.units()[0], "class B {}".to_string());
        assert_eq!(unit.id, UnitId(0));
        assert_eq!(unit.text, "class B {}");
        assert!(unit.tree().is_some());
    }
}
