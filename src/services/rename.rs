//! Whole-program rename
//!
//! A rename is planned against one immutable snapshot: every reference is
//! collected and checked before any text is produced, and the result is a new
//! snapshot sharing all untouched units. Either every location is rewritten
//! or the caller gets an error and keeps the snapshot it passed in.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{RenameError, ResolveError};
use crate::models::edit::{RenameEdit, RenameOptions};
use crate::models::program::{ProgramSnapshot, SourceUnit, UnitId};
use crate::models::symbol::{ReferenceLocation, Symbol};
use crate::models::syntax::SyntaxKind;
use crate::services::parse::ParseService;
use crate::services::semantic::{SemanticModel, declaration_kind, declaration_name, declared_name_text};

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^@?[\p{L}\p{Nl}_][\p{L}\p{Nl}\p{Nd}\p{Mn}\p{Mc}\p{Pc}\p{Cf}]*$").ok());

/// Reserved words that need a verbatim `@` to be used as identifiers
const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

pub fn is_valid_identifier(name: &str) -> bool {
    let Some(pattern) = IDENTIFIER.as_ref() else {
        return false;
    };
    pattern.is_match(name) && (name.starts_with('@') || !KEYWORDS.contains(&name))
}

/// Strip every case-insensitive occurrence of `suffix`, then append it once
///
/// A name that is nothing but the suffix becomes exactly the suffix.
pub fn suffixed_name(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return name.to_string();
    }
    let stripped = match Regex::new(&format!("(?i){}", regex::escape(suffix))) {
        Ok(pattern) => pattern.replace_all(name, "").into_owned(),
        Err(_) => name.to_string(),
    };
    format!("{stripped}{suffix}")
}

#[derive(Clone)]
pub struct RenameEngine {
    semantic: Arc<dyn SemanticModel>,
    parser: ParseService,
}

impl RenameEngine {
    pub fn new(semantic: Arc<dyn SemanticModel>, parser: ParseService) -> Self {
        Self { semantic, parser }
    }

    pub fn semantic(&self) -> &dyn SemanticModel {
        self.semantic.as_ref()
    }

    /// Rename `symbol` everywhere it is referenced
    pub fn rename(
        &self,
        program: &ProgramSnapshot,
        symbol: &Symbol,
        new_name: &str,
        options: &RenameOptions,
    ) -> Result<(ProgramSnapshot, RenameEdit), RenameError> {
        tracing::debug!(
            "Renaming {} '{}' to '{}' ({:?})",
            symbol.kind,
            symbol.name,
            new_name,
            options
        );
        if !is_valid_identifier(new_name) {
            return Err(RenameError::InvalidName(new_name.to_string()));
        }

        let locations = self.semantic.find_all_references(program, symbol)?;
        let edit = RenameEdit {
            symbol: symbol.clone(),
            old_name: symbol.name.clone(),
            new_name: new_name.to_string(),
            locations,
        };

        let snapshot = self.apply(program, &edit)?;
        tracing::info!(
            "Renamed '{}' to '{}' at {} locations",
            edit.old_name,
            edit.new_name,
            edit.locations.len()
        );
        Ok((snapshot, edit))
    }

    /// Produce the edited snapshot, or reject without touching anything
    pub fn apply(
        &self,
        program: &ProgramSnapshot,
        edit: &RenameEdit,
    ) -> Result<ProgramSnapshot, RenameError> {
        let mut by_unit: BTreeMap<UnitId, Vec<ReferenceLocation>> = BTreeMap::new();
        for loc in &edit.locations {
            by_unit.entry(loc.unit).or_default().push(*loc);
        }

        let mut planned: Vec<(&SourceUnit, Vec<(ReferenceLocation, bool)>)> = Vec::new();
        for (unit_id, locations) in by_unit {
            let unit = program
                .unit(unit_id)
                .ok_or_else(|| ResolveError::UnknownSymbol(edit.old_name.clone()))?;
            planned.push((unit, validate_locations(unit, &locations, &edit.old_name)?));
        }

        let bare = edit.new_name.trim_start_matches('@');
        if bare == edit.old_name {
            return Ok(program.clone());
        }
        let forced_verbatim = edit.new_name.starts_with('@');

        let replacements = planned
            .into_iter()
            .map(|(unit, locations)| {
                let mut text = unit.text.clone();
                for (loc, verbatim) in locations.iter().rev() {
                    let replacement = if *verbatim || forced_verbatim {
                        format!("@{bare}")
                    } else {
                        bare.to_string()
                    };
                    text.replace_range(loc.range.start..loc.range.end, &replacement);
                }
                tracing::debug!(
                    "Rewrote {} occurrences in {}",
                    locations.len(),
                    unit.path.display()
                );
                Arc::new(self.parser.reparse(unit, text))
            })
            .collect();

        Ok(program.with_replaced(replacements))
    }

    /// Symbol declared or referenced by the identifier at `offset`
    pub fn symbol_at(
        &self,
        program: &ProgramSnapshot,
        unit_id: UnitId,
        offset: usize,
    ) -> Result<Symbol, ResolveError> {
        let unit = program
            .unit(unit_id)
            .ok_or_else(|| ResolveError::NoDeclaration {
                location: format!("unit {}", unit_id.0),
            })?;
        let tree = unit
            .tree()
            .ok_or_else(|| ResolveError::UnitNotParsed(unit.path.clone()))?;
        let not_found = || ResolveError::NoDeclaration {
            location: format!("{}@{}", unit.path.display(), offset),
        };

        let ident = tree
            .token_at(offset)
            .filter(|&n| tree.kind(n) == SyntaxKind::Identifier)
            .ok_or_else(not_found)?;

        if let Some(parent) = tree.parent(ident)
            && declaration_name(tree, parent) == Some(ident)
            && let Some(symbol) = self.semantic.resolve(program, unit_id, parent)
        {
            return Ok(symbol);
        }

        let node = tree.node(ident);
        let site = ReferenceLocation {
            unit: unit_id,
            range: node.range,
            span: node.span,
        };
        let name = tree.token(ident).map(|t| t.value_text()).unwrap_or_default();

        for (candidate_unit, candidate_tree) in program.parsed_units() {
            let candidates = candidate_tree
                .descendants(candidate_tree.root())
                .filter(|&n| declaration_kind(candidate_tree, n).is_some())
                .filter(|&n| declared_name_text(candidate_tree, n).as_deref() == Some(name));
            for decl in candidates {
                let Some(symbol) = self.semantic.resolve(program, candidate_unit.id, decl) else {
                    continue;
                };
                if self
                    .semantic
                    .find_all_references(program, &symbol)?
                    .contains(&site)
                {
                    return Ok(symbol);
                }
            }
        }
        Err(not_found())
    }
}

/// Check every location of one unit; returns them in order with a flag for
/// verbatim (`@name`) occurrences
fn validate_locations(
    unit: &SourceUnit,
    locations: &[ReferenceLocation],
    old_name: &str,
) -> Result<Vec<(ReferenceLocation, bool)>, RenameError> {
    let mut checked = Vec::with_capacity(locations.len());
    let mut previous_end = 0;

    for loc in locations {
        if loc.range.start < previous_end {
            return Err(RenameError::OverlappingEdits(unit.path.clone()));
        }
        let found = unit
            .text
            .get(loc.range.start..loc.range.end)
            .ok_or_else(|| RenameError::StaleReference {
                path: unit.path.clone(),
                expected: old_name.to_string(),
                found: format!("<bytes {}..{}>", loc.range.start, loc.range.end),
            })?;
        let verbatim = found.starts_with('@');
        if found.trim_start_matches('@') != old_name {
            return Err(RenameError::StaleReference {
                path: unit.path.clone(),
                expected: old_name.to_string(),
                found: found.to_string(),
            });
        }
        previous_end = loc.range.end;
        checked.push((*loc, verbatim));
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::program::SourceText;
    use crate::models::syntax::{ByteRange, Span};
    use crate::services::semantic::SyntacticSemanticModel;
    use std::collections::BTreeSet;

    fn engine() -> RenameEngine {
        RenameEngine::new(Arc::new(SyntacticSemanticModel), ParseService::default())
    }

    fn program(sources: &[(&str, &str)]) -> ProgramSnapshot {
        ParseService::default().parse_program(
            sources
                .iter()
                .map(|(path, text)| SourceText::new(*path, *text))
                .collect(),
        )
    }

    fn symbol_named(engine: &RenameEngine, program: &ProgramSnapshot, name: &str) -> Symbol {
        let unit = &program.units()[0];
        let offset = unit.text.find(name).unwrap();
        engine.symbol_at(program, unit.id, offset).unwrap()
    }

    #[test]
    fn test_suffixed_name() {
        assert_eq!(suffixed_name("Home", "Controller"), "HomeController");
        assert_eq!(suffixed_name("HomeController", "Controller"), "HomeController");
        assert_eq!(suffixed_name("Homecontroller", "Controller"), "HomeController");
        assert_eq!(suffixed_name("CONTROLLERHomeController", "Controller"), "HomeController");
        assert_eq!(suffixed_name("controller", "Controller"), "Controller");
        assert_eq!(suffixed_name("", "Controller"), "Controller");
    }

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("HomeController"));
        assert!(is_valid_identifier("_x1"));
        assert!(is_valid_identifier("@class"));
        assert!(is_valid_identifier("Größe"));
        assert!(!is_valid_identifier("class"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_rename_type_across_units_preserves_trivia() {
        let program = program(&[
            ("Home.cs", "class Home /* keep */ : Controller\n{\n    public Home() { }\n}"),
            ("Use.cs", "class User\n{\n    Home   h = new Home();\n}"),
        ]);
        let engine = engine();
        let symbol = symbol_named(&engine, &program, "Home");

        let (renamed, edit) = engine
            .rename(&program, &symbol, "HomeController", &RenameOptions::default())
            .unwrap();
        assert_eq!(edit.locations.len(), 4);
        assert_eq!(edit.changes_by_unit(), vec![(UnitId(0), 2), (UnitId(1), 2)]);
        assert_eq!(
            renamed.units()[0].text,
            "class HomeController /* keep */ : Controller\n{\n    public HomeController() { }\n}"
        );
        assert_eq!(
            renamed.units()[1].text,
            "class User\n{\n    HomeController   h = new HomeController();\n}"
        );
        assert!(renamed.units()[1].tree().is_some());
        // the input snapshot is untouched
        assert!(program.units()[0].text.starts_with("class Home /*"));
    }

    #[test]
    fn test_rename_to_same_name_changes_nothing() {
        let program = program(&[("A.cs", "class A { void M() { var item = 1; Use(item); } }")]);
        let engine = engine();
        let symbol = symbol_named(&engine, &program, "item");
        let (renamed, edit) = engine
            .rename(&program, &symbol, "item", &RenameOptions::default())
            .unwrap();
        assert!(edit.is_noop());
        assert!(renamed.same_text(&program));
    }

    #[test]
    fn test_symbol_at_reference_site() {
        let source = "class A { void M() { var item = 1; Use(item); } }";
        let program = program(&[("A.cs", source)]);
        let engine = engine();
        let offset = source.rfind("item").unwrap();
        let symbol = engine.symbol_at(&program, UnitId(0), offset).unwrap();
        assert_eq!(symbol.name, "item");
        assert_eq!(symbol.declaration.range.start, source.find("item").unwrap());
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let program = program(&[("A.cs", "class A {}")]);
        let engine = engine();
        let symbol = symbol_named(&engine, &program, "A");
        let err = engine
            .rename(&program, &symbol, "class", &RenameOptions::default())
            .unwrap_err();
        assert_eq!(err, RenameError::InvalidName("class".to_string()));
    }

    #[test]
    fn test_verbatim_occurrence_keeps_prefix() {
        let source = "class A { void M() { var @value = 1; Use(value); } }";
        let program = program(&[("A.cs", source)]);
        let engine = engine();
        let symbol = symbol_named(&engine, &program, "value");
        let (renamed, _) = engine
            .rename(&program, &symbol, "amount", &RenameOptions::default())
            .unwrap();
        assert_eq!(
            renamed.units()[0].text,
            "class A { void M() { var @amount = 1; Use(amount); } }"
        );
    }

    struct StaleModel {
        extra: ReferenceLocation,
    }

    impl SemanticModel for StaleModel {
        fn resolve(&self, program: &ProgramSnapshot, unit: UnitId, node: crate::models::syntax::NodeId) -> Option<Symbol> {
            SyntacticSemanticModel.resolve(program, unit, node)
        }

        fn find_all_references(
            &self,
            program: &ProgramSnapshot,
            symbol: &Symbol,
        ) -> Result<BTreeSet<ReferenceLocation>, ResolveError> {
            let mut refs = SyntacticSemanticModel.find_all_references(program, symbol)?;
            refs.insert(self.extra);
            Ok(refs)
        }

        fn is_textual(&self, _: &ProgramSnapshot, _: UnitId, _: crate::models::syntax::NodeId) -> bool {
            false
        }
    }

    #[test]
    fn test_one_bad_location_rejects_the_whole_rename() {
        let program = program(&[
            ("A.cs", "class Alpha { }"),
            ("B.cs", "class Beta { Alpha a; }"),
        ]);
        let stale = StaleModel {
            extra: ReferenceLocation {
                unit: UnitId(1),
                range: ByteRange::new(6, 10),
                span: Span {
                    start_line: 1,
                    start_col: 7,
                    end_line: 1,
                    end_col: 11,
                },
            },
        };
        let engine = RenameEngine::new(Arc::new(stale), ParseService::default());
        let symbol = engine.symbol_at(&program, UnitId(0), 6).unwrap();

        let err = engine
            .rename(&program, &symbol, "Omega", &RenameOptions::default())
            .unwrap_err();
        assert!(err.is_stale());
        assert_eq!(program.units()[0].text, "class Alpha { }");
        assert_eq!(program.units()[1].text, "class Beta { Alpha a; }");
    }

    #[test]
    fn test_unresolvable_symbol_is_rejected() {
        let program = program(&[("A.cs", "class Alpha { }")]);
        let engine = engine();
        let symbol = symbol_named(&engine, &program, "Alpha");
        let moved = self::program(&[("A.cs", "// nothing here")]);
        let err = engine
            .rename(&moved, &symbol, "Omega", &RenameOptions::default())
            .unwrap_err();
        assert!(matches!(err, RenameError::Resolve(_)));
    }
}
