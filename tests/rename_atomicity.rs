//! Integration tests for whole-program renames and their failure modes

use std::collections::BTreeSet;
use std::sync::Arc;

use sharpfix::error::{RenameError, ResolveError};
use sharpfix::models::edit::RenameOptions;
use sharpfix::models::program::{ProgramSnapshot, SourceText, UnitId};
use sharpfix::models::symbol::{ReferenceLocation, Symbol};
use sharpfix::models::syntax::{ByteRange, NodeId, Span};
use sharpfix::services::parse::ParseService;
use sharpfix::services::rename::RenameEngine;
use sharpfix::services::semantic::{SemanticModel, SyntacticSemanticModel};
use sharpfix::services::workspace::Workspace;

fn program() -> ProgramSnapshot {
    ParseService::default().parse_program(vec![
        SourceText::new(
            "Person.cs",
            "namespace People\n{\n    // Person keeps its comment\n    public class Person { }\n}",
        ),
        SourceText::new(
            "Use.cs",
            "using People;\nclass Use\n{\n    Person owner = new Person();\n}",
        ),
    ])
}

fn engine(semantic: Arc<dyn SemanticModel>) -> RenameEngine {
    RenameEngine::new(semantic, ParseService::default())
}

fn texts(program: &ProgramSnapshot) -> Vec<String> {
    program.units().iter().map(|u| u.text.clone()).collect()
}

/// Resolves like the syntactic model but loses track of the symbol while
/// collecting references
struct LosesSymbol;

impl SemanticModel for LosesSymbol {
    fn resolve(&self, program: &ProgramSnapshot, unit: UnitId, node: NodeId) -> Option<Symbol> {
        SyntacticSemanticModel.resolve(program, unit, node)
    }

    fn find_all_references(
        &self,
        _program: &ProgramSnapshot,
        symbol: &Symbol,
    ) -> Result<BTreeSet<ReferenceLocation>, ResolveError> {
        Err(ResolveError::UnknownSymbol(symbol.name.clone()))
    }

    fn is_textual(&self, program: &ProgramSnapshot, unit: UnitId, type_node: NodeId) -> bool {
        SyntacticSemanticModel.is_textual(program, unit, type_node)
    }
}

/// Returns every real reference plus one location whose text is not the name
struct StaleLocation;

impl SemanticModel for StaleLocation {
    fn resolve(&self, program: &ProgramSnapshot, unit: UnitId, node: NodeId) -> Option<Symbol> {
        SyntacticSemanticModel.resolve(program, unit, node)
    }

    fn find_all_references(
        &self,
        program: &ProgramSnapshot,
        symbol: &Symbol,
    ) -> Result<BTreeSet<ReferenceLocation>, ResolveError> {
        let mut locations = SyntacticSemanticModel.find_all_references(program, symbol)?;
        locations.insert(ReferenceLocation {
            unit: UnitId(1),
            range: ByteRange::new(0, 5),
            span: Span::new(1, 1, 1, 6),
        });
        Ok(locations)
    }

    fn is_textual(&self, program: &ProgramSnapshot, unit: UnitId, type_node: NodeId) -> bool {
        SyntacticSemanticModel.is_textual(program, unit, type_node)
    }
}

fn person_symbol(engine: &RenameEngine, program: &ProgramSnapshot) -> Symbol {
    let offset = program.units()[0].text.find("Person {").unwrap();
    engine.symbol_at(program, UnitId(0), offset).unwrap()
}

#[test]
fn test_rename_updates_every_unit_and_keeps_trivia() {
    let program = program();
    let engine = engine(Arc::new(SyntacticSemanticModel));
    let symbol = person_symbol(&engine, &program);

    let (renamed, edit) = engine
        .rename(&program, &symbol, "Customer", &RenameOptions::default())
        .unwrap();
    assert_eq!(edit.locations.len(), 3);
    assert_eq!(
        texts(&renamed),
        vec![
            "namespace People\n{\n    // Person keeps its comment\n    public class Customer { }\n}",
            "using People;\nclass Use\n{\n    Customer owner = new Customer();\n}",
        ]
    );
}

#[test]
fn test_rename_to_current_name_changes_nothing() {
    let program = program();
    let engine = engine(Arc::new(SyntacticSemanticModel));
    let symbol = person_symbol(&engine, &program);

    let (renamed, edit) = engine
        .rename(&program, &symbol, "Person", &RenameOptions::default())
        .unwrap();
    assert!(edit.is_noop());
    assert!(renamed.same_text(&program));

    let (again, _) = engine
        .rename(&renamed, &person_symbol(&engine, &renamed), "Person", &RenameOptions::default())
        .unwrap();
    assert!(again.same_text(&program));
}

#[test]
fn test_resolution_failure_leaves_program_unchanged() {
    let program = program();
    let before = texts(&program);
    let engine = engine(Arc::new(LosesSymbol));
    let symbol = person_symbol(&engine, &program);

    let err = engine
        .rename(&program, &symbol, "Customer", &RenameOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        RenameError::Resolve(ResolveError::UnknownSymbol("Person".to_string()))
    );
    assert_eq!(texts(&program), before);
}

#[test]
fn test_one_bad_location_rejects_the_whole_rename() {
    let workspace = Workspace::new(program());
    let before = texts(&workspace.snapshot());
    let engine = engine(Arc::new(StaleLocation));

    let outcome = workspace.edit_with(|program| {
        let symbol = person_symbol(&engine, program);
        engine.rename(program, &symbol, "Customer", &RenameOptions::default())
    });
    assert!(!outcome.is_applied());
    assert_eq!(texts(&workspace.snapshot()), before);
}

#[test]
fn test_invalid_names_are_rejected() {
    let program = program();
    let engine = engine(Arc::new(SyntacticSemanticModel));
    let symbol = person_symbol(&engine, &program);

    for name in ["", "1Person", "class", "Per son"] {
        assert_eq!(
            engine
                .rename(&program, &symbol, name, &RenameOptions::default())
                .unwrap_err(),
            RenameError::InvalidName(name.to_string())
        );
    }
}

#[test]
fn test_local_rename_leaves_fields_and_shadowing_lambdas_alone() {
    let source = "class C { int x; void M() { var x = 1; x++; Func<int,int> f = x => x + 1; this.x = x; } }";
    let program = ParseService::default().parse_program(vec![SourceText::new("C.cs", source)]);
    let engine = engine(Arc::new(SyntacticSemanticModel));

    let local = engine
        .symbol_at(&program, UnitId(0), source.find("var x").unwrap() + 4)
        .unwrap();
    let (renamed, edit) = engine
        .rename(&program, &local, "count", &RenameOptions::default())
        .unwrap();
    assert_eq!(edit.locations.len(), 3);
    assert_eq!(
        texts(&renamed),
        vec!["class C { int x; void M() { var count = 1; count++; Func<int,int> f = x => x + 1; this.x = count; } }"]
    );

    let parameter = engine
        .symbol_at(&program, UnitId(0), source.find("x =>").unwrap())
        .unwrap();
    let (renamed, _) = engine
        .rename(&program, &parameter, "value", &RenameOptions::default())
        .unwrap();
    assert_eq!(
        texts(&renamed),
        vec!["class C { int x; void M() { var x = 1; x++; Func<int,int> f = value => value + 1; this.x = x; } }"]
    );
}

#[test]
fn test_partial_type_rename_covers_every_part() {
    let program = ParseService::default().parse_program(vec![
        SourceText::new("A.cs", "public partial class Home : Controller { }"),
        SourceText::new("B.cs", "public partial class Home { Home Self() => this; }"),
    ]);
    let engine = engine(Arc::new(SyntacticSemanticModel));
    let symbol = engine
        .symbol_at(&program, UnitId(1), "public partial class ".len())
        .unwrap();

    let (renamed, _) = engine
        .rename(&program, &symbol, "HomeController", &RenameOptions::default())
        .unwrap();
    assert_eq!(
        texts(&renamed),
        vec![
            "public partial class HomeController : Controller { }",
            "public partial class HomeController { HomeController Self() => this; }",
        ]
    );
}
