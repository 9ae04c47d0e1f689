//! Code fixes for diagnostics
//!
//! A provider turns a diagnostic into [`CodeAction`]s. Applying an action
//! re-derives everything from the snapshot it is given, so a stale diagnostic
//! is rejected rather than applied to the wrong place.

use std::fmt;
use std::sync::Arc;

use crate::error::{RenameError, ResolveError};
use crate::models::diagnostic::Diagnostic;
use crate::models::edit::{RenameEdit, RenameOptions};
use crate::models::program::ProgramSnapshot;
use crate::models::symbol::{Symbol, SymbolKind};
use crate::services::analyzer::TYPE_SUFFIX;
use crate::services::rename::{RenameEngine, suffixed_name};
use crate::services::semantic::find_enclosing_declaration;

/// Result of applying a fix
#[derive(Debug)]
pub enum FixOutcome {
    Applied {
        snapshot: ProgramSnapshot,
        edit: RenameEdit,
    },
    Rejected(RenameError),
}

impl FixOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

type ApplyFn = dyn Fn(&ProgramSnapshot) -> Result<(ProgramSnapshot, RenameEdit), RenameError> + Send + Sync;

/// One registered fix for one diagnostic
#[derive(Clone)]
pub struct CodeAction {
    pub title: String,
    /// Groups equivalent actions across diagnostics
    pub equivalence_key: String,
    pub diagnostic: Diagnostic,
    apply: Arc<ApplyFn>,
}

impl CodeAction {
    pub fn new(
        title: impl Into<String>,
        equivalence_key: impl Into<String>,
        diagnostic: Diagnostic,
        apply: impl Fn(&ProgramSnapshot) -> Result<(ProgramSnapshot, RenameEdit), RenameError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            equivalence_key: equivalence_key.into(),
            diagnostic,
            apply: Arc::new(apply),
        }
    }

    /// Apply against `program`; on rejection `program` is what the caller keeps
    pub fn apply(&self, program: &ProgramSnapshot) -> FixOutcome {
        match (self.apply)(program) {
            Ok((snapshot, edit)) => FixOutcome::Applied { snapshot, edit },
            Err(e) => {
                tracing::warn!("Fix '{}' rejected: {}", self.title, e);
                FixOutcome::Rejected(e)
            }
        }
    }
}

impl fmt::Debug for CodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeAction")
            .field("title", &self.title)
            .field("equivalence_key", &self.equivalence_key)
            .field("diagnostic", &self.diagnostic.id)
            .finish()
    }
}

pub trait CodeFixProvider: Send + Sync {
    fn fixable_diagnostic_ids(&self) -> &[&'static str];

    fn register_fixes(&self, program: &ProgramSnapshot, diagnostic: &Diagnostic) -> Vec<CodeAction>;
}

/// Renames a type so it ends with the required suffix
pub struct TypeSuffixFixProvider {
    engine: RenameEngine,
    suffix: String,
    options: RenameOptions,
}

impl TypeSuffixFixProvider {
    pub fn new(engine: RenameEngine, suffix: impl Into<String>, options: RenameOptions) -> Self {
        Self {
            engine,
            suffix: suffix.into(),
            options,
        }
    }

    pub fn title(&self) -> String {
        format!("Make type name end in '{}'", self.suffix)
    }
}

impl CodeFixProvider for TypeSuffixFixProvider {
    fn fixable_diagnostic_ids(&self) -> &[&'static str] {
        &[TYPE_SUFFIX.id]
    }

    fn register_fixes(&self, _program: &ProgramSnapshot, diagnostic: &Diagnostic) -> Vec<CodeAction> {
        if !self.fixable_diagnostic_ids().contains(&diagnostic.id.as_str()) {
            return Vec::new();
        }

        let engine = self.engine.clone();
        let suffix = self.suffix.clone();
        let options = self.options.clone();
        let target = diagnostic.clone();

        vec![CodeAction::new(
            self.title(),
            "MakeTypeEndInSuffix",
            diagnostic.clone(),
            move |program| {
                let symbol = declared_type_at(&engine, program, &target)?;
                let new_name = suffixed_name(&symbol.name, &suffix);
                engine.rename(program, &symbol, &new_name, &options)
            },
        )]
    }
}

/// Innermost type declaration around the diagnostic, resolved against `program`
fn declared_type_at(
    engine: &RenameEngine,
    program: &ProgramSnapshot,
    diagnostic: &Diagnostic,
) -> Result<Symbol, ResolveError> {
    let location = || ResolveError::NoDeclaration {
        location: format!(
            "{}:{}:{}",
            diagnostic.file_path.display(),
            diagnostic.display_line(),
            diagnostic.display_column()
        ),
    };

    let unit = program
        .unit(diagnostic.unit)
        .filter(|u| u.path == diagnostic.file_path)
        .ok_or_else(location)?;
    let tree = unit
        .tree()
        .ok_or_else(|| ResolveError::UnitNotParsed(unit.path.clone()))?;

    let declaration =
        find_enclosing_declaration(tree, diagnostic.range.start, |k| k == SymbolKind::Type)
            .ok_or_else(location)?;
    engine
        .semantic()
        .resolve(program, unit.id, declaration)
        .ok_or_else(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SharpfixConfig;
    use crate::models::program::SourceText;
    use crate::services::analyzer::RuleEngine;
    use crate::services::parse::ParseService;
    use crate::services::semantic::SyntacticSemanticModel;

    fn provider() -> TypeSuffixFixProvider {
        let engine = RenameEngine::new(Arc::new(SyntacticSemanticModel), ParseService::default());
        TypeSuffixFixProvider::new(engine, "Controller", RenameOptions::default())
    }

    fn lab001(program: &ProgramSnapshot) -> Vec<Diagnostic> {
        RuleEngine::new(&SharpfixConfig::default())
            .analyze(program)
            .into_iter()
            .filter(|d| d.id == "Lab001")
            .collect()
    }

    #[test]
    fn test_fix_renames_declaration_and_references() {
        let program = ParseService::default().parse_program(vec![
            SourceText::new("Home.cs", "public class Home : Controller { }"),
            SourceText::new("Routes.cs", "class Routes { Home home = new Home(); }"),
        ]);
        let diagnostics = lab001(&program);
        assert_eq!(diagnostics.len(), 1);

        let provider = provider();
        let actions = provider.register_fixes(&program, &diagnostics[0]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].title, "Make type name end in 'Controller'");

        let FixOutcome::Applied { snapshot, edit } = actions[0].apply(&program) else {
            panic!("fix was rejected");
        };
        assert_eq!(edit.new_name, "HomeController");
        assert_eq!(
            snapshot.units()[0].text,
            "public class HomeController : Controller { }"
        );
        assert_eq!(
            snapshot.units()[1].text,
            "class Routes { HomeController home = new HomeController(); }"
        );
        assert!(lab001(&snapshot).is_empty());

        // reapplying to the fixed program is a no-op
        let FixOutcome::Applied { snapshot: again, edit } = actions[0].apply(&snapshot) else {
            panic!("reapply was rejected");
        };
        assert!(edit.is_noop());
        assert!(again.same_text(&snapshot));
    }

    #[test]
    fn test_fix_renames_every_part_of_a_partial_type() {
        let program = ParseService::default().parse_program(vec![
            SourceText::new("A.cs", "public partial class Home : Controller { }"),
            SourceText::new("B.cs", "public partial class Home { }"),
        ]);
        let diagnostics = lab001(&program);
        assert_eq!(diagnostics.len(), 1);

        let actions = provider().register_fixes(&program, &diagnostics[0]);
        let FixOutcome::Applied { snapshot, edit } = actions[0].apply(&program) else {
            panic!("fix was rejected");
        };
        assert_eq!(edit.locations.len(), 2);
        assert_eq!(
            snapshot.units()[0].text,
            "public partial class HomeController : Controller { }"
        );
        assert_eq!(snapshot.units()[1].text, "public partial class HomeController { }");
    }

    #[test]
    fn test_miscased_suffix_is_normalized() {
        let program = ParseService::default()
            .parse_program(vec![SourceText::new("A.cs", "class Accountcontroller : Controller { }")]);
        let diagnostics = lab001(&program);
        let actions = provider().register_fixes(&program, &diagnostics[0]);
        let FixOutcome::Applied { snapshot, .. } = actions[0].apply(&program) else {
            panic!("fix was rejected");
        };
        assert_eq!(
            snapshot.units()[0].text,
            "class AccountController : Controller { }"
        );
    }

    #[test]
    fn test_other_diagnostics_are_not_fixable() {
        let program = ParseService::default()
            .parse_program(vec![SourceText::new("A.cs", "class A { void M() { var x = 1; } }")]);
        let diagnostics = RuleEngine::new(&SharpfixConfig::default()).analyze(&program);
        assert_eq!(diagnostics[0].id, "Demo001");
        assert!(provider().register_fixes(&program, &diagnostics[0]).is_empty());
    }

    #[test]
    fn test_stale_diagnostic_is_rejected() {
        let program = ParseService::default()
            .parse_program(vec![SourceText::new("A.cs", "class Home : Controller { }")]);
        let diagnostics = lab001(&program);
        let actions = provider().register_fixes(&program, &diagnostics[0]);

        let emptied = ParseService::default()
            .parse_program(vec![SourceText::new("A.cs", "// removed")]);
        let outcome = actions[0].apply(&emptied);
        assert!(matches!(
            outcome,
            FixOutcome::Rejected(RenameError::Resolve(ResolveError::NoDeclaration { .. }))
        ));
    }
}
