//! Service layer for Sharpfix

pub mod analyzer;
pub mod config;
pub mod fix;
pub mod generator;
pub mod parse;
pub mod project;
pub mod rename;
pub mod semantic;
pub mod workspace;

pub use analyzer::{Rule, RuleEngine};
pub use config::{ConfigService, DefaultConfigService};
pub use fix::{CodeAction, CodeFixProvider, FixOutcome, TypeSuffixFixProvider};
pub use generator::CsvGenerator;
pub use parse::ParseService;
pub use project::{DefaultProjectService, ProjectService};
pub use rename::RenameEngine;
pub use semantic::{SemanticModel, SyntacticSemanticModel};
pub use workspace::Workspace;
