//! CSV serializer source generator
//!
//! Discovery and extraction read the program through the semantic model;
//! emission is a pure function of the extracted declarations. Regions are
//! rendered in parallel and collected back in discovery order.

pub mod emit;
pub mod runtime;

use rayon::prelude::*;

use crate::models::config::GeneratorConfig;
use crate::models::generated::{
    AnnotatedTypeDeclaration, GeneratedUnit, PropertyDescriptor, TypeClassification,
};
use crate::models::program::{ProgramSnapshot, SourceUnit};
use crate::models::syntax::{NodeId, SyntaxKind, SyntaxTree};
use crate::services::semantic::{SemanticModel, enclosing_namespace};

use emit::{MarkerAttributeTemplate, RegionTemplate, SerializerTemplate};

pub use runtime::{CsvRecord, CsvValue, DeclaredRecord, to_csv};

pub struct CsvGenerator<'a> {
    semantic: &'a dyn SemanticModel,
    config: &'a GeneratorConfig,
}

impl<'a> CsvGenerator<'a> {
    pub fn new(semantic: &'a dyn SemanticModel, config: &'a GeneratorConfig) -> Self {
        Self { semantic, config }
    }

    pub fn attribute_key(&self) -> String {
        format!("{}Attribute.g.cs", self.config.marker)
    }

    pub fn serializer_key(&self) -> String {
        format!("{}.g.cs", self.config.namespace)
    }

    /// Full pass: the marker attribute unit first, then the serializer unit
    pub fn generate(&self, program: &ProgramSnapshot) -> Vec<GeneratedUnit> {
        let declarations = self.discover(program);
        tracing::debug!(
            "Discovered {} [{}] types",
            declarations.len(),
            self.config.marker
        );
        vec![self.marker_unit(), self.emit(&declarations)]
    }

    /// Emitted even when nothing is annotated
    pub fn marker_unit(&self) -> GeneratedUnit {
        GeneratedUnit {
            key: self.attribute_key(),
            text: MarkerAttributeTemplate {
                namespace: &self.config.namespace,
                marker: &self.config.marker,
            }
            .render(),
        }
    }

    /// Annotated class declarations in encounter order across units
    pub fn discover(&self, program: &ProgramSnapshot) -> Vec<AnnotatedTypeDeclaration> {
        program
            .parsed_units()
            .flat_map(|(unit, tree)| {
                tree.descendants(tree.root())
                    .filter(|&n| tree.kind(n) == SyntaxKind::ClassDeclaration)
                    .filter(|&n| has_marker(tree, &unit.text, n, &self.config.marker))
                    .filter_map(|n| self.extract(program, unit, tree, n))
                    .collect::<Vec<_>>()
            })
            .enumerate()
            .map(|(index, mut declaration)| {
                declaration.discovery_index = index;
                declaration
            })
            .collect()
    }

    fn extract(
        &self,
        program: &ProgramSnapshot,
        unit: &SourceUnit,
        tree: &SyntaxTree,
        class: NodeId,
    ) -> Option<AnnotatedTypeDeclaration> {
        let name = written_name(tree, class)?;

        let mut containing_types: Vec<String> = tree
            .ancestors_and_self(class)
            .skip(1)
            .filter(|&a| tree.kind(a).is_type_declaration())
            .filter_map(|a| written_name(tree, a))
            .collect();
        containing_types.reverse();

        let properties = tree
            .first_child_of_kind(class, SyntaxKind::DeclarationList)
            .map(|body| {
                tree.children_of_kind(body, SyntaxKind::PropertyDeclaration)
                    .filter_map(|property| {
                        let name = written_name(tree, property)?;
                        let classification = match tree.child_by_field(property, "type") {
                            Some(ty) if self.semantic.is_textual(program, unit.id, ty) => {
                                TypeClassification::Textual
                            }
                            _ => TypeClassification::Other,
                        };
                        Some(PropertyDescriptor::new(name, classification))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(AnnotatedTypeDeclaration {
            name,
            namespace: enclosing_namespace(tree, &unit.text, class),
            containing_types,
            properties,
            discovery_index: 0,
        })
    }

    /// Serializer unit for an already discovered declaration set
    pub fn emit(&self, declarations: &[AnnotatedTypeDeclaration]) -> GeneratedUnit {
        let regions: Vec<String> = declarations
            .par_iter()
            .map(|d| {
                RegionTemplate {
                    type_name: &d.full_name(),
                    members: &d.properties,
                }
                .render()
            })
            .collect();

        GeneratedUnit {
            key: self.serializer_key(),
            text: SerializerTemplate {
                namespace: &self.config.namespace,
                regions: &regions,
            }
            .render(),
        }
    }
}

/// Identifier exactly as written, verbatim prefix included
fn written_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let name = tree.name_token(node)?;
    tree.token(name)
        .filter(|t| !t.is_missing)
        .map(|t| t.text.clone())
}

fn has_marker(tree: &SyntaxTree, source: &str, class: NodeId, marker: &str) -> bool {
    tree.children_of_kind(class, SyntaxKind::AttributeList)
        .flat_map(|list| tree.children_of_kind(list, SyntaxKind::Attribute))
        .filter_map(|attribute| {
            tree.child_by_field(attribute, "name")
                .or_else(|| tree.children(attribute).first().copied())
        })
        .any(|name| tree.text(name, source) == marker)
}
