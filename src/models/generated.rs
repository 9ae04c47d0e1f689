//! Source generator data model

use serde::{Deserialize, Serialize};

/// How a member's declared type serializes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeClassification {
    /// Resolves to the built-in string type; written quoted
    Textual,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub classification: TypeClassification,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, classification: TypeClassification) -> Self {
        Self {
            name: name.into(),
            classification,
        }
    }

    pub fn is_textual(&self) -> bool {
        self.classification == TypeClassification::Textual
    }
}

/// A type declaration carrying the marker annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedTypeDeclaration {
    pub name: String,
    pub namespace: Option<String>,
    /// Enclosing type names, outermost first
    pub containing_types: Vec<String>,
    /// Members in source declaration order
    pub properties: Vec<PropertyDescriptor>,
    /// Encounter order across all scanned units
    pub discovery_index: usize,
}

impl AnnotatedTypeDeclaration {
    /// Name as written in generated code (`Ns.Outer.Name`)
    pub fn full_name(&self) -> String {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(self.containing_types.iter().map(String::as_str))
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// One emitted source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedUnit {
    /// Generator-assigned hint name, unique within one pass
    pub key: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_joins_namespace_and_containers() {
        let decl = AnnotatedTypeDeclaration {
            name: "Person".to_string(),
            namespace: Some("App.Models".to_string()),
            containing_types: vec!["Outer".to_string()],
            properties: vec![],
            discovery_index: 0,
        };
        assert_eq!(decl.full_name(), "App.Models.Outer.Person");
    }

    #[test]
    fn test_full_name_global_namespace() {
        let decl = AnnotatedTypeDeclaration {
            name: "Person".to_string(),
            namespace: None,
            containing_types: vec![],
            properties: vec![],
            discovery_index: 0,
        };
        assert_eq!(decl.full_name(), "Person");
    }
}
