//! Rust mirror of the generated serialization contract
//!
//! Lets the quoting, joining and empty-sequence rules of the emitted C# be
//! exercised without a C# toolchain.

use crate::models::generated::{AnnotatedTypeDeclaration, TypeClassification};

/// A member value as the generated code would interpolate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvValue {
    Textual(String),
    Other(String),
}

impl CsvValue {
    fn render(&self) -> String {
        match self {
            Self::Textual(s) => format!("\"{s}\""),
            Self::Other(s) => s.clone(),
        }
    }
}

pub trait CsvRecord {
    /// `(member name, value)` in member declaration order
    fn csv_fields(&self) -> Vec<(String, CsvValue)>;

    /// `ToCsv(this T)`
    fn to_csv_line(&self) -> String {
        self.csv_fields()
            .iter()
            .map(|(_, value)| value.render())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `ToCsvHeader(this T)`
    fn to_csv_header(&self) -> String {
        self.csv_fields()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `ToCsv(this IEnumerable<T>)`: header from the first record, then one line
/// per record; nothing at all for an empty sequence
pub fn to_csv<R: CsvRecord>(records: &[R]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let mut out = first.to_csv_header();
    out.push('\n');
    for record in records {
        out.push_str(&record.to_csv_line());
        out.push('\n');
    }
    out
}

/// Values for an extracted declaration, paired positionally with its members
#[derive(Debug, Clone)]
pub struct DeclaredRecord<'a> {
    pub declaration: &'a AnnotatedTypeDeclaration,
    pub values: Vec<String>,
}

impl CsvRecord for DeclaredRecord<'_> {
    fn csv_fields(&self) -> Vec<(String, CsvValue)> {
        self.declaration
            .properties
            .iter()
            .zip(self.values.iter())
            .map(|(property, value)| {
                let value = match property.classification {
                    TypeClassification::Textual => CsvValue::Textual(value.clone()),
                    TypeClassification::Other => CsvValue::Other(value.clone()),
                };
                (property.name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generated::PropertyDescriptor;

    struct Person {
        name: String,
        age: u32,
    }

    impl CsvRecord for Person {
        fn csv_fields(&self) -> Vec<(String, CsvValue)> {
            vec![
                ("Name".to_string(), CsvValue::Textual(self.name.clone())),
                ("Age".to_string(), CsvValue::Other(self.age.to_string())),
            ]
        }
    }

    #[test]
    fn test_line_and_header() {
        let jim = Person {
            name: "Jim".to_string(),
            age: 42,
        };
        assert_eq!(jim.to_csv_line(), "\"Jim\", 42");
        assert_eq!(jim.to_csv_header(), "Name, Age");
    }

    #[test]
    fn test_bulk_keeps_input_order() {
        let people = vec![
            Person {
                name: "Jim".to_string(),
                age: 42,
            },
            Person {
                name: "Ann".to_string(),
                age: 7,
            },
        ];
        assert_eq!(to_csv(&people), "Name, Age\n\"Jim\", 42\n\"Ann\", 7\n");
    }

    #[test]
    fn test_bulk_empty_is_empty() {
        let people: Vec<Person> = Vec::new();
        assert_eq!(to_csv(&people), "");
    }

    #[test]
    fn test_declared_record() {
        let declaration = AnnotatedTypeDeclaration {
            name: "Point".to_string(),
            namespace: None,
            containing_types: Vec::new(),
            properties: vec![
                PropertyDescriptor::new("X", TypeClassification::Other),
                PropertyDescriptor::new("Label", TypeClassification::Textual),
            ],
            discovery_index: 0,
        };
        let record = DeclaredRecord {
            declaration: &declaration,
            values: vec!["3".to_string(), "origin".to_string()],
        };
        assert_eq!(record.to_csv_line(), "3, \"origin\"");
        assert_eq!(record.to_csv_header(), "X, Label");
    }
}
