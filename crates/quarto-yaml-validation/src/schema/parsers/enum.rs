//! Enum schema parser
//!
//! Supports both inline and explicit forms:
//! - Inline: enum: [val1, val2, val3]
//! - Explicit: enum: { values: [...], description: "..." }

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::structure_error;
use crate::schema::types::EnumSchema;

/// Parse an enum schema
pub(in crate::schema) fn parse_enum_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;

    let values_node = match node.get("values") {
        Some(values) if values.is_array() => values,
        Some(values) => return Err(structure_error(values, "enum values must be an array")),
        None if node.is_array() => node,
        None => return Err(structure_error(node, "Expected array for inline enum")),
    };

    Ok(Schema::Enum(EnumSchema {
        annotations,
        values: values_node
            .items()
            .iter()
            .map(|item| item.result.to_json())
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    fn value_of(text: &str) -> AnnotatedParse {
        quarto_yaml::parse(text, None).get("enum").unwrap().clone()
    }

    #[test]
    fn test_inline_and_explicit_forms_agree() {
        let inline = parse_enum_schema(&value_of("enum: [a, b]\n")).unwrap();
        let explicit =
            parse_enum_schema(&value_of("enum:\n  values: [a, b]\n  description: letters\n"))
                .unwrap();
        match (inline, explicit) {
            (Schema::Enum(i), Schema::Enum(e)) => {
                assert_eq!(i.values, e.values);
                assert_eq!(e.annotations.description.as_deref(), Some("letters"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_values_must_be_array() {
        assert!(matches!(
            parse_enum_schema(&value_of("enum:\n  values: a\n")),
            Err(SchemaError::InvalidStructure { .. })
        ));
        assert!(matches!(
            parse_enum_schema(&value_of("enum: a\n")),
            Err(SchemaError::InvalidStructure { .. })
        ));
    }
}
