//! Primitive type schema parsers
//!
//! This module contains parsers for basic/primitive schema types:
//! - boolean
//! - number
//! - string (including "path" alias)
//! - null
//! - any

use quarto_yaml::AnnotatedParse;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{get_hash_number, get_hash_string};
use crate::schema::types::{
    AnySchema, BooleanSchema, NullSchema, NumberSchema, Pattern, StringSchema,
};

/// Parse a boolean schema
pub(in crate::schema) fn parse_boolean_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    Ok(Schema::Boolean(BooleanSchema { annotations }))
}

/// Parse a number schema (integer or float)
pub(in crate::schema) fn parse_number_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    let minimum = get_hash_number(node, "minimum")?;
    let maximum = get_hash_number(node, "maximum")?;
    let exclusive_minimum = get_hash_number(node, "exclusiveMinimum")?;
    let exclusive_maximum = get_hash_number(node, "exclusiveMaximum")?;

    Ok(Schema::Number(NumberSchema {
        annotations,
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
    }))
}

/// Parse a string schema (also handles "path" alias)
pub(in crate::schema) fn parse_string_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    let pattern = match get_hash_string(node, "pattern")? {
        Some(source) => Some(compile_pattern(&source, node.get("pattern").unwrap_or(node))?),
        None => None,
    };

    Ok(Schema::String(StringSchema {
        annotations,
        pattern,
    }))
}

/// Parse a null schema
pub(in crate::schema) fn parse_null_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    Ok(Schema::Null(NullSchema { annotations }))
}

/// Parse an any schema (accepts any value)
pub(in crate::schema) fn parse_any_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    Ok(Schema::Any(AnySchema { annotations }))
}

pub(in crate::schema) fn compile_pattern(
    source: &str,
    node: &AnnotatedParse,
) -> SchemaResult<Pattern> {
    Pattern::new(source).map_err(|e| SchemaError::InvalidPattern {
        pattern: source.to_string(),
        message: e.to_string(),
        location: node.range(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(text: &str, key: &str) -> AnnotatedParse {
        quarto_yaml::parse(text, None).get(key).unwrap().clone()
    }

    #[test]
    fn test_number_bounds() {
        let node = value_of("number:\n  minimum: 1\n  exclusiveMaximum: 10.5\n", "number");
        match parse_number_schema(&node).unwrap() {
            Schema::Number(n) => {
                assert_eq!(n.minimum, Some(1.0));
                assert_eq!(n.exclusive_maximum, Some(10.5));
                assert_eq!(n.maximum, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_string_pattern() {
        let node = value_of("string:\n  pattern: \"^[a-z]+$\"\n", "string");
        match parse_string_schema(&node).unwrap() {
            Schema::String(s) => {
                let pattern = s.pattern.unwrap();
                assert_eq!(pattern.as_str(), "^[a-z]+$");
                assert!(pattern.is_match("abc"));
                assert!(!pattern.is_match("ABC"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        let node = value_of("string:\n  pattern: \"[a-\"\n", "string");
        assert!(matches!(
            parse_string_schema(&node),
            Err(SchemaError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_annotations_on_primitive() {
        let node = value_of("boolean:\n  description: Show a table of contents\n  hidden: true\n", "boolean");
        let schema = parse_boolean_schema(&node).unwrap();
        assert_eq!(
            schema.annotations().description.as_deref(),
            Some("Show a table of contents")
        );
        assert_eq!(schema.annotations().hidden, Some(true));
    }
}
