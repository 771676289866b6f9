//! Combinator schema parsers
//!
//! - anyOf: Validates if any subschema matches
//! - allOf: Validates if all subschemas match
//! - maybeArrayOf: Quarto extension that expands to anyOf(T, arrayOf(T))
//!
//! anyOf and allOf support an inline array form and an explicit object form
//! with annotations.

use std::collections::HashMap;

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::structure_error;
use crate::schema::parser::from_annotated;
use crate::schema::types::{AllOfSchema, AnyOfSchema, ArraySchema, SchemaAnnotations};

/// Subschemas of `anyOf`/`allOf`, from either `[...]` or `{schemas: [...]}`.
fn parse_schema_list(node: &AnnotatedParse, combinator: &str) -> SchemaResult<Vec<Schema>> {
    let list = match node.get("schemas") {
        Some(schemas) if schemas.is_array() => schemas,
        Some(schemas) => {
            return Err(structure_error(
                schemas,
                format!("{} schemas must be an array", combinator),
            ));
        }
        None if node.is_array() => node,
        None => {
            return Err(structure_error(
                node,
                format!("Expected array for {}", combinator),
            ));
        }
    };
    list.items().iter().map(from_annotated).collect()
}

/// Parse an anyOf schema
pub(in crate::schema) fn parse_anyof_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    Ok(Schema::AnyOf(AnyOfSchema {
        annotations: parse_annotations(node)?,
        schemas: parse_schema_list(node, "anyOf")?,
    }))
}

/// Parse an allOf schema
pub(in crate::schema) fn parse_allof_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    Ok(Schema::AllOf(AllOfSchema {
        annotations: parse_annotations(node)?,
        schemas: parse_schema_list(node, "allOf")?,
    }))
}

/// Parse a maybeArrayOf schema
///
/// `maybeArrayOf: T` expands to `anyOf: [T, arrayOf: T]`, tagged so that
/// completions are drawn from the scalar form.
pub(in crate::schema) fn parse_maybe_arrayof_schema(
    node: &AnnotatedParse,
) -> SchemaResult<Schema> {
    let inner = from_annotated(node)?;

    let array = Schema::Array(ArraySchema {
        annotations: Default::default(),
        prefix_items: Vec::new(),
        items: Some(Box::new(inner.clone())),
        min_items: None,
        max_items: None,
    });

    let tags = HashMap::from([(
        "complete-from".to_string(),
        serde_json::json!(["anyOf", 0]),
    )]);

    Ok(Schema::AnyOf(AnyOfSchema {
        annotations: SchemaAnnotations {
            tags: Some(tags),
            ..Default::default()
        },
        schemas: vec![inner, array],
    }))
}
