//! Array schema parser
//!
//! Arrays can have:
//! - items: Schema for array elements
//! - prefixItems: Schemas for the leading elements, position by position
//! - minItems/maxItems: Length constraints
//!
//! Also handles the arrayOf shorthand:
//! - arrayOf: <schema> - Simple form
//! - arrayOf: { schema: <schema>, length: N } - Fixed-length arrays

use quarto_yaml::AnnotatedParse;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{get_hash_usize, structure_error};
use crate::schema::parser::from_annotated;
use crate::schema::types::ArraySchema;

/// Parse an array schema
///
/// ```yaml
/// array:
///   prefixItems: [string, number]
///   items: <schema>
///   minItems: 1
///   maxItems: 10
/// ```
pub(in crate::schema) fn parse_array_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;
    let items = match node.get("items") {
        Some(items) => Some(Box::new(from_annotated(items)?)),
        None => None,
    };
    let prefix_items = match node.get("prefixItems") {
        Some(prefix) if prefix.is_array() => prefix
            .items()
            .iter()
            .map(from_annotated)
            .collect::<SchemaResult<Vec<_>>>()?,
        Some(prefix) => return Err(structure_error(prefix, "prefixItems must be an array")),
        None => Vec::new(),
    };

    Ok(Schema::Array(ArraySchema {
        annotations,
        prefix_items,
        items,
        min_items: get_hash_usize(node, "minItems")?,
        max_items: get_hash_usize(node, "maxItems")?,
    }))
}

/// Parse arrayOf schema
///
/// Simple form:
/// ```yaml
/// arrayOf: string
/// ```
///
/// Complex form with length, which sets both minItems and maxItems:
/// ```yaml
/// arrayOf:
///   schema: string
///   length: 2
/// ```
pub(in crate::schema) fn parse_arrayof_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    if let Some(schema_node) = node.get("schema") {
        let length = get_hash_usize(node, "length")?;
        return Ok(Schema::Array(ArraySchema {
            annotations: parse_annotations(node)?,
            prefix_items: Vec::new(),
            items: Some(Box::new(from_annotated(schema_node)?)),
            min_items: length,
            max_items: length,
        }));
    }

    Ok(Schema::Array(ArraySchema {
        annotations: Default::default(),
        prefix_items: Vec::new(),
        items: Some(Box::new(from_annotated(node)?)),
        min_items: None,
        max_items: None,
    }))
}
