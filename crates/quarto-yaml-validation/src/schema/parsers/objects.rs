//! Object schema parser
//!
//! Objects can have:
//! - properties: Named property schemas, kept in declaration order
//! - patternProperties: Regex-keyed property schemas
//! - additionalProperties: Schema for unspecified properties
//! - required: List of required property names, or "all"
//! - closed: Quarto extension - disallow properties not in schema
//!
//! Also handles the record shorthand, a closed object with every property
//! required.

use indexmap::IndexMap;
use quarto_yaml::AnnotatedParse;

use super::primitive::compile_pattern;
use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{get_hash_bool, string_keys, structure_error};
use crate::schema::parser::from_annotated;
use crate::schema::types::{ObjectSchema, Pattern};

fn parse_properties(node: &AnnotatedParse, what: &str) -> SchemaResult<IndexMap<String, Schema>> {
    string_keys(node, what)?
        .into_iter()
        .map(|(key, value)| Ok((key.to_string(), from_annotated(value)?)))
        .collect()
}

/// Parse an object schema
///
/// ```yaml
/// object:
///   properties:
///     name: string
///     age: number
///   patternProperties:
///     "^x-": string
///   additionalProperties: boolean
///   required: [name]
///   closed: true
/// ```
pub(in crate::schema) fn parse_object_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = parse_annotations(node)?;

    let properties = match node.get("properties") {
        Some(props) => parse_properties(props, "properties")?,
        None => IndexMap::new(),
    };

    let pattern_properties = match node.get("patternProperties") {
        Some(props) => string_keys(props, "patternProperties")?
            .into_iter()
            .map(|(key, value)| {
                let pattern = compile_pattern(key, value)?;
                Ok((pattern, from_annotated(value)?))
            })
            .collect::<SchemaResult<Vec<(Pattern, Schema)>>>()?,
        None => Vec::new(),
    };

    let additional_properties = match node.get("additionalProperties") {
        Some(additional) => Some(Box::new(from_annotated(additional)?)),
        None => None,
    };

    let required = match node.get("required") {
        Some(required) => match required.result.as_str() {
            // Expand to all property keys
            Some("all") => properties.keys().cloned().collect(),
            Some(other) => {
                return Err(structure_error(
                    required,
                    format!("Invalid required value: '{}' (expected 'all' or array)", other),
                ));
            }
            None if required.is_array() => required
                .items()
                .iter()
                .map(|item| {
                    item.result
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| structure_error(item, "required items must be strings"))
                })
                .collect::<SchemaResult<Vec<_>>>()?,
            None => {
                return Err(structure_error(required, "required must be 'all' or an array"));
            }
        },
        None => Vec::new(),
    };

    let closed = get_hash_bool(node, "closed")?.unwrap_or(false);

    Ok(Schema::Object(ObjectSchema {
        annotations,
        properties,
        pattern_properties,
        additional_properties,
        required,
        closed,
    }))
}

/// Parse a record schema
///
/// Either form expands to a closed object with every listed property
/// required:
///
/// ```yaml
/// record:
///   properties:
///     key1: string
/// ```
///
/// ```yaml
/// record:
///   key1: string
///   key2: number
/// ```
pub(in crate::schema) fn parse_record_schema(node: &AnnotatedParse) -> SchemaResult<Schema> {
    let (annotations, properties) = match node.get("properties") {
        Some(props) => (parse_annotations(node)?, parse_properties(props, "record properties")?),
        None => (Default::default(), parse_properties(node, "record")?),
    };
    let required = properties.keys().cloned().collect();

    Ok(Schema::Object(ObjectSchema {
        annotations,
        properties,
        pattern_properties: Vec::new(),
        additional_properties: None,
        required,
        closed: true,
    }))
}
