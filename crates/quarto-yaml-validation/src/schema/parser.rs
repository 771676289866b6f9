//! Schema parsing entry point
//!
//! - from_annotated(): Main parsing function
//! - parse_short_form(): Handle short string forms like "boolean", "string"
//! - parse_object_form(): Handle object forms like {boolean: {...}}
//! - parse_inline_enum(): Handle inline enum arrays like [val1, val2, val3]

use quarto_yaml::{AnnotatedParse, NodeKind};

use super::Schema;
use super::annotations::{merge_annotations, parse_annotations};
use super::helpers::structure_error;
use super::parsers::*;
use super::types::{AnySchema, BooleanSchema, EnumSchema, NullSchema, NumberSchema, StringSchema};
use crate::error::{SchemaError, SchemaResult};

/// Keys that name a schema type in object form.
const TYPE_KEYS: &[&str] = &[
    "boolean",
    "number",
    "string",
    "path",
    "null",
    "enum",
    "any",
    "anyOf",
    "allOf",
    "array",
    "arrayOf",
    "maybeArrayOf",
    "object",
    "record",
    "schema",
    "ref",
    "$ref",
    "tagged",
];

/// Parse a Schema from an annotated node.
pub(super) fn from_annotated(node: &AnnotatedParse) -> SchemaResult<Schema> {
    match node.kind {
        // Short form: "boolean", "string", etc.
        NodeKind::String => match node.result.as_str() {
            Some(name) => parse_short_form(name, node),
            None => Err(structure_error(node, "Expected schema name")),
        },

        // Object form: {boolean: {...}}, {enum: [...]}, etc.
        NodeKind::Object => parse_object_form(node),

        // Array form: [val1, val2, val3] - inline enum
        NodeKind::Array => parse_inline_enum(node),

        NodeKind::Boolean => match node.result.as_bool() {
            Some(true) => Ok(Schema::True),
            _ => Ok(Schema::False),
        },

        // Null can be a schema type too
        NodeKind::Null => Ok(Schema::Null(NullSchema {
            annotations: Default::default(),
        })),

        NodeKind::Number | NodeKind::Tagged => Err(structure_error(
            node,
            format!("Expected schema, got {}", node.result.type_name()),
        )),
    }
}

/// Parse short form: "boolean", "string", "number", "any", "null", "path"
fn parse_short_form(name: &str, node: &AnnotatedParse) -> SchemaResult<Schema> {
    let annotations = Default::default();
    match name {
        "boolean" => Ok(Schema::Boolean(BooleanSchema { annotations })),
        "number" => Ok(Schema::Number(NumberSchema {
            annotations,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
        })),
        "string" | "path" => Ok(Schema::String(StringSchema {
            annotations,
            pattern: None,
        })),
        "null" => Ok(Schema::Null(NullSchema { annotations })),
        "any" => Ok(Schema::Any(AnySchema { annotations })),
        _ => Err(SchemaError::InvalidType {
            name: name.to_string(),
            location: node.range(),
        }),
    }
}

/// Parse object form: {boolean: {...}}, {string: {...}}, etc.
///
/// The first key naming a schema type decides the kind; the remaining keys
/// of the mapping are annotations on the resulting schema.
fn parse_object_form(node: &AnnotatedParse) -> SchemaResult<Schema> {
    if node.is_empty() {
        return Err(structure_error(node, "Empty schema object"));
    }

    let found = node
        .entries()
        .find_map(|(key, value)| {
            key.result
                .as_str()
                .filter(|k| TYPE_KEYS.contains(k))
                .map(|k| (k, value))
        });

    let Some((key, value)) = found else {
        let (first, _) = node
            .entries()
            .next()
            .ok_or_else(|| structure_error(node, "Empty schema object"))?;
        return Err(SchemaError::InvalidType {
            name: first.result.to_key_string(),
            location: first.range(),
        });
    };

    let schema = match key {
        "boolean" => parse_boolean_schema(value),
        "number" => parse_number_schema(value),
        "string" | "path" => parse_string_schema(value),
        "null" => parse_null_schema(value),
        "enum" => parse_enum_schema(value),
        "any" => parse_any_schema(value),
        "anyOf" => parse_anyof_schema(value),
        "allOf" => parse_allof_schema(value),
        "array" => parse_array_schema(value),
        "arrayOf" => parse_arrayof_schema(value),
        "maybeArrayOf" => parse_maybe_arrayof_schema(value),
        "object" => parse_object_schema(value),
        "record" => parse_record_schema(value),
        "tagged" => parse_tagged_schema(value),
        "ref" | "$ref" => parse_ref_schema(value),
        // the wrapper reads its annotations from the whole mapping
        "schema" => return parse_schema_wrapper(node),
        other => Err(SchemaError::InvalidType {
            name: other.to_string(),
            location: node.range(),
        }),
    }?;

    let outer = parse_annotations(node)?;
    if outer.is_empty() {
        return Ok(schema);
    }
    let inner = schema.annotations().clone();
    Ok(schema.with_annotations(merge_annotations(inner, outer)))
}

/// Parse inline enum array: [val1, val2, val3]
fn parse_inline_enum(node: &AnnotatedParse) -> SchemaResult<Schema> {
    Ok(Schema::Enum(EnumSchema {
        annotations: Default::default(),
        values: node.items().iter().map(|item| item.result.to_json()).collect(),
    }))
}
