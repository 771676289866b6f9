//! Schema types for YAML validation
//!
//! This module defines the schema type system used for validation,
//! closely matching Quarto's simplified JSON Schema subset.
//!
//! Schemas are not deserialized with serde. They are read from an
//! [`AnnotatedParse`] so that a malformed schema can be reported at the
//! exact range of the offending field, whether the schema came from YAML
//! or JSON.

use indexmap::IndexMap;
use quarto_source_map::Range;
use quarto_yaml::AnnotatedParse;

use crate::error::{SchemaError, SchemaResult};

// Internal modules
mod annotations;
mod helpers;
mod parser;
mod parsers;
mod types;

// Public re-exports
pub use types::{
    AllOfSchema, AnyOfSchema, AnySchema, ArraySchema, BooleanSchema, EnumSchema, NullSchema,
    NumberSchema, ObjectSchema, Pattern, RefSchema, SchemaAnnotations, StringSchema, TaggedSchema,
};

use annotations::EMPTY_ANNOTATIONS;

/// The main schema enum representing all possible schema types
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Always fails validation
    False,
    /// Always passes validation
    True,
    /// Boolean type schema
    Boolean(BooleanSchema),
    /// Number type schema (integer or float)
    Number(NumberSchema),
    /// String type schema
    String(StringSchema),
    /// Null type schema
    Null(NullSchema),
    /// Enum type schema (fixed set of values)
    Enum(EnumSchema),
    /// Any type schema (no validation)
    Any(AnySchema),
    /// AnyOf schema (validates if any subschema matches)
    AnyOf(AnyOfSchema),
    /// AllOf schema (validates if all subschemas match)
    AllOf(AllOfSchema),
    /// Array type schema
    Array(ArraySchema),
    /// Object type schema
    Object(ObjectSchema),
    /// Reference to another schema, by id
    Ref(RefSchema),
    /// Custom-tagged scalar such as `!expr`
    Tagged(TaggedSchema),
}

impl Schema {
    /// Parse a Schema from an annotated YAML or JSON node.
    ///
    /// Supported syntaxes:
    /// - Short forms: "boolean", "string", "number", etc.
    /// - Object forms: {boolean: {...}}, {string: {...}}, etc.
    /// - Inline arrays: [val1, val2, val3] (for enums)
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_yaml_validation::Schema;
    ///
    /// let parse = quarto_yaml::parse("arrayOf: string", None);
    /// let schema = Schema::from_annotated(&parse).unwrap();
    /// assert_eq!(schema.type_name(), "array");
    /// ```
    pub fn from_annotated(node: &AnnotatedParse) -> SchemaResult<Schema> {
        parser::from_annotated(node)
    }

    /// Parse schema text; `.json` file names select the JSON parser.
    ///
    /// The first syntax error, if any, is returned as [`SchemaError::Syntax`].
    pub fn from_text(text: &str, file_name: Option<&str>) -> SchemaResult<Schema> {
        let parse = quarto_yaml::parse(text, file_name);
        if let Some(error) = parse.errors.first() {
            return Err(SchemaError::Syntax {
                message: error.message.clone(),
                location: Range::new(error.start, error.end),
            });
        }
        Schema::from_annotated(&parse)
    }

    /// Get the annotations for this schema
    pub fn annotations(&self) -> &SchemaAnnotations {
        match self {
            Schema::False | Schema::True => &EMPTY_ANNOTATIONS,
            Schema::Boolean(s) => &s.annotations,
            Schema::Number(s) => &s.annotations,
            Schema::String(s) => &s.annotations,
            Schema::Null(s) => &s.annotations,
            Schema::Enum(s) => &s.annotations,
            Schema::Any(s) => &s.annotations,
            Schema::AnyOf(s) => &s.annotations,
            Schema::AllOf(s) => &s.annotations,
            Schema::Array(s) => &s.annotations,
            Schema::Object(s) => &s.annotations,
            Schema::Ref(s) => &s.annotations,
            Schema::Tagged(s) => &s.annotations,
        }
    }

    /// Get a mutable reference to the annotations for this schema
    pub fn annotations_mut(&mut self) -> Option<&mut SchemaAnnotations> {
        match self {
            Schema::False | Schema::True => None,
            Schema::Boolean(s) => Some(&mut s.annotations),
            Schema::Number(s) => Some(&mut s.annotations),
            Schema::String(s) => Some(&mut s.annotations),
            Schema::Null(s) => Some(&mut s.annotations),
            Schema::Enum(s) => Some(&mut s.annotations),
            Schema::Any(s) => Some(&mut s.annotations),
            Schema::AnyOf(s) => Some(&mut s.annotations),
            Schema::AllOf(s) => Some(&mut s.annotations),
            Schema::Array(s) => Some(&mut s.annotations),
            Schema::Object(s) => Some(&mut s.annotations),
            Schema::Ref(s) => Some(&mut s.annotations),
            Schema::Tagged(s) => Some(&mut s.annotations),
        }
    }

    /// Replace annotations for this schema, returning the modified schema.
    ///
    /// `True` and `False` carry no annotations and are returned unchanged.
    pub(crate) fn with_annotations(mut self, annotations: SchemaAnnotations) -> Self {
        if let Some(slot) = self.annotations_mut() {
            *slot = annotations;
        }
        self
    }

    /// Get a human-readable name for this schema type
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::False => "false",
            Schema::True => "true",
            Schema::Boolean(_) => "boolean",
            Schema::Number(_) => "number",
            Schema::String(_) => "string",
            Schema::Null(_) => "null",
            Schema::Enum(_) => "enum",
            Schema::Any(_) => "any",
            Schema::AnyOf(_) => "anyOf",
            Schema::AllOf(_) => "allOf",
            Schema::Array(_) => "array",
            Schema::Object(_) => "object",
            Schema::Ref(_) => "$ref",
            Schema::Tagged(_) => "tagged",
        }
    }

    /// Directly nested schemas, in traversal order.
    ///
    /// References are not followed; a `Ref` has no children.
    pub fn children(&self) -> Vec<&Schema> {
        match self {
            Schema::AnyOf(s) => s.schemas.iter().collect(),
            Schema::AllOf(s) => s.schemas.iter().collect(),
            Schema::Array(s) => s.prefix_items.iter().chain(s.items.as_deref()).collect(),
            Schema::Object(s) => s
                .properties
                .values()
                .chain(s.pattern_properties.iter().map(|(_, schema)| schema))
                .chain(s.additional_properties.as_deref())
                .collect(),
            Schema::Tagged(s) => s.schema.as_deref().into_iter().collect(),
            Schema::False
            | Schema::True
            | Schema::Boolean(_)
            | Schema::Number(_)
            | Schema::String(_)
            | Schema::Null(_)
            | Schema::Enum(_)
            | Schema::Any(_)
            | Schema::Ref(_) => Vec::new(),
        }
    }

    /// Mutable counterpart of [`children`](Schema::children), same order.
    pub fn children_mut(&mut self) -> Vec<&mut Schema> {
        match self {
            Schema::AnyOf(s) => s.schemas.iter_mut().collect(),
            Schema::AllOf(s) => s.schemas.iter_mut().collect(),
            Schema::Array(s) => s
                .prefix_items
                .iter_mut()
                .chain(s.items.as_deref_mut())
                .collect(),
            Schema::Object(s) => s
                .properties
                .values_mut()
                .chain(s.pattern_properties.iter_mut().map(|(_, schema)| schema))
                .chain(s.additional_properties.as_deref_mut())
                .collect(),
            Schema::Tagged(s) => s.schema.as_deref_mut().into_iter().collect(),
            Schema::False
            | Schema::True
            | Schema::Boolean(_)
            | Schema::Number(_)
            | Schema::String(_)
            | Schema::Null(_)
            | Schema::Enum(_)
            | Schema::Any(_)
            | Schema::Ref(_) => Vec::new(),
        }
    }
}

/// Schema registry for managing schemas with $ref resolution
///
/// Ids iterate in registration order.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create a new empty schema registry
    pub fn new() -> Self {
        Self {
            schemas: IndexMap::new(),
        }
    }

    /// Register a schema with an ID, replacing any earlier one
    pub fn register(&mut self, id: impl Into<String>, schema: Schema) {
        self.schemas.insert(id.into(), schema);
    }

    /// Register `schema` under `id` and every nested schema that declares
    /// its own `$id`.
    pub fn register_with_nested(&mut self, id: impl Into<String>, schema: Schema) {
        fn collect(schema: &Schema, out: &mut Vec<(String, Schema)>) {
            for child in schema.children() {
                if let Some(id) = &child.annotations().id {
                    out.push((id.clone(), child.clone()));
                }
                collect(child, out);
            }
        }
        let mut nested = Vec::new();
        collect(&schema, &mut nested);
        self.register(id, schema);
        for (nested_id, nested_schema) in nested {
            self.schemas.entry(nested_id).or_insert(nested_schema);
        }
    }

    /// Resolve a schema reference
    pub fn resolve(&self, reference: &str) -> Option<&Schema> {
        self.schemas.get(reference)
    }

    pub(crate) fn resolve_mut(&mut self, reference: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(reference)
    }

    /// Get all registered schema IDs
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.schemas.keys()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
