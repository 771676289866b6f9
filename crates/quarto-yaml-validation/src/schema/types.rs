//! Schema type definitions
//!
//! This module contains all the schema struct definitions that represent
//! different validation types in Quarto's simplified JSON Schema subset.
//!
//! Each schema type struct contains:
//! - annotations: Common metadata like description, documentation, etc.
//! - type-specific fields: Constraints and validation rules specific to that type

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Schema;

/// Annotations that can be attached to any schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaAnnotations {
    /// Schema identifier for references
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Short description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Detailed documentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Custom error message to display on validation failure
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Whether this schema should be hidden in IDE completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Completion suggestions for IDE support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<Vec<String>>,

    /// Additional completions to merge with existing completions
    #[serde(
        rename = "additionalCompletions",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_completions: Option<Vec<String>>,

    /// Tags for categorization (e.g., "engine: knitr")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, serde_json::Value>>,
}

/// A compiled regular expression that remembers its source text.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored search, as in JSON Schema.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

/// Boolean type schema
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanSchema {
    pub annotations: SchemaAnnotations,
}

/// Number type schema (integer or float)
#[derive(Debug, Clone, PartialEq)]
pub struct NumberSchema {
    pub annotations: SchemaAnnotations,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

/// String type schema
#[derive(Debug, Clone, PartialEq)]
pub struct StringSchema {
    pub annotations: SchemaAnnotations,
    pub pattern: Option<Pattern>,
}

/// Null type schema
#[derive(Debug, Clone, PartialEq)]
pub struct NullSchema {
    pub annotations: SchemaAnnotations,
}

/// Enum type schema
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub annotations: SchemaAnnotations,
    pub values: Vec<serde_json::Value>,
}

/// Any type schema (no validation)
#[derive(Debug, Clone, PartialEq)]
pub struct AnySchema {
    pub annotations: SchemaAnnotations,
}

/// AnyOf schema (validates if any subschema matches)
#[derive(Debug, Clone, PartialEq)]
pub struct AnyOfSchema {
    pub annotations: SchemaAnnotations,
    pub schemas: Vec<Schema>,
}

/// AllOf schema (validates if all subschemas match)
#[derive(Debug, Clone, PartialEq)]
pub struct AllOfSchema {
    pub annotations: SchemaAnnotations,
    pub schemas: Vec<Schema>,
}

/// Array type schema
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub annotations: SchemaAnnotations,
    /// Schemas for the leading elements, position by position
    pub prefix_items: Vec<Schema>,
    /// Schema for elements not covered by `prefix_items`
    pub items: Option<Box<Schema>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// Object type schema
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub annotations: SchemaAnnotations,
    /// Declared properties, in declaration order
    pub properties: IndexMap<String, Schema>,
    pub pattern_properties: Vec<(Pattern, Schema)>,
    pub additional_properties: Option<Box<Schema>>,
    pub required: Vec<String>,
    /// Quarto extension: if true, object cannot have properties not in schema
    pub closed: bool,
}

/// Reference to another schema
#[derive(Debug, Clone, PartialEq)]
pub struct RefSchema {
    pub annotations: SchemaAnnotations,
    pub reference: String,
}

/// Schema accepting only values carrying a custom YAML tag, such as `!expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSchema {
    pub annotations: SchemaAnnotations,
    /// The tag as written, including the leading `!`
    pub tag: String,
    /// Schema for the scalar behind the tag
    pub schema: Option<Box<Schema>>,
}
