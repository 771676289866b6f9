// Error types for schema loading and YAML validation

use std::fmt;

use quarto_source_map::Range;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading schemas from YAML or JSON
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Invalid schema type name
    #[error("Invalid schema type: {name} (at offset {})", .location.start)]
    InvalidType { name: String, location: Range },

    /// Invalid schema structure
    #[error("Invalid schema structure: {message} (at offset {})", .location.start)]
    InvalidStructure { message: String, location: Range },

    /// Missing required field
    #[error("Missing required field '{field}' (at offset {})", .location.start)]
    MissingField { field: String, location: Range },

    /// A `pattern` or `patternProperties` key that is not a valid regex
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern {
        pattern: String,
        message: String,
        location: Range,
    },

    /// The schema text itself failed to parse
    #[error("Schema syntax error: {message} (at offset {})", .location.start)]
    Syntax { message: String, location: Range },

    /// Unresolved schema reference
    #[error("Unresolved schema reference: {0}")]
    UnresolvedRef(String),

    /// Positional description list does not line up with the schema graph
    #[error("Description list for '{id}' has {got} entries, but the schema has {expected} nodes")]
    DescriptionCountMismatch {
        id: String,
        expected: usize,
        got: usize,
    },
}

/// Result type for schema loading operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Failure to look a schema up by id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaResolutionError {
    #[error("No schema registered under id '{0}'")]
    UnknownId(String),
}

/// Errors from building or reaching the process-wide schema model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Schema model has not been initialized")]
    NotInitialized,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolution(#[from] SchemaResolutionError),

    #[error("Failed to load schema resources: {0}")]
    Load(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Structured validation error kinds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ValidationErrorKind {
    /// Type mismatch
    TypeMismatch { expected: String, got: String },

    /// Missing required property
    MissingRequiredProperty { property: String },

    /// Property not allowed by a closed object
    UnknownProperty { property: String },

    /// Value not in enum
    InvalidEnumValue { value: String, allowed: Vec<String> },

    /// Number out of range
    NumberOutOfRange {
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
        exclusive_minimum: Option<f64>,
        exclusive_maximum: Option<f64>,
    },

    /// String doesn't match pattern
    StringPatternMismatch { value: String, pattern: String },

    /// Array length invalid
    ArrayLengthInvalid {
        length: usize,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },

    /// None of the branches of an anyOf accepted the value
    NoMatchingAlternative { alternatives: Vec<String> },

    /// A tagged value (such as `!expr ...`) whose tag is not the one expected
    TaggedValueMismatch { expected: String, got: String },

    /// Other validation error
    ///
    /// Last resort for failures that carry no structured data, such as a
    /// value appearing where the schema is `false`.
    Other { message: String },
}

impl ValidationErrorKind {
    /// Get the error code for this error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequiredProperty { .. } => "Q-1-10",
            ValidationErrorKind::TypeMismatch { .. } => "Q-1-11",
            ValidationErrorKind::InvalidEnumValue { .. } => "Q-1-12",
            ValidationErrorKind::ArrayLengthInvalid { .. } => "Q-1-13",
            ValidationErrorKind::StringPatternMismatch { .. } => "Q-1-14",
            ValidationErrorKind::NumberOutOfRange { .. } => "Q-1-15",
            ValidationErrorKind::UnknownProperty { .. } => "Q-1-18",
            ValidationErrorKind::NoMatchingAlternative { .. } => "Q-1-19",
            ValidationErrorKind::TaggedValueMismatch { .. } => "Q-1-20",
            ValidationErrorKind::Other { .. } => "Q-1-99",
        }
    }

    /// Format a human-readable message from this error kind
    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::TypeMismatch { expected, got } => {
                format!("The value is {}, but {} is expected", with_article(got), expected)
            }
            ValidationErrorKind::MissingRequiredProperty { property } => {
                format!("The required property \"{}\" is missing", property)
            }
            ValidationErrorKind::UnknownProperty { property } => {
                format!("The property \"{}\" is not allowed here", property)
            }
            ValidationErrorKind::InvalidEnumValue { value, allowed } => {
                format!(
                    "The value {} is not one of: {}",
                    value,
                    allowed.join(", ")
                )
            }
            ValidationErrorKind::NumberOutOfRange {
                value,
                minimum,
                maximum,
                exclusive_minimum,
                exclusive_maximum,
            } => {
                if let Some(min) = minimum {
                    format!("The number {} is less than the minimum {}", value, min)
                } else if let Some(max) = maximum {
                    format!("The number {} is greater than the maximum {}", value, max)
                } else if let Some(min) = exclusive_minimum {
                    format!("The number {} is not greater than {}", value, min)
                } else if let Some(max) = exclusive_maximum {
                    format!("The number {} is not less than {}", value, max)
                } else {
                    format!("The number {} is out of range", value)
                }
            }
            ValidationErrorKind::StringPatternMismatch { value, pattern } => {
                format!("The string \"{}\" does not match the pattern {}", value, pattern)
            }
            ValidationErrorKind::ArrayLengthInvalid {
                length,
                min_items,
                max_items,
            } => match (min_items, max_items) {
                (Some(min), Some(max)) if min == max => {
                    format!("The array has {} items, but exactly {} are required", length, min)
                }
                (Some(min), _) if length < min => {
                    format!("The array has {} items, fewer than the minimum {}", length, min)
                }
                (_, Some(max)) if length > max => {
                    format!("The array has {} items, more than the maximum {}", length, max)
                }
                _ => format!("The array length {} is invalid", length),
            },
            ValidationErrorKind::NoMatchingAlternative { alternatives } => {
                format!("The value matches none of: {}", alternatives.join("; "))
            }
            ValidationErrorKind::TaggedValueMismatch { expected, got } => {
                format!("The value is tagged {}, but {} is expected", got, expected)
            }
            ValidationErrorKind::Other { message } => message.clone(),
        }
    }
}

fn with_article(type_name: &str) -> String {
    match type_name {
        "null" => "null".to_string(),
        name if name.starts_with(['a', 'e', 'i', 'o', 'u']) => format!("an {}", name),
        name => format!("a {}", name),
    }
}

/// A schema violation, located in the coordinates of the parsed text.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// The structured error kind
    pub kind: ValidationErrorKind,
    /// Narrowest responsible range, in the coordinates of the parsed text
    pub start: usize,
    pub end: usize,
    /// Instance path where the error occurred (e.g., ["format", "html", "toc"])
    pub instance_path: InstancePath,
    /// Schema path that failed (e.g., ["object", "properties", "format"])
    pub schema_path: SchemaPath,
    /// What the schema wanted, phrased to follow "must be"
    pub expected: String,
    /// The offending value as written in the source
    pub value: String,
    /// The schema's own `errorMessage`, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Closest matches, best first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Explanations carried over from nested attempts (anyOf branches)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validation error at {}: {}",
            self.instance_path,
            self.kind.message()
        )
    }
}

impl ValidationError {
    /// Create a new validation error with a structured kind
    pub fn new(kind: ValidationErrorKind, range: Range, instance_path: InstancePath) -> Self {
        Self {
            kind,
            start: range.start,
            end: range.end,
            instance_path,
            schema_path: SchemaPath::new(),
            expected: String::new(),
            value: String::new(),
            error_message: None,
            suggestions: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }

    /// Get the human-readable message for this error
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    /// Set the schema path for this error
    pub fn with_schema_path(mut self, schema_path: SchemaPath) -> Self {
        self.schema_path = schema_path;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether `self` equals `other` or lies underneath it.
    pub fn starts_with(&self, other: &InstancePath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl FromIterator<PathSegment> for InstancePath {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(root)")
        } else {
            for (i, segment) in self.segments.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                write!(f, "{}", segment)?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaPath {
    segments: Vec<String>,
}

impl SchemaPath {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.segments.join(" > "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_path_display() {
        let mut path = InstancePath::new();
        assert_eq!(path.to_string(), "(root)");

        path.push_key("format");
        assert_eq!(path.to_string(), "format");

        path.push_key("html");
        assert_eq!(path.to_string(), "format.html");

        path.push_index(0);
        assert_eq!(path.to_string(), "format.html.[0]");
    }

    #[test]
    fn test_instance_path_prefix() {
        let parent: InstancePath = [PathSegment::Key("items".into())].into_iter().collect();
        let mut child = parent.clone();
        child.push_index(2);
        assert!(child.starts_with(&parent));
        assert!(!parent.starts_with(&child));
    }

    #[test]
    fn test_instance_path_serializes_as_array() {
        let path: InstancePath = [PathSegment::Key("items".into()), PathSegment::Index(2)]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["items",2]"#);
    }

    #[test]
    fn test_schema_path_display() {
        let mut path = SchemaPath::new();
        assert_eq!(path.to_string(), "(root)");
        path.push("object");
        path.push("properties");
        path.push("title");
        assert_eq!(path.to_string(), "object > properties > title");
    }

    #[test]
    fn test_error_codes_are_catalogued() {
        let kinds = vec![
            ValidationErrorKind::TypeMismatch {
                expected: "a string".into(),
                got: "number".into(),
            },
            ValidationErrorKind::MissingRequiredProperty {
                property: "title".into(),
            },
            ValidationErrorKind::NoMatchingAlternative {
                alternatives: vec![],
            },
            ValidationErrorKind::TaggedValueMismatch {
                expected: "!expr".into(),
                got: "!date".into(),
            },
            ValidationErrorKind::Other {
                message: "x".into(),
            },
        ];
        for kind in kinds {
            assert!(
                quarto_error_reporting::catalog::get_error_info(kind.error_code()).is_some(),
                "{}",
                kind.error_code()
            );
        }
    }

    #[test]
    fn test_messages() {
        let kind = ValidationErrorKind::TypeMismatch {
            expected: "a string".into(),
            got: "number".into(),
        };
        assert_eq!(kind.message(), "The value is a number, but a string is expected");

        let kind = ValidationErrorKind::TypeMismatch {
            expected: "a boolean".into(),
            got: "object".into(),
        };
        assert_eq!(kind.message(), "The value is an object, but a boolean is expected");

        let kind = ValidationErrorKind::ArrayLengthInvalid {
            length: 3,
            min_items: Some(2),
            max_items: Some(2),
        };
        assert_eq!(kind.message(), "The array has 3 items, but exactly 2 are required");
    }
}
