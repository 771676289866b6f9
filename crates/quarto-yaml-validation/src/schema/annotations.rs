//! Schema annotation parsing
//!
//! This module handles parsing of common schema annotations that can be
//! attached to any schema type (description, documentation, error messages, etc.)

use std::collections::HashMap;

use quarto_yaml::AnnotatedParse;

use super::helpers::{get_hash_bool, get_hash_string, get_hash_string_array, get_hash_tags};
use super::types::SchemaAnnotations;
use crate::error::SchemaResult;

/// Static empty annotations for False and True schemas
pub(super) static EMPTY_ANNOTATIONS: SchemaAnnotations = SchemaAnnotations {
    id: None,
    description: None,
    documentation: None,
    error_message: None,
    hidden: None,
    completions: None,
    additional_completions: None,
    tags: None,
};

/// Parse common annotations from a schema mapping
pub(super) fn parse_annotations(node: &AnnotatedParse) -> SchemaResult<SchemaAnnotations> {
    Ok(SchemaAnnotations {
        id: get_hash_string(node, "$id")?,
        description: get_hash_string(node, "description")?,
        documentation: get_hash_string(node, "documentation")?,
        error_message: get_hash_string(node, "errorMessage")?,
        hidden: get_hash_bool(node, "hidden")?,
        completions: get_hash_string_array(node, "completions")?,
        additional_completions: get_hash_string_array(node, "additionalCompletions")?,
        tags: get_hash_tags(node)?,
    })
}

/// Merge outer annotations with inner annotations
///
/// - id, description, documentation, error_message, hidden: outer overrides inner
/// - completions: inner completions, then inner and outer additionalCompletions,
///   unless the outer schema lists its own completions, which win outright
/// - tags: merged, outer values override inner values for the same key
pub(super) fn merge_annotations(
    inner: SchemaAnnotations,
    outer: SchemaAnnotations,
) -> SchemaAnnotations {
    let mut merged_completions = inner.completions.unwrap_or_default();
    if let Some(extra) = inner.additional_completions {
        merged_completions.extend(extra);
    }
    if let Some(extra) = &outer.additional_completions {
        merged_completions.extend(extra.iter().cloned());
    }

    let completions = if outer.completions.is_some() {
        outer.completions
    } else if !merged_completions.is_empty() {
        Some(merged_completions)
    } else {
        None
    };

    SchemaAnnotations {
        id: outer.id.or(inner.id),
        description: outer.description.or(inner.description),
        documentation: outer.documentation.or(inner.documentation),
        error_message: outer.error_message.or(inner.error_message),
        hidden: outer.hidden.or(inner.hidden),
        completions,
        additional_completions: None,
        tags: merge_tags(inner.tags, outer.tags),
    }
}

fn merge_tags(
    inner: Option<HashMap<String, serde_json::Value>>,
    outer: Option<HashMap<String, serde_json::Value>>,
) -> Option<HashMap<String, serde_json::Value>> {
    match (inner, outer) {
        (None, None) => None,
        (Some(i), None) => Some(i),
        (None, Some(o)) => Some(o),
        (Some(mut i), Some(o)) => {
            i.extend(o);
            Some(i)
        }
    }
}

impl SchemaAnnotations {
    pub fn is_empty(&self) -> bool {
        *self == SchemaAnnotations::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_overrides_inner() {
        let inner = SchemaAnnotations {
            description: Some("inner".into()),
            documentation: Some("docs".into()),
            completions: Some(vec!["a".into()]),
            additional_completions: Some(vec!["b".into()]),
            ..Default::default()
        };
        let outer = SchemaAnnotations {
            description: Some("outer".into()),
            additional_completions: Some(vec!["c".into()]),
            ..Default::default()
        };
        let merged = merge_annotations(inner, outer);
        assert_eq!(merged.description.as_deref(), Some("outer"));
        assert_eq!(merged.documentation.as_deref(), Some("docs"));
        assert_eq!(
            merged.completions,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(merged.additional_completions, None);
    }

    #[test]
    fn test_outer_completions_win() {
        let inner = SchemaAnnotations {
            completions: Some(vec!["a".into()]),
            ..Default::default()
        };
        let outer = SchemaAnnotations {
            completions: Some(vec!["z".into()]),
            ..Default::default()
        };
        assert_eq!(
            merge_annotations(inner, outer).completions,
            Some(vec!["z".to_string()])
        );
    }

    #[test]
    fn test_tags_merge() {
        let inner = SchemaAnnotations {
            tags: Some(HashMap::from([
                ("engine".to_string(), serde_json::json!("knitr")),
                ("kind".to_string(), serde_json::json!("inner")),
            ])),
            ..Default::default()
        };
        let outer = SchemaAnnotations {
            tags: Some(HashMap::from([(
                "kind".to_string(),
                serde_json::json!("outer"),
            )])),
            ..Default::default()
        };
        let tags = merge_annotations(inner, outer).tags.unwrap();
        assert_eq!(tags["engine"], serde_json::json!("knitr"));
        assert_eq!(tags["kind"], serde_json::json!("outer"));
    }
}
