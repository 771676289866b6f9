//! Helper functions for reading schema fields
//!
//! Each helper looks a key up in a mapping node and checks the value's
//! type, reporting the value's range when it has the wrong shape.

use std::collections::HashMap;

use quarto_yaml::AnnotatedParse;

use crate::error::{SchemaError, SchemaResult};

pub(super) fn structure_error(node: &AnnotatedParse, message: impl Into<String>) -> SchemaError {
    SchemaError::InvalidStructure {
        message: message.into(),
        location: node.range(),
    }
}

/// Get a string value from a mapping by key
pub(super) fn get_hash_string(node: &AnnotatedParse, key: &str) -> SchemaResult<Option<String>> {
    match node.get(key) {
        Some(value) => match value.result.as_str() {
            Some(s) => Ok(Some(s.to_string())),
            None => Err(structure_error(
                value,
                format!("Field '{}' must be a string", key),
            )),
        },
        None => Ok(None),
    }
}

/// Get a number value from a mapping by key
pub(super) fn get_hash_number(node: &AnnotatedParse, key: &str) -> SchemaResult<Option<f64>> {
    match node.get(key) {
        Some(value) => match value.result.as_f64() {
            Some(n) => Ok(Some(n)),
            None => Err(structure_error(
                value,
                format!("Field '{}' must be a number", key),
            )),
        },
        None => Ok(None),
    }
}

/// Get a usize value from a mapping by key
pub(super) fn get_hash_usize(node: &AnnotatedParse, key: &str) -> SchemaResult<Option<usize>> {
    if let Some(value) = node.get(key) {
        if let Some(i) = value.result.as_i64()
            && let Ok(n) = usize::try_from(i)
        {
            return Ok(Some(n));
        }
        return Err(structure_error(
            value,
            format!("Field '{}' must be a non-negative integer", key),
        ));
    }
    Ok(None)
}

/// Get a boolean value from a mapping by key
pub(super) fn get_hash_bool(node: &AnnotatedParse, key: &str) -> SchemaResult<Option<bool>> {
    match node.get(key) {
        Some(value) => match value.result.as_bool() {
            Some(b) => Ok(Some(b)),
            None => Err(structure_error(
                value,
                format!("Field '{}' must be a boolean", key),
            )),
        },
        None => Ok(None),
    }
}

/// Get an array of strings from a mapping by key
pub(super) fn get_hash_string_array(
    node: &AnnotatedParse,
    key: &str,
) -> SchemaResult<Option<Vec<String>>> {
    let Some(value) = node.get(key) else {
        return Ok(None);
    };
    if !value.is_array() {
        return Err(structure_error(
            value,
            format!("Field '{}' must be an array", key),
        ));
    }
    let strings = value
        .items()
        .iter()
        .map(|item| {
            item.result.as_str().map(str::to_string).ok_or_else(|| {
                structure_error(item, format!("Field '{}' items must be strings", key))
            })
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(Some(strings))
}

/// Get tags (a mapping of key-value pairs) from a schema
pub(super) fn get_hash_tags(
    node: &AnnotatedParse,
) -> SchemaResult<Option<HashMap<String, serde_json::Value>>> {
    let Some(value) = node.get("tags") else {
        return Ok(None);
    };
    if !value.is_object() {
        return Err(structure_error(value, "tags must be an object"));
    }
    let mut tags = HashMap::new();
    for (key, tag_value) in value.entries() {
        let name = key
            .result
            .as_str()
            .ok_or_else(|| structure_error(key, "tag key must be a string"))?;
        tags.insert(name.to_string(), tag_value.result.to_json());
    }
    Ok(Some(tags))
}

/// Keys of a mapping node, each required to be a string.
pub(super) fn string_keys<'a>(
    node: &'a AnnotatedParse,
    what: &str,
) -> SchemaResult<Vec<(&'a str, &'a AnnotatedParse)>> {
    if !node.is_object() {
        return Err(structure_error(node, format!("{} must be an object", what)));
    }
    node.entries()
        .map(|(key, value)| {
            key.result
                .as_str()
                .map(|k| (k, value))
                .ok_or_else(|| structure_error(key, format!("{} keys must be strings", what)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AnnotatedParse {
        quarto_yaml::parse(text, None)
    }

    #[test]
    fn test_typed_getters() {
        let node = parse("name: x\nmin: 2\nflag: true\nlist: [a, b]\n");
        assert_eq!(get_hash_string(&node, "name").unwrap(), Some("x".into()));
        assert_eq!(get_hash_number(&node, "min").unwrap(), Some(2.0));
        assert_eq!(get_hash_usize(&node, "min").unwrap(), Some(2));
        assert_eq!(get_hash_bool(&node, "flag").unwrap(), Some(true));
        assert_eq!(
            get_hash_string_array(&node, "list").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(get_hash_string(&node, "missing").unwrap(), None);
    }

    #[test]
    fn test_wrong_type_reports_value_range() {
        let node = parse("minItems: -1\n");
        match get_hash_usize(&node, "minItems") {
            Err(SchemaError::InvalidStructure { location, .. }) => {
                assert_eq!(location.start, 10);
                assert_eq!(location.end, 12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tags() {
        let node = parse("tags:\n  engine: knitr\n  formats: [html]\n");
        let tags = get_hash_tags(&node).unwrap().unwrap();
        assert_eq!(tags["engine"], serde_json::json!("knitr"));
        assert_eq!(tags["formats"], serde_json::json!(["html"]));
    }
}
