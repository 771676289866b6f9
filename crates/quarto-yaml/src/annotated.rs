//! Source-annotated parse trees.

use quarto_source_map::{MappedString, Range};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Structural kind of an annotated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Tagged,
}

impl NodeKind {
    pub fn of(value: &Value) -> NodeKind {
        match value {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Integer(_) | Value::Float(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
            Value::Tagged(_) => NodeKind::Tagged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Boolean => "boolean",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
            NodeKind::Tagged => "tagged",
        }
    }
}

/// A syntax error recorded on the root of a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub start: usize,
    pub end: usize,
    pub message: String,
}

/// A parsed value together with the source range that produced it.
///
/// `[start, end)` is expressed in `source` coordinates. For mappings,
/// `components` alternates key and value nodes in source order; for
/// sequences there is one component per element; scalars have none.
/// `errors` is only ever populated on the root node of a parse.
#[derive(Debug, Clone)]
pub struct AnnotatedParse {
    pub start: usize,
    pub end: usize,
    pub result: Value,
    pub kind: NodeKind,
    pub source: MappedString,
    pub components: Vec<AnnotatedParse>,
    pub errors: Vec<ParseError>,
}

impl AnnotatedParse {
    /// Create a leaf node.
    pub fn scalar(source: &MappedString, start: usize, end: usize, result: Value) -> Self {
        AnnotatedParse {
            start,
            end,
            kind: NodeKind::of(&result),
            result,
            source: source.clone(),
            components: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }

    /// The source text this node was parsed from.
    pub fn text(&self) -> &str {
        self.source.value().get(self.start..self.end).unwrap_or("")
    }

    pub fn is_object(&self) -> bool {
        self.kind == NodeKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind == NodeKind::Array
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_object() && !self.is_array()
    }

    /// Key/value node pairs of a mapping, in source order.
    pub fn entries(&self) -> impl Iterator<Item = (&AnnotatedParse, &AnnotatedParse)> {
        let components: &[AnnotatedParse] = if self.is_object() {
            &self.components
        } else {
            &[]
        };
        components.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Element nodes of a sequence.
    pub fn items(&self) -> &[AnnotatedParse] {
        if self.is_array() {
            &self.components
        } else {
            &[]
        }
    }

    /// Value node for `key`; the last occurrence wins, matching `result`.
    pub fn get(&self, key: &str) -> Option<&AnnotatedParse> {
        self.entries()
            .filter(|(k, _)| k.result.to_key_string() == key)
            .last()
            .map(|(_, v)| v)
    }

    /// Key node for `key`.
    pub fn get_key(&self, key: &str) -> Option<&AnnotatedParse> {
        self.entries()
            .filter(|(k, _)| k.result.to_key_string() == key)
            .last()
            .map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        match self.kind {
            NodeKind::Object => self.components.len() / 2,
            NodeKind::Array => self.components.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Innermost node whose range contains `offset`.
    ///
    /// A node's end offset counts as inside it, so a cursor placed right
    /// after a value still finds that value.
    pub fn node_at(&self, offset: usize) -> Option<&AnnotatedParse> {
        if offset < self.start || offset > self.end {
            return None;
        }
        self.components
            .iter()
            .find_map(|c| c.node_at(offset))
            .or(Some(self))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_yaml;

    #[test]
    fn test_entries_and_get() {
        let source = MappedString::original("a: 1\nb: two\n", None);
        let parse = parse_yaml(&source);
        assert!(parse.is_object());
        assert_eq!(parse.len(), 2);
        let keys: Vec<&str> = parse.entries().map(|(k, _)| k.text()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(parse.get("b").unwrap().text(), "two");
        assert_eq!(parse.get_key("b").unwrap().start, 5);
        assert!(parse.get("c").is_none());
    }

    #[test]
    fn test_node_at() {
        let source = MappedString::original("list: [1, 22, 3]", None);
        let parse = parse_yaml(&source);
        let node = parse.node_at(11).unwrap();
        assert_eq!(node.text(), "22");
        let node = parse.node_at(6).unwrap();
        assert!(node.is_array());
        assert!(parse.node_at(100).is_none());
    }
}
