//! JSON parsing into annotated trees.
//!
//! Syntax is checked strictly with `serde_json` first; the tree itself is
//! then built by a small scanner that stops where `serde_json` did.

use indexmap::IndexMap;
use quarto_source_map::MappedString;
use tracing::debug;

use crate::annotated::{AnnotatedParse, NodeKind, ParseError};
use crate::value::Value;

/// Parse `source` as a single JSON value.
///
/// Like [`crate::parse_yaml`] this never fails. Invalid JSON yields the
/// tree read up to where `serde_json` stopped, with every open container
/// closed there, and one error at that offset. A value cut short before
/// any container opened gives a null root.
pub fn parse_json(source: &MappedString) -> AnnotatedParse {
    let text = source.value();

    let error = serde_json::from_str::<serde_json::Value>(text).err().map(|err| {
        let start = error_offset(source, err.line(), err.column());
        let width = text[start..].chars().next().map_or(0, char::len_utf8);
        debug!(
            file = source.file_name().unwrap_or("<anonymous>"),
            offset = start,
            error = %err,
            "JSON parse failed"
        );
        ParseError {
            start,
            end: start + width,
            message: err.to_string(),
        }
    });

    let mut scanner = Scanner {
        source,
        text,
        pos: 0,
        limit: error.as_ref().map_or(text.len(), |e| e.start),
    };
    let mut root = scanner
        .value()
        .unwrap_or_else(|| AnnotatedParse::scalar(source, 0, 0, Value::Null));
    root.errors.extend(error);
    root
}

/// Byte offset for serde_json's one-based line and column.
fn error_offset(source: &MappedString, line: usize, column: usize) -> usize {
    let text = source.value();
    let line_start = source
        .file_info()
        .line_range(text, line.saturating_sub(1))
        .map_or(text.len(), |(start, _)| start);
    let mut offset = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

struct Scanner<'a> {
    source: &'a MappedString,
    text: &'a str,
    pos: usize,
    /// Nothing at or past this offset is read
    limit: usize,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        if self.pos >= self.limit {
            return None;
        }
        self.text.as_bytes().get(self.pos).copied()
    }

    fn visible(&self, start: usize) -> &str {
        self.text.get(start..self.limit).unwrap_or_default()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn leaf(&self, start: usize, result: Value) -> AnnotatedParse {
        AnnotatedParse::scalar(self.source, start, self.pos, result)
    }

    fn value(&mut self) -> Option<AnnotatedParse> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek()? {
            b'{' => Some(self.object(start)),
            b'[' => Some(self.array(start)),
            b'"' => {
                self.pos = start + string_len(self.visible(start))?;
                let s: String = serde_json::from_str(&self.text[start..self.pos]).ok()?;
                Some(self.leaf(start, Value::String(s)))
            }
            b't' => self.literal(start, "true", Value::Bool(true)),
            b'f' => self.literal(start, "false", Value::Bool(false)),
            b'n' => self.literal(start, "null", Value::Null),
            _ => {
                while matches!(
                    self.peek(),
                    Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9')
                ) {
                    self.pos += 1;
                }
                let number: serde_json::Value =
                    serde_json::from_str(&self.text[start..self.pos]).ok()?;
                Some(self.leaf(start, Value::from_json(&number)))
            }
        }
    }

    fn literal(&mut self, start: usize, word: &str, result: Value) -> Option<AnnotatedParse> {
        if !self.visible(start).starts_with(word) {
            return None;
        }
        self.pos = start + word.len();
        Some(self.leaf(start, result))
    }

    /// An object, closed at the limit if its `}` lies beyond it. A key
    /// whose value was cut off is dropped.
    fn object(&mut self, start: usize) -> AnnotatedParse {
        self.pos += 1;
        let mut components = Vec::new();
        let mut map = IndexMap::new();
        let mut closed = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b'}') => {
                    self.pos += 1;
                    closed = true;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }
            let Some(key) = self.value() else { break };
            self.skip_whitespace();
            if self.peek() == Some(b':') {
                self.pos += 1;
            }
            let Some(value) = self.value() else { break };
            map.insert(key.result.to_key_string(), value.result.clone());
            components.push(key);
            components.push(value);
        }
        self.collection(start, closed, Value::Object(map), components)
    }

    fn array(&mut self, start: usize) -> AnnotatedParse {
        self.pos += 1;
        let mut components = Vec::new();
        let mut closed = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(b']') => {
                    self.pos += 1;
                    closed = true;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }
            let Some(item) = self.value() else { break };
            components.push(item);
        }
        let result = Value::Array(components.iter().map(|c| c.result.clone()).collect());
        self.collection(start, closed, result, components)
    }

    fn collection(
        &self,
        start: usize,
        closed: bool,
        result: Value,
        components: Vec<AnnotatedParse>,
    ) -> AnnotatedParse {
        AnnotatedParse {
            start,
            end: if closed { self.pos } else { self.limit.max(start) },
            kind: NodeKind::of(&result),
            result,
            source: self.source.clone(),
            components,
            errors: Vec::new(),
        }
    }
}

/// Length of the JSON string literal at the start of `rest`, quotes included.
fn string_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
