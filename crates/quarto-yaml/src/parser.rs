//! YAML parser that builds [`AnnotatedParse`] trees.

use std::collections::HashMap;

use indexmap::IndexMap;
use quarto_source_map::MappedString;
use tracing::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::annotated::{AnnotatedParse, NodeKind, ParseError};
use crate::scalar::resolve_scalar;
use crate::value::Value;

/// Parse the first YAML document in `source`.
///
/// Never fails: syntax errors are recorded on the returned root's `errors`
/// and every node completed before the failure is kept, with open
/// collections closed at the failure offset. An empty document parses to a
/// null node at `0..0`.
///
/// # Example
///
/// ```rust
/// use quarto_source_map::MappedString;
/// use quarto_yaml::parse_yaml;
///
/// let source = MappedString::original("title: \"My Doc\"\n", None);
/// let parse = parse_yaml(&source);
/// let title = parse.get("title").unwrap();
/// assert_eq!((title.start, title.end), (7, 15));
/// assert_eq!(title.result.as_str(), Some("My Doc"));
/// ```
pub fn parse_yaml(source: &MappedString) -> AnnotatedParse {
    let mut builder = TreeBuilder::new(source);
    let mut parser = Parser::new_from_str(source.value());

    if let Err(err) = parser.load(&mut builder, false) {
        let offset = builder.offsets.byte(err.marker().index());
        debug!(
            file = source.file_name().unwrap_or("<anonymous>"),
            offset,
            error = err.info(),
            "YAML parse failed"
        );
        builder.fail(offset, err.info().to_string());
    }

    builder.finish()
}

/// Parse `text` as a fresh original string.
///
/// Files whose name ends in `.json` go through [`crate::parse_json`].
pub fn parse(text: &str, file_name: Option<&str>) -> AnnotatedParse {
    let source = MappedString::original(text, file_name);
    if file_name.is_some_and(|name| name.ends_with(".json")) {
        crate::json::parse_json(&source)
    } else {
        parse_yaml(&source)
    }
}

/// Converts the scanner's character indices into byte offsets.
struct CharOffsets {
    /// `None` when the text is ASCII and the two coincide
    bytes: Option<Vec<usize>>,
    len: usize,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let bytes = (!text.is_ascii()).then(|| {
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect()
        });
        CharOffsets {
            bytes,
            len: text.len(),
        }
    }

    fn byte(&self, char_index: usize) -> usize {
        match &self.bytes {
            None => char_index.min(self.len),
            Some(bytes) => bytes.get(char_index).copied().unwrap_or(self.len),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CollectionKind {
    Sequence,
    Mapping,
}

/// A collection whose end event has not been seen yet.
struct OpenCollection {
    kind: CollectionKind,
    start: usize,
    /// `[...]` / `{...}` rather than indentation-delimited
    flow: bool,
    anchor: usize,
    components: Vec<AnnotatedParse>,
}

struct TreeBuilder<'a> {
    source: &'a MappedString,
    text: &'a str,
    offsets: CharOffsets,
    stack: Vec<OpenCollection>,
    /// Completed anchored nodes by anchor id
    anchors: HashMap<usize, AnnotatedParse>,
    root: Option<AnnotatedParse>,
    errors: Vec<ParseError>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a MappedString) -> Self {
        let text = source.value();
        TreeBuilder {
            source,
            text,
            offsets: CharOffsets::new(text),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
            errors: Vec::new(),
        }
    }

    fn rest(&self, offset: usize) -> &'a str {
        self.text.get(offset..).unwrap_or("")
    }

    fn finish(self) -> AnnotatedParse {
        let mut root = self
            .root
            .unwrap_or_else(|| AnnotatedParse::scalar(self.source, 0, 0, Value::Null));
        root.errors = self.errors;
        root
    }

    /// Record a syntax error and close every open collection at `offset`.
    fn fail(&mut self, offset: usize, message: String) {
        let width = self.rest(offset).chars().next().map_or(0, char::len_utf8);
        self.errors.push(ParseError {
            start: offset,
            end: offset + width,
            message,
        });
        while let Some(open) = self.stack.pop() {
            let end = offset.max(open.start);
            let anchor = open.anchor;
            let node = self.close_collection(open, end);
            self.complete(node, anchor);
        }
    }

    /// Attach a finished node to its parent (or make it the root).
    fn complete(&mut self, node: AnnotatedParse, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        match self.stack.last_mut() {
            Some(parent) => parent.components.push(node),
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }

    fn open(&mut self, kind: CollectionKind, start: usize, anchor: usize) {
        let opener = match kind {
            CollectionKind::Sequence => '[',
            CollectionKind::Mapping => '{',
        };
        self.stack.push(OpenCollection {
            kind,
            start,
            flow: self.rest(start).starts_with(opener),
            anchor,
            components: Vec::new(),
        });
    }

    /// Handle a sequence or mapping end event positioned at `offset`.
    fn close(&mut self, offset: usize) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let last_end = open.components.last().map_or(open.start, |c| c.end);
        let end = if open.flow && self.rest(offset).starts_with([']', '}']) {
            offset + 1
        } else {
            last_end
        };
        let anchor = open.anchor;
        let node = self.close_collection(open, end.max(last_end));
        self.complete(node, anchor);
    }

    fn close_collection(&self, open: OpenCollection, end: usize) -> AnnotatedParse {
        let OpenCollection {
            kind,
            start,
            flow,
            mut components,
            ..
        } = open;
        // Block mapping events are marked after the first key
        let start = if flow {
            start
        } else {
            components.first().map_or(start, |c| c.start.min(start))
        };

        let result = match kind {
            CollectionKind::Sequence => {
                Value::Array(components.iter().map(|c| c.result.clone()).collect())
            }
            CollectionKind::Mapping => {
                // A key left without a value by a syntax error
                if components.len() % 2 == 1 {
                    components.pop();
                }
                let mut map = IndexMap::with_capacity(components.len() / 2);
                for pair in components.chunks_exact(2) {
                    map.insert(pair[0].result.to_key_string(), pair[1].result.clone());
                }
                Value::Object(map)
            }
        };

        AnnotatedParse {
            start,
            end,
            kind: NodeKind::of(&result),
            result,
            source: self.source.clone(),
            components,
            errors: Vec::new(),
        }
    }

    fn scalar(
        &self,
        offset: usize,
        text: &str,
        style: TScalarStyle,
        tag: Option<&Tag>,
    ) -> AnnotatedParse {
        // The event parser reports an absent value as a plain `~` located at
        // whatever token follows it.
        let implicit_empty = matches!(style, TScalarStyle::Plain)
            && text == "~"
            && !self.rest(offset).starts_with('~');

        if implicit_empty {
            let at = self.empty_value_offset(offset);
            return AnnotatedParse::scalar(self.source, at, at, resolve_scalar("", style, tag));
        }

        let end = offset + self.scalar_len(offset, text, style);
        AnnotatedParse::scalar(self.source, offset, end, resolve_scalar(text, style, tag))
    }

    /// Place an empty value right after the indicator that introduced it.
    fn empty_value_offset(&self, next_token: usize) -> usize {
        let floor = self
            .stack
            .last()
            .map_or(0, |open| open.components.last().map_or(open.start, |c| c.end));
        let before = self.text.get(..next_token).unwrap_or(self.text);
        before.trim_end().len().max(floor).min(next_token)
    }

    /// Length of the scalar token starting at `offset`, quotes and block
    /// headers included.
    fn scalar_len(&self, offset: usize, text: &str, style: TScalarStyle) -> usize {
        let rest = self.rest(offset);
        match style {
            TScalarStyle::Plain => {
                if rest.starts_with(text) {
                    text.len()
                } else {
                    // Folded over several lines
                    walk_words(rest, text, 0)
                }
            }
            TScalarStyle::DoubleQuoted => {
                double_quoted_len(rest).unwrap_or_else(|| walk_words(rest, text, 1))
            }
            TScalarStyle::SingleQuoted => {
                single_quoted_len(rest).unwrap_or_else(|| walk_words(rest, text, 1))
            }
            _ => {
                let header = rest.find('\n').unwrap_or(rest.len());
                if text.trim().is_empty() {
                    header.max(1).min(rest.len())
                } else {
                    walk_words(rest, text, header)
                }
            }
        }
    }

    fn alias(&self, anchor: usize, offset: usize) -> AnnotatedParse {
        let rest = self.rest(offset);
        let len = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c.is_whitespace() || ",[]{}".contains(c))
            .map_or(rest.len(), |(i, _)| i);

        match self.anchors.get(&anchor) {
            Some(anchored) => {
                let mut node = anchored.clone();
                node.start = offset;
                node.end = offset + len;
                node
            }
            None => AnnotatedParse::scalar(self.source, offset, offset + len, Value::Null),
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        let offset = self.offsets.byte(marker.index());
        match ev {
            Event::Scalar(text, style, anchor, tag) => {
                let node = self.scalar(offset, &text, style, tag.as_ref());
                self.complete(node, anchor);
            }
            Event::SequenceStart(anchor, _) => {
                self.open(CollectionKind::Sequence, offset, anchor);
            }
            Event::MappingStart(anchor, _) => {
                self.open(CollectionKind::Mapping, offset, anchor);
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(offset),
            Event::Alias(anchor) => {
                let node = self.alias(anchor, offset);
                self.complete(node, 0);
            }
            _ => {}
        }
    }
}

fn double_quoted_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn single_quoted_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
            } else {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Find each word of `text` in order in `rest`, starting at `from`, and
/// return the offset just past the last one.
fn walk_words(rest: &str, text: &str, from: usize) -> usize {
    let mut cursor = from.min(rest.len());
    for word in text.split_whitespace() {
        match rest.get(cursor..).and_then(|tail| tail.find(word)) {
            Some(pos) => cursor += pos + word.len(),
            None => break,
        }
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> AnnotatedParse {
        parse_yaml(&MappedString::original(text, None))
    }

    #[test]
    fn test_parse_scalar() {
        let parse = parse_str("hello");
        assert!(parse.is_scalar());
        assert_eq!(parse.result.as_str(), Some("hello"));
        assert_eq!((parse.start, parse.end), (0, 5));
    }

    #[test]
    fn test_mapping_ranges() {
        let text = "a: 1\nb: [2, 3]\n";
        let parse = parse_str(text);
        assert!(parse.is_object());
        assert_eq!(parse.start, 0);
        assert_eq!(parse.end, 14);

        let b = parse.get("b").unwrap();
        assert_eq!(b.text(), "[2, 3]");
        assert_eq!(b.items()[1].start, 12);
        assert_eq!(b.items()[1].result, Value::Integer(3));
    }

    #[test]
    fn test_quoted_scalar_ranges_include_quotes() {
        let parse = parse_str("a: \"x\\\"y\"\nb: 'it''s'\n");
        assert_eq!(parse.get("a").unwrap().text(), "\"x\\\"y\"");
        assert_eq!(parse.get("a").unwrap().result.as_str(), Some("x\"y"));
        assert_eq!(parse.get("b").unwrap().text(), "'it''s'");
        assert_eq!(parse.get("b").unwrap().result.as_str(), Some("it's"));
    }

    #[test]
    fn test_block_scalar_range() {
        let text = "body: |\n  line one\n  line two\nnext: 1\n";
        let parse = parse_str(text);
        let body = parse.get("body").unwrap();
        assert_eq!(body.result.as_str(), Some("line one\nline two\n"));
        assert_eq!(body.start, 6);
        assert_eq!(&text[body.start..body.end], "|\n  line one\n  line two");
    }

    #[test]
    fn test_multiline_plain_scalar() {
        let text = "title: a long\n  title here\n";
        let parse = parse_str(text);
        let title = parse.get("title").unwrap();
        assert_eq!(title.result.as_str(), Some("a long title here"));
        assert_eq!(title.text(), "a long\n  title here");
    }

    #[test]
    fn test_empty_value() {
        let parse = parse_str("a:\nb: 1\n");
        let a = parse.get("a").unwrap();
        assert!(a.result.is_null());
        assert_eq!((a.start, a.end), (2, 2));
        assert_eq!(parse.get("b").unwrap().result, Value::Integer(1));
    }

    #[test]
    fn test_empty_document() {
        let parse = parse_str("");
        assert!(parse.result.is_null());
        assert_eq!((parse.start, parse.end), (0, 0));
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_non_ascii_offsets_are_bytes() {
        let text = "título: «olá»\nnext: 2\n";
        let parse = parse_str(text);
        let value = parse.get("título").unwrap();
        assert_eq!(value.text(), "«olá»");
        let next = parse.get_key("next").unwrap();
        assert_eq!(&text[next.start..next.end], "next");
    }

    #[test]
    fn test_nested_block_mapping_ranges() {
        let parse = parse_str("a:\n  b: 1\n");
        let a = parse.get("a").unwrap();
        assert_eq!(a.text(), "b: 1");
        assert_eq!(a.start, 5);

        let parse = parse_str("format:\n  html:\n    toc: 7\n");
        let format = parse.get("format").unwrap();
        assert_eq!(format.text(), "html:\n    toc: 7");
        let html = format.get("html").unwrap();
        assert_eq!(html.text(), "toc: 7");
        assert_eq!(html.get("toc").unwrap().text(), "7");
    }

    #[test]
    fn test_block_sequence_in_mapping() {
        let text = "authors:\n  - Alice\n  - Bob\n";
        let parse = parse_str(text);
        let authors = parse.get("authors").unwrap();
        assert!(authors.is_array());
        assert_eq!(authors.len(), 2);
        assert_eq!(authors.items()[1].text(), "Bob");
        assert_eq!(authors.end, authors.items()[1].end);
    }

    #[test]
    fn test_alias_copies_anchored_value() {
        let parse = parse_str("base: &b\n  x: 1\nother: *b\n");
        let other = parse.get("other").unwrap();
        assert!(other.is_object());
        assert_eq!(other.text(), "*b");
        assert_eq!(other.result.get("x"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_custom_tag() {
        let parse = parse_str("x: !expr params$a\n");
        let x = parse.get("x").unwrap();
        assert_eq!(x.kind, NodeKind::Tagged);
        assert_eq!(x.text(), "params$a");
        assert_eq!(x.result.as_tagged().unwrap().tag, "!expr");
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let parse = parse_str("a: 1\na: 2\n");
        assert_eq!(parse.len(), 2);
        assert_eq!(parse.result.get("a"), Some(&Value::Integer(2)));
        assert_eq!(parse.get("a").unwrap().start, 8);
    }

    #[test]
    fn test_syntax_error_keeps_partial_tree() {
        let text = "a: 1\nb: [2, 3\nc: 4\n";
        let parse = parse_str(text);
        assert!(parse.has_errors());
        assert!(parse.is_object());
        assert_eq!(parse.result.get("a"), Some(&Value::Integer(1)));
        let error = &parse.errors[0];
        assert!(error.start <= text.len());
        assert!(error.start <= error.end);
    }

    #[test]
    fn test_unterminated_quote_reports_error() {
        let parse = parse_str("a: \"open\n");
        assert!(parse.has_errors());
        assert!(!parse.errors[0].message.is_empty());
    }

    #[test]
    fn test_parse_by_file_name() {
        let parse = parse("{\"a\": [1, 2]}", Some("config.json"));
        assert_eq!(parse.source.file_name(), Some("config.json"));
        assert_eq!(parse.get("a").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_through_derived_string() {
        let doc = MappedString::original("---\ntitle: Hi\n---\nbody\n", Some("doc.qmd"));
        let front = doc.substring(4, 14).unwrap();
        let parse = parse_yaml(&front);
        let title = parse.get("title").unwrap();
        assert_eq!(title.text(), "Hi");
        let loc = parse.source.map(title.start, false).unwrap();
        assert_eq!(loc.index, 11);
        assert!(loc.original.ptr_eq(&doc));
    }
}
