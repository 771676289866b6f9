//! Request context and YAML extraction.
//!
//! A host sends the whole editor buffer. Only part of it is YAML: a `.qmd`
//! file has front matter between `---` fences, a code cell has `#| key:
//! value` option lines. Extraction builds a [`MappedString`] over just that
//! YAML so that parse and validation offsets still resolve to positions in
//! the buffer.

use std::borrow::Cow;

use quarto_source_map::{MappedString, Range, StringPiece, mapped_lines, mapped_string};
use quarto_yaml_validation::{Schema, SchemaModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};

/// Schema used for `.qmd` front matter when none is pinned.
pub const FRONT_MATTER_SCHEMA: &str = "front-matter";
/// Schema used for `_quarto.yml` and other plain YAML files.
pub const PROJECT_CONFIG_SCHEMA: &str = "project-config";
/// Schema used for `#|` cell options.
pub const CELL_OPTIONS_SCHEMA: &str = "cell-options";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Yaml,
    Markdown,
    Script,
}

/// Zero-based cursor position; `column` counts characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub row: usize,
    pub column: usize,
}

/// Everything a lint or completion request knows about the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlIntelligenceContext {
    pub code: String,
    #[serde(default)]
    pub position: CursorPosition,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub filetype: FileType,
    /// Active output formats, e.g. `["html", "pdf"]`
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub engine: Option<String>,
    /// Language of the code cell, for `script` buffers
    #[serde(default)]
    pub language: Option<String>,
    /// A schema pinned inline, in the JSON schema syntax
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
    /// Id of a schema in the model, overriding the filetype default
    #[serde(default)]
    pub schema_name: Option<String>,
}

/// YAML pulled out of a buffer.
#[derive(Debug, Clone)]
pub struct ExtractedYaml {
    pub source: MappedString,
    /// The cursor as an offset into `source`, if it falls inside it
    pub cursor: Option<usize>,
}

impl YamlIntelligenceContext {
    pub fn new(code: impl Into<String>, filetype: FileType) -> Self {
        YamlIntelligenceContext {
            code: code.into(),
            filetype,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, row: usize, column: usize) -> Self {
        self.position = CursorPosition { row, column };
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The buffer as an original mapped string.
    pub fn document(&self) -> MappedString {
        MappedString::original(self.code.as_str(), self.path.as_deref())
    }

    /// Byte offset of the cursor in `code`.
    ///
    /// Columns past the end of the line clamp to the line end; rows past the
    /// end of the buffer have no offset.
    pub fn cursor_offset(&self) -> Option<usize> {
        let mut line_start = 0;
        for _ in 0..self.position.row {
            line_start += self.code[line_start..].find('\n')? + 1;
        }
        let line = &self.code[line_start..];
        let line = &line[..line.find('\n').unwrap_or(line.len())];
        let line = line.strip_suffix('\r').unwrap_or(line);
        let column = line
            .char_indices()
            .nth(self.position.column)
            .map_or(line.len(), |(i, _)| i);
        Some(line_start + column)
    }

    /// The YAML part of the buffer, or `None` when there is none
    /// (a `.qmd` file without front matter, a cell without options).
    pub fn extract_yaml(&self) -> Option<ExtractedYaml> {
        let document = self.document();
        let source = match self.filetype {
            FileType::Yaml => document,
            FileType::Markdown => front_matter(&document)?,
            FileType::Script => {
                cell_options(&document, comment_prefix(self.language.as_deref(), self.path.as_deref()))?
            }
        };
        let cursor = self
            .cursor_offset()
            .and_then(|offset| translate_offset(&source, offset));
        debug!(
            filetype = ?self.filetype,
            yaml_len = source.len(),
            cursor = ?cursor,
            "extracted yaml"
        );
        Some(ExtractedYaml { source, cursor })
    }

    /// Id of the schema requests against this buffer validate with.
    pub fn schema_id(&self) -> &str {
        match (&self.schema_name, self.filetype) {
            (Some(name), _) => name,
            (None, FileType::Yaml) => PROJECT_CONFIG_SCHEMA,
            (None, FileType::Markdown) => FRONT_MATTER_SCHEMA,
            (None, FileType::Script) => CELL_OPTIONS_SCHEMA,
        }
    }

    /// The schema to check against: the inline one if given, otherwise
    /// [`schema_id`](Self::schema_id) looked up in `model`.
    ///
    /// An id missing from the model is not the user's problem; it is
    /// logged and yields `None`, so only syntax errors get reported.
    pub fn resolve_schema<'m>(&self, model: &'m SchemaModel) -> Result<Option<Cow<'m, Schema>>> {
        if let Some(inline) = &self.schema {
            let schema = Schema::from_text(&inline.to_string(), Some("schema.json"))
                .map_err(|e| ProtocolError::MalformedRequest(format!("invalid schema: {}", e)))?;
            return Ok(Some(Cow::Owned(schema)));
        }
        let id = self.schema_id();
        match model.ref_schema(id) {
            Ok(schema) => Ok(Some(Cow::Borrowed(schema))),
            Err(error) => {
                warn!(%error, "no schema for request; skipping validation");
                Ok(None)
            }
        }
    }

    /// Whether a schema limited by `formats`/`engine` tags applies here.
    pub(crate) fn accepts(&self, schema: &Schema) -> bool {
        let Some(tags) = &schema.annotations().tags else {
            return true;
        };
        let listed = |tag: &str, active: &[&str]| match tags.get(tag).and_then(|v| v.as_array()) {
            Some(allowed) if !active.is_empty() => allowed
                .iter()
                .filter_map(|v| v.as_str())
                .any(|a| active.contains(&a)),
            _ => true,
        };
        let formats: Vec<&str> = self.formats.iter().map(String::as_str).collect();
        let engine: Vec<&str> = self.engine.as_deref().into_iter().collect();
        listed("formats", &formats) && listed("engine", &engine)
    }
}

/// The front matter block of a markdown document.
///
/// The document must open with a `---` line. The block ends at the next
/// `---` or `...` line, or runs to the end of the buffer while the closing
/// fence has not been typed yet.
fn front_matter(document: &MappedString) -> Option<MappedString> {
    let text = document.value();
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }
    let start = first.len();
    let mut offset = start;
    for line in lines {
        let fence = line.trim_end();
        if fence == "---" || fence == "..." {
            return document.substring(start, offset).ok();
        }
        offset += line.len();
    }
    document.substring(start, text.len()).ok()
}

fn comment_prefix(language: Option<&str>, path: Option<&str>) -> &'static str {
    let language = language.map(str::to_ascii_lowercase).or_else(|| {
        path.and_then(|p| p.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
    });
    match language.as_deref() {
        Some("js" | "javascript" | "ojs" | "ts" | "typescript" | "c" | "cpp" | "java" | "rust"
        | "rs" | "dot" | "mermaid" | "scala" | "go") => "//",
        Some("sql" | "lua" | "haskell" | "hs") => "--",
        _ => "#",
    }
}

/// The leading `#| ` option lines of a code cell, prefixes stripped.
fn cell_options(document: &MappedString, prefix: &str) -> Option<MappedString> {
    let marker = format!("{}|", prefix);
    let mut pieces = Vec::new();
    for line in mapped_lines(document) {
        let text = line.value();
        let indent = text.len() - text.trim_start().len();
        let Some(rest) = text[indent..].strip_prefix(marker.as_str()) else {
            break;
        };
        let skip = indent + marker.len() + usize::from(rest.starts_with(' '));
        let start = line.map(0, false)?.index;
        pieces.push(StringPiece::Range(Range::new(start + skip, start + text.len())));
        pieces.push(StringPiece::Text("\n".to_string()));
    }
    if pieces.is_empty() {
        return None;
    }
    mapped_string(document, pieces).ok()
}

/// Offset in `source` whose text sits at `offset` of the deepest original.
///
/// A cursor just past the last character of a line maps to the position
/// after that character.
fn translate_offset(source: &MappedString, offset: usize) -> Option<usize> {
    if source.is_original() {
        return (offset <= source.len()).then_some(offset);
    }
    let mut after = None;
    for (i, ch) in source.value().char_indices() {
        let Some(location) = source.map(i, false) else {
            continue;
        };
        if location.index == offset {
            return Some(i);
        }
        if location.index + ch.len_utf8() == offset {
            after = Some(i + ch.len_utf8());
        }
    }
    after
}
