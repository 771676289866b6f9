//! Mapped strings: text values that remember where every byte came from

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SourceMapError};
use crate::file_info::FileInformation;
use crate::types::{Position, Range};

/// An immutable string with an offset → original-location function.
///
/// A `MappedString` is either an *original* (text read from a file or handed
/// over by an editor) or *derived* from other mapped strings by selecting
/// ranges and inserting synthetic text. Derived strings keep their bases
/// alive through reference counting, so arbitrarily deep chains can be built
/// without copying provenance information. Cloning is cheap.
#[derive(Clone)]
pub struct MappedString {
    inner: Arc<Inner>,
}

struct Inner {
    value: String,
    file_name: Option<String>,
    origin: Origin,
    /// Line index, built on first line/column lookup. Only used by originals.
    line_info: OnceLock<FileInformation>,
}

enum Origin {
    Original,
    /// Pieces sorted by `offset`, non-overlapping, no zero-length entries
    Derived(Vec<Piece>),
}

struct Piece {
    /// Where this piece starts in the derived value
    offset: usize,
    length: usize,
    source: PieceSource,
}

enum PieceSource {
    Mapped { base: MappedString, start: usize },
    Synthetic,
}

/// Result of resolving an offset back to its original text.
#[derive(Debug, Clone)]
pub struct MappedLocation {
    /// Byte offset in `original`
    pub index: usize,
    /// The deepest original string the offset resolves into
    pub original: MappedString,
}

/// One piece of a string assembled by [`mapped_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringPiece {
    /// Keep this range of the source text
    Range(Range),
    /// Insert literal text with no source backing
    Text(String),
}

impl From<Range> for StringPiece {
    fn from(range: Range) -> Self {
        StringPiece::Range(range)
    }
}

impl From<std::ops::Range<usize>> for StringPiece {
    fn from(range: std::ops::Range<usize>) -> Self {
        StringPiece::Range(range.into())
    }
}

impl From<&str> for StringPiece {
    fn from(text: &str) -> Self {
        StringPiece::Text(text.to_string())
    }
}

impl From<String> for StringPiece {
    fn from(text: String) -> Self {
        StringPiece::Text(text)
    }
}

impl MappedString {
    /// Create an original, source-backed string.
    pub fn original(value: impl Into<String>, file_name: Option<&str>) -> Self {
        MappedString {
            inner: Arc::new(Inner {
                value: value.into(),
                file_name: file_name.map(str::to_string),
                origin: Origin::Original,
                line_info: OnceLock::new(),
            }),
        }
    }

    fn derived(value: String, file_name: Option<String>, pieces: Vec<Piece>) -> Self {
        MappedString {
            inner: Arc::new(Inner {
                value,
                file_name,
                origin: Origin::Derived(pieces),
                line_info: OnceLock::new(),
            }),
        }
    }

    pub fn value(&self) -> &str {
        &self.inner.value
    }

    pub fn file_name(&self) -> Option<&str> {
        self.inner.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.inner.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.value.is_empty()
    }

    /// True when this string is an original rather than derived text.
    pub fn is_original(&self) -> bool {
        matches!(self.inner.origin, Origin::Original)
    }

    /// The original this string's first mapped byte resolves into.
    ///
    /// Returns `self` for originals and for purely synthetic strings.
    pub fn original_string(&self) -> MappedString {
        self.map(0, true)
            .map(|loc| loc.original)
            .unwrap_or_else(|| self.clone())
    }

    /// True when both handles point to the same underlying string.
    pub fn ptr_eq(&self, other: &MappedString) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve `index` to a location in the deepest original string.
    ///
    /// Offsets inside synthetic text resolve to `None` unless `closest` is
    /// set, in which case the nearest preceding mapped location is returned
    /// (or the first following one when nothing precedes). For original
    /// strings `index == len()` is valid and denotes the end of the text.
    pub fn map(&self, index: usize, closest: bool) -> Option<MappedLocation> {
        match &self.inner.origin {
            Origin::Original => {
                let len = self.len();
                if index <= len {
                    Some(MappedLocation {
                        index,
                        original: self.clone(),
                    })
                } else if closest {
                    Some(MappedLocation {
                        index: len,
                        original: self.clone(),
                    })
                } else {
                    None
                }
            }
            Origin::Derived(pieces) => map_derived(pieces, index, closest),
        }
    }

    /// Slice `[start, end)` of this string as a new mapped string.
    pub fn substring(&self, start: usize, end: usize) -> Result<MappedString> {
        mapped_string(self, vec![StringPiece::Range(Range::new(start, end))])
    }

    /// Line index for this string's own text.
    pub fn file_info(&self) -> &FileInformation {
        self.inner
            .line_info
            .get_or_init(|| FileInformation::new(&self.inner.value))
    }

    /// Zero-based line/column of `offset` in this string's own text.
    pub fn position(&self, offset: usize) -> Option<Position> {
        self.file_info().position(self.value(), offset)
    }

    /// Slice without validation; callers guarantee char-boundary ranges.
    fn slice_unchecked(&self, start: usize, end: usize) -> MappedString {
        let pieces = if start < end {
            vec![Piece {
                offset: 0,
                length: end - start,
                source: PieceSource::Mapped {
                    base: self.clone(),
                    start,
                },
            }]
        } else {
            Vec::new()
        };
        MappedString::derived(
            self.inner.value[start..end].to_string(),
            self.inner.file_name.clone(),
            pieces,
        )
    }
}

fn map_derived(pieces: &[Piece], index: usize, closest: bool) -> Option<MappedLocation> {
    // Number of pieces starting at or before `index`
    let after = pieces.partition_point(|p| p.offset <= index);

    if let Some(piece) = after.checked_sub(1).map(|i| &pieces[i]) {
        if index < piece.offset + piece.length {
            if let PieceSource::Mapped { base, start } = &piece.source {
                return base.map(start + index - piece.offset, closest);
            }
        }
    }

    if !closest {
        return None;
    }

    // Nearest preceding mapped piece, clamped to its end
    for piece in pieces[..after].iter().rev() {
        if let PieceSource::Mapped { base, start } = &piece.source {
            let local = (index - piece.offset).min(piece.length);
            return base.map(start + local, true);
        }
    }

    // Nothing precedes: the first following mapped piece
    pieces[after..].iter().find_map(|piece| match &piece.source {
        PieceSource::Mapped { base, start } => base.map(*start, true),
        PieceSource::Synthetic => None,
    })
}

fn check_range(source: &str, range: &Range) -> Result<()> {
    if range.start > range.end {
        return Err(SourceMapError::InvertedRange {
            start: range.start,
            end: range.end,
        });
    }
    if range.end > source.len() {
        return Err(SourceMapError::OutOfBounds {
            start: range.start,
            end: range.end,
            len: source.len(),
        });
    }
    for offset in [range.start, range.end] {
        if !source.is_char_boundary(offset) {
            return Err(SourceMapError::NotCharBoundary { offset });
        }
    }
    Ok(())
}

/// Build a new mapped string from ranges of `source` and literal text.
///
/// Ranges are kept in the order given and may be non-contiguous or out of
/// source order. Literal text pieces are synthetic: offsets inside them do
/// not map back to any source.
///
/// # Example
///
/// ```
/// use quarto_source_map::{MappedString, StringPiece, mapped_string};
///
/// let base = MappedString::original("alpha beta gamma", None);
/// let s = mapped_string(&base, vec![(11..16).into(), " & ".into(), (0..5).into()]).unwrap();
/// assert_eq!(s.value(), "gamma & alpha");
/// assert_eq!(s.map(8, false).unwrap().index, 0);
/// assert!(s.map(6, false).is_none());
/// ```
pub fn mapped_string(
    source: impl Into<MappedString>,
    pieces: Vec<StringPiece>,
) -> Result<MappedString> {
    let source: MappedString = source.into();
    let mut value = String::new();
    let mut out = Vec::with_capacity(pieces.len());

    for piece in pieces {
        let offset = value.len();
        match piece {
            StringPiece::Range(range) => {
                check_range(source.value(), &range)?;
                if range.is_empty() {
                    continue;
                }
                value.push_str(&source.value()[range.start..range.end]);
                out.push(Piece {
                    offset,
                    length: range.len(),
                    source: PieceSource::Mapped {
                        base: source.clone(),
                        start: range.start,
                    },
                });
            }
            StringPiece::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                value.push_str(&text);
                out.push(Piece {
                    offset,
                    length: text.len(),
                    source: PieceSource::Synthetic,
                });
            }
        }
    }

    Ok(MappedString::derived(
        value,
        source.inner.file_name.clone(),
        out,
    ))
}

/// Concatenate several mapped strings, keeping each one's provenance.
pub fn mapped_concat(strings: Vec<MappedString>) -> MappedString {
    let mut value = String::new();
    let mut pieces = Vec::with_capacity(strings.len());
    let file_name = strings.iter().find_map(|s| s.inner.file_name.clone());

    for s in strings {
        if s.is_empty() {
            continue;
        }
        let offset = value.len();
        value.push_str(s.value());
        pieces.push(Piece {
            offset,
            length: s.len(),
            source: PieceSource::Mapped { base: s, start: 0 },
        });
    }

    MappedString::derived(value, file_name, pieces)
}

/// Split a mapped string into lines, each keeping its provenance.
///
/// Terminators (`\n` or `\r\n`) are dropped; a trailing terminator does not
/// produce a final empty line.
pub fn mapped_lines(source: &MappedString) -> Vec<MappedString> {
    let text = source.value();
    let mut lines = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let (end, next) = match text[start..].find('\n') {
            Some(rel) => (start + rel, start + rel + 1),
            None => (text.len(), text.len()),
        };
        let content_end = if end > start && text.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        lines.push(source.slice_unchecked(start, content_end));
        start = next;
    }

    lines
}

/// Return a function from offsets in `source` to zero-based line/column
/// positions in the deepest original text.
///
/// Offsets inside synthetic text resolve to the closest preceding mapped
/// location.
pub fn mapped_index_to_line_col(
    source: &MappedString,
) -> impl Fn(usize) -> Option<Position> + Send + Sync + 'static {
    let source = source.clone();
    move |offset| {
        let loc = source.map(offset, true)?;
        loc.original.position(loc.index)
    }
}

impl From<&str> for MappedString {
    fn from(value: &str) -> Self {
        MappedString::original(value, None)
    }
}

impl From<String> for MappedString {
    fn from(value: String) -> Self {
        MappedString::original(value, None)
    }
}

impl From<&MappedString> for MappedString {
    fn from(value: &MappedString) -> Self {
        value.clone()
    }
}

impl fmt::Debug for MappedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedString")
            .field("value", &self.inner.value)
            .field("file_name", &self.inner.file_name)
            .field("original", &self.is_original())
            .finish()
    }
}

impl fmt::Display for MappedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl PartialEq for MappedString {
    /// Strings compare by text; provenance is not part of equality.
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Serialize for MappedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.value())
    }
}

impl<'de> Deserialize<'de> for MappedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(MappedString::original(value, None))
    }
}
