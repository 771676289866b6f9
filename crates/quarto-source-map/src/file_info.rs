//! Efficient line-break index for offset → line/column lookups

use crate::types::Position;

/// Line-start index for a piece of text.
///
/// Built once per original string by scanning for line breaks. Both `\n` and
/// `\r\n` count as a single break, so the column resets immediately after
/// either. Lookups run in O(log n) via binary search over line starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInformation {
    /// Byte offset at which each line starts; always begins with 0
    line_starts: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,
}

impl FileInformation {
    /// Create file information by analyzing content
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("line 1\r\nline 2\nline 3");
    /// assert_eq!(info.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter_map(|(idx, b)| (b == b'\n').then_some(idx + 1)),
        );

        FileInformation {
            line_starts,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a zero-based line/column position.
    ///
    /// `content` must be the same text this index was built from. Returns
    /// `None` when the offset lies past the end of the text.
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_source_map::{FileInformation, Position};
    ///
    /// let text = "hello\nworld";
    /// let info = FileInformation::new(text);
    /// assert_eq!(info.position(text, 6), Some(Position { line: 1, column: 0 }));
    /// ```
    pub fn position(&self, content: &str, offset: usize) -> Option<Position> {
        if offset > self.total_length {
            return None;
        }

        let line = self.line_of(offset);
        let line_start = self.line_starts[line];
        let column = content[line_start..]
            .char_indices()
            .take_while(|(idx, _)| line_start + idx < offset)
            .count();

        Some(Position { line, column })
    }

    /// Zero-based line containing `offset` (clamped to the last line).
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1)
    }

    /// Byte range `[start, end)` of a line, excluding its terminator.
    pub fn line_range(&self, content: &str, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let mut end = self
            .line_starts
            .get(line + 1)
            .map_or(self.total_length, |next| next - 1);
        if end > start && content.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some((start, end))
    }

    /// Get the total length of the text in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of lines; text ending in a break has a final empty line
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
