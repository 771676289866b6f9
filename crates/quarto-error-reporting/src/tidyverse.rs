//! Located, human-phrased diagnostics handed to editor front ends.

use std::fmt::Write;

use indexmap::IndexMap;
use quarto_source_map::{Position, Range};
use serde::{Deserialize, Serialize};

use crate::builder::DiagnosticMessageBuilder;
use crate::diagnostic::DiagnosticMessage;
use crate::text::color_quoted_strings;

/// Start and end of a diagnostic, zero-based, in the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub start: Position,
    pub end: Position,
}

/// A diagnostic in the tidyverse shape: a heading saying what was expected,
/// error bullets with specifics, and tagged info notes.
///
/// `info` holds at most one note per tag; adding a note under an existing
/// tag replaces it. This is what keeps repeated explanations (the same
/// "did you mean" from several branches, say) from piling up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidyverseError {
    pub heading: String,
    pub error: Vec<String>,
    pub info: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ErrorLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Offsets in the text the error was located against
    #[serde(skip)]
    pub range: Option<Range>,
}

impl TidyverseError {
    pub fn new(heading: impl Into<String>) -> Self {
        TidyverseError {
            heading: heading.into(),
            error: Vec::new(),
            info: IndexMap::new(),
            file_name: None,
            location: None,
            source_context: None,
            code: None,
            range: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.error.push(error.into());
    }

    /// Set the note for `tag`, replacing any earlier one.
    pub fn add_info(&mut self, tag: impl Into<String>, note: impl Into<String>) {
        let tag = tag.into();
        // keep the replaced tag's position so output order is stable
        match self.info.get_mut(&tag) {
            Some(existing) => *existing = note.into(),
            None => {
                self.info.insert(tag, note.into());
            }
        }
    }

    /// Render as text.
    ///
    /// `styled` only adds terminal colour to quoted strings; stripping the
    /// escapes from a styled rendering yields the plain one.
    ///
    /// ```
    /// use quarto_error_reporting::TidyverseError;
    ///
    /// let mut error = TidyverseError::new("Expected a string");
    /// error.add_error("The value 7 is a number");
    /// error.add_info("path", "items.[2]");
    /// let text = error.to_text(false);
    /// assert_eq!(text, "Expected a string\n✖ The value 7 is a number\nℹ items.[2]\n");
    /// ```
    pub fn to_text(&self, styled: bool) -> String {
        let style = |line: &str| {
            if styled {
                color_quoted_strings(line)
            } else {
                line.to_string()
            }
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}", style(&self.heading));
        if let Some(location) = &self.location {
            let file = self.file_name.as_deref().unwrap_or("<input>");
            let _ = writeln!(
                out,
                "{}:{}:{}",
                file,
                location.start.line + 1,
                location.start.column + 1
            );
        }
        for error in &self.error {
            let _ = writeln!(out, "✖ {}", style(error));
        }
        for note in self.info.values() {
            let _ = writeln!(out, "ℹ {}", style(note));
        }
        if let Some(context) = &self.source_context {
            out.push_str(context);
            if !context.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    /// Convert to a [`DiagnosticMessage`].
    ///
    /// Error bullets become error details and info notes become info
    /// details. The located range, if any, carries over so the message can
    /// render a source excerpt.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let mut builder = DiagnosticMessageBuilder::error(self.heading.clone());
        if let Some(code) = &self.code {
            builder = builder.with_code(code.clone());
        }
        if let Some(range) = self.range {
            builder = builder.with_location(range);
        }
        if let Some((first, rest)) = self.error.split_first() {
            builder = builder.problem(first.clone());
            for error in rest {
                builder = builder.add_detail(error.clone());
            }
        }
        for note in self.info.values() {
            builder = builder.add_info(note.clone());
        }
        builder.build()
    }
}
