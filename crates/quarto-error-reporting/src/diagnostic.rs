//! Core diagnostic message types.
//!
//! A [`DiagnosticMessage`] follows the tidyverse structure: a short title, an
//! optional problem statement, bulleted details and hints. Locations are
//! [`Range`]s in the coordinates of the [`MappedString`] the diagnostic was
//! produced against; rendering maps them back to the original text.

use std::fmt::Write;

use quarto_source_map::{MappedString, Range};
use serde::{Deserialize, Serialize};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Info,
    Note,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Info => "info",
            DiagnosticKind::Note => "note",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
            DiagnosticKind::Note => "Note",
        }
    }
}

/// How detail items are presented (tidyverse bullets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    /// ✖
    Error,
    /// ℹ
    Info,
    /// •
    Note,
}

impl DetailKind {
    pub fn bullet(&self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// The content of a message or detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum MessageContent {
    Plain(String),
    Markdown(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &str {
        match self {
            MessageContent::Plain(s) | MessageContent::Markdown(s) => s,
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Markdown(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Markdown(s.to_string())
    }
}

/// A bulleted detail of a diagnostic, optionally pointing at its own range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Range>,
}

/// A diagnostic message following tidyverse-style structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    /// Catalog code such as `Q-1-11`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    pub kind: DiagnosticKind,
    /// What went wrong, phrased with "must" or "can't"
    pub problem: Option<MessageContent>,
    pub details: Vec<DetailItem>,
    pub hints: Vec<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Range>,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Documentation URL for this diagnostic's code, if cataloged.
    pub fn docs_url(&self) -> Option<&str> {
        self.code
            .as_deref()
            .and_then(crate::catalog::get_docs_url)
    }

    /// Render as text.
    ///
    /// With a `source` and a location that resolves into a single original
    /// text, an ariadne report with the source excerpt is produced and only
    /// unlocated details and hints follow it. Otherwise everything is
    /// rendered as tidyverse bullets:
    ///
    /// ```text
    /// Error [Q-1-11]: title
    /// Problem statement
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// # Example
    ///
    /// ```
    /// use quarto_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Invalid input")
    ///     .problem("Values must be numeric")
    ///     .add_detail("Found text in column 3")
    ///     .add_hint("Convert to numbers first?")
    ///     .build();
    /// let text = msg.to_text(None);
    /// assert!(text.contains("Error: Invalid input"));
    /// assert!(text.contains("✖ Found text in column 3"));
    /// ```
    pub fn to_text(&self, source: Option<&MappedString>) -> String {
        let mut result = String::new();

        let report = self
            .location
            .or_else(|| self.details.iter().find_map(|d| d.location))
            .zip(source)
            .and_then(|(location, source)| self.render_source_report(location, source));

        match report {
            Some(report) => {
                result.push_str(&report);
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str());
                }
            }
            None => {
                match &self.code {
                    Some(code) => {
                        let _ = writeln!(result, "{} [{}]: {}", self.kind.label(), code, self.title);
                    }
                    None => {
                        let _ = writeln!(result, "{}: {}", self.kind.label(), self.title);
                    }
                }
                if let Some(problem) = &self.problem {
                    let _ = writeln!(result, "{}", problem.as_str());
                }
                for detail in &self.details {
                    let _ = writeln!(result, "{} {}", detail.kind.bullet(), detail.content.as_str());
                }
            }
        }

        for hint in &self.hints {
            let _ = writeln!(result, "? {}", hint.as_str());
        }

        result
    }

    /// Render as a JSON value.
    ///
    /// ```
    /// use quarto_error_reporting::DiagnosticMessage;
    ///
    /// let json = DiagnosticMessage::error("Something went wrong").to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut obj = json!({
            "kind": self.kind.as_str(),
            "title": self.title,
        });
        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }
        if let Some(problem) = &self.problem {
            obj["problem"] = json!(problem);
        }
        if !self.details.is_empty() {
            obj["details"] = json!(self.details);
        }
        if !self.hints.is_empty() {
            obj["hints"] = json!(self.hints);
        }
        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }
        obj
    }

    /// Ariadne excerpt of the original text `location` resolves into.
    fn render_source_report(&self, location: Range, source: &MappedString) -> Option<String> {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let start = source.map(location.start, true)?;
        let end = source.map(location.end, true)?;
        if !start.original.ptr_eq(&end.original) {
            return None;
        }
        let original = start.original;
        let content = original.value();
        let name = original.file_name().unwrap_or("<input>").to_string();
        // ariadne spans count characters
        let to_char = |offset: usize| content.get(..offset).map_or(0, |s| s.chars().count());
        let span = to_char(start.index)..to_char(end.index.max(start.index));

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
            DiagnosticKind::Note => (ReportKind::Advice, Color::Blue),
        };

        let message = match &self.code {
            Some(code) => format!("[{code}] {}", self.title),
            None => self.title.clone(),
        };
        let label_message = self
            .problem
            .as_ref()
            .map_or(self.title.as_str(), MessageContent::as_str);

        let mut report = Report::build(report_kind, name.clone(), span.start)
            .with_message(message)
            .with_label(
                Label::new((name.clone(), span))
                    .with_message(label_message)
                    .with_color(main_color),
            );

        for detail in &self.details {
            let Some(range) = detail.location else {
                continue;
            };
            let (Some(d_start), Some(d_end)) =
                (source.map(range.start, true), source.map(range.end, true))
            else {
                continue;
            };
            if !d_start.original.ptr_eq(&original) || !d_end.original.ptr_eq(&original) {
                continue;
            }
            let color = match detail.kind {
                DetailKind::Error => Color::Red,
                DetailKind::Info => Color::Cyan,
                DetailKind::Note => Color::Blue,
            };
            report = report.with_label(
                Label::new((
                    name.clone(),
                    to_char(d_start.index)..to_char(d_end.index.max(d_start.index)),
                ))
                .with_message(detail.content.as_str())
                .with_color(color),
            );
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((name, Source::from(content)), &mut output)
            .ok()?;
        String::from_utf8(output).ok()
    }
}
