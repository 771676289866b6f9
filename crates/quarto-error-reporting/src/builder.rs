//! Builder API for diagnostic messages.
//!
//! The builder follows the tidyverse four-part structure: a title (via
//! [`error`](DiagnosticMessageBuilder::error) and friends), a problem
//! statement, details, and hints.

use quarto_source_map::Range;

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};

/// Builder for [`DiagnosticMessage`].
///
/// # Example
///
/// ```
/// use quarto_error_reporting::DiagnosticMessageBuilder;
///
/// let error = DiagnosticMessageBuilder::error("Invalid value")
///     .with_code("Q-1-12")
///     .problem("`format` must be one of the supported formats")
///     .add_detail("found `htlm`")
///     .add_hint("Did you mean `html`?")
///     .build();
///
/// assert_eq!(error.code.as_deref(), Some("Q-1-12"));
/// assert_eq!(error.details.len(), 1);
/// assert_eq!(error.hints.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement. Calling this again replaces it.
    pub fn problem(mut self, problem: impl Into<MessageContent>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Where the diagnostic applies, in the coordinates of the text the
    /// message will be rendered against.
    pub fn with_location(mut self, location: Range) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Add an error detail (✖).
    pub fn add_detail(self, detail: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail that highlights its own range.
    pub fn add_detail_at(self, detail: impl Into<MessageContent>, location: Range) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail (ℹ).
    pub fn add_info(self, info: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Info, info.into(), None)
    }

    /// Add a note detail (•).
    pub fn add_note(self, note: impl Into<MessageContent>) -> Self {
        self.push_detail(DetailKind::Note, note.into(), None)
    }

    /// Add a hint. Hints read as questions ("Did you mean ...?").
    pub fn add_hint(mut self, hint: impl Into<MessageContent>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: MessageContent,
        location: Option<Range>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_kinds_in_order() {
        let msg = DiagnosticMessageBuilder::error("t")
            .add_detail("a")
            .add_info("b")
            .add_note("c")
            .build();
        let kinds: Vec<DetailKind> = msg.details.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DetailKind::Error, DetailKind::Info, DetailKind::Note]);
    }

    #[test]
    fn test_problem_replaces() {
        let msg = DiagnosticMessageBuilder::info("t")
            .problem("first")
            .problem("second")
            .build();
        assert_eq!(msg.kind, DiagnosticKind::Info);
        assert_eq!(msg.problem.unwrap().as_str(), "second");
    }

    #[test]
    fn test_located_detail() {
        let msg = DiagnosticMessageBuilder::error("t")
            .with_location(Range::new(1, 4))
            .add_detail_at("here", Range::new(2, 3))
            .build();
        assert_eq!(msg.location, Some(Range::new(1, 4)));
        assert_eq!(msg.details[0].location, Some(Range::new(2, 3)));
    }
}
