//! Turning validation errors into located, human-phrased diagnostics.

use quarto_error_reporting::TidyverseError;
use quarto_error_reporting::text::format_line_range;
use quarto_error_reporting::tidyverse::ErrorLocation;
use quarto_source_map::{MappedString, Position, Range, mapped_index_to_line_col};

use crate::error::{PathSegment, ValidationError, ValidationErrorKind};

/// Lines of source shown under a diagnostic, at most.
const MAX_CONTEXT_LINES: usize = 3;

/// Locate every error against `source`, the text the tree was parsed from.
///
/// Positions, file name and the source excerpt all refer to the deepest
/// original text behind `source`, so errors in extracted front matter point
/// into the full document.
pub fn locate(errors: &[ValidationError], source: &MappedString) -> Vec<TidyverseError> {
    errors
        .iter()
        .map(|error| {
            let mut located = describe_error(error);
            attach_location(&mut located, error.range(), source);
            located
        })
        .collect()
}

/// Point `diagnostic` at `range` of `source`: offsets, line/column
/// location, file name and a source excerpt.
pub fn attach_location(diagnostic: &mut TidyverseError, range: Range, source: &MappedString) {
    let to_line_col = mapped_index_to_line_col(source);
    diagnostic.range = Some(range);

    let start = to_line_col(range.start);
    let end = to_line_col(range.end.max(range.start));
    let (Some(start), Some(end)) = (start, end) else {
        return;
    };
    diagnostic.location = Some(ErrorLocation { start, end });
    if let Some(origin) = source.map(range.start, true) {
        diagnostic.file_name = origin.original.file_name().map(str::to_string);
        diagnostic.source_context = Some(source_context(origin.original.value(), start, end));
    }
}

/// Heading, bullets and info notes, without location.
fn describe_error(error: &ValidationError) -> TidyverseError {
    let heading = match &error.error_message {
        Some(message) => message.clone(),
        None => heading(error),
    };
    let mut located = TidyverseError::new(heading).with_code(error.error_code());
    located.add_error(error.message());
    for note in &error.notes {
        located.add_info(format!("note:{}", note), note.clone());
    }
    if let Some(hint) = did_you_mean(&error.suggestions) {
        located.add_info("did-you-mean", hint);
    }
    located.add_info("path", error.instance_path.to_string());
    if !error.schema_path.is_empty() {
        located.add_info("schema", format!("Schema: {}", error.schema_path));
    }
    located
}

fn heading(error: &ValidationError) -> String {
    let segments = error.instance_path.segments();
    match &error.kind {
        ValidationErrorKind::MissingRequiredProperty { property } => match segments.last() {
            None => format!("YAML object is missing required field \"{}\"", property),
            Some(PathSegment::Key(key)) => {
                format!("Field \"{}\" is missing required field \"{}\"", key, property)
            }
            Some(PathSegment::Index(i)) => {
                format!("Array entry {} is missing required field \"{}\"", i + 1, property)
            }
        },
        ValidationErrorKind::UnknownProperty { property } => {
            let parent = &segments[..segments.len().saturating_sub(1)];
            match parent.last() {
                Some(PathSegment::Key(key)) => {
                    format!("Field \"{}\" is not allowed in \"{}\"", property, key)
                }
                _ => format!("Field \"{}\" is not allowed here", property),
            }
        }
        _ => match segments.last() {
            None => format!("YAML value {} must be {}", error.value, error.expected),
            Some(PathSegment::Key(key)) => format!(
                "Field \"{}\" has value {}, which must be {}",
                key, error.value, error.expected
            ),
            Some(PathSegment::Index(i)) => format!(
                "Array entry {} with value {} must be {}",
                i + 1,
                error.value,
                error.expected
            ),
        },
    }
}

fn did_you_mean(suggestions: &[String]) -> Option<String> {
    let quoted: Vec<String> = suggestions.iter().map(|s| format!("\"{}\"", s)).collect();
    match quoted.as_slice() {
        [] => None,
        [one] => Some(format!("Did you mean {}?", one)),
        [init @ .., last] => Some(format!("Did you mean {} or {}?", init.join(", "), last)),
    }
}

/// Numbered excerpt of the lines spanning `start..end`, with the first
/// line's part of the range underlined.
fn source_context(text: &str, start: Position, end: Position) -> String {
    let last = end.line.min(start.line + MAX_CONTEXT_LINES - 1);
    let excerpt = format_line_range(text, start.line, last);
    let mut out = String::new();
    for (i, line) in excerpt.iter().enumerate() {
        let content = line.content.trim_end();
        out.push_str(&line.prefix);
        out.push_str(content);
        out.push('\n');
        if i == 0 {
            let line_chars = content.chars().count();
            let underline_end = if end.line == start.line {
                end.column
            } else {
                line_chars
            };
            let width = underline_end.saturating_sub(start.column).max(1);
            let indent = line.prefix.chars().count() + start.column;
            out.push_str(&" ".repeat(indent));
            out.push_str(&"~".repeat(width));
            out.push('\n');
        }
    }
    out
}
