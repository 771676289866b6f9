//! Text primitives shared by diagnostic producers.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Levenshtein distance between two strings, counted in characters.
///
/// # Example
///
/// ```
/// use quarto_error_reporting::text::edit_distance;
///
/// assert_eq!(edit_distance("titel", "title"), 2);
/// assert_eq!(edit_distance("toc", "toc"), 0);
/// ```
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Split `text` into lines on `\n` or `\r\n`.
///
/// A trailing line break yields a final empty line, so the result always
/// has one entry per line-break plus one.
pub fn lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// One line of a [`format_line_range`] excerpt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedLine {
    /// Zero-based line number
    pub line_number: usize,
    /// Right-aligned one-based line number followed by `": "`
    pub prefix: String,
    pub content: String,
}

impl fmt::Display for NumberedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.content)
    }
}

/// Excerpt of lines `first..=last` (zero-based) of `text`.
///
/// Line numbers in the prefixes are one-based and padded to a common width.
/// Lines past the end of `text` are omitted.
///
/// # Example
///
/// ```
/// use quarto_error_reporting::text::format_line_range;
///
/// let excerpt = format_line_range("a: 1\nb: 2\nc: 3\n", 1, 2);
/// assert_eq!(excerpt[0].to_string(), "2: b: 2");
/// assert_eq!(excerpt[1].prefix, "3: ");
/// ```
pub fn format_line_range(text: &str, first: usize, last: usize) -> Vec<NumberedLine> {
    let all = lines(text);
    let last = last.min(all.len().saturating_sub(1));
    if first > last {
        return Vec::new();
    }
    let width = (last + 1).to_string().len();
    (first..=last)
        .map(|line_number| NumberedLine {
            line_number,
            prefix: format!("{:>width$}: ", line_number + 1),
            content: all[line_number].to_string(),
        })
        .collect()
}

const QUOTE_COLOR: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// `text` in double quotes, coloured for terminal output.
pub fn quoted_string_color(text: &str) -> String {
    format!("{QUOTE_COLOR}\"{text}\"{RESET}")
}

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"\n]*""#).expect("valid regex"));

/// Apply [`quoted_string_color`] to every double-quoted run in `line`.
///
/// Stripping the escape sequences from the result gives back `line`.
pub fn color_quoted_strings(line: &str) -> String {
    QUOTED
        .replace_all(line, |caps: &regex::Captures<'_>| {
            let quoted = &caps[0];
            quoted_string_color(&quoted[1..quoted.len() - 1])
        })
        .into_owned()
}

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    static ANSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid regex"));
    ANSI.replace_all(text, "").into_owned()
}
