//! Error reporting for Quarto's YAML tooling.
//!
//! Diagnostics follow the tidyverse style guide: say what was expected, list
//! the specifics, offer hints. Two shapes are provided:
//!
//! - [`TidyverseError`]: the located, editor-facing shape (heading, error
//!   bullets, tagged info notes, line/column location, source excerpt)
//! - [`DiagnosticMessage`]: the terminal/JSON shape with error codes and
//!   ariadne source rendering, built with [`DiagnosticMessageBuilder`]
//!
//! The [`text`] module holds the string primitives both rely on.
//!
//! # Example
//!
//! ```
//! use quarto_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Unknown property")
//!     .with_code("Q-1-18")
//!     .problem("`titel` is not a valid key here")
//!     .add_hint("Did you mean `title`?")
//!     .build();
//!
//! assert!(error.to_text(None).starts_with("Error [Q-1-18]: Unknown property"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;
pub mod text;
pub mod tidyverse;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_docs_url, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
pub use tidyverse::{ErrorLocation, TidyverseError};
