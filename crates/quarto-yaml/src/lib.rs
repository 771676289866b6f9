//! # quarto-yaml
//!
//! YAML and JSON parsing into source-annotated value trees.
//!
//! Every node of an [`AnnotatedParse`] records the `[start, end)` range of
//! the text that produced it, in the coordinates of the [`MappedString`] it
//! was parsed from. Because that string remembers its own provenance, a node
//! in front matter extracted from a `.qmd` file can be traced back to a line
//! and column of the original document.
//!
//! Parsing never fails outright. Syntax errors are collected on the root
//! node next to whatever part of the tree could be built.
//!
//! ## Example
//!
//! ```rust
//! use quarto_source_map::MappedString;
//! use quarto_yaml::{NodeKind, parse_yaml};
//!
//! let source = MappedString::original("format:\n  html:\n    toc: true\n", Some("_quarto.yml"));
//! let parse = parse_yaml(&source);
//!
//! let toc = parse.get("format").and_then(|f| f.get("html")).and_then(|h| h.get("toc")).unwrap();
//! assert_eq!(toc.kind, NodeKind::Boolean);
//! assert_eq!(toc.text(), "true");
//! ```
//!
//! [`MappedString`]: quarto_source_map::MappedString

mod annotated;
mod json;
mod parser;
mod scalar;
mod value;

pub use annotated::{AnnotatedParse, NodeKind, ParseError};
pub use json::parse_json;
pub use parser::{parse, parse_yaml};
pub use value::{TaggedValue, Value};
