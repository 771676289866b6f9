//! Source mapping for Quarto
//!
//! This crate provides [`MappedString`], an immutable text value that can be
//! sliced, concatenated and interleaved with synthetic text while always being
//! able to answer "which original location does offset N come from".
//!
//! # Overview
//!
//! - [`MappedString`]: text plus its provenance chain
//! - [`mapped_string`]: build a new string from ranges of a base and literal text
//! - [`mapped_index_to_line_col`]: offset → zero-based line/column in the original
//! - [`FileInformation`]: cached line-break index used for line/column lookups
//!
//! # Example
//!
//! ```rust
//! use quarto_source_map::*;
//!
//! let doc = MappedString::original("---\ntitle: Hello\n---\n", Some("doc.qmd"));
//! let front_matter = mapped_string(&doc, vec![Range::new(4, 17).into()]).unwrap();
//! assert_eq!(front_matter.value(), "title: Hello\n");
//!
//! let loc = front_matter.map(7, false).unwrap();
//! assert_eq!(loc.index, 11);
//!
//! let to_line_col = mapped_index_to_line_col(&front_matter);
//! assert_eq!(to_line_col(7), Some(Position { line: 1, column: 7 }));
//! ```

pub mod error;
pub mod file_info;
pub mod mapped_string;
pub mod types;

pub use error::{Result, SourceMapError};
pub use file_info::FileInformation;
pub use mapped_string::{
    MappedLocation, MappedString, StringPiece, mapped_concat, mapped_index_to_line_col,
    mapped_lines, mapped_string,
};
pub use types::{Position, Range};
