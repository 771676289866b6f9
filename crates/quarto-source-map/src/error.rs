//! Error types for building mapped strings

/// Errors raised while constructing a [`crate::MappedString`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceMapError {
    #[error("range {start}..{end} is out of bounds for text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("range {start}..{end} ends before it starts")]
    InvertedRange { start: usize, end: usize },

    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

pub type Result<T> = std::result::Result<T, SourceMapError>;
