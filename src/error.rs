//! Error types for the blockmatch library.
//!
//! Only faults that break block or span identity are raised. Anything that
//! merely degrades visual fidelity (missing style fields, dangling tags,
//! unknown image aliases, fit failures) is repaired locally and logged.

use std::io;
use thiserror::Error;

/// Result type alias for blockmatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while matching, exporting or laying out blocks.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A block id was referenced but does not exist.
    #[error("Block not found: {0}")]
    MissingBlock(String),

    /// A span id was referenced but does not exist on the page.
    #[error("Span {span_id} not found on page {page}")]
    UnknownSpan {
        /// Page number (1-based)
        page: u32,
        /// Referenced span id
        span_id: u32,
    },

    /// A span is claimed by two blocks at once.
    #[error("Span {span_id} is assigned to both '{first}' and '{second}'")]
    DuplicateSpan {
        /// Span id
        span_id: u32,
        /// First owning block
        first: String,
        /// Second owning block
        second: String,
    },

    /// A merge group is malformed (missing member, broken order, too few blocks).
    #[error("Invalid merge group: {0}")]
    InvalidMergeGroup(String),

    /// A global style id could not be parsed.
    #[error("Invalid style id: {0}")]
    InvalidStyleId(String),

    /// Input records are malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingBlock("page1_bloc00".to_string());
        assert_eq!(err.to_string(), "Block not found: page1_bloc00");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );

        let err = Error::DuplicateSpan {
            span_id: 3,
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert_eq!(err.to_string(), "Span 3 is assigned to both 'a' and 'b'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
