//! Error types for textdisp.
//!
//! The layout and metric engine itself is total: late or inconsistent metric
//! data is treated as stale, and layout always makes progress. Errors only
//! arise at the boundaries, when edits name positions that do not exist or
//! when the binary loads its input and configuration.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error of the `textdisp` binary
//!   - [`StoreError`] - Invalid positions or ranges passed to text edits
//!   - [`ConfigError`] - Config file read or parse failures
//!   - [`LoggingError`] - Tracing subscriber setup failures
//!   - Input file read failures

use crate::config::loader::ConfigError;
use crate::logging::LoggingError;
use crate::model::index::TextIndex;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error of the `textdisp` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the input document.
    #[error("Failed to read {path}: {source}")]
    InputRead {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// An edit referred to an invalid position.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing the report to stdout failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Invalid position or range passed to a text edit.
///
/// # Examples
///
/// ```
/// # use textdisp::model::error::StoreError;
/// let err = StoreError::LineOutOfRange { line: 7, count: 3 };
/// assert_eq!(err.to_string(), "line 7 out of range (document has 3 lines)");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The line does not exist.
    #[error("line {line} out of range (document has {count} lines)")]
    LineOutOfRange {
        /// Requested line.
        line: usize,
        /// Number of lines in the document.
        count: usize,
    },

    /// The byte offset lies past the end of the line.
    #[error("byte {byte} out of range for line {line} ({len} bytes)")]
    ByteOutOfRange {
        /// Line of the index.
        line: usize,
        /// Requested byte.
        byte: usize,
        /// Content length of the line, excluding the newline.
        len: usize,
    },

    /// The byte offset splits a UTF-8 character.
    #[error("index {index} is not on a character boundary")]
    NotCharBoundary {
        /// Offending index.
        index: TextIndex,
    },

    /// The range end precedes its start.
    #[error("invalid range {from}..{to}")]
    InvalidRange {
        /// Range start.
        from: TextIndex,
        /// Range end.
        to: TextIndex,
    },
}
