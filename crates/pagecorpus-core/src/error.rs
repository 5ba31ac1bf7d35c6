//! Error types for corpus serialization and export.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, writing or converting corpus files.
///
/// Schema-shape misses (a missing zone, an absent attribute) are not errors:
/// they degrade to empty or default values. This enum only covers conditions
/// that prevent a whole file from being read or written.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON checkpoint (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input path does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A scholarly export could not be parsed back.
    #[error("Scholarly format error: {0}")]
    Scholarly(#[from] ScholarlyError),

    /// Unknown export format name.
    #[error("Unknown export format: {0} (expected clean, diplomatic, annotated, vertical or scholarly)")]
    UnknownFormat(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

/// Violations of the scholarly header layout.
///
/// A document that breaks the layout is skipped; the parser never guesses
/// where the header ends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScholarlyError {
    /// Fewer than two `====` separator lines were found.
    #[error("expected two separator lines, found {found}")]
    MissingSeparator {
        /// Number of separator lines present.
        found: usize,
    },
}

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, Error>;
