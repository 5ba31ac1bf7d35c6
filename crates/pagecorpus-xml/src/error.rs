//! Error types for PAGE XML extraction

use std::io;
use thiserror::Error;

/// PAGE XML extraction errors
///
/// A missing zone or attribute is never an error; only unreadable or
/// malformed files are.
#[derive(Debug, Error)]
pub enum XmlError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Checkpoint writing or configuration error
    #[error(transparent)]
    Core(#[from] pagecorpus_core::Error),
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, XmlError>;
