//! Error types for enrichment

use std::io;
use thiserror::Error;

/// Failure of a lemmatizer backend on one sentence
///
/// The processor never propagates these: the sentence falls back to
/// pass-through annotation and is flagged.
#[derive(Debug, Error)]
pub enum LemmatizerError {
    /// The tagger process could not be spawned or talked to
    #[error("tagger I/O error: {0}")]
    Io(#[from] io::Error),

    /// The tagger exited with a failure status
    #[error("tagger exited with {status}: {stderr}")]
    Process {
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// Output is not one annotation per input token
    #[error("expected {expected} annotations, got {actual}")]
    CountMismatch {
        /// Tokens sent
        expected: usize,
        /// Annotations received
        actual: usize,
    },
}

/// Enrichment errors
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Checkpoint loading, vertical writing or scholarly parsing error
    #[error(transparent)]
    Core(#[from] pagecorpus_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;
