//! Corpus serialization
//!
//! Serializers between annotated pages and the on-disk formats: the vertical
//! corpus format, JSON checkpoints and the human-facing export formats.

pub mod export;
pub mod json;
pub mod vertical;

pub use export::{formatter, wrap_text, ExportFormat, PageFormatter};
pub use json::{JsonOptions, JsonSerializer};
pub use vertical::{VerticalFormatter, VerticalParser};
