//! # pagecorpus-core
//!
//! Data model and file formats of the PAGE-to-corpus pipeline.
//!
//! The pipeline turns PAGE XML produced by OCR/HTR tools into an annotated
//! corpus and back again after manual correction:
//!
//! ```text
//! PAGE XML ──extract──▶ ExtractedPage ──enrich──▶ AnnotatedPage ──▶ vertical
//!                                                       │
//!                                     corrected ◀──export (scholarly)
//!                                    scholarly text ──parse──▶ ExtractedPage ──enrich──▶ …
//! ```
//!
//! This crate holds everything that does not depend on XML parsing or on a
//! morphological analyzer:
//!
//! - [`page`]: page and corpus value types
//! - [`config`]: serde-driven pipeline configuration
//! - [`serializer::vertical`]: the vertical format, the corpus format of record
//! - [`serializer::json`]: JSON checkpoints between pipeline steps
//! - [`serializer::export`]: clean, diplomatic, annotated, vertical and
//!   scholarly page renderings
//! - [`scholarly`]: parser for corrected scholarly exports
//! - [`export`]: folder export with index files
//!
//! ## Example
//!
//! ```rust
//! use pagecorpus_core::{AnnotatedCorpus, AnnotatedPage, PageMetadata, Sentence, Token};
//!
//! let page = AnnotatedPage::new(
//!     PageMetadata::new("0042.xml", 42),
//!     vec![Sentence::new(1, vec![Token::new("Deus", "NOM", "deus")])],
//! );
//! let corpus = AnnotatedCorpus::new(vec![page]);
//! let vertical = corpus.to_vertical();
//! assert_eq!(AnnotatedCorpus::from_vertical(&vertical), corpus);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod page;
pub mod scholarly;
pub mod serializer;

pub use config::{
    ColumnMode, CorpusMetadata, EnrichmentConfig, ExportConfig, ExtractionConfig, PageNumberSource,
    PaginationConfig, PipelineConfig,
};
pub use error::{Error, Result, ScholarlyError};
pub use export::{ExportReport, IndexGenerator, TextExporter};
pub use page::{
    AnnotatedCorpus, AnnotatedPage, ExtractedCorpus, ExtractedPage, PageMetadata, Sentence, Token,
    DEFAULT_RUNNING_TITLE, POS_PUNCT, POS_UNKNOWN,
};
pub use scholarly::{ScholarlyBatch, ScholarlyParser};
pub use serializer::{ExportFormat, JsonSerializer, PageFormatter, VerticalFormatter, VerticalParser};
