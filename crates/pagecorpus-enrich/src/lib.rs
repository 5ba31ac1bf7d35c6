//! Linguistic enrichment for pagecorpus
//!
//! Turns extracted pages into annotated pages: sentence segmentation,
//! tokenization and per-sentence lemmatization through a pluggable
//! [`Lemmatizer`]. The same [`EnrichmentProcessor`] re-annotates corrected
//! scholarly exports through [`ReEnricher`].
//!
//! ## Example
//!
//! ```rust
//! use pagecorpus_core::{EnrichmentConfig, ExtractedPage, PageMetadata};
//! use pagecorpus_enrich::{EnrichmentProcessor, PassThroughLemmatizer};
//!
//! let processor = EnrichmentProcessor::new(&EnrichmentConfig::default(), PassThroughLemmatizer);
//! let page = ExtractedPage::new(
//!     PageMetadata::new("0001.xml", 1),
//!     vec!["Quid est? Nihil!".to_string()],
//! );
//! let enriched = processor.process_page(&page);
//! assert_eq!(enriched.page.sentences.len(), 2);
//! assert!(enriched.is_fully_lemmatized());
//! ```

pub mod error;
pub mod lemmatizer;
pub mod processor;
pub mod reenrich;
pub mod tokenizer;

pub use error::{EnrichError, LemmatizerError, Result};
pub use lemmatizer::{Lemmatizer, PassThroughLemmatizer, TaggerProcess};
pub use processor::{into_pages, EnrichedPage, EnrichmentProcessor};
pub use reenrich::{ReEnrichReport, ReEnricher};
pub use tokenizer::{is_punctuation, Tokenizer};
