//! PAGE XML extraction for pagecorpus
//!
//! Reads PAGE XML files (as exported by Transkribus, eScriptorium, Kraken
//! and similar OCR/HTR tools) into [`pagecorpus_core::ExtractedPage`]s.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pagecorpus_core::PipelineConfig;
//! use pagecorpus_xml::Extractor;
//! use std::path::Path;
//!
//! let extractor = Extractor::new(&PipelineConfig::default());
//! let report = extractor.extract_folder(Path::new("pages/"))?;
//! println!("{} pages, {} errors", report.pages.len(), report.error_count());
//! # Ok::<(), pagecorpus_xml::XmlError>(())
//! ```

pub mod error;
pub mod extractor;
pub mod hyphen;
pub mod namespace;
pub mod pagination;
pub mod zone;

pub use error::{Result, XmlError};
pub use extractor::{ExtractionReport, Extractor, FileOutcome};
pub use hyphen::{HyphenMerger, MergeOutcome};
pub use namespace::{find_descendants, find_first, Namespace};
pub use pagination::{page_number_from_filename, Paginator};
pub use zone::{ZoneContent, ZoneMap, ZoneParser, ZoneRole};
