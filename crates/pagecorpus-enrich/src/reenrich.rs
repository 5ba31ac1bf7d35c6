//! Re-enrichment of corrected scholarly exports
//!
//! Corrected page files go back through the scholarly parser and the very
//! same [`EnrichmentProcessor`] used on extracted pages, so a corrected
//! corpus is annotated exactly like a fresh one.

use crate::error::Result;
use crate::processor::{into_pages, EnrichedPage, EnrichmentProcessor};
use pagecorpus_core::scholarly::DocumentOutcome;
use pagecorpus_core::{AnnotatedCorpus, AnnotatedPage, ScholarlyBatch, ScholarlyError, ScholarlyParser};
use std::path::Path;

/// Default extension of corrected page files
pub const DEFAULT_EXTENSION: &str = "txt";

/// Result of re-enriching a batch of documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReEnrichReport {
    /// Enriched pages, sorted by page number
    pub pages: Vec<EnrichedPage>,
    /// One entry per input document, in input order
    pub outcomes: Vec<DocumentOutcome>,
}

impl ReEnrichReport {
    /// Documents that could not be parsed
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Sentences annotated without the lemmatizer, over all pages
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.pages.iter().map(|p| p.fallback_sentences.len()).sum()
    }

    /// The annotated pages
    #[must_use]
    pub fn annotated_pages(&self) -> Vec<AnnotatedPage> {
        self.pages.iter().map(|p| p.page.clone()).collect()
    }

    /// The annotated pages as a corpus
    #[must_use]
    pub fn into_corpus(self) -> AnnotatedCorpus {
        AnnotatedCorpus::new(into_pages(self.pages))
    }
}

/// Parses corrected scholarly text and enriches it again
#[derive(Debug)]
pub struct ReEnricher {
    parser: ScholarlyParser,
    processor: EnrichmentProcessor,
    extension: String,
}

impl Default for ReEnricher {
    fn default() -> Self {
        Self::new(EnrichmentProcessor::default())
    }
}

impl ReEnricher {
    /// Create a re-enricher around `processor`
    #[must_use = "creates a re-enricher"]
    pub fn new(processor: EnrichmentProcessor) -> Self {
        Self {
            parser: ScholarlyParser::new(),
            processor,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Read page files with another extension
    #[must_use = "returns a re-enricher reading another extension"]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The enrichment processor
    #[inline]
    #[must_use]
    pub const fn processor(&self) -> &EnrichmentProcessor {
        &self.processor
    }

    /// Re-enrich one scholarly document
    ///
    /// # Errors
    ///
    /// Returns a [`ScholarlyError`] when the document breaks the header
    /// layout.
    pub fn reenrich_str(&self, content: &str) -> std::result::Result<EnrichedPage, ScholarlyError> {
        let page = self.parser.parse_str(content)?;
        Ok(self.processor.process_page(&page))
    }

    /// Re-enrich a concatenation of scholarly documents
    #[must_use]
    pub fn reenrich_combined(&self, content: &str) -> ReEnrichReport {
        self.enrich_batch(self.parser.parse_combined(content))
    }

    /// Re-enrich every page file of `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is missing or cannot be listed. Files that
    /// fail to parse are recorded in the report.
    pub fn reenrich_folder(&self, dir: &Path) -> Result<ReEnrichReport> {
        let batch = self.parser.parse_folder(dir, &self.extension)?;
        Ok(self.enrich_batch(batch))
    }

    /// Re-enrich a combined export file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    pub fn reenrich_combined_file(&self, path: &Path) -> Result<ReEnrichReport> {
        let batch = self.parser.parse_combined_file(path)?;
        Ok(self.enrich_batch(batch))
    }

    /// Re-enrich a folder, a combined file or a single page file
    ///
    /// # Errors
    ///
    /// Same as the operation chosen for `path`.
    pub fn reenrich_path(&self, path: &Path) -> Result<ReEnrichReport> {
        let batch = self.parser.parse_path(path, &self.extension)?;
        Ok(self.enrich_batch(batch))
    }

    /// Re-enrich `input` and write the result to `output` in the vertical
    /// format
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the output written.
    pub fn reenrich_to_vertical(&self, input: &Path, output: &Path) -> Result<ReEnrichReport> {
        let report = self.reenrich_path(input)?;
        if report.pages.is_empty() {
            log::warn!("No page to re-enrich in {}", input.display());
        }
        EnrichmentProcessor::save_vertical(&report.annotated_pages(), output)?;
        Ok(report)
    }

    fn enrich_batch(&self, batch: ScholarlyBatch) -> ReEnrichReport {
        let failed = batch.failed_count();
        let pages = self.processor.process(&batch.pages);
        log::info!(
            "Re-enriched {} pages ({} documents skipped)",
            pages.len(),
            failed
        );
        ReEnrichReport {
            pages,
            outcomes: batch.outcomes,
        }
    }
}
