//! Page enrichment
//!
//! [`EnrichmentProcessor`] turns [`ExtractedPage`]s into [`AnnotatedPage`]s:
//! lines are joined, the text is tokenized into sentences and each sentence
//! goes through the configured [`Lemmatizer`]. A sentence the lemmatizer
//! fails on is annotated with [`PassThroughLemmatizer`] instead and flagged.

use crate::error::{EnrichError, Result};
use crate::lemmatizer::{Lemmatizer, PassThroughLemmatizer};
use crate::tokenizer::Tokenizer;
use pagecorpus_core::serializer::JsonSerializer;
use pagecorpus_core::{AnnotatedCorpus, AnnotatedPage, EnrichmentConfig, ExtractedPage, Sentence};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

/// An annotated page and the sentences that fell back to pass-through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedPage {
    pub page: AnnotatedPage,
    /// Ids of sentences annotated without the lemmatizer
    pub fallback_sentences: Vec<usize>,
}

impl EnrichedPage {
    /// True when every sentence went through the lemmatizer
    #[inline]
    #[must_use]
    pub fn is_fully_lemmatized(&self) -> bool {
        self.fallback_sentences.is_empty()
    }

    /// The annotated page
    #[inline]
    #[must_use]
    pub fn into_page(self) -> AnnotatedPage {
        self.page
    }
}

/// Annotated pages of a batch, in batch order
#[must_use]
pub fn into_pages(pages: Vec<EnrichedPage>) -> Vec<AnnotatedPage> {
    pages.into_iter().map(EnrichedPage::into_page).collect()
}

/// Tokenizes and lemmatizes extracted pages
pub struct EnrichmentProcessor {
    tokenizer: Tokenizer,
    lemmatizer: Box<dyn Lemmatizer>,
    parallel: bool,
}

impl fmt::Debug for EnrichmentProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentProcessor")
            .field("tokenizer", &self.tokenizer)
            .field("lemmatizer", &self.lemmatizer.name())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Default for EnrichmentProcessor {
    fn default() -> Self {
        Self::new(&EnrichmentConfig::default(), PassThroughLemmatizer)
    }
}

impl EnrichmentProcessor {
    /// Create a processor from enrichment settings and a lemmatizer backend
    #[must_use = "creates an enrichment processor"]
    pub fn new(config: &EnrichmentConfig, lemmatizer: impl Lemmatizer + 'static) -> Self {
        Self::with_boxed(config, Box::new(lemmatizer))
    }

    /// Create a processor around an already boxed backend
    #[must_use = "creates an enrichment processor"]
    pub fn with_boxed(config: &EnrichmentConfig, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        Self {
            tokenizer: Tokenizer::from_config(config),
            lemmatizer,
            parallel: config.parallel,
        }
    }

    /// Replace the tokenizer
    #[must_use = "returns a processor with another tokenizer"]
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Tokenizer in use
    #[inline]
    #[must_use]
    pub const fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Name of the lemmatizer backend
    #[inline]
    #[must_use]
    pub fn lemmatizer_name(&self) -> &str {
        self.lemmatizer.name()
    }

    /// Enrich one page
    ///
    /// An empty page gives a page without sentences; the lemmatizer is not
    /// called.
    #[must_use]
    pub fn process_page(&self, page: &ExtractedPage) -> EnrichedPage {
        let metadata = page.metadata.clone();
        if page.is_empty() {
            log::debug!("{}: empty page", metadata.folio);
            return EnrichedPage {
                page: AnnotatedPage::empty(metadata),
                fallback_sentences: Vec::new(),
            };
        }

        let mut fallback_sentences = Vec::new();
        let sentences: Vec<Sentence> = self
            .tokenizer
            .tokenize(&page.lines.join(" "))
            .into_iter()
            .enumerate()
            .map(|(i, tokens)| {
                let id = i + 1;
                let (sentence, fell_back) = self.annotate_sentence(id, &tokens, &metadata.folio);
                if fell_back {
                    fallback_sentences.push(id);
                }
                sentence
            })
            .collect();

        EnrichedPage {
            page: AnnotatedPage::new(metadata, sentences),
            fallback_sentences,
        }
    }

    fn annotate_sentence(&self, id: usize, tokens: &[String], folio: &str) -> (Sentence, bool) {
        match self.lemmatizer.lemmatize(tokens) {
            Ok(annotated) if annotated.len() == tokens.len() => (Sentence::new(id, annotated), false),
            Ok(annotated) => {
                log::warn!(
                    "{folio}: sentence {id}: {} returned {} tokens for {}, using pass-through",
                    self.lemmatizer.name(),
                    annotated.len(),
                    tokens.len()
                );
                (Sentence::new(id, PassThroughLemmatizer::annotate_all(tokens)), true)
            }
            Err(e) => {
                log::warn!(
                    "{folio}: sentence {id}: {} failed ({e}), using pass-through",
                    self.lemmatizer.name()
                );
                (Sentence::new(id, PassThroughLemmatizer::annotate_all(tokens)), true)
            }
        }
    }

    /// Enrich pages one after the other, sorted by page number
    #[must_use]
    pub fn process_pages(&self, pages: &[ExtractedPage]) -> Vec<EnrichedPage> {
        log::info!("Enriching {} pages with {}", pages.len(), self.lemmatizer.name());
        let enriched = pages.iter().map(|page| self.process_page(page)).collect();
        finish(enriched)
    }

    /// Enrich pages on the rayon pool, sorted by page number
    #[must_use]
    pub fn par_process_pages(&self, pages: &[ExtractedPage]) -> Vec<EnrichedPage> {
        log::info!(
            "Enriching {} pages with {} ({} threads)",
            pages.len(),
            self.lemmatizer.name(),
            rayon::current_num_threads()
        );
        let enriched = pages.par_iter().map(|page| self.process_page(page)).collect();
        finish(enriched)
    }

    /// Enrich pages, in parallel when configured
    #[must_use]
    pub fn process(&self, pages: &[ExtractedPage]) -> Vec<EnrichedPage> {
        if self.parallel {
            self.par_process_pages(pages)
        } else {
            self.process_pages(pages)
        }
    }

    /// Enrich a JSON checkpoint: a corpus file, or a folder of page files
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint is missing or cannot be read.
    pub fn process_json(&self, path: &Path) -> Result<Vec<EnrichedPage>> {
        let corpus = if path.is_dir() {
            JsonSerializer::load_folder(path)?
        } else {
            JsonSerializer::load_extracted(path)?
        };
        Ok(self.process(&corpus.pages))
    }

    /// Write pages in the vertical format
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_vertical(pages: &[AnnotatedPage], path: &Path) -> Result<()> {
        pagecorpus_core::VerticalFormatter::new()
            .write_file(pages, path)
            .map_err(EnrichError::from)
    }

    /// Write pages as an annotated JSON corpus
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_json(pages: &[AnnotatedPage], path: &Path) -> Result<()> {
        let corpus = AnnotatedCorpus::new(pages.to_vec());
        JsonSerializer::new().save(&corpus, path)?;
        Ok(())
    }
}

fn finish(mut enriched: Vec<EnrichedPage>) -> Vec<EnrichedPage> {
    enriched.sort_by_key(|p| p.page.metadata.page_number);
    let fallbacks: usize = enriched.iter().map(|p| p.fallback_sentences.len()).sum();
    log::info!(
        "Enriched {} pages ({} sentences fell back to pass-through)",
        enriched.len(),
        fallbacks
    );
    enriched
}
