//! Writing annotated pages to text files
//!
//! [`TextExporter`] renders every page with the configured
//! [`PageFormatter`], writes one file per page, an optional combined file and
//! the index files produced by [`IndexGenerator`]. A page that cannot be
//! written is recorded in the [`ExportReport`]; the other pages are still
//! exported.

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::page::{AnnotatedPage, PageMetadata, POS_PUNCT};
use crate::serializer::export::{formatter, image_name, ExportFormat, PageFormatter};
use crate::serializer::json::JsonSerializer;
use crate::serializer::vertical::VerticalParser;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// All page texts concatenated
pub const COMBINED_FILE_NAME: &str = "texte_complet.txt";
/// Per-page JSON index
pub const PAGES_INDEX_FILE_NAME: &str = "pages_index.json";
/// Image to output file mapping
pub const IMAGES_MAPPING_FILE_NAME: &str = "images_mapping.txt";
/// Corpus statistics
pub const CORPUS_STATS_FILE_NAME: &str = "corpus_stats.json";

const TOP_LEMMAS: usize = 100;

static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(number|page_number|folio)(?::0(\d+))?\}").expect("regex is compile-time constant")
});

/// Output file name of a page
///
/// Placeholders: `{number}` and `{page_number}` (optionally zero-padded as
/// `{number:04}`), and `{folio}` (folio without extension).
#[must_use]
pub fn page_file_name(pattern: &str, metadata: &PageMetadata) -> String {
    RE_PLACEHOLDER
        .replace_all(pattern, |caps: &Captures<'_>| {
            if &caps[1] == "folio" {
                return folio_stem(&metadata.folio);
            }
            let width = caps.get(2).and_then(|w| w.as_str().parse::<usize>().ok()).unwrap_or(0);
            format!("{:0width$}", metadata.page_number)
        })
        .into_owned()
}

fn folio_stem(folio: &str) -> String {
    Path::new(folio)
        .file_stem()
        .map_or_else(|| folio.to_string(), |s| s.to_string_lossy().into_owned())
}

/// Export result of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExport {
    /// Folio of the page
    pub folio: String,
    /// Page number of the page
    pub page_number: i64,
    /// File name relative to the output folder, when written
    pub output_file: Option<String>,
    /// Write error, when not written
    pub error: Option<String>,
}

/// Result of an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// One entry per input page, in input order
    pub pages: Vec<PageExport>,
    /// Combined file, when written
    pub combined_file: Option<PathBuf>,
    /// Index files written
    pub index_files: Vec<PathBuf>,
}

impl ExportReport {
    /// Number of page files written
    #[must_use]
    pub fn exported_count(&self) -> usize {
        self.pages.iter().filter(|p| p.error.is_none()).count()
    }

    /// Number of pages that could not be written
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.pages.len() - self.exported_count()
    }
}

/// Writes pages, combined text and index files to a folder
pub struct TextExporter {
    config: ExportConfig,
    formatter: Box<dyn PageFormatter>,
}

impl std::fmt::Debug for TextExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for TextExporter {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl TextExporter {
    /// Create an exporter for the configured format
    #[must_use = "creates an exporter"]
    pub fn new(config: ExportConfig) -> Self {
        let formatter = formatter(config.format, config.line_width);
        Self { config, formatter }
    }

    /// Switch to another format
    pub fn set_format(&mut self, format: ExportFormat) {
        self.config.format = format;
        self.formatter = formatter(format, self.config.line_width);
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Parse a vertical file and export its pages
    ///
    /// # Errors
    ///
    /// Returns an error if the vertical file cannot be read or the output
    /// folder cannot be created.
    pub fn export_vertical_file(&self, input: &Path, output_dir: &Path) -> Result<ExportReport> {
        let pages = VerticalParser::new().parse_file(input)?;
        self.export_pages(&pages, output_dir)
    }

    /// Export pages to `output_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the output folder, the combined file or an index
    /// file cannot be written. Per-page failures are only recorded.
    pub fn export_pages(&self, pages: &[AnnotatedPage], output_dir: &Path) -> Result<ExportReport> {
        fs::create_dir_all(output_dir)?;
        log::info!(
            "Exporting {} pages as {} to {}",
            pages.len(),
            self.config.format,
            output_dir.display()
        );

        let mut report = ExportReport::default();
        let mut texts = Vec::with_capacity(pages.len());
        for page in pages {
            let name = page_file_name(&self.config.page_filename_pattern, &page.metadata);
            let text = self.formatter.format_page(page);
            let (output_file, error) = match fs::write(output_dir.join(&name), &text) {
                Ok(()) => {
                    log::debug!("Wrote {name}");
                    texts.push(text);
                    (Some(name), None)
                }
                Err(e) => {
                    log::error!("Failed to export {}: {e}", page.metadata.folio);
                    (None, Some(e.to_string()))
                }
            };
            report.pages.push(PageExport {
                folio: page.metadata.folio.clone(),
                page_number: page.metadata.page_number,
                output_file,
                error,
            });
        }

        if self.config.generate_combined {
            report.combined_file = Some(write_combined(output_dir, &texts)?);
        }
        if self.config.generate_index {
            let outputs: Vec<String> = report
                .pages
                .iter()
                .map(|p| p.output_file.clone().unwrap_or_default())
                .collect();
            report.index_files = IndexGenerator::new(output_dir).generate_all(pages, &outputs)?;
        }

        log::info!(
            "Export finished: {} pages, {} errors",
            report.exported_count(),
            report.error_count()
        );
        Ok(report)
    }
}

fn write_combined(output_dir: &Path, texts: &[String]) -> Result<PathBuf> {
    let combined = texts
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    let path = output_dir.join(COMBINED_FILE_NAME);
    fs::write(&path, combined)?;
    log::info!("Wrote combined text to {}", path.display());
    Ok(path)
}

/// One page of `pages_index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndexEntry {
    /// Source file name
    pub folio: String,
    /// Page number
    pub page_number: i64,
    /// Running title, or the placeholder
    pub running_title: String,
    /// True when the page has no sentence
    pub is_empty: bool,
    /// Sentences on the page
    pub sentence_count: usize,
    /// Tokens on the page
    pub token_count: usize,
    /// Exported file name, relative to the output folder
    pub output_file: String,
    /// Corpus attributes of the page, inlined
    #[serde(flatten)]
    pub corpus_metadata: BTreeMap<String, String>,
}

/// Content of `pages_index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesIndex {
    pub generated_at: DateTime<Utc>,
    pub total_pages: usize,
    pub pages: Vec<PageIndexEntry>,
}

/// Totals of `corpus_stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    /// Pages in the corpus, empty ones included
    pub total_pages: usize,
    /// Pages without sentences
    pub empty_pages: usize,
    /// Sentences over all pages
    pub total_sentences: usize,
    /// Tokens over all pages
    pub total_tokens: usize,
    /// Over non-empty pages, two decimals
    pub avg_sentences_per_page: f64,
    /// Two decimals
    pub avg_tokens_per_sentence: f64,
}

/// Tag frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosCount {
    pub pos: String,
    pub count: usize,
}

/// Lemma frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmaCount {
    pub lemma: String,
    pub count: usize,
}

/// Content of `corpus_stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub generated_at: DateTime<Utc>,
    pub corpus_statistics: CorpusStatistics,
    /// Most frequent first
    pub pos_distribution: Vec<PosCount>,
    /// Most frequent non-punctuation lemmas first
    pub top_100_lemmas: Vec<LemmaCount>,
}

impl CorpusStats {
    /// Compute statistics over `pages`
    #[must_use]
    pub fn compute(pages: &[AnnotatedPage]) -> Self {
        let mut empty_pages = 0;
        let mut total_sentences = 0;
        let mut total_tokens = 0;
        let mut pos_counts: HashMap<&str, usize> = HashMap::new();
        let mut lemma_counts: HashMap<&str, usize> = HashMap::new();

        for page in pages {
            if page.is_empty() {
                empty_pages += 1;
                continue;
            }
            total_sentences += page.sentences.len();
            for token in page.tokens() {
                total_tokens += 1;
                *pos_counts.entry(token.pos.as_str()).or_default() += 1;
                if token.pos != POS_PUNCT {
                    *lemma_counts.entry(token.lemma.as_str()).or_default() += 1;
                }
            }
        }

        let pos_distribution = by_frequency(pos_counts)
            .into_iter()
            .map(|(pos, count)| PosCount { pos, count })
            .collect();
        let top_100_lemmas = by_frequency(lemma_counts)
            .into_iter()
            .take(TOP_LEMMAS)
            .map(|(lemma, count)| LemmaCount { lemma, count })
            .collect();

        let filled_pages = (pages.len() - empty_pages).max(1);
        Self {
            generated_at: Utc::now(),
            corpus_statistics: CorpusStatistics {
                total_pages: pages.len(),
                empty_pages,
                total_sentences,
                total_tokens,
                avg_sentences_per_page: round2(total_sentences as f64 / filled_pages as f64),
                avg_tokens_per_sentence: round2(total_tokens as f64 / total_sentences.max(1) as f64),
            },
            pos_distribution,
            top_100_lemmas,
        }
    }
}

/// Descending count, ties in key order
fn by_frequency(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Writes the index files of an export folder
#[derive(Debug, Clone)]
pub struct IndexGenerator {
    output_dir: PathBuf,
}

impl IndexGenerator {
    /// Create a generator writing into `output_dir`
    #[must_use = "creates an index generator"]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write every index file; `outputs[i]` is the file written for `pages[i]`
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn generate_all(&self, pages: &[AnnotatedPage], outputs: &[String]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(vec![
            self.generate_pages_index(pages, outputs)?,
            self.generate_images_mapping(pages, outputs)?,
            self.generate_corpus_stats(pages)?,
        ])
    }

    /// Build the page index
    #[must_use]
    pub fn pages_index(pages: &[AnnotatedPage], outputs: &[String]) -> PagesIndex {
        let entries = pages
            .iter()
            .enumerate()
            .map(|(i, page)| PageIndexEntry {
                folio: page.metadata.folio.clone(),
                page_number: page.metadata.page_number,
                running_title: page.metadata.running_title.clone(),
                is_empty: page.is_empty(),
                sentence_count: page.sentences.len(),
                token_count: page.token_count(),
                output_file: outputs.get(i).cloned().unwrap_or_default(),
                corpus_metadata: page.metadata.corpus_metadata.clone(),
            })
            .collect();
        PagesIndex {
            generated_at: Utc::now(),
            total_pages: pages.len(),
            pages: entries,
        }
    }

    /// Write `pages_index.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn generate_pages_index(&self, pages: &[AnnotatedPage], outputs: &[String]) -> Result<PathBuf> {
        let path = self.output_dir.join(PAGES_INDEX_FILE_NAME);
        JsonSerializer::new().save(&Self::pages_index(pages, outputs), &path)?;
        log::info!("Wrote page index to {}", path.display());
        Ok(path)
    }

    /// Write `images_mapping.txt`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn generate_images_mapping(&self, pages: &[AnnotatedPage], outputs: &[String]) -> Result<PathBuf> {
        let mut content = String::from("# Mapping: image_source → page_output\n");
        let _ = writeln!(content, "# Generated: {}", Utc::now().to_rfc3339());
        let _ = writeln!(content, "#{}\n", "=".repeat(60));
        for (i, page) in pages.iter().enumerate() {
            let output = outputs.get(i).filter(|o| !o.is_empty()).map_or("N/A", String::as_str);
            let _ = writeln!(content, "{}\t→\t{output}", image_name(&page.metadata.folio));
        }

        let path = self.output_dir.join(IMAGES_MAPPING_FILE_NAME);
        fs::write(&path, content).map_err(Error::from)?;
        log::info!("Wrote image mapping to {}", path.display());
        Ok(path)
    }

    /// Write `corpus_stats.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn generate_corpus_stats(&self, pages: &[AnnotatedPage]) -> Result<PathBuf> {
        let path = self.output_dir.join(CORPUS_STATS_FILE_NAME);
        JsonSerializer::new().save(&CorpusStats::compute(pages), &path)?;
        log::info!("Wrote corpus statistics to {}", path.display());
        Ok(path)
    }
}
