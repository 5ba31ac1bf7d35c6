//! Folder extraction
//!
//! [`Extractor`] turns a folder of PAGE XML files into [`ExtractedPage`]s:
//! zones are classified, main-zone lines collected per column mode, word
//! breaks merged and metadata attached. A file that cannot be read or
//! parsed is recorded in the [`ExtractionReport`] and the batch continues.

use crate::error::{Result, XmlError};
use crate::hyphen::HyphenMerger;
use crate::pagination::Paginator;
use crate::zone::{parse_xml, ZoneParser};
use pagecorpus_core::serializer::JsonSerializer;
use pagecorpus_core::{
    ColumnMode, ExtractedCorpus, ExtractedPage, ExtractionConfig, PageMetadata, PaginationConfig,
    PipelineConfig,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Corpus attribute naming the column of a dual-column page
pub const COLUMN_ATTRIBUTE: &str = "column";

/// Result of extracting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Input file
    pub path: PathBuf,
    /// True when the file parsed
    pub success: bool,
    /// Error message when `success` is false
    pub message: Option<String>,
    /// Pages produced (before empty pages are dropped)
    pub pages: usize,
}

/// Result of extracting a folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Extracted pages, sorted by page number
    pub pages: Vec<ExtractedPage>,
    /// One entry per XML file, in lexical order
    pub outcomes: Vec<FileOutcome>,
}

impl ExtractionReport {
    /// Files extracted successfully
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Files that failed
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// True when the folder held no XML file at all
    #[must_use]
    pub fn is_empty_input(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Pages as a checkpoint corpus
    #[must_use]
    pub fn into_corpus(self) -> ExtractedCorpus {
        ExtractedCorpus::new(self.pages)
    }
}

/// Extracts pages from PAGE XML files
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractionConfig,
    paginator: Paginator,
    corpus_metadata: BTreeMap<String, String>,
    zone_parser: ZoneParser,
    merger: HyphenMerger,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl Extractor {
    /// Create an extractor from the pipeline configuration
    #[must_use = "creates an extractor"]
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_config(
            config.extraction.clone(),
            config.pagination,
            config.corpus.to_map(),
        )
    }

    /// Create an extractor from individual settings
    #[must_use = "creates an extractor"]
    pub fn with_config(
        config: ExtractionConfig,
        pagination: PaginationConfig,
        corpus_metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            zone_parser: ZoneParser::from_config(&config),
            paginator: Paginator::new(pagination),
            merger: HyphenMerger::new(),
            corpus_metadata,
            config,
        }
    }

    /// Extraction settings
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// `*.xml` files of `dir` (extension case-insensitive), lexical order
    ///
    /// # Errors
    ///
    /// Returns [`pagecorpus_core::Error::NotFound`] when `dir` is not a
    /// directory.
    pub fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(pagecorpus_core::Error::NotFound(dir.to_path_buf()).into());
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Extract the pages of one document
    ///
    /// `file_name` is the folio and `index` the position of the file in its
    /// folder. Single mode gives one page; dual mode gives one page per
    /// column.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::Xml`] for malformed XML.
    pub fn extract_str(&self, xml: &str, file_name: &str, index: usize) -> Result<Vec<ExtractedPage>> {
        let doc = parse_xml(xml)?;
        let zones = self.zone_parser.parse_document(&doc);
        let running_title = zones.running_title(&self.config.default_running_title);
        let zone_number = zones.page_number();
        let columns = zones.main_columns(self.config.column_mode);

        let numbers = match self.config.column_mode {
            ColumnMode::Single => vec![self.paginator.resolve(file_name, index, zone_number).value],
            ColumnMode::Dual => self.paginator.resolve_columns(file_name, index, zone_number).to_vec(),
        };

        let pages = columns
            .into_iter()
            .zip(numbers)
            .map(|(column, page_number)| {
                let mut corpus_metadata = self.corpus_metadata.clone();
                if self.config.column_mode == ColumnMode::Dual {
                    if let Some(id) = column.column_id {
                        corpus_metadata.insert(COLUMN_ATTRIBUTE.to_string(), id.to_string());
                    }
                }
                let lines = if self.config.merge_hyphenated {
                    self.merger.merge(&column.lines)
                } else {
                    column.lines
                };
                let metadata = PageMetadata::new(file_name, page_number)
                    .with_running_title(running_title.clone())
                    .with_corpus_metadata(corpus_metadata);
                ExtractedPage::new(metadata, lines)
            })
            .collect();
        Ok(pages)
    }

    /// Extract the pages of one file
    ///
    /// # Errors
    ///
    /// Returns an I/O error or [`XmlError::Xml`] for malformed XML.
    pub fn extract_file(&self, path: &Path, index: usize) -> Result<Vec<ExtractedPage>> {
        let xml = fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let pages = self.extract_str(&xml, &file_name, index)?;
        log::debug!("Extracted {} page(s) from {file_name}", pages.len());
        Ok(pages)
    }

    /// Extract every XML file of `dir`
    ///
    /// Files are numbered in lexical order. With `parallel` set, files are
    /// processed on the rayon pool; the outcome order and the final
    /// page-number sort do not depend on completion order.
    ///
    /// # Errors
    ///
    /// Returns [`pagecorpus_core::Error::NotFound`] when `dir` is not a
    /// directory. Per-file failures are only recorded in the report.
    pub fn extract_folder(&self, dir: &Path) -> Result<ExtractionReport> {
        let files = Self::list_xml_files(dir)?;
        if files.is_empty() {
            log::warn!("No XML files found in {}", dir.display());
            return Ok(ExtractionReport::default());
        }
        log::info!("Extracting {} XML files from {}", files.len(), dir.display());

        let extract = |(index, path): (usize, &PathBuf)| (path.clone(), self.extract_file(path, index));
        let results: Vec<(PathBuf, Result<Vec<ExtractedPage>>)> = if self.config.parallel {
            files.par_iter().enumerate().map(extract).collect()
        } else {
            files.iter().enumerate().map(extract).collect()
        };

        let mut report = ExtractionReport::default();
        for (path, result) in results {
            match result {
                Ok(pages) => {
                    report.outcomes.push(FileOutcome {
                        path,
                        success: true,
                        message: None,
                        pages: pages.len(),
                    });
                    report.pages.extend(
                        pages
                            .into_iter()
                            .filter(|p| self.config.include_empty_pages || !p.is_empty()),
                    );
                }
                Err(e) => {
                    log::error!("Failed to extract {}: {e}", path.display());
                    report.outcomes.push(FileOutcome {
                        path,
                        success: false,
                        message: Some(e.to_string()),
                        pages: 0,
                    });
                }
            }
        }
        report.pages.sort_by_key(|p| p.metadata.page_number);

        log::info!(
            "Extraction finished: {} files processed, {} errors, {} pages",
            report.processed_count(),
            report.error_count(),
            report.pages.len()
        );
        Ok(report)
    }

    /// Write pages as one corpus checkpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_corpus_json(pages: &[ExtractedPage], path: &Path) -> Result<()> {
        let corpus = ExtractedCorpus::new(pages.to_vec());
        JsonSerializer::new().save(&corpus, path)?;
        log::info!("Saved {} pages to {}", pages.len(), path.display());
        Ok(())
    }

    /// Write one checkpoint per page into `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn save_individual_json(pages: &[ExtractedPage], dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(JsonSerializer::new().save_individual(pages, dir)?)
    }
}
