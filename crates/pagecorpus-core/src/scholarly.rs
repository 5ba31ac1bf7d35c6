//! Reading corrected scholarly exports back into pages
//!
//! A scholarly document is a header between two separator lines followed by
//! prose. The header is parsed with one fixed pattern per known label. A
//! `[key]: value` line is kept as the corpus attribute `key` verbatim, and
//! any other `Label: value` line as a snake_case corpus attribute. The
//! prose is collapsed into a single line so enrichment sees it exactly like
//! first-pass extracted text.

use crate::error::{Error, Result, ScholarlyError};
use crate::export::{COMBINED_FILE_NAME, IMAGES_MAPPING_FILE_NAME};
use crate::page::{ExtractedPage, PageMetadata};
use crate::serializer::export::{PAGE_LABELS, SCHOLARLY_LABELS};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Folio used when the header has no `Source:` line
pub const UNKNOWN_FOLIO: &str = "unknown.xml";

static RE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^={40,}\s*$").expect("regex is compile-time constant"));
static RE_PAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^PAGE\s+(\d+)\s*$").expect("regex is compile-time constant"));
static RE_RAW_KEY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+?)\]:\s*(.+?)\s*$").expect("regex is compile-time constant"));
static RE_GENERIC_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:=][^:]*?)\s*:\s*(.+?)\s*$").expect("regex is compile-time constant")
});

/// Header field a label line is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Folio,
    Image,
    RunningTitle,
    Corpus(&'static str),
}

static FIELD_PATTERNS: LazyLock<Vec<(Field, Regex)>> = LazyLock::new(|| {
    let fixed = [Field::Folio, Field::Image, Field::RunningTitle]
        .into_iter()
        .zip(PAGE_LABELS);
    let curated = SCHOLARLY_LABELS.map(|(key, label)| (Field::Corpus(key), label));
    fixed
        .into_iter()
        .chain(curated)
        .map(|(field, label)| {
            let pattern = format!(r"(?i)^{}:\s*(.+?)\s*$", regex::escape(label));
            (field, Regex::new(&pattern).expect("regex is compile-time constant"))
        })
        .collect()
});

/// Result of parsing one document of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    /// File path, with `#<n>` appended for documents of a combined file
    pub source: String,
    /// Parse error, if the document was skipped
    pub error: Option<String>,
}

impl DocumentOutcome {
    /// True when the document produced a page
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Pages parsed from several documents, with one outcome per document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScholarlyBatch {
    /// Successfully parsed pages, in input order
    pub pages: Vec<ExtractedPage>,
    /// One entry per document, in input order
    pub outcomes: Vec<DocumentOutcome>,
}

impl ScholarlyBatch {
    fn push(&mut self, source: String, result: std::result::Result<ExtractedPage, String>) {
        match result {
            Ok(page) => {
                self.pages.push(page);
                self.outcomes.push(DocumentOutcome { source, error: None });
            }
            Err(message) => {
                log::warn!("Skipping {source}: {message}");
                self.outcomes.push(DocumentOutcome {
                    source,
                    error: Some(message),
                });
            }
        }
    }

    /// Number of documents that failed to parse
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Outcomes of the skipped documents
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Parser for the scholarly export format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScholarlyParser;

impl ScholarlyParser {
    /// Create a parser
    #[inline]
    #[must_use = "creates a scholarly parser"]
    pub const fn new() -> Self {
        Self
    }

    /// Parse one scholarly document
    ///
    /// # Errors
    ///
    /// Returns [`ScholarlyError::MissingSeparator`] when the header is not
    /// enclosed by two separator lines.
    pub fn parse_str(&self, content: &str) -> std::result::Result<ExtractedPage, ScholarlyError> {
        let lines: Vec<&str> = content.lines().collect();
        let separators: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| RE_SEPARATOR.is_match(line))
            .map(|(i, _)| i)
            .take(2)
            .collect();
        let &[open, close] = separators.as_slice() else {
            return Err(ScholarlyError::MissingSeparator {
                found: separators.len(),
            });
        };

        let metadata = parse_header(&lines[open + 1..close]);
        let text = collapse_text(&lines[close + 1..]);
        let lines = if text.is_empty() { Vec::new() } else { vec![text] };
        Ok(ExtractedPage::new(metadata, lines))
    }

    /// Parse one scholarly file
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing file, an I/O error, or
    /// [`Error::Scholarly`] for a layout violation.
    pub fn parse_file(&self, path: &Path) -> Result<ExtractedPage> {
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(self.parse_str(&content)?)
    }

    /// Parse every file of `dir` with the given extension, in lexical order
    ///
    /// The combined file and the image mapping written by the exporter are
    /// skipped. Files that fail to parse are recorded in the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when `dir` is not a directory, or an I/O
    /// error if it cannot be listed.
    pub fn parse_folder(&self, dir: &Path, extension: &str) -> Result<ScholarlyBatch> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.to_path_buf()));
        }
        let extension = extension.trim_start_matches('.');
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            })
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                name != COMBINED_FILE_NAME && name != IMAGES_MAPPING_FILE_NAME
            })
            .collect();
        files.sort();

        log::info!("Parsing {} scholarly files from {}", files.len(), dir.display());
        let mut batch = ScholarlyBatch::default();
        for path in files {
            let result = self.parse_file(&path).map_err(|e| e.to_string());
            batch.push(path.display().to_string(), result);
        }
        log::info!(
            "Parsed {} pages ({} skipped)",
            batch.pages.len(),
            batch.failed_count()
        );
        Ok(batch)
    }

    /// Parse a concatenation of scholarly documents
    ///
    /// Documents start at every other separator line (the 1st, 3rd, ...).
    /// Text before the first separator is ignored.
    #[must_use]
    pub fn parse_combined(&self, content: &str) -> ScholarlyBatch {
        self.parse_combined_named(content, "combined")
    }

    /// Parse a combined export file
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing file or an I/O error.
    pub fn parse_combined_file(&self, path: &Path) -> Result<ScholarlyBatch> {
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let batch = self.parse_combined_named(&content, &path.display().to_string());
        log::info!("Parsed {} pages from {}", batch.pages.len(), path.display());
        Ok(batch)
    }

    /// Parse a folder, a combined file (name containing `complet`), or a
    /// single page file
    ///
    /// A single page file that breaks the header layout is recorded in the
    /// batch like a failed file of a folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing path, or an I/O error.
    pub fn parse_path(&self, path: &Path, extension: &str) -> Result<ScholarlyBatch> {
        if path.is_dir() {
            return self.parse_folder(path, extension);
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains("complet") {
            return self.parse_combined_file(path);
        }
        let result = match self.parse_file(path) {
            Ok(page) => Ok(page),
            Err(Error::Scholarly(e)) => Err(e.to_string()),
            Err(e) => return Err(e),
        };
        let mut batch = ScholarlyBatch::default();
        batch.push(path.display().to_string(), result);
        Ok(batch)
    }

    fn parse_combined_named(&self, content: &str, name: &str) -> ScholarlyBatch {
        let lines: Vec<&str> = content.lines().collect();
        let openings: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| RE_SEPARATOR.is_match(line))
            .map(|(i, _)| i)
            .step_by(2)
            .collect();

        let mut batch = ScholarlyBatch::default();
        for (n, &start) in openings.iter().enumerate() {
            let end = openings.get(n + 1).copied().unwrap_or(lines.len());
            let chunk = lines[start..end].join("\n");
            let result = self.parse_str(&chunk).map_err(|e| e.to_string());
            batch.push(format!("{name}#{}", n + 1), result);
        }
        batch
    }
}

fn parse_header(lines: &[&str]) -> PageMetadata {
    let mut metadata = PageMetadata::new(UNKNOWN_FOLIO, 0);
    let mut corpus = BTreeMap::new();

    for line in lines {
        if let Some(caps) = RE_PAGE.captures(line) {
            match caps[1].parse() {
                Ok(n) => metadata.page_number = n,
                Err(e) => log::warn!("Ignoring page number {:?}: {e}", &caps[1]),
            }
            continue;
        }
        if let Some(caps) = RE_RAW_KEY_FIELD.captures(line) {
            corpus.insert(caps[1].to_string(), caps[2].to_string());
            continue;
        }

        let known = FIELD_PATTERNS
            .iter()
            .find_map(|(field, re)| re.captures(line).map(|c| (*field, c[1].to_string())));
        match known {
            Some((Field::Folio, value)) => metadata.folio = value,
            Some((Field::Image, _)) => {}
            Some((Field::RunningTitle, value)) => metadata.running_title = value,
            Some((Field::Corpus(key), value)) => {
                corpus.insert(key.to_string(), value);
            }
            None => {
                if let Some(caps) = RE_GENERIC_FIELD.captures(line) {
                    let key = snake_case_key(&caps[1]);
                    if !key.is_empty() {
                        corpus.insert(key, caps[2].to_string());
                    }
                }
            }
        }
    }

    metadata.corpus_metadata = corpus;
    metadata
}

/// `Shelf Mark` -> `shelf_mark`
pub(crate) fn snake_case_key(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Prose lines joined into one line with single spaces
fn collapse_text(lines: &[&str]) -> String {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
