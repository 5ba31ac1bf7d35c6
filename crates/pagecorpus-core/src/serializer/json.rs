//! JSON checkpoints
//!
//! The extraction step writes either one corpus file (`{"pages": [...]}`) or
//! one file per page; the enrichment step reads either back. Pages already
//! implement `Serialize`, so this is mostly a wrapper with formatting options
//! and file handling.

use crate::error::{Error, Result};
use crate::page::{AnnotatedCorpus, ExtractedCorpus, ExtractedPage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for JSON serialization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonOptions {
    /// Pretty-print with indentation (default: true)
    pub pretty: bool,
    /// Indentation string when pretty=true (default: 2 spaces)
    pub indent: String,
}

impl Default for JsonOptions {
    #[inline]
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

/// JSON serializer for page checkpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonSerializer {
    options: JsonOptions,
}

impl JsonSerializer {
    /// Create a serializer with default options (pretty-printed)
    #[inline]
    #[must_use = "creates serializer with default options"]
    pub fn new() -> Self {
        Self {
            options: JsonOptions::default(),
        }
    }

    /// Create a serializer with custom options
    #[inline]
    #[must_use = "creates serializer with custom options"]
    pub const fn with_options(options: JsonOptions) -> Self {
        Self { options }
    }

    /// Serialize any checkpoint value
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[must_use = "this function returns serialized JSON that should be used"]
    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if !self.options.pretty {
            return Ok(serde_json::to_string(value)?);
        }
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.options.indent.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Serialize an extracted corpus
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[must_use = "this function returns serialized JSON that should be used"]
    pub fn serialize_extracted(&self, corpus: &ExtractedCorpus) -> Result<String> {
        self.to_string(corpus)
    }

    /// Serialize an annotated corpus
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[must_use = "this function returns serialized JSON that should be used"]
    pub fn serialize_annotated(&self, corpus: &AnnotatedCorpus) -> Result<String> {
        self.to_string(corpus)
    }

    /// Write a value to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_string(value)?)?;
        Ok(())
    }

    /// Write one JSON file per page into `dir`
    ///
    /// Files are named after the folio stem; pages carrying a `column`
    /// attribute get a `_col<N>` suffix so both halves of a dual-column
    /// folio are kept.
    ///
    /// # Errors
    ///
    /// Returns an error on the first page that cannot be written.
    pub fn save_individual(&self, pages: &[ExtractedPage], dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(pages.len());
        for page in pages {
            let path = dir.join(individual_file_name(page));
            self.save(page, &path)?;
            written.push(path);
        }
        log::info!("Saved {} JSON files to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Read a JSON value from `path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing file, or a read/parse error.
    pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read an extracted corpus file
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing file, or a read/parse error.
    pub fn load_extracted(path: &Path) -> Result<ExtractedCorpus> {
        Self::load(path)
    }

    /// Read every `*.json` page file of `dir`, in lexical filename order
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing folder, or the first
    /// read/parse error.
    pub fn load_folder(dir: &Path) -> Result<ExtractedCorpus> {
        if !dir.is_dir() {
            return Err(Error::NotFound(dir.to_path_buf()));
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("json"))
            })
            .collect();
        files.sort();

        let pages = files
            .iter()
            .map(|path| Self::load::<ExtractedPage>(path))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Loaded {} pages from {}", pages.len(), dir.display());
        Ok(ExtractedCorpus::new(pages))
    }
}

fn individual_file_name(page: &ExtractedPage) -> String {
    let stem = Path::new(&page.metadata.folio)
        .file_stem()
        .map_or_else(|| page.metadata.folio.clone(), |s| s.to_string_lossy().into_owned());
    match page.metadata.corpus_metadata.get("column") {
        Some(column) => format!("{stem}_col{column}.json"),
        None => format!("{stem}.json"),
    }
}
