//! Pipeline configuration
//!
//! Plain serde structs with defaults. Reading them from YAML or the command
//! line is left to the caller; any serde format works.

use crate::serializer::export::ExportFormat;
use crate::serializer::vertical::is_valid_corpus_key;
use crate::page::DEFAULT_RUNNING_TITLE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Corpus-wide attributes written into every `<doc>` tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusMetadata {
    pub edition_id: String,
    pub title: String,
    pub language: String,
    pub author: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub lieu: String,
    pub ville: String,

    /// Any further attribute
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for CorpusMetadata {
    fn default() -> Self {
        Self {
            edition_id: String::new(),
            title: String::new(),
            language: "Latin".to_string(),
            author: String::new(),
            source: String::new(),
            kind: String::new(),
            date: String::new(),
            lieu: String::new(),
            ville: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl CorpusMetadata {
    /// Non-empty attributes as the page-level map
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let named = [
            ("edition_id", &self.edition_id),
            ("title", &self.title),
            ("language", &self.language),
            ("author", &self.author),
            ("source", &self.source),
            ("type", &self.kind),
            ("date", &self.date),
            ("lieu", &self.lieu),
            ("ville", &self.ville),
        ];
        named
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .chain(self.extra.clone())
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }
}

/// How main-zone columns are read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMode {
    /// All main-zone content concatenated in document order
    #[default]
    Single,
    /// Column 1 then column 2, each column an independent page
    Dual,
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Dual => f.write_str("dual"),
        }
    }
}

impl FromStr for ColumnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "dual" => Ok(Self::Dual),
            other => Err(format!("invalid column mode: {other} (expected single or dual)")),
        }
    }
}

/// Where page numbers come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNumberSource {
    /// Digits in the filename, else position in the folder
    #[default]
    Filename,
    /// The numbering zone, else the filename rule
    Zone,
}

/// Page numbering settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub starting_page_number: i64,
    pub page_number_source: PageNumberSource,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            starting_page_number: 1,
            page_number_source: PageNumberSource::Filename,
        }
    }
}

/// Extraction step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub column_mode: ColumnMode,
    pub merge_hyphenated: bool,
    pub main_zone_type: String,
    pub running_title_zone_type: String,
    pub numbering_zone_type: String,
    pub default_running_title: String,
    /// Keep pages without text in the output
    pub include_empty_pages: bool,
    /// Extract files on the rayon pool
    pub parallel: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            column_mode: ColumnMode::Single,
            merge_hyphenated: true,
            main_zone_type: "MainZone".to_string(),
            running_title_zone_type: "RunningTitleZone".to_string(),
            numbering_zone_type: "NumberingZone".to_string(),
            default_running_title: DEFAULT_RUNNING_TITLE.to_string(),
            include_empty_pages: true,
            parallel: false,
        }
    }
}

/// Enrichment step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub sentence_delimiters: Vec<String>,
    pub preserve_case: bool,
    /// Annotate pages on the rayon pool
    pub parallel: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            sentence_delimiters: [".", "?", "!", ";"].map(String::from).to_vec(),
            preserve_case: true,
            parallel: false,
        }
    }
}

/// Export step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub generate_index: bool,
    pub generate_combined: bool,
    /// Supports `{number}`, `{number:04}`, `{page_number}` and `{folio}`
    pub page_filename_pattern: String,
    /// Wrap width of scholarly prose (0 disables wrapping)
    pub line_width: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Clean,
            generate_index: true,
            generate_combined: true,
            page_filename_pattern: "page_{number:04}_{folio}.txt".to_string(),
            line_width: 80,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub corpus: CorpusMetadata,
    pub pagination: PaginationConfig,
    pub extraction: ExtractionConfig,
    pub enrichment: EnrichmentConfig,
    pub export: ExportConfig,
}

impl PipelineConfig {
    /// Validation messages; empty when the configuration is usable
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.pagination.starting_page_number < 0 {
            errors.push("starting_page_number must be >= 0".to_string());
        }
        if self.extraction.main_zone_type.trim().is_empty() {
            errors.push("main_zone_type must not be empty".to_string());
        }
        if self.enrichment.sentence_delimiters.is_empty() {
            errors.push("sentence_delimiters must not be empty".to_string());
        }
        if let Some(bad) = self
            .enrichment
            .sentence_delimiters
            .iter()
            .find(|d| d.chars().count() != 1)
        {
            errors.push(format!("sentence delimiter must be one character: {bad:?}"));
        }
        if self.export.page_filename_pattern.trim().is_empty() {
            errors.push("page_filename_pattern must not be empty".to_string());
        }
        for key in self.corpus.to_map().keys().filter(|k| !is_valid_corpus_key(k)) {
            errors.push(format!("corpus attribute name is reserved or invalid: {key:?}"));
        }

        errors
    }

    /// Fail with [`crate::Error::InvalidConfig`] when validation reports problems
    ///
    /// # Errors
    ///
    /// Returns every validation message at once.
    pub fn ensure_valid(&self) -> crate::Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::InvalidConfig(errors))
        }
    }
}
