//! Page and corpus value types
//!
//! `ExtractedPage` is what the extractor produces from one XML file;
//! `AnnotatedPage` is what enrichment produces from one `ExtractedPage`.
//! Both are values: every pipeline step builds new instances instead of
//! patching existing ones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running title used when a page has no running-title zone.
pub const DEFAULT_RUNNING_TITLE: &str = "No running title";

/// Part-of-speech tag carried by punctuation tokens.
pub const POS_PUNCT: &str = "PUNCT";

/// Part-of-speech tag for tokens without analysis.
pub const POS_UNKNOWN: &str = "UNK";

/// Metadata attached to every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Stable source identifier (usually the XML filename)
    pub folio: String,

    /// Page number in the edition; not required to be unique
    pub page_number: i64,

    /// Running title read from the running-title zone
    #[serde(default = "default_running_title")]
    pub running_title: String,

    /// Open-ended corpus attributes (edition id, author, ...)
    #[serde(default)]
    pub corpus_metadata: BTreeMap<String, String>,
}

fn default_running_title() -> String {
    DEFAULT_RUNNING_TITLE.to_string()
}

impl PageMetadata {
    /// Create metadata with the default running title and no corpus attributes
    #[inline]
    #[must_use = "creates page metadata"]
    pub fn new(folio: impl Into<String>, page_number: i64) -> Self {
        Self {
            folio: folio.into(),
            page_number,
            running_title: default_running_title(),
            corpus_metadata: BTreeMap::new(),
        }
    }

    /// Replace the running title
    #[inline]
    #[must_use = "returns metadata with the running title set"]
    pub fn with_running_title(mut self, running_title: impl Into<String>) -> Self {
        self.running_title = running_title.into();
        self
    }

    /// Replace the corpus attributes
    #[inline]
    #[must_use = "returns metadata with the corpus attributes set"]
    pub fn with_corpus_metadata(mut self, corpus_metadata: BTreeMap<String, String>) -> Self {
        self.corpus_metadata = corpus_metadata;
        self
    }

    /// True when the running title is the placeholder default
    #[inline]
    #[must_use]
    pub fn has_default_running_title(&self) -> bool {
        self.running_title.is_empty() || self.running_title == DEFAULT_RUNNING_TITLE
    }
}

/// Text lines extracted from one page, before annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ExtractedPageRepr", from = "ExtractedPageRepr")]
pub struct ExtractedPage {
    /// Page metadata
    pub metadata: PageMetadata,

    /// Raw text lines in reading order
    pub lines: Vec<String>,
}

impl ExtractedPage {
    /// Create a page from metadata and lines
    #[inline]
    #[must_use = "creates an extracted page"]
    pub const fn new(metadata: PageMetadata, lines: Vec<String>) -> Self {
        Self { metadata, lines }
    }

    /// True when every line is blank (or there are no lines)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Lines joined with newlines
    #[must_use]
    pub fn full_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// JSON shape of [`ExtractedPage`]; `is_empty` is written for readers of the
/// checkpoint and recomputed on load.
#[derive(Serialize, Deserialize)]
struct ExtractedPageRepr {
    metadata: PageMetadata,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    is_empty: bool,
}

impl From<ExtractedPage> for ExtractedPageRepr {
    fn from(page: ExtractedPage) -> Self {
        let is_empty = page.is_empty();
        Self {
            metadata: page.metadata,
            lines: page.lines,
            is_empty,
        }
    }
}

impl From<ExtractedPageRepr> for ExtractedPage {
    fn from(repr: ExtractedPageRepr) -> Self {
        Self::new(repr.metadata, repr.lines)
    }
}

/// A word with its part of speech and lemma
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Surface form
    pub word: String,
    /// Part-of-speech tag
    pub pos: String,
    /// Lemma
    pub lemma: String,
}

impl Token {
    /// Create a token
    #[inline]
    #[must_use = "creates a token"]
    pub fn new(word: impl Into<String>, pos: impl Into<String>, lemma: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            pos: pos.into(),
            lemma: lemma.into(),
        }
    }

    /// Token without analysis: `UNK` tag, lowercased word as lemma
    #[must_use = "creates a token"]
    pub fn passthrough(word: impl Into<String>) -> Self {
        let word = word.into();
        let lemma = word.to_lowercase();
        Self {
            word,
            pos: POS_UNKNOWN.to_string(),
            lemma,
        }
    }

    /// True when tagged as punctuation
    #[inline]
    #[must_use]
    pub fn is_punctuation(&self) -> bool {
        self.pos == POS_PUNCT
    }
}

/// Ordered tokens of one sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// 1-based position of the sentence within its page
    #[serde(default)]
    pub id: usize,

    /// Tokens in order
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Create a sentence
    #[inline]
    #[must_use = "creates a sentence"]
    pub const fn new(id: usize, tokens: Vec<Token>) -> Self {
        Self { id, tokens }
    }

    /// Words joined by single spaces, optionally without punctuation tokens
    #[must_use]
    pub fn text(&self, include_punctuation: bool) -> String {
        self.tokens
            .iter()
            .filter(|token| include_punctuation || !token.is_punctuation())
            .map(|token| token.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Annotated page; the unit written to the vertical format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AnnotatedPageRepr", from = "AnnotatedPageRepr")]
pub struct AnnotatedPage {
    /// Page metadata
    pub metadata: PageMetadata,

    /// Sentences in order
    pub sentences: Vec<Sentence>,
}

impl AnnotatedPage {
    /// Create a page from metadata and sentences
    #[inline]
    #[must_use = "creates an annotated page"]
    pub const fn new(metadata: PageMetadata, sentences: Vec<Sentence>) -> Self {
        Self {
            metadata,
            sentences,
        }
    }

    /// Page without any sentence
    #[inline]
    #[must_use = "creates an empty annotated page"]
    pub const fn empty(metadata: PageMetadata) -> Self {
        Self::new(metadata, Vec::new())
    }

    /// True when no sentence carries a token
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.tokens.is_empty())
    }

    /// Total number of tokens across sentences
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }

    /// Sentence texts joined by single spaces
    #[must_use]
    pub fn text(&self, include_punctuation: bool) -> String {
        self.sentences
            .iter()
            .map(|s| s.text(include_punctuation))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All tokens of the page in order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }
}

#[derive(Serialize, Deserialize)]
struct AnnotatedPageRepr {
    metadata: PageMetadata,
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    is_empty: bool,
}

impl From<AnnotatedPage> for AnnotatedPageRepr {
    fn from(page: AnnotatedPage) -> Self {
        let is_empty = page.is_empty();
        Self {
            metadata: page.metadata,
            sentences: page.sentences,
            is_empty,
        }
    }
}

impl From<AnnotatedPageRepr> for AnnotatedPage {
    fn from(repr: AnnotatedPageRepr) -> Self {
        Self::new(repr.metadata, repr.sentences)
    }
}

/// Ordered collection of extracted pages (the JSON checkpoint unit)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCorpus {
    /// Pages in order
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedCorpus {
    /// Wrap pages
    #[inline]
    #[must_use = "creates a corpus"]
    pub const fn new(pages: Vec<ExtractedPage>) -> Self {
        Self { pages }
    }

    /// Stable sort by page number
    pub fn sort_by_page_number(&mut self) {
        self.pages.sort_by_key(|p| p.metadata.page_number);
    }
}

/// Ordered collection of annotated pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedCorpus {
    /// Pages in order
    pub pages: Vec<AnnotatedPage>,
}

impl AnnotatedCorpus {
    /// Wrap pages
    #[inline]
    #[must_use = "creates a corpus"]
    pub const fn new(pages: Vec<AnnotatedPage>) -> Self {
        Self { pages }
    }

    /// Stable sort by page number
    pub fn sort_by_page_number(&mut self) {
        self.pages.sort_by_key(|p| p.metadata.page_number);
    }

    /// Whole corpus in the vertical format
    #[must_use]
    pub fn to_vertical(&self) -> String {
        crate::serializer::vertical::VerticalFormatter::new().serialize_corpus(&self.pages)
    }

    /// Parse a whole vertical corpus
    #[must_use]
    pub fn from_vertical(content: &str) -> Self {
        Self::new(crate::serializer::vertical::VerticalParser::new().parse_str(content))
    }
}
