//! Sentence segmentation and tokenization
//!
//! Punctuation is split off into tokens of its own, then the token stream is
//! cut after every sentence delimiter:
//!
//! ```text
//! "Quid est? Nihil!"  ->  [["Quid", "est", "?"], ["Nihil", "!"]]
//! ```

use pagecorpus_core::EnrichmentConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Characters isolated as tokens
pub const PUNCTUATION_CHARS: &str = ".,;:!?()[]«»“”\"'„‟⁊";

/// Default sentence delimiters
pub const DEFAULT_DELIMITERS: [&str; 4] = [".", "?", "!", ";"];

static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("([{}])", regex::escape(PUNCTUATION_CHARS)))
        .expect("regex is compile-time constant")
});

static SINGLE_PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[{}]$", regex::escape(PUNCTUATION_CHARS)))
        .expect("regex is compile-time constant")
});

/// True when `token` is a single punctuation character
#[must_use]
pub fn is_punctuation(token: &str) -> bool {
    SINGLE_PUNCTUATION_RE.is_match(token)
}

/// Splits text into sentences of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    delimiters: Vec<String>,
    preserve_case: bool,
}

impl Default for Tokenizer {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a tokenizer with [`DEFAULT_DELIMITERS`], preserving case
    #[inline]
    #[must_use = "creates a tokenizer"]
    pub fn new() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.map(String::from).to_vec(),
            preserve_case: true,
        }
    }

    /// Create a tokenizer from enrichment settings
    #[must_use = "creates a tokenizer"]
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            delimiters: config.sentence_delimiters.clone(),
            preserve_case: config.preserve_case,
        }
    }

    /// Use other sentence delimiters
    #[must_use = "returns a tokenizer with other delimiters"]
    pub fn with_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delimiters = delimiters.into_iter().map(Into::into).collect();
        self
    }

    /// Keep or lowercase the original case of tokens
    #[inline]
    #[must_use = "returns a tokenizer with the case option set"]
    pub const fn with_preserve_case(mut self, preserve_case: bool) -> Self {
        self.preserve_case = preserve_case;
        self
    }

    /// Sentence delimiters in use
    #[inline]
    #[must_use]
    pub fn delimiters(&self) -> &[String] {
        &self.delimiters
    }

    /// True when `token` closes a sentence
    #[must_use]
    pub fn is_delimiter(&self, token: &str) -> bool {
        self.delimiters.iter().any(|d| d == token)
    }

    /// Tokenize `text` into sentences
    ///
    /// A trailing fragment without delimiter becomes the last sentence.
    /// Blank input yields no sentence.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<Vec<String>> {
        let spaced = PUNCTUATION_RE.replace_all(text, " $1 ");
        let mut sentences = Vec::new();
        let mut current = Vec::new();

        for token in spaced.split_whitespace() {
            let closes = self.is_delimiter(token);
            current.push(if self.preserve_case {
                token.to_string()
            } else {
                token.to_lowercase()
            });
            if closes {
                sentences.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            sentences.push(current);
        }
        sentences
    }

    /// Tokenize lines joined by single spaces; blank lines are skipped
    #[must_use]
    pub fn tokenize_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Vec<String>> {
        let text = lines
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        self.tokenize(&text)
    }
}
