//! Vertical corpus format
//!
//! One token per line, sentences wrapped in `<s>`/`</s>`, pages wrapped in
//! `<doc ...>`/`</doc>` with the page metadata as attributes:
//!
//! ```text
//! <doc folio="0042.xml" page_number="42" running_title="No running title" author="Anonyme">
//! <s>
//! Dominus	NOM	dominus
//! dicit	VER	dico
//! .	PUNCT	.
//! </s>
//! </doc>
//! ```
//!
//! Token fields are written with `<`, `>` and `&` escaped, so a token can
//! never read as a sentence or page marker. Corpus keys that are not valid
//! attribute names, or that clash with the reserved page attributes, are
//! left out of the `<doc>` tag.
//!
//! This is the format of record: [`VerticalParser`] is the exact inverse of
//! [`VerticalFormatter`] for every well-formed page (non-empty sentences with
//! dense ids, no tab or newline inside token fields, valid corpus keys).

use crate::error::Result;
use crate::page::{AnnotatedPage, PageMetadata, Sentence, Token, DEFAULT_RUNNING_TITLE, POS_UNKNOWN};
use quick_xml::escape::{escape, partial_escape, unescape};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const SENTENCE_OPEN: &str = "<s>";
const SENTENCE_CLOSE: &str = "</s>";
const DOC_CLOSE: &str = "</doc>";

/// Attributes stored on [`PageMetadata`] fields rather than in `corpus_metadata`
pub const RESERVED_ATTRIBUTES: [&str; 3] = ["folio", "page_number", "running_title"];

static RE_DOC_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<doc(?:\s+([^>]*))?>").expect("regex is compile-time constant"));
static RE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w[\w.:-]*)="([^"]*)""#).expect("regex is compile-time constant")
});
static RE_ATTRIBUTE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w[\w.:-]*$").expect("regex is compile-time constant"));
static RE_SENTENCE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<s>|</s>").expect("regex is compile-time constant"));

/// True when `key` can be written as a corpus attribute of the `<doc>` tag
/// and read back unchanged
#[must_use]
pub fn is_valid_corpus_key(key: &str) -> bool {
    RE_ATTRIBUTE_NAME.is_match(key) && !RESERVED_ATTRIBUTES.contains(&key)
}

/// Writes annotated pages in the vertical format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VerticalFormatter;

impl VerticalFormatter {
    /// Create a formatter
    #[inline]
    #[must_use = "creates a vertical formatter"]
    pub const fn new() -> Self {
        Self
    }

    /// Attribute string of the `<doc>` tag, values XML-escaped
    ///
    /// Corpus keys rejected by [`is_valid_corpus_key`] are skipped.
    #[must_use]
    pub fn doc_attributes(&self, metadata: &PageMetadata) -> String {
        let mut attrs = format!(
            r#"folio="{}" page_number="{}" running_title="{}""#,
            escape(&metadata.folio),
            metadata.page_number,
            escape(&metadata.running_title),
        );
        for (key, value) in &metadata.corpus_metadata {
            if !is_valid_corpus_key(key) {
                log::warn!("Skipping corpus attribute {key:?} of {}", metadata.folio);
                continue;
            }
            let _ = write!(attrs, r#" {key}="{}""#, escape(value));
        }
        attrs
    }

    /// One sentence: `<s>`, a `word\tpos\tlemma` line per token, `</s>`
    #[must_use]
    pub fn serialize_sentence(&self, sentence: &Sentence) -> String {
        let mut out = String::from(SENTENCE_OPEN);
        for token in &sentence.tokens {
            let _ = write!(
                out,
                "\n{}\t{}\t{}",
                partial_escape(&token.word),
                partial_escape(&token.pos),
                partial_escape(&token.lemma)
            );
        }
        out.push('\n');
        out.push_str(SENTENCE_CLOSE);
        out
    }

    /// One page, from `<doc ...>` to `</doc>`
    #[must_use]
    pub fn serialize_page(&self, page: &AnnotatedPage) -> String {
        let mut lines = vec![format!("<doc {}>", self.doc_attributes(&page.metadata))];
        if page.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(page.sentences.iter().map(|s| self.serialize_sentence(s)));
        }
        lines.push(DOC_CLOSE.to_string());
        lines.join("\n")
    }

    /// Pages separated by one blank line
    #[must_use]
    pub fn serialize_corpus(&self, pages: &[AnnotatedPage]) -> String {
        pages
            .iter()
            .map(|p| self.serialize_page(p))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write a corpus file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_file(&self, pages: &[AnnotatedPage], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut content = self.serialize_corpus(pages);
        content.push('\n');
        fs::write(path, content)?;
        log::info!("Wrote {} pages in vertical format to {}", pages.len(), path.display());
        Ok(())
    }
}

/// Reads the vertical format back into annotated pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VerticalParser;

impl VerticalParser {
    /// Create a parser
    #[inline]
    #[must_use = "creates a vertical parser"]
    pub const fn new() -> Self {
        Self
    }

    /// Parse every page of a vertical corpus
    ///
    /// The content is split on `</doc>` rather than `<doc` so that escaped
    /// angle brackets inside attribute values can never start a page.
    /// Chunks without an opening `<doc>` tag are skipped.
    #[must_use]
    pub fn parse_str(&self, content: &str) -> Vec<AnnotatedPage> {
        let pages: Vec<AnnotatedPage> = content
            .split(DOC_CLOSE)
            .filter(|chunk| !chunk.trim().is_empty())
            .filter_map(|chunk| self.parse_page(chunk))
            .collect();
        log::debug!("Parsed {} pages from vertical content", pages.len());
        pages
    }

    /// Parse a vertical corpus file
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] for a missing file, or an I/O error.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<AnnotatedPage>> {
        if !path.exists() {
            return Err(crate::Error::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(self.parse_str(&content))
    }

    /// Parse one `<doc ...>` chunk (without its closing tag)
    #[must_use]
    pub fn parse_page(&self, chunk: &str) -> Option<AnnotatedPage> {
        let open = RE_DOC_OPEN.captures(chunk)?;
        let attrs = open
            .get(1)
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default();
        let body_start = open.get(0).map_or(0, |m| m.end());

        let metadata = metadata_from_attributes(attrs);
        let sentences = parse_sentences(&chunk[body_start..]);
        Some(AnnotatedPage::new(metadata, sentences))
    }
}

/// `key="value"` pairs in encounter order, values unescaped
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    RE_ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| (caps[1].to_string(), unescape_or_raw(&caps[2])))
        .collect()
}

/// Unescaped text, or `raw` itself when it holds a bad entity
fn unescape_or_raw(raw: &str) -> String {
    unescape(raw).map_or_else(
        |e| {
            log::warn!("Keeping raw text {raw:?}: {e}");
            raw.to_string()
        },
        |v| v.into_owned(),
    )
}

fn metadata_from_attributes(attrs: Vec<(String, String)>) -> PageMetadata {
    let mut folio = None;
    let mut page_number = None;
    let mut running_title = None;
    let mut corpus_metadata = BTreeMap::new();

    for (key, value) in attrs {
        match key.as_str() {
            "folio" => folio = Some(value),
            "page_number" => page_number = Some(value),
            "running_title" => running_title = Some(value),
            _ => {
                corpus_metadata.insert(key, value);
            }
        }
    }

    let page_number = page_number.map_or(0, |raw| {
        raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid page_number {raw:?}, using 0");
            0
        })
    });

    PageMetadata {
        folio: folio.unwrap_or_default(),
        page_number,
        running_title: running_title.unwrap_or_else(|| DEFAULT_RUNNING_TITLE.to_string()),
        corpus_metadata,
    }
}

/// Odd fragments between `<s>` / `</s>` markers are sentence bodies.
/// Sentences without tokens are dropped and ids stay dense.
fn parse_sentences(body: &str) -> Vec<Sentence> {
    RE_SENTENCE_SPLIT
        .split(body)
        .skip(1)
        .step_by(2)
        .map(parse_tokens)
        .filter(|tokens| !tokens.is_empty())
        .enumerate()
        .map(|(i, tokens)| Sentence::new(i + 1, tokens))
        .collect()
}

fn parse_tokens(body: &str) -> Vec<Token> {
    body.lines()
        .map(|line| line.trim_matches(|c| c == ' ' || c == '\r'))
        .filter(|line| !line.is_empty())
        .map(parse_token_line)
        .map(|token| {
            Token::new(
                unescape_or_raw(&token.word),
                unescape_or_raw(&token.pos),
                unescape_or_raw(&token.lemma),
            )
        })
        .collect()
}

/// Split a token line on tabs, rebuilding missing columns
///
/// Two fields: lemma is the lowercased word. One field: `UNK` tag and the
/// lowercased word as lemma.
#[must_use]
pub fn parse_token_line(line: &str) -> Token {
    let mut fields = line.split('\t');
    let word = fields.next().unwrap_or_default();
    match (fields.next(), fields.next()) {
        (Some(pos), Some(lemma)) => Token::new(word, pos, lemma),
        (Some(pos), None) => Token::new(word, pos, word.to_lowercase()),
        _ => Token::new(word, POS_UNKNOWN, word.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::POS_PUNCT;

    fn sample_page() -> AnnotatedPage {
        let mut corpus_metadata = BTreeMap::new();
        corpus_metadata.insert("author".to_string(), "Anonyme".to_string());
        corpus_metadata.insert("title".to_string(), "Summa \"Induent\" <sancti> & co".to_string());
        let metadata = PageMetadata::new("0042_1.xml", 79)
            .with_running_title("DISTINCTIO 'LXXX'")
            .with_corpus_metadata(corpus_metadata);
        AnnotatedPage::new(
            metadata,
            vec![
                Sentence::new(
                    1,
                    vec![
                        Token::new("Dominus", "NOM", "dominus"),
                        Token::new("dicit", "VER", "dico"),
                        Token::new(".", POS_PUNCT, "."),
                    ],
                ),
                Sentence::new(2, vec![Token::new("Amen", "INT", "amen")]),
            ],
        )
    }

    #[test]
    fn test_serialize_page_layout() {
        let page = sample_page();
        let text = VerticalFormatter::new().serialize_page(&page);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with(r#"<doc folio="0042_1.xml" page_number="79""#));
        assert!(lines[0].contains("&quot;Induent&quot; &lt;sancti&gt; &amp; co"));
        assert!(lines[0].contains("running_title=\"DISTINCTIO &apos;LXXX&apos;\""));
        assert_eq!(lines[1], "<s>");
        assert_eq!(lines[2], "Dominus\tNOM\tdominus");
        assert_eq!(lines[5], "</s>");
        assert_eq!(*lines.last().unwrap(), "</doc>");
    }

    #[test]
    fn test_empty_page_has_blank_body() {
        let page = AnnotatedPage::empty(PageMetadata::new("blank.xml", 3));
        let text = VerticalFormatter::new().serialize_page(&page);
        assert_eq!(
            text,
            "<doc folio=\"blank.xml\" page_number=\"3\" running_title=\"No running title\">\n\n</doc>"
        );
        let parsed = VerticalParser::new().parse_str(&text);
        assert_eq!(parsed, vec![page]);
    }

    #[test]
    fn test_roundtrip_with_escaped_values() {
        let pages = vec![sample_page(), AnnotatedPage::empty(PageMetadata::new("b.xml", 80))];
        let text = VerticalFormatter::new().serialize_corpus(&pages);
        assert!(text.contains("</doc>\n\n<doc"));
        let parsed = VerticalParser::new().parse_str(&text);
        assert_eq!(parsed, pages);
    }

    #[test]
    fn test_degraded_token_lines() {
        let content = "<doc folio=\"x.xml\" page_number=\"1\">\n<s>\nRoma\tNPR\nEst\n</s>\n</doc>";
        let pages = VerticalParser::new().parse_str(content);
        let tokens = &pages[0].sentences[0].tokens;
        assert_eq!(tokens[0], Token::new("Roma", "NPR", "roma"));
        assert_eq!(tokens[1], Token::new("Est", "UNK", "est"));
        assert_eq!(pages[0].metadata.running_title, DEFAULT_RUNNING_TITLE);
    }

    #[test]
    fn test_missing_or_bad_page_number_defaults_to_zero() {
        let pages = VerticalParser::new()
            .parse_str("<doc folio=\"a.xml\">\n\n</doc>\n<doc folio=\"b.xml\" page_number=\"xii\">\n\n</doc>");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].metadata.page_number, 0);
        assert_eq!(pages[1].metadata.page_number, 0);
    }

    #[test]
    fn test_empty_sentences_are_dropped_and_ids_densified() {
        let content = "<doc folio=\"a.xml\" page_number=\"1\">\n<s>\n</s>\n<s>\nest\tVER\tsum\n</s>\n</doc>";
        let pages = VerticalParser::new().parse_str(content);
        assert_eq!(pages[0].sentences.len(), 1);
        assert_eq!(pages[0].sentences[0].id, 1);
    }

    #[test]
    fn test_marker_like_tokens_round_trip() {
        let page = AnnotatedPage::new(
            PageMetadata::new("0003.xml", 3),
            vec![
                Sentence::new(
                    1,
                    vec![
                        Token::new("<s>", "SYM", "<s>"),
                        Token::new("est", "VER", "sum"),
                        Token::new("</doc>", "SYM", "</s>"),
                    ],
                ),
                Sentence::new(2, vec![Token::new("&", "CON", "et")]),
            ],
        );
        let text = VerticalFormatter::new().serialize_page(&page);
        assert!(text.contains("&lt;s&gt;\tSYM\t&lt;s&gt;"));
        assert!(text.contains("&amp;\tCON\tet"));
        assert_eq!(VerticalParser::new().parse_str(&text), vec![page]);
    }

    #[test]
    fn test_bad_entity_in_token_is_kept_raw() {
        let content = "<doc folio=\"a.xml\" page_number=\"1\">\n<s>\nAT&T\tNPR\n</s>\n</doc>";
        let pages = VerticalParser::new().parse_str(content);
        assert_eq!(pages[0].sentences[0].tokens, [Token::new("AT&T", "NPR", "at&t")]);
    }

    #[test]
    fn test_invalid_corpus_keys_are_not_written() {
        let mut corpus_metadata = BTreeMap::new();
        corpus_metadata.insert("folio".to_string(), "shelf-42".to_string());
        corpus_metadata.insert("shelf mark".to_string(), "Lat. 3881".to_string());
        corpus_metadata.insert("author".to_string(), "Anonyme".to_string());
        let page = AnnotatedPage::empty(
            PageMetadata::new("0007.xml", 7).with_corpus_metadata(corpus_metadata),
        );
        let attrs = VerticalFormatter::new().doc_attributes(&page.metadata);
        assert!(!attrs.contains("shelf"));

        let text = VerticalFormatter::new().serialize_page(&page);
        let parsed = VerticalParser::new().parse_str(&text);
        assert_eq!(parsed[0].metadata.folio, "0007.xml");
        assert_eq!(parsed[0].metadata.corpus_metadata.len(), 1);
        assert_eq!(parsed[0].metadata.corpus_metadata["author"], "Anonyme");
    }

    #[test]
    fn test_is_valid_corpus_key() {
        assert!(is_valid_corpus_key("author"));
        assert!(is_valid_corpus_key("dc:title"));
        assert!(!is_valid_corpus_key("running_title"));
        assert!(!is_valid_corpus_key("shelf mark"));
        assert!(!is_valid_corpus_key(""));
        assert!(!is_valid_corpus_key("-x"));
    }

    #[test]
    fn test_chunks_without_doc_are_skipped() {
        let pages = VerticalParser::new().parse_str("stray text\n</doc>\n\n");
        assert!(pages.is_empty());
    }
}
