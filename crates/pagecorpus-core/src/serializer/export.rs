//! Human-facing export formats
//!
//! Every format is a pure function from an [`AnnotatedPage`] to a string,
//! behind the [`PageFormatter`] trait. The scholarly format is the one meant
//! for manual correction: [`crate::scholarly::ScholarlyParser`] reads it back.

use crate::error::Error;
use crate::page::{AnnotatedPage, PageMetadata, Sentence, Token};
use crate::scholarly::snake_case_key;
use crate::serializer::vertical::VerticalFormatter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Width of the scholarly header separator
pub const SEPARATOR_WIDTH: usize = 80;

/// Default wrap width of scholarly prose
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// Scholarly header labels of the folio, image and running title lines
pub const PAGE_LABELS: [&str; 3] = ["Source", "Image", "Titre courant"];

/// Curated scholarly header fields, in display order
pub const SCHOLARLY_LABELS: [(&str, &str); 9] = [
    ("edition_id", "Edition ID"),
    ("title", "Œuvre"),
    ("author", "Auteur"),
    ("date", "Date"),
    ("language", "Langue"),
    ("source", "Provenance"),
    ("type", "Type"),
    ("lieu", "Lieu"),
    ("ville", "Ville"),
];

/// Export format selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain prose, punctuation attached to the preceding word
    #[default]
    Clean,
    /// Prose with `(POS→lemma)` after each word
    Diplomatic,
    /// Tabular tokens inside `<s>` markers
    Annotated,
    /// Canonical vertical page
    Vertical,
    /// Metadata header followed by wrapped prose
    Scholarly,
}

impl ExportFormat {
    /// Every format, in declaration order
    pub const ALL: [Self; 5] = [
        Self::Clean,
        Self::Diplomatic,
        Self::Annotated,
        Self::Vertical,
        Self::Scholarly,
    ];

    /// Lowercase name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Diplomatic => "diplomatic",
            Self::Annotated => "annotated",
            Self::Vertical => "vertical",
            Self::Scholarly => "scholarly",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| Error::UnknownFormat(s.to_string()))
    }
}

/// Renders annotated pages as text
pub trait PageFormatter: Send + Sync {
    /// Render one page
    fn format_page(&self, page: &AnnotatedPage) -> String;

    /// Render one sentence
    fn format_sentence(&self, sentence: &Sentence) -> String;

    /// Recommended file extension, dot included
    fn extension(&self) -> &'static str {
        ".txt"
    }
}

/// Build the formatter for `format`; `line_width` only affects scholarly output
#[must_use]
pub fn formatter(format: ExportFormat, line_width: usize) -> Box<dyn PageFormatter> {
    match format {
        ExportFormat::Clean => Box::new(CleanFormatter::new()),
        ExportFormat::Diplomatic => Box::new(DiplomaticFormatter::new()),
        ExportFormat::Annotated => Box::new(AnnotatedFormatter::new()),
        ExportFormat::Vertical => Box::new(VerticalPageFormatter),
        ExportFormat::Scholarly => Box::new(ScholarlyFormatter::new().with_line_width(line_width)),
    }
}

/// Words of `tokens` with punctuation glued to the word before it
fn attach_punctuation<'a>(
    tokens: impl IntoIterator<Item = &'a Token>,
    include_punctuation: bool,
    render: impl Fn(&Token) -> String,
) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for token in tokens {
        if token.is_punctuation() {
            if !include_punctuation {
                continue;
            }
            match words.last_mut() {
                Some(last) => last.push_str(&token.word),
                None => words.push(token.word.clone()),
            }
        } else {
            words.push(render(token));
        }
    }
    words
}

fn join_sentences(formatter: &dyn PageFormatter, page: &AnnotatedPage, sep: &str) -> String {
    if page.is_empty() {
        return String::new();
    }
    page.sentences
        .iter()
        .map(|s| formatter.format_sentence(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Plain prose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanFormatter {
    /// Keep punctuation tokens (default: true)
    pub include_punctuation: bool,
}

impl Default for CleanFormatter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl CleanFormatter {
    /// Create a formatter that keeps punctuation
    #[inline]
    #[must_use = "creates a formatter"]
    pub const fn new() -> Self {
        Self {
            include_punctuation: true,
        }
    }
}

impl PageFormatter for CleanFormatter {
    fn format_page(&self, page: &AnnotatedPage) -> String {
        join_sentences(self, page, " ")
    }

    fn format_sentence(&self, sentence: &Sentence) -> String {
        attach_punctuation(&sentence.tokens, self.include_punctuation, |t| t.word.clone()).join(" ")
    }
}

/// Prose with inline annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiplomaticFormatter {
    /// Show the lemma after the tag (default: true)
    pub show_lemma: bool,
    /// Separator between tag and lemma (default: `→`)
    pub separator: String,
}

impl Default for DiplomaticFormatter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DiplomaticFormatter {
    /// Create a formatter showing `(POS→lemma)`
    #[inline]
    #[must_use = "creates a formatter"]
    pub fn new() -> Self {
        Self {
            show_lemma: true,
            separator: "→".to_string(),
        }
    }

    fn annotate(&self, token: &Token) -> String {
        if self.show_lemma {
            format!("{}({}{}{})", token.word, token.pos, self.separator, token.lemma)
        } else {
            format!("{}({})", token.word, token.pos)
        }
    }
}

impl PageFormatter for DiplomaticFormatter {
    fn format_page(&self, page: &AnnotatedPage) -> String {
        join_sentences(self, page, " ")
    }

    fn format_sentence(&self, sentence: &Sentence) -> String {
        attach_punctuation(&sentence.tokens, true, |t| self.annotate(t)).join(" ")
    }
}

/// Tabular tokens without page attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotatedFormatter {
    /// Wrap sentences in `<s>`/`</s>` (default: true)
    pub sentence_markers: bool,
}

impl Default for AnnotatedFormatter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatedFormatter {
    /// Create a formatter with sentence markers
    #[inline]
    #[must_use = "creates a formatter"]
    pub const fn new() -> Self {
        Self {
            sentence_markers: true,
        }
    }
}

impl PageFormatter for AnnotatedFormatter {
    fn format_page(&self, page: &AnnotatedPage) -> String {
        join_sentences(self, page, "\n")
    }

    fn format_sentence(&self, sentence: &Sentence) -> String {
        if self.sentence_markers {
            return VerticalFormatter::new().serialize_sentence(sentence);
        }
        sentence
            .tokens
            .iter()
            .map(|t| format!("{}\t{}\t{}", t.word, t.pos, t.lemma))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn extension(&self) -> &'static str {
        ".tsv"
    }
}

/// The vertical format, one page at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerticalPageFormatter;

impl PageFormatter for VerticalPageFormatter {
    fn format_page(&self, page: &AnnotatedPage) -> String {
        VerticalFormatter::new().serialize_page(page)
    }

    fn format_sentence(&self, sentence: &Sentence) -> String {
        VerticalFormatter::new().serialize_sentence(sentence)
    }

    fn extension(&self) -> &'static str {
        ".vertical.txt"
    }
}

/// Metadata header plus continuous prose
///
/// ```text
/// ================================================================================
/// PAGE 79
/// Source: 0109.xml
/// Image: 0109.jpg
/// Titre courant: DISTINCTIO OCTOGESIMA
/// Œuvre: Summa 'Induent sancti'
/// Auteur: Anonyme
/// ================================================================================
/// catum susceperit biennio in lectoratu erit, et sequenti quinquennio...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScholarlyFormatter {
    /// Separator length (default: 80)
    pub header_width: usize,
    /// Wrap width of the prose, 0 for a single line (default: 80)
    pub line_width: usize,
    /// Keep punctuation tokens (default: true)
    pub include_punctuation: bool,
}

impl Default for ScholarlyFormatter {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ScholarlyFormatter {
    /// Create a formatter with 80-column header and prose
    #[inline]
    #[must_use = "creates a formatter"]
    pub const fn new() -> Self {
        Self {
            header_width: SEPARATOR_WIDTH,
            line_width: DEFAULT_LINE_WIDTH,
            include_punctuation: true,
        }
    }

    /// Set the prose wrap width
    #[inline]
    #[must_use = "returns formatter with the line width set"]
    pub const fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    /// Header block, both separators included
    #[must_use]
    pub fn format_header(&self, metadata: &PageMetadata) -> String {
        let separator = "=".repeat(self.header_width);
        let mut lines = vec![
            separator.clone(),
            format!("PAGE {}", metadata.page_number),
            format!("Source: {}", metadata.folio),
            format!("Image: {}", image_name(&metadata.folio)),
        ];
        if !metadata.has_default_running_title() {
            lines.push(format!("Titre courant: {}", metadata.running_title));
        }

        let corpus = &metadata.corpus_metadata;
        for (key, label) in SCHOLARLY_LABELS {
            if let Some(value) = corpus.get(key).filter(|v| !v.is_empty()) {
                lines.push(format!("{label}: {value}"));
            }
        }
        for (key, value) in corpus {
            if value.is_empty() || SCHOLARLY_LABELS.iter().any(|(k, _)| k == key) {
                continue;
            }
            lines.push(corpus_field_line(key, value));
        }

        lines.push(separator);
        lines.join("\n")
    }

    /// Page prose, wrapped to `line_width`
    #[must_use]
    pub fn format_text(&self, page: &AnnotatedPage) -> String {
        let words = attach_punctuation(page.tokens(), self.include_punctuation, |t| t.word.clone());
        let text = words.join(" ");
        if self.line_width > 0 {
            wrap_text(&text, self.line_width)
        } else {
            text
        }
    }
}

impl PageFormatter for ScholarlyFormatter {
    /// Empty pages keep their header so they survive a correction round
    fn format_page(&self, page: &AnnotatedPage) -> String {
        format!("{}\n{}", self.format_header(&page.metadata), self.format_text(page))
    }

    fn format_sentence(&self, sentence: &Sentence) -> String {
        attach_punctuation(&sentence.tokens, self.include_punctuation, |t| t.word.clone()).join(" ")
    }
}

/// `<folio stem>.jpg`
#[must_use]
pub fn image_name(folio: &str) -> String {
    let stem = Path::new(folio)
        .file_stem()
        .map_or_else(|| folio.to_string(), |s| s.to_string_lossy().into_owned());
    format!("{stem}.jpg")
}

/// Header line of a corpus attribute without a curated label
///
/// The title-cased label is used when it reads back as `key` and names no
/// other header field. Any other key is written as `[key]: value`.
fn corpus_field_line(key: &str, value: &str) -> String {
    let label = title_case_label(key);
    let lowered = label.to_lowercase();
    let taken = PAGE_LABELS
        .iter()
        .chain(SCHOLARLY_LABELS.iter().map(|(_, l)| l))
        .any(|l| l.to_lowercase() == lowered);
    if taken || snake_case_key(&label) != key {
        format!("[{key}]: {value}")
    } else {
        format!("{label}: {value}")
    }
}

/// `shelf_mark` -> `Shelf Mark`
fn title_case_label(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Greedy word wrap; a word longer than `width` gets a line of its own
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len + word_len + current.len() > width {
            if current.is_empty() {
                lines.push(word.to_string());
                current_len = 0;
            } else {
                lines.push(current.join(" "));
                current = vec![word];
                current_len = word_len;
            }
        } else {
            current.push(word);
            current_len += word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::POS_PUNCT;
    use std::collections::BTreeMap;

    fn page() -> AnnotatedPage {
        let mut corpus = BTreeMap::new();
        corpus.insert("title".to_string(), "Summa".to_string());
        corpus.insert("author".to_string(), "Anonyme".to_string());
        corpus.insert("shelf_mark".to_string(), "Lat. 3881".to_string());
        corpus.insert("ville".to_string(), String::new());
        AnnotatedPage::new(
            PageMetadata::new("scans/0109.xml", 79)
                .with_running_title("DISTINCTIO OCTOGESIMA")
                .with_corpus_metadata(corpus),
            vec![
                Sentence::new(
                    1,
                    vec![
                        Token::new("Dominus", "NOM", "dominus"),
                        Token::new("dicit", "VER", "dico"),
                        Token::new(".", POS_PUNCT, "."),
                    ],
                ),
                Sentence::new(
                    2,
                    vec![Token::new("Amen", "INT", "amen"), Token::new("!", POS_PUNCT, "!")],
                ),
            ],
        )
    }

    #[test]
    fn test_clean() {
        assert_eq!(CleanFormatter::new().format_page(&page()), "Dominus dicit. Amen!");
        let empty = AnnotatedPage::empty(PageMetadata::new("a.xml", 1));
        assert_eq!(CleanFormatter::new().format_page(&empty), "");
    }

    #[test]
    fn test_clean_leading_punctuation() {
        let sentence = Sentence::new(
            1,
            vec![Token::new("«", POS_PUNCT, "«"), Token::new("Ave", "INT", "ave")],
        );
        assert_eq!(CleanFormatter::new().format_sentence(&sentence), "« Ave");
    }

    #[test]
    fn test_diplomatic() {
        assert_eq!(
            DiplomaticFormatter::new().format_page(&page()),
            "Dominus(NOM→dominus) dicit(VER→dico). Amen(INT→amen)!"
        );
    }

    #[test]
    fn test_annotated() {
        let text = AnnotatedFormatter::new().format_page(&page());
        assert!(text.starts_with("<s>\nDominus\tNOM\tdominus"));
        assert!(!text.contains("<doc"));
        assert_eq!(AnnotatedFormatter::new().extension(), ".tsv");
    }

    #[test]
    fn test_scholarly_header() {
        let text = ScholarlyFormatter::new().format_page(&page());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert_eq!(lines[1], "PAGE 79");
        assert_eq!(lines[2], "Source: scans/0109.xml");
        assert_eq!(lines[3], "Image: 0109.jpg");
        assert_eq!(lines[4], "Titre courant: DISTINCTIO OCTOGESIMA");
        assert_eq!(lines[5], "Œuvre: Summa");
        assert_eq!(lines[6], "Auteur: Anonyme");
        assert_eq!(lines[7], "Shelf Mark: Lat. 3881");
        assert_eq!(lines[8], "=".repeat(80));
        assert_eq!(lines[9], "Dominus dicit. Amen!");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_scholarly_header_brackets_ambiguous_keys() {
        assert_eq!(corpus_field_line("shelf_mark", "Lat. 3881"), "Shelf Mark: Lat. 3881");
        assert_eq!(corpus_field_line("image", "scan7"), "[image]: scan7");
        assert_eq!(corpus_field_line("titre_courant", "X"), "[titre_courant]: X");
        assert_eq!(corpus_field_line("auteur", "Y"), "[auteur]: Y");
        assert_eq!(corpus_field_line("dc:title", "Z"), "[dc:title]: Z");
        assert_eq!(corpus_field_line("Folio_Range", "1-4"), "[Folio_Range]: 1-4");
    }

    #[test]
    fn test_scholarly_empty_page_keeps_header() {
        let empty = AnnotatedPage::empty(PageMetadata::new("0003.xml", 3));
        let text = ScholarlyFormatter::new().format_page(&empty);
        assert!(text.starts_with(&"=".repeat(80)));
        assert!(text.contains("PAGE 3"));
        assert!(!text.contains("Titre courant"));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("aa bb cc", 5), "aa bb\ncc");
        assert_eq!(wrap_text("a verylongword b", 4), "a\nverylongword\nb");
        assert_eq!(wrap_text("", 10), "");
        for line in wrap_text(&"verbum ".repeat(40), 80).lines() {
            assert!(line.chars().count() <= 80);
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("Scholarly".parse::<ExportFormat>().unwrap(), ExportFormat::Scholarly);
        assert!(matches!("pdf".parse::<ExportFormat>(), Err(Error::UnknownFormat(_))));
        assert_eq!(ExportFormat::Diplomatic.to_string(), "diplomatic");
    }

    #[test]
    fn test_factory() {
        for format in ExportFormat::ALL {
            let f = formatter(format, 80);
            assert!(f.extension().ends_with("txt") || f.extension() == ".tsv");
        }
        assert_eq!(formatter(ExportFormat::Vertical, 80).extension(), ".vertical.txt");
    }
}
