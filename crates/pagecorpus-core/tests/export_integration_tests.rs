//! Folder export and scholarly re-ingestion tests

use pagecorpus_core::export::{
    CorpusStats, PagesIndex, COMBINED_FILE_NAME, CORPUS_STATS_FILE_NAME, IMAGES_MAPPING_FILE_NAME,
    PAGES_INDEX_FILE_NAME,
};
use pagecorpus_core::{
    AnnotatedPage, ExportConfig, ExportFormat, JsonSerializer, PageMetadata, ScholarlyParser,
    Sentence, TextExporter, Token, VerticalFormatter,
};
use std::collections::BTreeMap;
use std::fs;

fn corpus_metadata() -> BTreeMap<String, String> {
    [("author", "Anonyme"), ("title", "Summa"), ("shelfmark", "Lat. 3881")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn pages() -> Vec<AnnotatedPage> {
    let words = "Ad hoc dicendum quod sacerdos in lectoratu erit et sequenti quinquennio";
    let mut tokens: Vec<Token> = words.split(' ').map(Token::passthrough).collect();
    tokens.push(Token::new(".", "PUNCT", "."));
    vec![
        AnnotatedPage::new(
            PageMetadata::new("0109.xml", 79)
                .with_running_title("DISTINCTIO OCTOGESIMA")
                .with_corpus_metadata(corpus_metadata()),
            vec![Sentence::new(1, tokens)],
        ),
        AnnotatedPage::empty(PageMetadata::new("0110.xml", 80).with_corpus_metadata(corpus_metadata())),
    ]
}

#[test]
fn test_clean_export_writes_pages_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let report = TextExporter::default().export_pages(&pages(), dir.path()).unwrap();

    assert_eq!(report.exported_count(), 2);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.pages[0].output_file.as_deref(), Some("page_0079_0109.txt"));
    assert_eq!(report.index_files.len(), 3);

    let first = fs::read_to_string(dir.path().join("page_0079_0109.txt")).unwrap();
    assert!(first.ends_with("quinquennio."));
    let empty = fs::read_to_string(dir.path().join("page_0080_0110.txt")).unwrap();
    assert!(empty.is_empty());

    // Empty page texts are left out of the combined file
    let combined = fs::read_to_string(dir.path().join(COMBINED_FILE_NAME)).unwrap();
    assert_eq!(combined, first);

    let index: PagesIndex = JsonSerializer::load(&dir.path().join(PAGES_INDEX_FILE_NAME)).unwrap();
    assert_eq!(index.total_pages, 2);
    assert!(index.pages[1].is_empty);
    assert_eq!(index.pages[0].token_count, 12);
    assert_eq!(index.pages[0].corpus_metadata["author"], "Anonyme");

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(PAGES_INDEX_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(raw["pages"][0]["shelfmark"], "Lat. 3881");

    let mapping = fs::read_to_string(dir.path().join(IMAGES_MAPPING_FILE_NAME)).unwrap();
    assert!(mapping.contains("0109.jpg\t→\tpage_0079_0109.txt"));

    let stats: CorpusStats = JsonSerializer::load(&dir.path().join(CORPUS_STATS_FILE_NAME)).unwrap();
    assert_eq!(stats.corpus_statistics.empty_pages, 1);
}

#[test]
fn test_export_without_index_or_combined() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        format: ExportFormat::Annotated,
        generate_index: false,
        generate_combined: false,
        page_filename_pattern: "{folio}.tsv".to_string(),
        ..ExportConfig::default()
    };
    let report = TextExporter::new(config).export_pages(&pages(), dir.path()).unwrap();
    assert!(report.index_files.is_empty());
    assert!(report.combined_file.is_none());
    assert!(dir.path().join("0109.tsv").exists());
    assert!(!dir.path().join(COMBINED_FILE_NAME).exists());
}

#[test]
fn test_scholarly_folder_export_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        format: ExportFormat::Scholarly,
        line_width: 30,
        ..ExportConfig::default()
    };
    TextExporter::new(config).export_pages(&pages(), dir.path()).unwrap();

    let batch = ScholarlyParser::new().parse_folder(dir.path(), "txt").unwrap();
    assert_eq!(batch.failed_count(), 0);
    assert_eq!(batch.pages.len(), 2);

    let first = &batch.pages[0];
    assert_eq!(first.metadata.folio, "0109.xml");
    assert_eq!(first.metadata.page_number, 79);
    assert_eq!(first.metadata.running_title, "DISTINCTIO OCTOGESIMA");
    assert_eq!(first.metadata.corpus_metadata, corpus_metadata());
    assert_eq!(
        first.lines,
        ["Ad hoc dicendum quod sacerdos in lectoratu erit et sequenti quinquennio."]
    );

    // The empty page survives with its metadata
    assert!(batch.pages[1].is_empty());
    assert_eq!(batch.pages[1].metadata.page_number, 80);

    let combined = ScholarlyParser::new()
        .parse_combined_file(&dir.path().join(COMBINED_FILE_NAME))
        .unwrap();
    assert_eq!(combined.pages, batch.pages);
}

#[test]
fn test_export_from_vertical_file() {
    let dir = tempfile::tempdir().unwrap();
    let vertical = dir.path().join("corpus.vertical.txt");
    VerticalFormatter::new().write_file(&pages(), &vertical).unwrap();

    let out = dir.path().join("out");
    let report = TextExporter::default().export_vertical_file(&vertical, &out).unwrap();
    assert_eq!(report.exported_count(), 2);
    assert!(out.join("page_0079_0109.txt").exists());
}
