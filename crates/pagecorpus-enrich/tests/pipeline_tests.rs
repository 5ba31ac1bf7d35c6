//! Extraction, enrichment, export and re-enrichment end to end

use pagecorpus_core::export::COMBINED_FILE_NAME;
use pagecorpus_core::{
    AnnotatedPage, EnrichmentConfig, ExportConfig, ExportFormat, PipelineConfig, TextExporter, Token,
    VerticalParser, POS_PUNCT, POS_UNKNOWN,
};
use pagecorpus_enrich::{into_pages, EnrichmentProcessor, PassThroughLemmatizer, ReEnricher};
use pagecorpus_xml::Extractor;
use std::fs;

const PAGE_2019: &str = include_str!("../../pagecorpus-xml/tests/fixtures/page_2019.xml");

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn annotated_fixture() -> Vec<AnnotatedPage> {
    let extracted = Extractor::default().extract_str(PAGE_2019, "0079.xml", 0).unwrap();
    into_pages(EnrichmentProcessor::default().process_pages(&extracted))
}

#[test]
fn test_broken_word_is_annotated_whole() {
    init_logging();
    let xml = r#"<PcGts><Page>
        <TextRegion custom="structure {type:MainZone;}">
          <TextLine><TextEquiv><Unicode>consti-</Unicode></TextEquiv></TextLine>
          <TextLine><TextEquiv><Unicode>tutio est magna.</Unicode></TextEquiv></TextLine>
        </TextRegion>
      </Page></PcGts>"#;
    let extracted = Extractor::default().extract_str(xml, "0001.xml", 0).unwrap();
    let enriched = EnrichmentProcessor::default().process_pages(&extracted);

    assert_eq!(enriched.len(), 1);
    assert_eq!(enriched[0].page.sentences.len(), 1);
    assert_eq!(
        enriched[0].page.sentences[0].tokens,
        [
            Token::new("constitutio", POS_UNKNOWN, "constitutio"),
            Token::new("est", POS_UNKNOWN, "est"),
            Token::new("magna", POS_UNKNOWN, "magna"),
            Token::new(".", POS_PUNCT, "."),
        ]
    );
}

#[test]
fn test_fixture_sentences() {
    let pages = annotated_fixture();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.metadata.page_number, 79);
    assert_eq!(page.metadata.running_title, "DISTINCTIO OCTOGESIMA");
    let texts: Vec<String> = page.sentences.iter().map(|s| s.text(true)).collect();
    assert_eq!(
        texts,
        ["Dominus enim constitutio est magna .", "Quid est ?", "Nihil !"]
    );
    let ids: Vec<usize> = page.sentences.iter().map(|s| s.id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn test_vertical_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.vertical.txt");
    let pages = annotated_fixture();
    EnrichmentProcessor::save_vertical(&pages, &path).unwrap();
    assert_eq!(VerticalParser::new().parse_file(&path).unwrap(), pages);
}

#[test]
fn test_json_checkpoint_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let extracted = Extractor::default().extract_str(PAGE_2019, "0079.xml", 0).unwrap();
    let corpus = dir.path().join("extracted.json");
    Extractor::save_corpus_json(&extracted, &corpus).unwrap();
    let folder = dir.path().join("pages");
    Extractor::save_individual_json(&extracted, &folder).unwrap();

    let processor = EnrichmentProcessor::default();
    let from_file = into_pages(processor.process_json(&corpus).unwrap());
    let from_folder = into_pages(processor.process_json(&folder).unwrap());
    assert_eq!(from_file, annotated_fixture());
    assert_eq!(from_folder, from_file);
    assert!(processor.process_json(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_corrected_export_reenriches_identically() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let pages = annotated_fixture();
    let config = ExportConfig {
        format: ExportFormat::Scholarly,
        ..ExportConfig::default()
    };
    TextExporter::new(config).export_pages(&pages, dir.path()).unwrap();

    let reenricher = ReEnricher::default();
    let from_folder = reenricher.reenrich_folder(dir.path()).unwrap();
    assert_eq!(from_folder.failed_count(), 0);
    assert_eq!(from_folder.annotated_pages(), pages);

    let from_combined = reenricher
        .reenrich_combined_file(&dir.path().join(COMBINED_FILE_NAME))
        .unwrap();
    assert_eq!(from_combined.into_corpus().pages, pages);
}

#[test]
fn test_correction_changes_annotation() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        format: ExportFormat::Scholarly,
        ..ExportConfig::default()
    };
    let report = TextExporter::new(config)
        .export_pages(&annotated_fixture(), dir.path())
        .unwrap();
    let page_file = dir.path().join(report.pages[0].output_file.as_deref().unwrap());

    // A corrector splits the first sentence and fixes a word
    let original = fs::read_to_string(&page_file).unwrap();
    fs::write(&page_file, original.replace("est magna.", "est. Magna.")).unwrap();

    let output = dir.path().join("corrected.vertical.txt");
    let reenriched = ReEnricher::default()
        .reenrich_to_vertical(&page_file, &output)
        .unwrap();
    assert_eq!(reenriched.pages.len(), 1);

    let parsed = VerticalParser::new().parse_file(&output).unwrap();
    assert_eq!(parsed, reenriched.annotated_pages());
    let texts: Vec<String> = parsed[0].sentences.iter().map(|s| s.text(true)).collect();
    assert_eq!(
        texts,
        ["Dominus enim constitutio est .", "Magna .", "Quid est ?", "Nihil !"]
    );
}

#[test]
fn test_unreadable_page_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let page_file = dir.path().join("0001.txt");
    fs::write(&page_file, "Dominus est magna.\n").unwrap();

    let output = dir.path().join("corrected.vertical.txt");
    let report = ReEnricher::default()
        .reenrich_to_vertical(&page_file, &output)
        .unwrap();
    assert!(report.pages.is_empty());
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(report.outcomes[0].error.is_some());
    assert!(output.is_file());
    assert!(VerticalParser::new().parse_file(&output).unwrap().is_empty());
}

#[test]
fn test_parallel_enrichment_matches_sequential() {
    let extractor = Extractor::new(&PipelineConfig::default());
    let extracted: Vec<_> = (0..12)
        .flat_map(|i| {
            extractor
                .extract_str(PAGE_2019, &format!("{:04}.xml", 100 - i), i)
                .unwrap()
        })
        .collect();
    let config = EnrichmentConfig {
        parallel: true,
        ..EnrichmentConfig::default()
    };
    let parallel = EnrichmentProcessor::new(&config, PassThroughLemmatizer).process(&extracted);
    let sequential = EnrichmentProcessor::default().process(&extracted);
    assert_eq!(parallel, sequential);
    let numbers: Vec<i64> = parallel.iter().map(|p| p.page.metadata.page_number).collect();
    assert_eq!(numbers, (89..=100).collect::<Vec<i64>>());
}
