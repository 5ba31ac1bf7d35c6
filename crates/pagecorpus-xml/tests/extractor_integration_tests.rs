//! Folder extraction tests

use pagecorpus_core::serializer::JsonSerializer;
use pagecorpus_core::{ColumnMode, CorpusMetadata, PipelineConfig};
use pagecorpus_xml::Extractor;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn copy_fixture(name: &str, dir: &Path, as_name: &str) {
    fs::copy(fixture(name), dir.join(as_name)).unwrap();
}

fn config() -> PipelineConfig {
    PipelineConfig {
        corpus: CorpusMetadata {
            edition_id: "Summa-1".to_string(),
            author: "Anonyme".to_string(),
            ..CorpusMetadata::default()
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn test_extract_folder_sorted_with_errors_recorded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("page_2013.xml", dir.path(), "0012.xml");
    copy_fixture("no_namespace.xml", dir.path(), "0003.XML");
    fs::write(dir.path().join("0007.xml"), "<PcGts><Page>").unwrap();
    fs::write(dir.path().join("notes.txt"), "not xml").unwrap();

    let report = Extractor::new(&config()).extract_folder(dir.path()).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.processed_count(), 2);
    assert_eq!(report.error_count(), 1);
    let failed = report.outcomes.iter().find(|o| !o.success).unwrap();
    assert!(failed.path.ends_with("0007.xml"));
    assert!(failed.message.is_some());

    let numbers: Vec<i64> = report.pages.iter().map(|p| p.metadata.page_number).collect();
    assert_eq!(numbers, [3, 12]);
    let page = &report.pages[0];
    assert_eq!(page.metadata.folio, "0003.XML");
    assert_eq!(page.metadata.corpus_metadata["edition_id"], "Summa-1");
    assert_eq!(page.metadata.corpus_metadata["language"], "Latin");
    assert_eq!(
        page.lines,
        ["Dominus enim constitutio est magna.", "Quid est ? Nihil !"]
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    for (i, name) in ["no_namespace.xml", "page_2013.xml", "page_2019.xml", "page_2010_prefixed.xml"]
        .iter()
        .enumerate()
    {
        copy_fixture(name, dir.path(), &format!("folio_{}.xml", 4 - i));
    }

    let sequential = Extractor::new(&config()).extract_folder(dir.path()).unwrap();
    let mut parallel_config = config();
    parallel_config.extraction.parallel = true;
    let parallel = Extractor::new(&parallel_config).extract_folder(dir.path()).unwrap();

    assert_eq!(sequential, parallel);
    let numbers: Vec<i64> = parallel.pages.iter().map(|p| p.metadata.page_number).collect();
    assert_eq!(numbers, [1, 2, 3, 4]);
}

#[test]
fn test_dual_mode_folder() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("page_2019.xml", dir.path(), "recto.xml");
    copy_fixture("page_2019.xml", dir.path(), "verso.xml");

    let mut config = config();
    config.extraction.column_mode = ColumnMode::Dual;
    config.pagination.starting_page_number = 5;
    let report = Extractor::new(&config).extract_folder(dir.path()).unwrap();

    let numbers: Vec<i64> = report.pages.iter().map(|p| p.metadata.page_number).collect();
    assert_eq!(numbers, [5, 6, 7, 8]);
    assert_eq!(report.pages[0].lines, ["Dominus enim constitutio est magna."]);
    assert_eq!(report.pages[1].lines, ["Quid est ? Nihil !"]);
    assert_eq!(report.pages[1].metadata.corpus_metadata["column"], "2");
    assert_eq!(report.pages[2].metadata.folio, "verso.xml");
}

#[test]
fn test_empty_pages_can_be_dropped() {
    let dir = tempfile::tempdir().unwrap();
    copy_fixture("page_2013.xml", dir.path(), "0001.xml");
    fs::write(dir.path().join("0002.xml"), "<PcGts><Page/></PcGts>").unwrap();

    let kept = Extractor::new(&config()).extract_folder(dir.path()).unwrap();
    assert_eq!(kept.pages.len(), 2);
    assert!(kept.pages[1].is_empty());

    let mut config = config();
    config.extraction.include_empty_pages = false;
    let dropped = Extractor::new(&config).extract_folder(dir.path()).unwrap();
    assert_eq!(dropped.pages.len(), 1);
    assert_eq!(dropped.processed_count(), 2);
}

#[test]
fn test_empty_folder_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let report = Extractor::new(&config()).extract_folder(dir.path()).unwrap();
    assert!(report.is_empty_input());
    assert!(report.pages.is_empty());
}

#[test]
fn test_json_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    copy_fixture("page_2013.xml", &input, "0079.xml");
    let report = Extractor::new(&config()).extract_folder(&input).unwrap();

    let corpus_path = dir.path().join("extracted.json");
    Extractor::save_corpus_json(&report.pages, &corpus_path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&corpus_path).unwrap()).unwrap();
    assert_eq!(raw["pages"][0]["is_empty"], false);
    assert_eq!(raw["pages"][0]["metadata"]["page_number"], 79);
    assert_eq!(JsonSerializer::load_extracted(&corpus_path).unwrap().pages, report.pages);

    let individual = dir.path().join("pages");
    let written = Extractor::save_individual_json(&report.pages, &individual).unwrap();
    assert_eq!(written, [individual.join("0079.json")]);
    assert_eq!(JsonSerializer::load_folder(&individual).unwrap().pages, report.pages);
}
