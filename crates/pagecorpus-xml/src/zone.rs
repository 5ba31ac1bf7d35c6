//! PAGE zone classification
//!
//! Every `TextRegion` carries its zone type in the `custom` attribute:
//!
//! ```text
//! <TextRegion custom="structure {type:MainZone:column#1;}">
//! ```
//!
//! [`ZoneParser`] reads each region's lines and files the region under a
//! [`ZoneRole`] according to the configured zone type names.

use crate::error::Result;
use crate::namespace::{find_children, find_descendants, find_first, text_content, Namespace};
use pagecorpus_core::{ColumnMode, ExtractionConfig};
use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Zone type of regions without a `type:` entry
pub const UNKNOWN_ZONE_TYPE: &str = "Unknown";

static RE_ZONE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"type:([^;}\s:]+)").expect("regex is compile-time constant"));
static RE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"column#(\d+)").expect("regex is compile-time constant"));
static RE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("regex is compile-time constant"));

/// Role of a zone on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneRole {
    /// Main text
    Main,
    /// Running title
    RunningTitle,
    /// Page numbering
    Numbering,
    /// Any other zone type (margins, drop capitals, ...)
    Other,
}

/// Text of one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneContent {
    /// Zone type from the `custom` attribute
    pub zone_type: String,
    /// Non-empty trimmed lines in document order
    pub lines: Vec<String>,
    /// Lines joined with newlines
    pub raw_text: String,
    /// `column#N` from the `custom` attribute
    pub column_id: Option<u32>,
}

impl ZoneContent {
    /// Create a zone from its lines
    #[must_use = "creates zone content"]
    pub fn new(zone_type: impl Into<String>, lines: Vec<String>, column_id: Option<u32>) -> Self {
        let raw_text = lines.join("\n");
        Self {
            zone_type: zone_type.into(),
            lines,
            raw_text,
            column_id,
        }
    }
}

/// Zones of a page grouped by role, each group in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneMap {
    /// Main text zones
    pub main: Vec<ZoneContent>,
    /// Running title zones
    pub running_title: Vec<ZoneContent>,
    /// Page and folio numbering zones
    pub numbering: Vec<ZoneContent>,
    /// Zones of any other type, and untyped zones
    pub other: Vec<ZoneContent>,
}

impl ZoneMap {
    /// Zones filed under `role`
    #[must_use]
    pub fn get(&self, role: ZoneRole) -> &[ZoneContent] {
        match role {
            ZoneRole::Main => &self.main,
            ZoneRole::RunningTitle => &self.running_title,
            ZoneRole::Numbering => &self.numbering,
            ZoneRole::Other => &self.other,
        }
    }

    fn push(&mut self, role: ZoneRole, zone: ZoneContent) {
        match role {
            ZoneRole::Main => self.main.push(zone),
            ZoneRole::RunningTitle => self.running_title.push(zone),
            ZoneRole::Numbering => self.numbering.push(zone),
            ZoneRole::Other => self.other.push(zone),
        }
    }

    /// Main-zone content grouped by column
    ///
    /// Single mode gives one group with every main line. Dual mode always
    /// gives two groups: column 1 (also regions without a column, or column
    /// 0) and column 2 (every column id of 2 or more).
    #[must_use]
    pub fn main_columns(&self, mode: ColumnMode) -> Vec<ZoneContent> {
        let zone_type = self
            .main
            .first()
            .map_or_else(String::new, |z| z.zone_type.clone());
        let lines_where = |keep: &dyn Fn(Option<u32>) -> bool| -> Vec<String> {
            self.main
                .iter()
                .filter(|z| keep(z.column_id))
                .flat_map(|z| z.lines.iter().cloned())
                .collect()
        };

        match mode {
            ColumnMode::Single => vec![ZoneContent::new(zone_type, lines_where(&|_| true), None)],
            ColumnMode::Dual => {
                let first = lines_where(&|c| c.map_or(true, |n| n < 2));
                let second = lines_where(&|c| c.is_some_and(|n| n >= 2));
                vec![
                    ZoneContent::new(zone_type.clone(), first, Some(1)),
                    ZoneContent::new(zone_type, second, Some(2)),
                ]
            }
        }
    }

    /// Main lines, columns concatenated
    #[must_use]
    pub fn main_lines(&self, mode: ColumnMode) -> Vec<String> {
        self.main_columns(mode)
            .into_iter()
            .flat_map(|z| z.lines)
            .collect()
    }

    /// First running-title zone text, else `default`
    #[must_use]
    pub fn running_title(&self, default: &str) -> String {
        self.running_title
            .first()
            .map_or_else(|| default.to_string(), |z| z.raw_text.clone())
    }

    /// First integer of the first numbering zone
    #[must_use]
    pub fn page_number(&self) -> Option<i64> {
        let zone = self.numbering.first()?;
        RE_DIGITS
            .find(&zone.raw_text)
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Zone type names for each role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneTypes {
    pub main: String,
    pub running_title: String,
    pub numbering: String,
}

impl Default for ZoneTypes {
    #[inline]
    fn default() -> Self {
        Self {
            main: "MainZone".to_string(),
            running_title: "RunningTitleZone".to_string(),
            numbering: "NumberingZone".to_string(),
        }
    }
}

/// Parses PAGE documents into [`ZoneMap`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneParser {
    types: ZoneTypes,
}

impl ZoneParser {
    /// Create a parser with the default zone type names
    #[inline]
    #[must_use = "creates a zone parser"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom zone type names
    #[inline]
    #[must_use = "creates a zone parser"]
    pub const fn with_zone_types(types: ZoneTypes) -> Self {
        Self { types }
    }

    /// Create a parser from the extraction settings
    #[must_use = "creates a zone parser"]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::with_zone_types(ZoneTypes {
            main: config.main_zone_type.clone(),
            running_title: config.running_title_zone_type.clone(),
            numbering: config.numbering_zone_type.clone(),
        })
    }

    /// Role of a zone type name
    #[must_use]
    pub fn role_of(&self, zone_type: &str) -> ZoneRole {
        if zone_type == self.types.main {
            ZoneRole::Main
        } else if zone_type == self.types.running_title {
            ZoneRole::RunningTitle
        } else if zone_type == self.types.numbering {
            ZoneRole::Numbering
        } else {
            ZoneRole::Other
        }
    }

    /// Classify every region of a document
    #[must_use]
    pub fn parse_document(&self, doc: &Document<'_>) -> ZoneMap {
        let ns = Namespace::detect(doc);
        let mut zones = ZoneMap::default();
        for region in find_descendants(doc.root_element(), "TextRegion", &ns) {
            let (zone_type, column_id) = parse_custom(region.attribute("custom").unwrap_or_default());
            let lines = region_lines(region, &ns);
            if lines.is_empty() {
                continue;
            }
            let role = self.role_of(&zone_type);
            zones.push(role, ZoneContent::new(zone_type, lines, column_id));
        }
        log::trace!(
            "Zones: {} main, {} running title, {} numbering, {} other",
            zones.main.len(),
            zones.running_title.len(),
            zones.numbering.len(),
            zones.other.len()
        );
        zones
    }

    /// Parse XML text
    ///
    /// # Errors
    ///
    /// Returns [`crate::XmlError::Xml`] for malformed XML.
    pub fn parse_str(&self, xml: &str) -> Result<ZoneMap> {
        let doc = parse_xml(xml)?;
        Ok(self.parse_document(&doc))
    }

    /// Parse an XML file
    ///
    /// # Errors
    ///
    /// Returns an I/O error or [`crate::XmlError::Xml`] for malformed XML.
    pub fn parse_file(&self, path: &Path) -> Result<ZoneMap> {
        let xml = fs::read_to_string(path)?;
        self.parse_str(&xml)
    }

    /// Main-zone content grouped by column
    #[must_use]
    pub fn main_columns(&self, doc: &Document<'_>, mode: ColumnMode) -> Vec<ZoneContent> {
        self.parse_document(doc).main_columns(mode)
    }

    /// Main-zone lines, columns concatenated
    #[must_use]
    pub fn main_zone_lines(&self, doc: &Document<'_>, mode: ColumnMode) -> Vec<String> {
        self.parse_document(doc).main_lines(mode)
    }

    /// Running title, else `default`
    #[must_use]
    pub fn running_title(&self, doc: &Document<'_>, default: &str) -> String {
        self.parse_document(doc).running_title(default)
    }

    /// First integer in the first numbering zone
    #[must_use]
    pub fn page_number_from_zone(&self, doc: &Document<'_>) -> Option<i64> {
        self.parse_document(doc).page_number()
    }
}

/// Parse a PAGE document, DTDs allowed
///
/// # Errors
///
/// Returns [`crate::XmlError::Xml`] for malformed XML.
pub fn parse_xml(xml: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(xml, options)?)
}

/// Zone type and column id from a `custom` attribute
#[must_use]
pub fn parse_custom(custom: &str) -> (String, Option<u32>) {
    let zone_type = RE_ZONE_TYPE
        .captures(custom)
        .map_or_else(|| UNKNOWN_ZONE_TYPE.to_string(), |c| c[1].to_string());
    let column_id = RE_COLUMN.captures(custom).and_then(|c| c[1].parse().ok());
    (zone_type, column_id)
}

/// Lines of a region; regions without `TextLine` fall back to their own text
fn region_lines(region: Node<'_, '_>, ns: &Namespace) -> Vec<String> {
    let lines: Vec<String> = find_descendants(region, "TextLine", ns)
        .into_iter()
        .filter_map(|line| unicode_text(line, ns))
        .collect();
    if !lines.is_empty() {
        return lines;
    }
    unicode_text(region, ns).into_iter().collect()
}

/// `TextEquiv/Unicode` directly under `node`, else any descendant `Unicode`;
/// trimmed, `None` when empty
fn unicode_text(node: Node<'_, '_>, ns: &Namespace) -> Option<String> {
    let direct = find_children(node, "TextEquiv", ns)
        .into_iter()
        .find_map(|equiv| find_children(equiv, "Unicode", ns).into_iter().next());
    let unicode = direct.or_else(|| find_first(node, "Unicode", ns))?;
    let text = text_content(unicode).trim().to_string();
    (!text.is_empty()).then_some(text)
}
