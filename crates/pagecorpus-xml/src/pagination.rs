//! Page numbering
//!
//! Page numbers come from the numbering zone, from digits in the file name,
//! or from the file's position in the folder, depending on
//! [`PageNumberSource`] and on what is available.

use pagecorpus_core::{PageNumberSource, PaginationConfig};
use regex::Regex;
use std::sync::LazyLock;

/// File name patterns, tried in order
static FILENAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+)\.xml$",
        r"(?i)(\d+)_\d+\.xml$",
        r"(?i)page[_-]?(\d+)",
        r"(?i)folio[_-]?(\d+)",
        r"(?i)f[_-]?(\d+)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("regex is compile-time constant"))
    .collect()
});

/// Page number found in a file name
///
/// Trailing digits before `.xml` first, then digits after a `page`, `folio`
/// or `f` prefix (optionally followed by `_` or `-`).
#[must_use]
pub fn page_number_from_filename(file_name: &str) -> Option<i64> {
    FILENAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(file_name))
        .and_then(|caps| caps[1].parse().ok())
}

/// Where a page number came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberOrigin {
    /// Numbering zone
    Zone,
    /// File name digits
    Filename,
    /// Position of the file in the folder
    Position,
}

/// A resolved page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageNumber {
    pub value: i64,
    pub origin: NumberOrigin,
}

/// Assigns page numbers to files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    /// Create a paginator
    #[inline]
    #[must_use = "creates a paginator"]
    pub const fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Number of the file at `index` (0-based, lexical order)
    #[must_use]
    pub fn resolve(&self, file_name: &str, index: usize, zone_number: Option<i64>) -> PageNumber {
        if self.config.page_number_source == PageNumberSource::Zone {
            if let Some(value) = zone_number {
                return PageNumber {
                    value,
                    origin: NumberOrigin::Zone,
                };
            }
        }
        if let Some(value) = page_number_from_filename(file_name) {
            return PageNumber {
                value,
                origin: NumberOrigin::Filename,
            };
        }
        PageNumber {
            value: self.position_number(index, 1),
            origin: NumberOrigin::Position,
        }
    }

    /// Numbers of the two column pages of the file at `index`
    ///
    /// Positional numbering reserves two numbers per file; a found number
    /// `n` gives `n` and `n + 1`.
    #[must_use]
    pub fn resolve_columns(&self, file_name: &str, index: usize, zone_number: Option<i64>) -> [i64; 2] {
        let number = self.resolve(file_name, index, zone_number);
        let first = match number.origin {
            NumberOrigin::Position => self.position_number(index, 2),
            NumberOrigin::Zone | NumberOrigin::Filename => number.value,
        };
        [first, first.saturating_add(1)]
    }

    fn position_number(&self, index: usize, pages_per_file: i64) -> i64 {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.config
            .starting_page_number
            .saturating_add(index.saturating_mul(pages_per_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_patterns() {
        assert_eq!(page_number_from_filename("0042.xml"), Some(42));
        assert_eq!(page_number_from_filename("ms_Lat3881_0109.XML"), Some(109));
        assert_eq!(page_number_from_filename("page_7.png.txt"), Some(7));
        assert_eq!(page_number_from_filename("Folio-12r.xml"), Some(12));
        assert_eq!(page_number_from_filename("f3v.xml"), Some(3));
        assert_eq!(page_number_from_filename("recto.xml"), None);
    }

    #[test]
    fn test_resolution_order() {
        let by_filename = Paginator::new(PaginationConfig::default());
        assert_eq!(by_filename.resolve("0042.xml", 0, Some(7)).value, 42);
        assert_eq!(
            by_filename.resolve("recto.xml", 3, Some(7)),
            PageNumber {
                value: 4,
                origin: NumberOrigin::Position
            }
        );

        let by_zone = Paginator::new(PaginationConfig {
            starting_page_number: 1,
            page_number_source: PageNumberSource::Zone,
        });
        assert_eq!(by_zone.resolve("0042.xml", 0, Some(7)).origin, NumberOrigin::Zone);
        assert_eq!(by_zone.resolve("0042.xml", 0, None).value, 42);
    }

    #[test]
    fn test_column_numbers() {
        let paginator = Paginator::new(PaginationConfig {
            starting_page_number: 10,
            page_number_source: PageNumberSource::Filename,
        });
        assert_eq!(paginator.resolve_columns("recto.xml", 0, None), [10, 11]);
        assert_eq!(paginator.resolve_columns("verso.xml", 1, None), [12, 13]);
        assert_eq!(paginator.resolve_columns("0042.xml", 5, None), [42, 43]);
    }
}
