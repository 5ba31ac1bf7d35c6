//! Rejoining words broken across lines
//!
//! Manuscripts and their transcriptions mark a word split at the end of a
//! line with a hyphen-like sign:
//!
//! ```text
//! Dominus enim consti-        Dominus enim constitutio
//! tutio est magna.      ->    est magna.
//! ```

/// Signs that mark a line-final word break
pub const HYPHEN_MARKERS: [char; 4] = ['-', '\u{2E17}', '\u{00AC}', '='];

/// Merged lines and the number of breaks joined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Lines after merging
    pub lines: Vec<String>,
    /// Number of line breaks removed
    pub merged: usize,
}

/// Joins line-final word breaks in a single forward pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyphenMerger {
    markers: Vec<char>,
}

impl Default for HyphenMerger {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl HyphenMerger {
    /// Create a merger recognizing [`HYPHEN_MARKERS`]
    #[inline]
    #[must_use = "creates a hyphen merger"]
    pub fn new() -> Self {
        Self {
            markers: HYPHEN_MARKERS.to_vec(),
        }
    }

    /// Create a merger recognizing other break signs
    #[inline]
    #[must_use = "creates a hyphen merger"]
    pub fn with_markers(markers: impl Into<Vec<char>>) -> Self {
        Self {
            markers: markers.into(),
        }
    }

    /// True when `line` ends with a break sign (trailing whitespace ignored)
    #[must_use]
    pub fn is_hyphenated(&self, line: &str) -> bool {
        self.strip_marker(line.trim_end()).is_some()
    }

    fn strip_marker<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.strip_suffix(|c: char| self.markers.contains(&c))
    }

    /// Merge broken words
    ///
    /// A carried fragment is glued to the start of the next non-blank line,
    /// and the result is checked again, so a word broken over several lines
    /// comes out whole. Blank lines are kept as they are and do not drop the
    /// carried fragment. A fragment still carried at the end is emitted as a
    /// line of its own.
    #[must_use]
    pub fn merge_lines<S: AsRef<str>>(&self, lines: &[S]) -> MergeOutcome {
        let mut out = Vec::with_capacity(lines.len());
        let mut carry: Option<String> = None;
        let mut merged = 0;

        for raw in lines {
            let raw = raw.as_ref();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                out.push(raw.to_string());
                continue;
            }

            let line = match carry.take() {
                Some(prefix) => {
                    merged += 1;
                    format!("{prefix}{trimmed}")
                }
                None => trimmed.to_string(),
            };

            match self.strip_marker(&line) {
                Some(prefix) => carry = Some(prefix.to_string()),
                None => out.push(line),
            }
        }

        if let Some(rest) = carry {
            out.push(rest);
        }
        if merged > 0 {
            log::debug!("Merged {merged} hyphenated line breaks");
        }
        MergeOutcome { lines: out, merged }
    }

    /// Merge broken words, discarding the count
    #[must_use]
    pub fn merge<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        self.merge_lines(lines).lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_break() {
        let outcome = HyphenMerger::new().merge_lines(&["Dominus enim consti-", "tutio est magna."]);
        assert_eq!(outcome.lines, ["Dominus enim constitutio est magna."]);
        assert_eq!(outcome.merged, 1);
    }

    #[test]
    fn test_every_marker() {
        for marker in HYPHEN_MARKERS {
            let first = format!("consti{marker}  ");
            let merged = HyphenMerger::new().merge(&[first.as_str(), "tutio"]);
            assert_eq!(merged, ["constitutio"], "marker {marker:?}");
        }
    }

    #[test]
    fn test_chain_over_three_lines() {
        let outcome = HyphenMerger::new().merge_lines(&["in-", "ter-", "pretatio est"]);
        assert_eq!(outcome.lines, ["interpretatio est"]);
        assert_eq!(outcome.merged, 2);
    }

    #[test]
    fn test_chain_over_five_lines() {
        let outcome = HyphenMerger::new().merge_lines(&["Dominus in-", "ter-", "pre-", "ta-", "tio est"]);
        assert_eq!(outcome.lines, ["Dominus interpretatio est"]);
        assert_eq!(outcome.merged, 4);
    }

    #[test]
    fn test_chain_ending_on_last_line() {
        let outcome = HyphenMerger::new().merge_lines(&["prima", "in-", "ter-"]);
        assert_eq!(outcome.lines, ["prima", "inter"]);
        assert_eq!(outcome.merged, 1);
    }

    #[test]
    fn test_blank_line_keeps_carry() {
        let merged = HyphenMerger::new().merge(&["consti-", "", "tutio"]);
        assert_eq!(merged, ["", "constitutio"]);
    }

    #[test]
    fn test_trailing_carry_is_emitted() {
        let merged = HyphenMerger::new().merge(&["prima linea", "consti-"]);
        assert_eq!(merged, ["prima linea", "consti"]);
    }

    #[test]
    fn test_mid_line_hyphen_is_kept() {
        let merged = HyphenMerger::new().merge(&["Jean-Baptiste dixit", "ecce"]);
        assert_eq!(merged, ["Jean-Baptiste dixit", "ecce"]);
    }

    #[test]
    fn test_lines_are_trimmed() {
        let merged = HyphenMerger::new().merge(&["  Deus  ", "\t"]);
        assert_eq!(merged, ["Deus", "\t"]);
    }

    #[test]
    fn test_is_hyphenated() {
        let merger = HyphenMerger::new();
        assert!(merger.is_hyphenated("consti¬ "));
        assert!(!merger.is_hyphenated("constitutio"));
        assert!(!HyphenMerger::with_markers(['~']).is_hyphenated("consti-"));
    }
}
