//! Pattern-file rules.
//!
//! A pattern file is plain text, one rule per line, `#` comments and blank
//! lines skipped. The dialect is the gitignore one (`*`, `**`, `?`, `[...]`),
//! but used as an *inclusion* filter: rules name what goes into a bundle and
//! `!`-prefixed rules carve exclusions out of that set.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// One parsed line of a pattern file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// The raw line as it appeared in the file.
    pub raw: String,
    /// Glob body with `!`, leading `/`, and trailing `/` stripped.
    pub pattern: String,
    /// 1-based line number in the pattern file.
    pub line: usize,
    /// Rule was prefixed with `!`: a match excludes instead of includes.
    pub negated: bool,
    /// Rule had a trailing `/`: it matches directories only.
    pub directory_only: bool,
    /// Rule is tied to a position under the root rather than any depth.
    pub anchored: bool,
}

impl Rule {
    /// Parse a single line. Returns `None` for blank lines and comments.
    pub fn parse(line_text: &str, line: usize) -> Option<Self> {
        let trimmed = line_text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let raw = trimmed.to_string();
        let mut body = trimmed;

        let negated = body.starts_with('!');
        if negated {
            body = &body[1..];
        }

        let directory_only = body.ends_with('/');
        if directory_only {
            body = &body[..body.len() - 1];
        }

        // A leading slash only anchors, it carries no path component.
        let mut anchored = body.starts_with('/');
        if anchored {
            body = &body[1..];
        }
        anchored |= body.contains('/');

        if body.is_empty() {
            return None;
        }

        Some(Self {
            raw,
            pattern: body.to_string(),
            line,
            negated,
            directory_only,
            anchored,
        })
    }
}

/// Ordered sequence of rules; later rules override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse pattern-file text. Blank lines and comments are never stored.
    pub fn parse(text: &str) -> Self {
        let rules = text
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| Rule::parse(line, idx + 1))
            .collect();
        Self { rules }
    }

    /// Read and parse a pattern file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules were parsed.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when at least one non-negated rule exists. A set with only
    /// negations can never include anything under the inclusion-filter
    /// default.
    pub fn has_includes(&self) -> bool {
        self.rules.iter().any(|r| !r.negated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let set = RuleSet::parse("# header\n\n*.py\n  \n!test_*.py\n");
        assert_eq!(set.len(), 2);
        assert_eq!(set.rules()[0].pattern, "*.py");
        assert!(set.rules()[1].negated);
    }

    #[test]
    fn test_parse_directory_only() {
        let rule = Rule::parse("build/", 1).unwrap();
        assert!(rule.directory_only);
        assert!(!rule.anchored);
        assert_eq!(rule.pattern, "build");
    }

    #[test]
    fn test_parse_anchored() {
        let rule = Rule::parse("src/lib.rs", 1).unwrap();
        assert!(rule.anchored);
        assert!(!rule.directory_only);

        let rule = Rule::parse("/Makefile", 2).unwrap();
        assert!(rule.anchored);
        assert_eq!(rule.pattern, "Makefile");

        let rule = Rule::parse("*.log", 3).unwrap();
        assert!(!rule.anchored);
    }

    #[test]
    fn test_parse_negated_directory() {
        let rule = Rule::parse("!target/", 1).unwrap();
        assert!(rule.negated);
        assert!(rule.directory_only);
        assert_eq!(rule.pattern, "target");
    }

    #[test]
    fn test_order_preserved() {
        let set = RuleSet::parse("a\nb\nc\n");
        let names: Vec<_> = set.rules().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_has_includes() {
        assert!(RuleSet::parse("*.py").has_includes());
        assert!(!RuleSet::parse("!*.py").has_includes());
        assert!(!RuleSet::parse("# only comments\n").has_includes());
    }
}
