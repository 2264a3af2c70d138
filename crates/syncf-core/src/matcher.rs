//! Compiled rule matching.
//!
//! A [`Matcher`] holds one compiled glob per rule and evaluates them by a
//! plain ordered scan: the *last* rule matching a path decides whether it is
//! included. The default for any path is excluded, because a rule set is an
//! inclusion filter (the inverse of the usual ignore-file convention).
//! Directory decisions are inherited: a positive match on a directory pulls
//! in its subtree, while an excluded directory short-circuits its subtree
//! entirely, so negations inside it are never consulted.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::error::PatternError;
use crate::rule::{Rule, RuleSet};

/// What the last matching rule said about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A positive rule matched last.
    Include,
    /// A negated rule matched last.
    Exclude,
}

/// A rule with its compiled glob.
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: Rule,
    glob: GlobMatcher,
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Result<Self, PatternError> {
        // An unanchored pattern matches its basename at any depth; a leading
        // `**/` component matches zero or more directories in globset.
        let source = if rule.anchored {
            rule.pattern.clone()
        } else {
            format!("**/{}", rule.pattern)
        };

        let glob = GlobBuilder::new(&source)
            .literal_separator(true)
            .build()
            .map_err(|e| PatternError::InvalidPattern {
                line: rule.line,
                pattern: rule.raw.clone(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            rule: rule.clone(),
            glob,
        })
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        if self.rule.directory_only && !is_dir {
            return false;
        }
        self.glob.is_match(path)
    }
}

/// Compiled matching predicate over relative paths.
#[derive(Debug, Clone)]
pub struct Matcher {
    rules: Vec<CompiledRule>,
}

impl Matcher {
    /// Compile a rule set. Fails fast on the first malformed pattern with
    /// its line number; nothing fails later at match time.
    pub fn compile(set: &RuleSet) -> Result<Self, PatternError> {
        let rules = set
            .rules()
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Last-matching-rule verdict for a single path, without ancestor
    /// context. `None` means no rule matched.
    pub fn decision(&self, path: impl AsRef<Path>, is_dir: bool) -> Option<Decision> {
        let path = path.as_ref();
        let mut last = None;
        for compiled in &self.rules {
            if compiled.matches(path, is_dir) {
                last = Some(if compiled.rule.negated {
                    Decision::Exclude
                } else {
                    Decision::Include
                });
            }
        }
        last
    }

    /// True when a directory at this relative path is explicitly excluded.
    /// The selector uses this to prune whole subtrees before descending.
    pub fn prunes(&self, dir_path: impl AsRef<Path>) -> bool {
        self.decision(dir_path, true) == Some(Decision::Exclude)
    }

    /// Full verdict for a relative path, including inherited directory
    /// decisions. An excluded ancestor wins over anything below it; an
    /// included ancestor covers entries no rule names directly.
    pub fn matches(&self, path: impl AsRef<Path>, is_dir: bool) -> bool {
        let path = path.as_ref();

        let mut inherited = false;
        for ancestor in ancestors_top_down(path) {
            match self.decision(&ancestor, true) {
                Some(Decision::Exclude) => return false,
                Some(Decision::Include) => inherited = true,
                None => {}
            }
        }

        match self.decision(path, is_dir) {
            Some(Decision::Include) => true,
            Some(Decision::Exclude) => false,
            None => inherited,
        }
    }
}

/// Proper ancestors of a relative path, shallowest first, root excluded.
fn ancestors_top_down(path: &Path) -> Vec<PathBuf> {
    let mut prefixes = Vec::new();
    let mut current = PathBuf::new();
    let components: Vec<_> = path.components().collect();
    if components.len() < 2 {
        return prefixes;
    }
    for component in &components[..components.len() - 1] {
        current.push(component);
        prefixes.push(current.clone());
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(text: &str) -> Matcher {
        Matcher::compile(&RuleSet::parse(text)).unwrap()
    }

    #[test]
    fn test_basename_at_any_depth() {
        let m = matcher("*.py");
        assert!(m.matches("a.py", false));
        assert!(m.matches("deep/nested/b.py", false));
        assert!(!m.matches("a.txt", false));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let m = matcher("src/*.rs");
        assert!(m.matches("src/lib.rs", false));
        assert!(!m.matches("src/sub/lib.rs", false));
    }

    #[test]
    fn test_double_star_crosses() {
        let m = matcher("src/**/*.rs");
        assert!(m.matches("src/a/b/lib.rs", false));
        assert!(m.matches("src/lib.rs", false));
    }

    #[test]
    fn test_last_rule_wins() {
        let m = matcher("*.py\n!test_*.py");
        assert!(m.matches("a.py", false));
        assert!(!m.matches("test_a.py", false));
        assert!(!m.matches("b.txt", false));
    }

    #[test]
    fn test_reinclude_after_exclusion() {
        let m = matcher("*.py\n!test_*.py\ntest_keep.py");
        assert!(!m.matches("test_a.py", false));
        assert!(m.matches("test_keep.py", false));
    }

    #[test]
    fn test_directory_include_covers_subtree() {
        let m = matcher("docs/");
        assert!(m.matches("docs", true));
        assert!(m.matches("docs/guide/intro.md", false));
        assert!(!m.matches("src/lib.rs", false));
    }

    #[test]
    fn test_directory_exclusion_short_circuits() {
        // The later re-include never applies inside the excluded subtree.
        let m = matcher("**\n!vendor/\nvendor/keep.txt");
        assert!(m.matches("src/main.rs", false));
        assert!(m.prunes("vendor"));
        assert!(!m.matches("vendor/keep.txt", false));
    }

    #[test]
    fn test_directory_only_does_not_match_files() {
        let m = matcher("build/");
        assert!(!m.matches("build", false));
        assert!(m.matches("build", true));
    }

    #[test]
    fn test_anchored_vs_floating() {
        let m = matcher("/README.md");
        assert!(m.matches("README.md", false));
        assert!(!m.matches("sub/README.md", false));

        let m = matcher("README.md");
        assert!(m.matches("sub/README.md", false));
    }

    #[test]
    fn test_character_class() {
        let m = matcher("file[0-9].txt");
        assert!(m.matches("file3.txt", false));
        assert!(!m.matches("filex.txt", false));
    }

    #[test]
    fn test_unbalanced_bracket_fails_at_compile() {
        let set = RuleSet::parse("ok.txt\n[broken");
        let err = Matcher::compile(&set).unwrap_err();
        match err {
            PatternError::InvalidPattern { line, pattern, .. } => {
                assert_eq!(line, 2);
                assert_eq!(pattern, "[broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let set = RuleSet::parse("*.py\n!test_*.py\ndocs/\n");
        let a = Matcher::compile(&set).unwrap();
        let b = Matcher::compile(&set).unwrap();
        for (path, is_dir) in [
            ("a.py", false),
            ("test_a.py", false),
            ("docs/x.md", false),
            ("docs", true),
            ("other", true),
        ] {
            assert_eq!(a.matches(path, is_dir), b.matches(path, is_dir));
            assert_eq!(a.decision(path, is_dir), b.decision(path, is_dir));
        }
    }

    #[test]
    fn test_default_is_excluded() {
        let m = matcher("*.py");
        assert!(!m.matches("unrelated.txt", false));
        assert!(!m.matches("dir", true));
    }
}
