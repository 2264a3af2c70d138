use std::fs;

use syncf_core::{Decision, Matcher, PatternError, RuleSet, SkipReason, SyncConfig};

#[test]
fn test_pattern_file_round_trip() {
    let temp = tempfile::TempDir::new().unwrap();
    let pattern_file = temp.path().join("files.txt");
    fs::write(&pattern_file, "# sources\n*.py\n!test_*.py\n\ndocs/\n").unwrap();

    let set = RuleSet::from_file(&pattern_file).unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.has_includes());

    let matcher = Matcher::compile(&set).unwrap();
    assert!(matcher.matches("pkg/a.py", false));
    assert!(!matcher.matches("pkg/test_a.py", false));
    assert!(matcher.matches("docs/guide.md", false));
}

#[test]
fn test_missing_pattern_file() {
    let err = RuleSet::from_file("/definitely/not/here.txt").unwrap_err();
    assert!(matches!(err, PatternError::Io { .. }));
}

#[test]
fn test_spec_inclusion_scenario() {
    // [*.py, !test_*.py] over {a.py, test_a.py, b.txt} selects only a.py.
    let matcher = Matcher::compile(&RuleSet::parse("*.py\n!test_*.py")).unwrap();

    let candidates = ["a.py", "test_a.py", "b.txt"];
    let selected: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|p| matcher.matches(*p, false))
        .collect();
    assert_eq!(selected, ["a.py"]);
}

#[test]
fn test_decision_primitive_matches_predicate() {
    let matcher = Matcher::compile(&RuleSet::parse("src/\n!src/gen/")).unwrap();

    assert_eq!(matcher.decision("src", true), Some(Decision::Include));
    assert_eq!(matcher.decision("src/gen", true), Some(Decision::Exclude));
    assert!(matcher.prunes("src/gen"));
    assert!(!matcher.matches("src/gen/out.rs", false));
    assert!(matcher.matches("src/lib.rs", false));
}

#[test]
fn test_config_defaults() {
    let config = SyncConfig::new(".", ".files");
    assert!(config.follow_symlinks);
    assert_eq!(config.compression_level, 6);
    assert!(!config.verbose);
}

#[test]
fn test_skip_reason_serialization() {
    let json = serde_json::to_string(&SkipReason::PathTraversal).unwrap();
    assert_eq!(json, "\"path-traversal\"");
}
