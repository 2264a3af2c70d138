//! Operation results: selections, bundles, extraction and deletion reports.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Skip;

/// Files chosen under a root, plus what was explicitly skipped on the way.
///
/// `files` holds root-relative paths in the canonical walk order; this is the
/// exact sequence the archive writer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Root the relative paths are resolved against.
    pub root: PathBuf,
    /// Included files, deduplicated, in deterministic walk order.
    pub files: Vec<PathBuf>,
    /// Entries skipped during the walk (unreadable, symlink loop).
    pub skips: Vec<Skip>,
}

impl SelectionResult {
    /// Create a selection result.
    pub fn new(root: impl Into<PathBuf>, files: Vec<PathBuf>, skips: Vec<Skip>) -> Self {
        Self {
            root: root.into(),
            files,
            skips,
        }
    }

    /// Number of selected files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// True when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// One archived, timestamped collection of selected files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Label the bundle was packed under.
    pub label: String,
    /// Creation time, second precision, local time.
    pub timestamp: DateTime<Local>,
    /// File name inside the store: `{label}_{YYYYMMDD_HHMMSS}.tar.gz`.
    pub filename: String,
    /// Absolute path of the bundle file.
    pub path: PathBuf,
    /// Size of the archive on disk.
    pub size_bytes: u64,
    /// Number of files successfully archived (0 when unknown, e.g. listed
    /// from disk without opening the archive).
    pub file_count: usize,
}

/// Outcome of writing a bundle: the bundle plus per-file skips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackReport {
    /// The bundle that was created.
    pub bundle: Bundle,
    /// Bytes of file content that went into the archive, before compression.
    pub content_bytes: u64,
    /// Files that vanished or became unreadable between selection and write.
    pub skips: Vec<Skip>,
}

/// Per-entry outcomes of extracting a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Bundle file name the report is about.
    pub bundle: String,
    /// Entries written to the destination, in archive order.
    pub extracted: Vec<PathBuf>,
    /// Entries refused or failed, with reasons.
    pub skips: Vec<Skip>,
}

impl ExtractionReport {
    /// Number of entries written.
    pub fn extracted_count(&self) -> usize {
        self.extracted.len()
    }

    /// Number of entries skipped.
    pub fn skipped_count(&self) -> usize {
        self.skips.len()
    }
}

/// Outcome of a best-effort bundle deletion pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Bundle files removed.
    pub deleted: Vec<PathBuf>,
    /// Bundles that could not be removed, with reasons.
    pub failed: Vec<Skip>,
    /// Total bytes freed.
    pub freed_bytes: u64,
}

impl DeletionReport {
    /// Number of bundles removed.
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_result_counts() {
        let sel = SelectionResult::new("/root", vec![PathBuf::from("a.py")], Vec::new());
        assert_eq!(sel.file_count(), 1);
        assert!(!sel.is_empty());

        let empty = SelectionResult::new("/root", Vec::new(), Vec::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_extraction_report_counts() {
        let mut report = ExtractionReport {
            bundle: "x.tar.gz".into(),
            ..Default::default()
        };
        report.extracted.push("a.txt".into());
        assert_eq!(report.extracted_count(), 1);
        assert_eq!(report.skipped_count(), 0);
    }
}
