//! Bundle store catalog.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};

use syncf_core::{Bundle, DeletionReport, Skip, SkipReason};

use crate::{parse_bundle_filename, ARCHIVE_EXTENSION};

/// Lists and deletes bundles in a store directory.
///
/// The catalog holds no state; every call reloads from disk. Listing never
/// mutates anything and an empty or missing store is an empty list, not an
/// error.
pub struct BundleCatalog;

impl BundleCatalog {
    /// Create a catalog.
    pub fn new() -> Self {
        Self
    }

    /// All bundles in the store, newest first, ties broken by filename.
    pub fn list(&self, store_dir: &Path) -> Vec<Bundle> {
        let entries = match fs::read_dir(store_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(store = %store_dir.display(), error = %err, "store not readable, treating as empty");
                return Vec::new();
            }
        };

        let suffix = format!(".{ARCHIVE_EXTENSION}");
        let mut bundles: Vec<Bundle> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let filename = entry.file_name().to_string_lossy().into_owned();
                if !filename.ends_with(&suffix) {
                    return None;
                }
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }

                // Foreign .tar.gz files are still listed; their label falls
                // back to the stem and their timestamp to the file mtime.
                let (label, timestamp) = match parse_bundle_filename(&filename) {
                    Some(parsed) => parsed,
                    None => {
                        let label = filename
                            .strip_suffix(&suffix)
                            .unwrap_or(&filename)
                            .to_string();
                        let mtime = metadata
                            .modified()
                            .map(DateTime::<Local>::from)
                            .unwrap_or_else(|_| Local::now());
                        (label, mtime)
                    }
                };

                Some(Bundle {
                    label,
                    timestamp,
                    filename,
                    path: entry.path(),
                    size_bytes: metadata.len(),
                    file_count: 0,
                })
            })
            .collect();

        bundles.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        bundles
    }

    /// Delete the given bundles, best effort. One failure is recorded and
    /// the rest proceed.
    pub fn delete(&self, bundles: &[Bundle]) -> DeletionReport {
        let mut report = DeletionReport::default();

        for bundle in bundles {
            match fs::remove_file(&bundle.path) {
                Ok(()) => {
                    tracing::debug!(bundle = %bundle.filename, "deleted");
                    report.freed_bytes += bundle.size_bytes;
                    report.deleted.push(bundle.path.clone());
                }
                Err(err) => {
                    report.failed.push(Skip::new(
                        &bundle.path,
                        SkipReason::WriteError,
                        err.to_string(),
                    ));
                }
            }
        }

        report
    }
}

impl Default for BundleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_store_lists_empty() {
        let catalog = BundleCatalog::new();
        assert!(catalog.list(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_newest_first_ordering() {
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("label_20240101_120000.tar.gz"), b"a").unwrap();
        fs::write(store.path().join("label_20240102_090000.tar.gz"), b"b").unwrap();
        fs::write(store.path().join("notes.txt"), b"ignored").unwrap();

        let bundles = BundleCatalog::new().list(store.path());
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].filename, "label_20240102_090000.tar.gz");
        assert_eq!(bundles[1].filename, "label_20240101_120000.tar.gz");
        assert_eq!(bundles[0].label, "label");
    }

    #[test]
    fn test_tie_broken_by_filename() {
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("beta_20240101_120000.tar.gz"), b"b").unwrap();
        fs::write(store.path().join("alpha_20240101_120000.tar.gz"), b"a").unwrap();

        let bundles = BundleCatalog::new().list(store.path());
        assert_eq!(bundles[0].label, "alpha");
        assert_eq!(bundles[1].label, "beta");
    }

    #[test]
    fn test_listing_is_idempotent() {
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("x_20240101_120000.tar.gz"), b"x").unwrap();
        fs::write(store.path().join("y_20240301_080000.tar.gz"), b"y").unwrap();

        let catalog = BundleCatalog::new();
        let first = catalog.list(store.path());
        let second = catalog.list(store.path());
        assert_eq!(first, second);
    }

    #[test]
    fn test_delete_is_best_effort() {
        let store = TempDir::new().unwrap();
        fs::write(store.path().join("a_20240101_120000.tar.gz"), b"aaaa").unwrap();

        let catalog = BundleCatalog::new();
        let mut bundles = catalog.list(store.path());
        // A bundle that no longer exists on disk.
        let mut ghost = bundles[0].clone();
        ghost.path = store.path().join("ghost_20240101_120000.tar.gz");
        ghost.filename = "ghost_20240101_120000.tar.gz".into();
        bundles.push(ghost);

        let report = catalog.delete(&bundles);
        assert_eq!(report.deleted_count(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.freed_bytes, 4);
        assert!(catalog.list(store.path()).is_empty());
    }
}
