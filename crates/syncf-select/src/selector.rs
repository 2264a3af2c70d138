//! Walkdir-based file selection.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use syncf_core::{Matcher, SelectionResult, Skip};

use crate::SelectError;

/// Walks the tree under `root` and applies the matcher to every entry.
///
/// The walk is sorted by file name so the resulting file list is identical
/// across runs; that list is the canonical input order for the archive
/// writer. Excluded directories are pruned before descent, so rules are
/// never evaluated inside them. Per-entry trouble (permission denied,
/// symlink loops) is recorded as a skip and never aborts the walk.
pub struct FileSelector {
    follow_symlinks: bool,
}

impl FileSelector {
    /// Create a selector with default behavior (symlinks followed).
    pub fn new() -> Self {
        Self {
            follow_symlinks: true,
        }
    }

    /// Set whether symbolic links are resolved during the walk.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Select files under `root` according to `matcher`.
    pub fn select(&self, root: &Path, matcher: &Matcher) -> Result<SelectionResult, SelectError> {
        let root = root
            .canonicalize()
            .map_err(|e| SelectError::io(root, e))?;
        if !root.is_dir() {
            return Err(SelectError::NotADirectory { path: root });
        }

        let mut files: BTreeSet<PathBuf> = BTreeSet::new();
        let mut skips: Vec<Skip> = Vec::new();

        let walker = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                match entry.path().strip_prefix(&root) {
                    // The root itself has an empty relative path; always enter.
                    Ok(rel) if rel.as_os_str().is_empty() => true,
                    Ok(rel) => !matcher.prunes(rel),
                    Err(_) => true,
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| relative_to(p, &root))
                        .unwrap_or_default();
                    let skip = if err.loop_ancestor().is_some() {
                        Skip::symlink_cycle(path)
                    } else if let Some(io) = err.io_error() {
                        if io.kind() == std::io::ErrorKind::PermissionDenied {
                            Skip::permission_denied(path)
                        } else {
                            Skip::new(
                                path,
                                syncf_core::SkipReason::ReadError,
                                err.to_string(),
                            )
                        }
                    } else {
                        Skip::new(path, syncf_core::SkipReason::ReadError, err.to_string())
                    };
                    tracing::debug!(path = %skip.path.display(), reason = skip.reason.as_str(), "skipping entry");
                    skips.push(skip);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(&root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };

            if matcher.matches(rel, false) {
                files.insert(rel.to_path_buf());
            }
        }

        tracing::debug!(
            root = %root.display(),
            selected = files.len(),
            skipped = skips.len(),
            "selection complete"
        );

        Ok(SelectionResult::new(
            root,
            files.into_iter().collect(),
            skips,
        ))
    }
}

impl Default for FileSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
