//! Validated bundle extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use syncf_core::{ExtractionReport, Skip, SkipReason};

use crate::ArchiveError;

/// Extracts a bundle into a destination directory.
///
/// The container is walked once up front so a truncated or corrupt archive
/// fails before any entry touches the destination. Entries are then restored
/// with their relative paths and permission bits; anything that would resolve
/// outside the destination (`..` segments, absolute paths) is refused
/// per-entry and extraction of the rest continues. Existing files at the
/// destination are overwritten.
pub struct ArchiveReader;

impl ArchiveReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Extract `bundle_path` into `destination`.
    pub fn extract(
        &self,
        bundle_path: &Path,
        destination: &Path,
    ) -> Result<ExtractionReport, ArchiveError> {
        let bundle_name = bundle_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| bundle_path.display().to_string());

        // Fail fast on a bad container before writing anything.
        self.validate(bundle_path, &bundle_name)?;

        std::fs::create_dir_all(destination)
            .map_err(|e| ArchiveError::io(destination, e))?;

        let file = File::open(bundle_path).map_err(|e| ArchiveError::io(bundle_path, e))?;
        let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);

        let mut report = ExtractionReport {
            bundle: bundle_name.clone(),
            ..Default::default()
        };

        let entries = archive
            .entries()
            .map_err(|e| corrupt(&bundle_name, &e))?;

        for entry in entries {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Err(corrupt(&bundle_name, &e)),
            };

            let rel: PathBuf = match entry.path() {
                Ok(path) => path.into_owned(),
                Err(e) => return Err(corrupt(&bundle_name, &e)),
            };

            if !is_safe_entry_path(&rel) {
                tracing::warn!(entry = %rel.display(), "refusing entry escaping the destination");
                report.skips.push(Skip::new(
                    rel,
                    SkipReason::PathTraversal,
                    "entry path escapes the destination",
                ));
                continue;
            }

            let target = destination.join(&rel);
            if let Some(parent) = target.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    report
                        .skips
                        .push(Skip::new(&rel, SkipReason::WriteError, e.to_string()));
                    continue;
                }
            }

            match entry.unpack(&target) {
                Ok(_) => {
                    tracing::trace!(entry = %rel.display(), "extracted");
                    report.extracted.push(rel);
                }
                Err(e) => {
                    report
                        .skips
                        .push(Skip::new(&rel, SkipReason::WriteError, e.to_string()));
                }
            }
        }

        tracing::debug!(
            bundle = %bundle_name,
            extracted = report.extracted_count(),
            skipped = report.skipped_count(),
            "extraction complete"
        );

        Ok(report)
    }

    /// Walk all entry headers without extracting. Catches truncated gzip
    /// streams and mangled tar headers in one pass.
    fn validate(&self, bundle_path: &Path, bundle_name: &str) -> Result<usize, ArchiveError> {
        let file = File::open(bundle_path).map_err(|e| ArchiveError::io(bundle_path, e))?;
        let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

        let mut count = 0usize;
        let entries = archive.entries().map_err(|e| corrupt(bundle_name, &e))?;
        for entry in entries {
            entry.map_err(|e| corrupt(bundle_name, &e))?;
            count += 1;
        }
        Ok(count)
    }
}

impl Default for ArchiveReader {
    fn default() -> Self {
        Self::new()
    }
}

fn corrupt(bundle: &str, err: &std::io::Error) -> ArchiveError {
    ArchiveError::CorruptArchive {
        bundle: bundle.to_string(),
        reason: err.to_string(),
    }
}

/// A safe entry path is relative and never steps upward.
fn is_safe_entry_path(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    path.components().all(|c| match c {
        Component::Normal(_) | Component::CurDir => true,
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_entry_paths() {
        assert!(is_safe_entry_path(Path::new("a/b/c.txt")));
        assert!(is_safe_entry_path(Path::new("./a.txt")));
        assert!(!is_safe_entry_path(Path::new("../../etc/passwd")));
        assert!(!is_safe_entry_path(Path::new("/etc/passwd")));
        assert!(!is_safe_entry_path(Path::new("a/../../b")));
        assert!(!is_safe_entry_path(Path::new("")));
    }
}
