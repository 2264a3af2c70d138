//! Streaming bundle creation.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder as TarBuilder;

use syncf_core::{Bundle, PackReport, SelectionResult, Skip, SkipReason};

use crate::{bundle_filename, sanitize_label, ArchiveError};

/// Streams a selection into a compressed bundle inside the store.
///
/// Files are appended in selection order, one at a time, preserving relative
/// path, mode bits, and mtime; nothing is buffered beyond the codec's own
/// chunks. The archive is written under a dot-prefixed temporary name and
/// renamed into place only once complete, so the store never exposes a
/// partial bundle.
pub struct ArchiveWriter {
    compression_level: u32,
}

impl ArchiveWriter {
    /// Create a writer with the default compression level.
    pub fn new() -> Self {
        Self {
            compression_level: 6,
        }
    }

    /// Set the gzip compression level (clamped to 1-9).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }

    /// Write a bundle stamped with the current time.
    pub fn write(
        &self,
        selection: &SelectionResult,
        store_dir: &Path,
        label: &str,
    ) -> Result<PackReport, ArchiveError> {
        self.write_at(selection, store_dir, label, Local::now())
    }

    /// Write a bundle with an explicit timestamp.
    ///
    /// A second write of the same label within the same second produces the
    /// same name and silently replaces the first; see the naming module.
    pub fn write_at(
        &self,
        selection: &SelectionResult,
        store_dir: &Path,
        label: &str,
        at: DateTime<Local>,
    ) -> Result<PackReport, ArchiveError> {
        // Structural failures come first, before the store is touched.
        let filename = bundle_filename(label, at)?;
        if selection.is_empty() {
            return Err(ArchiveError::EmptySelection);
        }

        fs::create_dir_all(store_dir).map_err(|source| ArchiveError::StoreUnavailable {
            path: store_dir.to_path_buf(),
            source,
        })?;

        let temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(store_dir)
            .map_err(|source| ArchiveError::StoreUnavailable {
                path: store_dir.to_path_buf(),
                source,
            })?;

        let mut skips: Vec<Skip> = Vec::new();
        let mut archived = 0usize;
        let mut content_bytes = 0u64;

        {
            let encoder = GzEncoder::new(temp.as_file(), Compression::new(self.compression_level));
            let mut builder = TarBuilder::new(encoder);

            for rel in &selection.files {
                let full = selection.root.join(rel);
                let metadata = match fs::metadata(&full) {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        skips.push(Skip::read_error(rel, &err));
                        continue;
                    }
                };
                if !metadata.is_file() {
                    skips.push(Skip::new(
                        rel,
                        SkipReason::Vanished,
                        "no longer a regular file",
                    ));
                    continue;
                }
                // Races between selection and write are per-file skips, never
                // fatal to the bundle.
                match builder.append_path_with_name(&full, rel) {
                    Ok(()) => {
                        tracing::trace!(path = %rel.display(), size = metadata.len(), "archived");
                        archived += 1;
                        content_bytes += metadata.len();
                    }
                    Err(err) => {
                        skips.push(Skip::read_error(rel, &err));
                    }
                }
            }

            let encoder = builder
                .into_inner()
                .map_err(|e| ArchiveError::io(store_dir, e))?;
            encoder
                .finish()
                .map_err(|e| ArchiveError::io(store_dir, e))?;
        }

        if archived == 0 {
            // Dropping the temp file removes it; nothing reaches the store.
            return Err(ArchiveError::NothingArchived {
                skipped: skips.len(),
            });
        }

        let out_path = store_dir.join(&filename);
        temp.persist(&out_path)
            .map_err(|e| ArchiveError::io(&out_path, e.error))?;

        let size_bytes = fs::metadata(&out_path)
            .map(|m| m.len())
            .map_err(|e| ArchiveError::io(&out_path, e))?;

        tracing::debug!(
            bundle = %filename,
            files = archived,
            skipped = skips.len(),
            size = size_bytes,
            "bundle written"
        );

        Ok(PackReport {
            bundle: Bundle {
                label: sanitize_label(label),
                timestamp: at,
                filename,
                path: out_path,
                size_bytes,
                file_count: archived,
            },
            content_bytes,
            skips,
        })
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}
