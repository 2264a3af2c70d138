//! Bundle lifecycle for syncf.
//!
//! Naming, creation, extraction, and catalog management of `.tar.gz`
//! bundles. The compression codec itself is the `tar` + `flate2` stack;
//! everything here is the policy around it: collision-free sortable names,
//! atomic placement of finished archives, traversal-safe extraction, and
//! newest-first listing.

mod catalog;
mod namer;
mod reader;
mod writer;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::BundleCatalog;
pub use namer::{bundle_filename, parse_bundle_filename, sanitize_label, ARCHIVE_EXTENSION};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

/// Fatal errors for bundle operations. Per-entry trouble never lands here;
/// it is collected into reports as [`Skip`](syncf_core::Skip) records.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Label is empty after removing path-unsafe characters.
    #[error("invalid bundle label '{label}': empty after sanitization")]
    InvalidLabel { label: String },

    /// The selection contained no files; nothing to archive.
    #[error("nothing matched the pattern rules; refusing to write an empty bundle")]
    EmptySelection,

    /// Every selected file was skipped before it could be archived.
    #[error("all {skipped} selected files were skipped; refusing to write an empty bundle")]
    NothingArchived { skipped: usize },

    /// The bundle container cannot be read.
    #[error("corrupt archive '{bundle}': {reason}")]
    CorruptArchive { bundle: String, reason: String },

    /// The store directory cannot be created or written.
    #[error("bundle store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error with path context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
