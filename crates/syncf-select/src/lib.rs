//! File selection engine for syncf.
//!
//! Walks a root directory in deterministic order, applies a compiled
//! [`Matcher`](syncf_core::Matcher), and yields the final file set together
//! with per-entry skip records.

mod selector;

use std::path::PathBuf;

use thiserror::Error;

pub use selector::FileSelector;

/// Fatal errors while starting or running a selection walk.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Selection root is not a directory.
    #[error("selection root is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// I/O error resolving the selection root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SelectError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
