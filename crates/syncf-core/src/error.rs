//! Error types for pattern compilation and per-entry skip records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or compiling a pattern file.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A pattern failed to compile (e.g. unbalanced bracket).
    #[error("invalid pattern '{pattern}' at line {line}: {reason}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        reason: String,
    },

    /// The pattern file could not be read.
    #[error("cannot read pattern file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pattern file contains no positive rules.
    #[error("pattern file {path} contains no include rules")]
    NoIncludeRules { path: PathBuf },
}

/// Reason an entry was skipped during selection, packing, or extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Permission was denied reading the entry.
    PermissionDenied,
    /// Following the symlink would revisit a directory on the descent path.
    SymlinkCycle,
    /// The file vanished between selection and archiving.
    Vanished,
    /// Error reading the entry.
    ReadError,
    /// An archive entry would resolve outside the destination.
    PathTraversal,
    /// Error writing the entry at the destination.
    WriteError,
}

impl SkipReason {
    /// Stable lowercase token used in reports and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::SymlinkCycle => "symlink-cycle",
            Self::Vanished => "vanished",
            Self::ReadError => "read-error",
            Self::PathTraversal => "path-traversal",
            Self::WriteError => "write-error",
        }
    }
}

/// Non-fatal per-entry outcome, collected into reports rather than raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skip {
    /// Path the problem occurred at, relative to the operation root.
    pub path: PathBuf,
    /// Why the entry was skipped.
    pub reason: SkipReason,
    /// Human-readable detail.
    pub message: String,
}

impl Skip {
    /// Create a new skip record.
    pub fn new(path: impl Into<PathBuf>, reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason,
            message: message.into(),
        }
    }

    /// Create a permission denied skip.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("permission denied: {}", path.display()),
            path,
            reason: SkipReason::PermissionDenied,
        }
    }

    /// Create a symlink cycle skip.
    pub fn symlink_cycle(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("symlink cycle at {}", path.display()),
            path,
            reason: SkipReason::SymlinkCycle,
        }
    }

    /// Create a read error skip, mapping permission errors to their own reason.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let reason = match error.kind() {
            std::io::ErrorKind::PermissionDenied => SkipReason::PermissionDenied,
            std::io::ErrorKind::NotFound => SkipReason::Vanished,
            _ => SkipReason::ReadError,
        };
        Self {
            message: format!("{error}"),
            path,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_maps_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let skip = Skip::read_error("/p", &err);
        assert_eq!(skip.reason, SkipReason::PermissionDenied);

        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let skip = Skip::read_error("/p", &err);
        assert_eq!(skip.reason, SkipReason::Vanished);
    }

    #[test]
    fn test_reason_tokens() {
        assert_eq!(SkipReason::PathTraversal.as_str(), "path-traversal");
        assert_eq!(SkipReason::SymlinkCycle.as_str(), "symlink-cycle");
    }
}
