//! Bundle naming.
//!
//! Bundle files are named `{label}_{YYYYMMDD_HHMMSS}.tar.gz`. The stamp is
//! local time at second precision, fixed width, so a plain lexicographic
//! sort of stamps is a chronological sort. Two writes of the same label
//! within the same second produce the same name and the second one wins;
//! that overwrite is documented behavior for a single-user local tool.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::ArchiveError;

/// Extension of every bundle file in the store.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
// `YYYYMMDD_HHMMSS`
const STAMP_LEN: usize = 15;

/// Strip path-unsafe characters from a label. Separators and NUL bytes are
/// replaced with `-`; surrounding whitespace and leading dots are dropped so
/// a label can never produce a hidden or nested file.
pub fn sanitize_label(label: &str) -> String {
    let replaced: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '-',
            c => c,
        })
        .collect();
    replaced.trim_start_matches('.').to_string()
}

/// Build the file name for a bundle. Pure function, no I/O.
pub fn bundle_filename(label: &str, at: DateTime<Local>) -> Result<String, ArchiveError> {
    let clean = sanitize_label(label);
    if clean.is_empty() {
        return Err(ArchiveError::InvalidLabel {
            label: label.to_string(),
        });
    }
    Ok(format!(
        "{clean}_{}.{ARCHIVE_EXTENSION}",
        at.format(STAMP_FORMAT)
    ))
}

/// Recover `(label, timestamp)` from a bundle file name. Returns `None` for
/// files that do not follow the naming scheme.
pub fn parse_bundle_filename(filename: &str) -> Option<(String, DateTime<Local>)> {
    let stem = filename.strip_suffix(&format!(".{ARCHIVE_EXTENSION}"))?;
    if stem.len() <= STAMP_LEN {
        return None;
    }
    let (label, stamp) = stem.split_at(stem.len() - STAMP_LEN - 1);
    let stamp = stamp.strip_prefix('_')?;
    let naive = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    if label.is_empty() {
        return None;
    }
    Some((label.to_string(), local))
}
