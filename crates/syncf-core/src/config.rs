//! Invocation configuration.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for one syncf invocation.
///
/// Built once by the CLI and passed into each operation explicitly; there is
/// no process-wide store path.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SyncConfig {
    /// Root of the tree files are selected from.
    pub root: PathBuf,

    /// Directory holding the bundles. Created lazily on first write.
    pub store_dir: PathBuf,

    /// Follow symbolic links while selecting (cycles are always skipped).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Gzip compression level (1-9).
    #[builder(default = "6")]
    #[serde(default = "default_compression")]
    pub compression_level: u32,

    /// Print per-entry detail during operations.
    #[builder(default = "false")]
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}

fn default_compression() -> u32 {
    6
}

impl SyncConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.root {
            Some(root) if root.as_os_str().is_empty() => {
                return Err("root path cannot be empty".to_string());
            }
            None => return Err("root path is required".to_string()),
            _ => {}
        }
        match &self.store_dir {
            Some(store) if store.as_os_str().is_empty() => {
                return Err("store directory cannot be empty".to_string());
            }
            None => return Err("store directory is required".to_string()),
            _ => {}
        }
        if let Some(level) = self.compression_level {
            if !(1..=9).contains(&level) {
                return Err(format!("compression level {level} out of range 1-9"));
            }
        }
        Ok(())
    }
}

impl SyncConfig {
    /// Create a new config builder.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Simple config rooted at `root` with bundles stored under `store_dir`.
    pub fn new(root: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store_dir: store_dir.into(),
            follow_symlinks: true,
            compression_level: 6,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SyncConfig::builder()
            .root("/work")
            .store_dir("/work/.files")
            .compression_level(9u32)
            .verbose(true)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/work"));
        assert_eq!(config.compression_level, 9);
        assert!(config.verbose);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_config_rejects_bad_level() {
        let result = SyncConfig::builder()
            .root("/work")
            .store_dir("/work/.files")
            .compression_level(0u32)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_requires_store() {
        let result = SyncConfig::builder().root("/work").build();
        assert!(result.is_err());
    }
}
