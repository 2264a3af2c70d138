//! Core types for syncf.
//!
//! This crate provides the pattern rules and compiled matcher that decide
//! which files belong in a bundle, plus the configuration and report types
//! shared by the selection and archive crates.

mod config;
mod error;
mod matcher;
mod report;
mod rule;

pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::{PatternError, Skip, SkipReason};
pub use matcher::{Decision, Matcher};
pub use report::{Bundle, DeletionReport, ExtractionReport, PackReport, SelectionResult};
pub use rule::{Rule, RuleSet};
