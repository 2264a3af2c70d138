//! syncf - pattern-driven file packer.
//!
//! Usage:
//!   syncf pack <FILELIST> <LABEL>   Pack files matching a pattern file
//!   syncf unpack [BUNDLE]           Restore a bundle (interactive if omitted)
//!   syncf list                      Show bundles in the store
//!   syncf clean                     Delete all bundles
//!   syncf --help                    Show help

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use syncf_archive::{ArchiveError, ArchiveReader, ArchiveWriter, BundleCatalog};
use syncf_core::{Bundle, Matcher, PatternError, RuleSet, Skip, SyncConfig};
use syncf_select::FileSelector;

#[derive(Parser)]
#[command(
    name = "syncf",
    version,
    about = "Pack files selected by pattern rules into timestamped bundles",
    long_about = "syncf selects files under the current directory with \
                  gitignore-style inclusion rules, packs them into \
                  timestamped .tar.gz bundles, and restores them later.\n\n\
                  The bundle store defaults to `.files` under the current \
                  directory; set SYNCF_STORE to override."
)]
struct Cli {
    /// Print per-entry detail during operations
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack files matching a pattern file into a new bundle
    Pack {
        /// Pattern file: one rule per line, `!` negates, `#` comments
        filelist: PathBuf,

        /// Label for the bundle name
        label: String,

        /// Gzip compression level (1-9)
        #[arg(short, long, default_value = "6")]
        compression: u32,
    },

    /// Restore a bundle into the current directory
    Unpack {
        /// Bundle file name or list index; prompts when omitted
        bundle: Option<String>,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show bundles in the store, newest first
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete all bundles in the store
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Failures classified for the exit code: 1 for user errors, 2 for I/O.
enum CliError {
    User(String),
    Io(String),
}

impl From<PatternError> for CliError {
    fn from(err: PatternError) -> Self {
        // A missing or malformed pattern file is the user's to fix.
        Self::User(err.to_string())
    }
}

impl From<ArchiveError> for CliError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::InvalidLabel { .. }
            | ArchiveError::EmptySelection
            | ArchiveError::NothingArchived { .. } => Self::User(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<syncf_select::SelectError> for CliError {
    fn from(err: syncf_select::SelectError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SYNCF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let result = match cli.command {
        Command::Pack {
            ref filelist,
            ref label,
            compression,
        } => run_pack(&config, filelist, label, compression),
        Command::Unpack {
            ref bundle,
            ref dest,
            yes,
        } => run_unpack(&config, bundle.as_deref(), dest, yes),
        Command::List { format } => run_list(&config, format),
        Command::Clean { yes } => run_clean(&config, yes),
    };

    Ok(match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::User(message)) => {
            eprintln!("error: {message}");
            ExitCode::from(1)
        }
        Err(CliError::Io(message)) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    })
}

/// The store is resolved once per invocation and handed to every operation;
/// nothing else ever recomputes it.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let root = std::env::current_dir()?;
    let store_dir = match std::env::var_os("SYNCF_STORE") {
        Some(dir) => PathBuf::from(dir),
        None => root.join(".files"),
    };
    SyncConfig::builder()
        .root(root)
        .store_dir(store_dir)
        .verbose(cli.verbose)
        .build()
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

fn run_pack(
    config: &SyncConfig,
    filelist: &PathBuf,
    label: &str,
    compression: u32,
) -> Result<(), CliError> {
    let rules = RuleSet::from_file(filelist)?;
    if !rules.has_includes() {
        return Err(PatternError::NoIncludeRules {
            path: filelist.clone(),
        }
        .into());
    }
    let matcher = Matcher::compile(&rules)?;

    let selection = FileSelector::new()
        .follow_symlinks(config.follow_symlinks)
        .select(&config.root, &matcher)?;

    println!(
        "packing <{}> files into {}",
        selection.file_count(),
        config.store_dir.display()
    );
    if config.verbose {
        for rel in &selection.files {
            let size = std::fs::metadata(selection.root.join(rel))
                .map(|m| m.len())
                .unwrap_or(0);
            println!("  added: {} ({})", rel.display(), format_size(size));
        }
    }

    let report = ArchiveWriter::new()
        .compression_level(compression)
        .write(&selection, &config.store_dir, label)?;

    println!(
        "packed {} files, total size: {}",
        report.bundle.file_count,
        format_size(report.content_bytes)
    );
    println!("bundle: {}", report.bundle.path.display());

    let mut skipped: Vec<&Skip> = selection.skips.iter().collect();
    skipped.extend(report.skips.iter());
    print_skips(&skipped);

    Ok(())
}

fn run_unpack(
    config: &SyncConfig,
    bundle: Option<&str>,
    dest: &PathBuf,
    yes: bool,
) -> Result<(), CliError> {
    let catalog = BundleCatalog::new();
    let bundles = catalog.list(&config.store_dir);
    if bundles.is_empty() {
        return Err(CliError::User(format!(
            "no bundles found in {}",
            config.store_dir.display()
        )));
    }

    let chosen = match bundle {
        Some(wanted) => find_bundle(&bundles, wanted)
            .ok_or_else(|| CliError::User(format!("no bundle matching '{wanted}'")))?,
        None => match choose_bundle(&bundles)? {
            Some(bundle) => bundle,
            None => {
                println!("nothing selected");
                return Ok(());
            }
        },
    };

    if !yes && !confirm(&format!("unpack {} into {}?", chosen.filename, dest.display()))? {
        println!("unpack cancelled");
        return Ok(());
    }

    let report = ArchiveReader::new().extract(&chosen.path, dest)?;

    if config.verbose {
        for path in &report.extracted {
            println!("  extracted: {}", path.display());
        }
    }
    println!(
        "unpacked {} entries from {} ({} skipped)",
        report.extracted_count(),
        report.bundle,
        report.skipped_count()
    );
    let skips: Vec<&Skip> = report.skips.iter().collect();
    print_skips(&skips);

    Ok(())
}

fn run_list(config: &SyncConfig, format: OutputFormat) -> Result<(), CliError> {
    let bundles = BundleCatalog::new().list(&config.store_dir);

    match format {
        OutputFormat::Text => {
            if bundles.is_empty() {
                println!("no bundles in {}", config.store_dir.display());
                return Ok(());
            }
            for (index, bundle) in bundles.iter().enumerate() {
                println!(
                    "{:3}. {} ({}, {})",
                    index + 1,
                    bundle.filename,
                    format_size(bundle.size_bytes),
                    format_time(bundle.timestamp)
                );
            }
            println!("total: {}", bundles.len());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&bundles)
                .map_err(|e| CliError::Io(e.to_string()))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn run_clean(config: &SyncConfig, yes: bool) -> Result<(), CliError> {
    let catalog = BundleCatalog::new();
    let bundles = catalog.list(&config.store_dir);
    if bundles.is_empty() {
        println!("no bundles to clean in {}", config.store_dir.display());
        return Ok(());
    }

    let total: u64 = bundles.iter().map(|b| b.size_bytes).sum();
    println!(
        "found {} bundle(s), total {}",
        bundles.len(),
        format_size(total)
    );

    if !yes && !confirm("delete all bundles?")? {
        println!("clean cancelled");
        return Ok(());
    }

    let report = catalog.delete(&bundles);
    println!(
        "deleted {} bundle(s), freed {}",
        report.deleted_count(),
        format_size(report.freed_bytes)
    );
    let failed: Vec<&Skip> = report.failed.iter().collect();
    print_skips(&failed);

    Ok(())
}

/// Resolve a bundle argument: a 1-based list index or a file name.
fn find_bundle<'a>(bundles: &'a [Bundle], wanted: &str) -> Option<&'a Bundle> {
    if let Ok(index) = wanted.parse::<usize>() {
        if (1..=bundles.len()).contains(&index) {
            return Some(&bundles[index - 1]);
        }
    }
    bundles.iter().find(|b| b.filename == wanted)
}

/// Present the catalog and read a 1-based index from stdin. `q` or an empty
/// line aborts.
fn choose_bundle(bundles: &[Bundle]) -> Result<Option<&Bundle>, CliError> {
    for (index, bundle) in bundles.iter().enumerate() {
        println!(
            "{:3}. {} ({}, {})",
            index + 1,
            bundle.filename,
            format_size(bundle.size_bytes),
            format_time(bundle.timestamp)
        );
    }
    print!("select bundle [1-{}], q to quit: ", bundles.len());
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("q") {
        return Ok(None);
    }

    let index: usize = line
        .parse()
        .map_err(|_| CliError::User(format!("not an index: '{line}'")))?;
    if !(1..=bundles.len()).contains(&index) {
        return Err(CliError::User(format!("index {index} out of range")));
    }
    Ok(Some(&bundles[index - 1]))
}

fn confirm(prompt: &str) -> Result<bool, CliError> {
    print!("{prompt} [Y/n]: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let line = line.trim();
    Ok(line.is_empty() || line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes"))
}

/// Print up to five skip records, then a remainder line.
fn print_skips(skips: &[&Skip]) {
    if skips.is_empty() {
        return;
    }
    println!("skipped {} item(s):", skips.len());
    for skip in skips.iter().take(5) {
        println!(
            "  {} [{}]: {}",
            skip.path.display(),
            skip.reason.as_str(),
            skip.message
        );
    }
    if skips.len() > 5 {
        println!("  ... and {} more", skips.len() - 5);
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Relative time for the listing: today/yesterday keep the clock time,
/// this year keeps month and day, older entries show the date only.
fn format_time(at: DateTime<Local>) -> String {
    let now = Local::now();
    let today = now.date_naive();
    let date = at.date_naive();

    if date == today {
        format!("today {}", at.format("%H:%M"))
    } else if today.pred_opt() == Some(date) {
        format!("yesterday {}", at.format("%H:%M"))
    } else if date.year() == today.year() {
        at.format("%m-%d %H:%M").to_string()
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bundle(filename: &str, stamp: DateTime<Local>) -> Bundle {
        Bundle {
            label: "x".into(),
            timestamp: stamp,
            filename: filename.into(),
            path: PathBuf::from(filename),
            size_bytes: 1,
            file_count: 0,
        }
    }

    #[test]
    fn test_find_bundle_by_index_and_name() {
        let now = Local::now();
        let bundles = vec![
            bundle("b_20240102_090000.tar.gz", now),
            bundle("a_20240101_120000.tar.gz", now),
        ];

        assert_eq!(
            find_bundle(&bundles, "1").unwrap().filename,
            "b_20240102_090000.tar.gz"
        );
        assert_eq!(
            find_bundle(&bundles, "a_20240101_120000.tar.gz")
                .unwrap()
                .filename,
            "a_20240101_120000.tar.gz"
        );
        assert!(find_bundle(&bundles, "3").is_none());
        assert!(find_bundle(&bundles, "nope.tar.gz").is_none());
    }

    #[test]
    fn test_format_time_old_year() {
        let old = Local.with_ymd_and_hms(2019, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_time(old), "2019-03-04");
    }

    #[test]
    fn test_format_time_today() {
        let now = Local::now();
        assert!(format_time(now).starts_with("today "));
    }
}
