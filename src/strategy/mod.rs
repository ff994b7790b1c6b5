//! Checksum strategies.
//!
//! A strategy brings one directory's persisted checksum record up to date
//! with what is on disk. Two implementations exist:
//!
//! - [`DirectHash`] diffs the manifest against a fresh snapshot and appends
//!   checksums for newly discovered files.
//! - [`BitrotTool`] hands the directory to the external `bitrot` tool, which
//!   owns its own database, and optionally transcribes that database into a
//!   manifest.
//!
//! The mode is picked from configuration and CLI flags through
//! [`build_strategy`]; callers only see `dyn ChecksumStrategy`.

pub mod bitrot;
pub mod direct;

pub use bitrot::{BitrotTool, export_database};
pub use direct::{AlgorithmHasher, DirectHash, FileHasher};

use crate::config::Config;
use crate::error::{MissingFileWarning, ReconcileError};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Outcome of reconciling one directory.
///
/// All counters are local to the run that produced the report.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Directory that was reconciled
    pub directory: PathBuf,
    /// Manifest that was read and extended (or written by an export)
    pub manifest: PathBuf,
    /// Number of records the manifest held before the run
    pub recorded: usize,
    /// Paths appended in this run, in discovery order
    pub added: Vec<String>,
    /// Recorded paths absent from disk, in manifest order
    pub missing: Vec<MissingFileWarning>,
    /// Files whose checksum could not be computed; never appended
    pub unresolved: Vec<ReconcileError>,
    /// Records transcribed from an external database, when exporting
    pub exported: Option<usize>,
}

impl ReconcileReport {
    /// Empty report for `directory`
    #[must_use]
    pub fn new(directory: &Path, manifest: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            manifest: manifest.to_path_buf(),
            ..Self::default()
        }
    }

    /// Whether every discovered file made it into the manifest
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Brings one directory's checksum record up to date.
pub trait ChecksumStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// External binaries this strategy needs on `PATH`
    fn required_tools(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Reconcile `directory` against its persisted record
    ///
    /// # Errors
    ///
    /// Returns an error that aborts this directory only: `Access` when the
    /// directory or manifest cannot be used, `ToolMissing`/`ToolFailed` for
    /// delegated work. Per-file hash failures are reported in
    /// [`ReconcileReport::unresolved`] instead.
    fn reconcile(&self, directory: &Path) -> Result<ReconcileReport, ReconcileError>;
}

/// Which strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Hash new files directly
    #[default]
    Direct,
    /// Delegate to the external bitrot tool
    Bitrot,
}

/// Options that pick and tune a strategy for one command invocation
#[derive(Debug, Clone, Default)]
pub struct StrategyOptions {
    /// Strategy to use
    pub mode: Mode,
    /// In bitrot mode, transcribe the database into the manifest afterwards
    pub export: bool,
    /// Draw per-directory hashing progress
    pub show_progress: bool,
}

/// Build the strategy selected by `options`
///
/// # Errors
///
/// Returns an error if the configuration holds invalid exclude patterns or
/// tool arguments.
pub fn build_strategy(
    config: &Config,
    options: &StrategyOptions,
) -> Result<Box<dyn ChecksumStrategy>> {
    match options.mode {
        Mode::Direct => Ok(Box::new(
            DirectHash::try_from_config(&config.manifest)?.with_progress(options.show_progress),
        )),
        Mode::Bitrot => Ok(Box::new(BitrotTool::from_config(config, options.export)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_strategy_by_mode() -> Result<()> {
        let config = Config::default();

        let direct = build_strategy(&config, &StrategyOptions::default())?;
        assert_eq!(direct.name(), "direct");
        assert!(direct.required_tools().is_empty());

        let bitrot = build_strategy(
            &config,
            &StrategyOptions {
                mode: Mode::Bitrot,
                export: true,
                show_progress: false,
            },
        )?;
        assert_eq!(bitrot.name(), "bitrot");
        assert_eq!(bitrot.required_tools(), vec!["bitrot", "sqlite3"]);

        Ok(())
    }

    #[test]
    fn test_report_completeness() {
        let mut report = ReconcileReport::new(Path::new("/d"), Path::new("/d/checksums.txt"));
        assert!(report.is_complete());
        report.unresolved.push(ReconcileError::hash("x", "boom"));
        assert!(!report.is_complete());
    }
}
