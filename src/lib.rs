#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Sumkeep - Append-Only Checksum Manifests
//!
//! Sumkeep keeps a plain-text checksum manifest next to the files it
//! describes and extends it as new files show up. Existing records are never
//! rewritten: a run only appends checksums for files the manifest does not yet
//! know about and reports recorded files that have disappeared.
//!
//! ## Features
//!
//! - **Append-only reconciliation**: `sumkeep new` hashes only newly discovered files
//! - **Batch mode**: one manifest per directory at a fixed depth below a root
//! - **Bit-rot delegation**: hand a directory to the external `bitrot` tool and
//!   export its database as a manifest
//! - **Small utilities**: file-type inventory, depth distribution, distinct
//!   characters, archive extraction and packing
//!
//! ## Architecture
//!
//! - [`manifest`]: manifest line format, parsing and the append-only writer
//! - [`scanner`]: file-set snapshots of a directory tree
//! - [`strategy`]: the checksum strategies (direct hashing, external bitrot)
//! - [`batch`]: target discovery and per-directory batch execution
//! - [`survey`], [`charset`], [`archive`]: the stateless utilities
//! - [`commands`]: command implementations wired to the CLI
//! - [`config`]: configuration parsing and validation
//! - [`output`]: colored output, verbosity and progress display
//!
//! ## Example Usage
//!
//! ```no_run
//! use sumkeep::SumkeepContext;
//! use sumkeep::strategy::{ChecksumStrategy, DirectHash};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = SumkeepContext::new()?;
//! let strategy = DirectHash::try_from_config(&ctx.config.manifest)?;
//! let report = strategy.reconcile(Path::new("/srv/photos"))?;
//! println!("{} new file(s)", report.added.len());
//! # Ok(())
//! # }
//! ```

/// Archive extraction and directory packing through external tools.
pub mod archive;

/// Batch execution of reconciliations over directories at a given depth.
pub mod batch;

/// Distinct character listing.
pub mod charset;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Error taxonomy for reconciliation.
pub mod error;

/// Manifest format, parsing and append-only writing.
pub mod manifest;

/// Output formatting and progress display.
pub mod output;

/// File-set snapshots of directory trees.
pub mod scanner;

/// Checksum strategies used to reconcile a directory.
pub mod strategy;

/// File-type inventory and depth distribution.
pub mod survey;

/// External tool discovery and invocation.
pub mod tools;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the sumkeep binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/sumkeep/config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "SUMKEEP_CONFIG_PATH";

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "SUMKEEP_LOG";

/// Default manifest file name written into each reconciled directory.
pub const DEFAULT_MANIFEST_NAME: &str = "checksums.txt";

/// Database file maintained by the external `bitrot` tool.
pub const BITROT_DB_FILE: &str = ".bitrot.db";

/// Central context for all sumkeep operations.
///
/// Holds the configuration file location and the loaded configuration.
/// Commands receive it by reference and never consult process-wide state.
///
/// # Examples
///
/// ```no_run
/// use sumkeep::SumkeepContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Load from the default location (or $SUMKEEP_CONFIG_PATH)
/// let ctx = SumkeepContext::new()?;
///
/// // Load from an explicit path (for testing)
/// let ctx = SumkeepContext::with_config_path("/tmp/sumkeep.toml".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SumkeepContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl SumkeepContext {
    /// Creates a new `SumkeepContext` by loading the configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the configuration
    /// file cannot be read or created.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        Self::with_config_path(config_path)
    }

    /// Creates a new `SumkeepContext` from an explicit configuration path.
    ///
    /// A default configuration is written to `config_path` when it does not exist.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                config_path.display()
            )
        })?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Creates a context around an in-memory configuration without touching disk.
    #[must_use]
    pub fn from_config(config_path: PathBuf, config: config::Config) -> Self {
        Self {
            config_path,
            config,
        }
    }
}
