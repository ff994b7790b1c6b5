//! Command-line interface definitions for sumkeep.
//!
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::strategy::Mode;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for sumkeep.
#[derive(Parser)]
#[command(
    name = "sumkeep",
    version = crate::VERSION,
    about = "Append-only checksum manifests for file collections",
    long_about = "Keeps a checksum manifest next to your files and extends it as new files appear, \
                  without ever rewriting recorded checksums"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress summaries and informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Append checksums for new files to the manifest(s) under ROOT
    New {
        /// Directory to reconcile
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Keep one manifest per directory exactly this many levels below ROOT
        #[arg(short, long, default_value_t = 0)]
        depth: usize,

        /// Checksum strategy
        #[arg(long, value_enum, default_value_t = Mode::Direct)]
        mode: Mode,

        /// Shorthand for --mode bitrot
        #[arg(long, conflicts_with = "mode")]
        bitrot: bool,

        /// In bitrot mode, write the database into the manifest afterwards
        #[arg(long)]
        export: bool,

        /// Hash algorithm for new records (sha256 or xxh3)
        #[arg(long)]
        algorithm: Option<String>,

        /// Manifest file name
        #[arg(long)]
        manifest: Option<String>,

        /// Number of directories processed in parallel
        #[arg(short, long, env = "SUMKEEP_JOBS")]
        jobs: Option<usize>,

        /// Do not follow symbolic links
        #[arg(long)]
        no_follow: bool,
    },

    /// Write the bitrot database of each directory into its manifest
    Export {
        /// Directories holding a .bitrot.db
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },

    /// Count files by extension
    Types {
        /// Directory to survey
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Show how many files sit at each depth
    Depths {
        /// Directory to survey
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Count directories instead of files
        #[arg(long)]
        dirs: bool,
    },

    /// List the distinct characters of a text
    Chars {
        /// File to read (standard input if omitted)
        file: Option<PathBuf>,

        /// Also print how often each character occurs
        #[arg(short, long)]
        count: bool,
    },

    /// Extract archives next to themselves
    Extract {
        /// Archives to extract
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        /// Extract even if the target directory exists
        #[arg(short, long)]
        force: bool,
    },

    /// Pack directories into 7z archives
    Pack {
        /// Directories to pack
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Replace existing archives
        #[arg(short, long)]
        force: bool,

        /// Delete each directory after it was packed
        #[arg(long)]
        remove: bool,
    },

    /// Get and set configuration options
    Config {
        /// Configuration key (e.g. manifest.algorithm)
        key: Option<String>,

        /// Configuration value to set
        value: Option<String>,

        /// Reset the configuration key to its default
        #[arg(long)]
        unset: bool,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
