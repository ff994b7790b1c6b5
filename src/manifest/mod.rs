//! Checksum manifest format.
//!
//! A manifest is a text file with one record per line in the layout written
//! by the coreutils `*sum` tools:
//!
//! ```text
//! <checksum-hex>  <relative-path>
//! ```
//!
//! When reading, a single space or a space followed by `*` (binary mode) is
//! accepted as the separator as well. Paths holding a newline, carriage
//! return or backslash are escaped: the line starts with `\` and those
//! characters appear as `\n`, `\r` and `\\`.
//!
//! The checksum column is opaque here. Reconciliation only needs the path
//! column; hashes are never compared against each other.
//!
//! # Layout
//!
//! - [`ManifestRecord`] - one parsed line
//! - [`Manifest`] - the records of a manifest file, in file order
//! - [`writer::ManifestWriter`] - append-only, locked writer

pub mod writer;

use crate::utils::paths::normalize_recorded;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub use writer::{ManifestWriter, write_atomic};

/// One `(checksum, path)` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Hex digest, copied verbatim
    pub checksum: String,
    /// Path relative to the manifest's directory, `/`-separated
    pub path: String,
}

impl ManifestRecord {
    /// Create a record
    #[must_use]
    pub fn new(checksum: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            checksum: checksum.into(),
            path: path.into(),
        }
    }

    /// Parse one manifest line (without its line terminator)
    ///
    /// Returns `None` for blank lines and lines that do not start with a hex
    /// token followed by a recognised separator and a non-empty path.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (escaped, line) = match line.strip_prefix('\\') {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        let (checksum, rest) = line.split_at(line.find(' ')?);
        if checksum.is_empty() || !checksum.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let raw_path = rest
            .strip_prefix(" *")
            .or_else(|| rest.strip_prefix("  "))
            .or_else(|| rest.strip_prefix(' '))?;

        let path = if escaped {
            unescape(raw_path)
        } else {
            raw_path.to_string()
        };
        let path = normalize_recorded(&path);
        if path.is_empty() {
            return None;
        }

        Some(Self::new(checksum, path))
    }

    /// Render the record as a manifest line, including the trailing newline
    #[must_use]
    pub fn to_line(&self) -> String {
        if needs_escape(&self.path) {
            format!("\\{}  {}\n", self.checksum, escape(&self.path))
        } else {
            format!("{}  {}\n", self.checksum, self.path)
        }
    }
}

/// Whether a path must be written in escaped form
fn needs_escape(path: &str) -> bool {
    path.contains(['\n', '\r', '\\'])
}

/// Escape backslashes and line terminators
fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    for c in path.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Undo [`escape`]; unknown escapes are kept literally
fn unescape(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// The records of a manifest file, in file order
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Parsed records
    records: Vec<ManifestRecord>,
    /// Number of non-blank lines that could not be parsed
    skipped: usize,
}

impl Manifest {
    /// Parse manifest text
    #[must_use]
    pub fn parse_str(content: &str) -> Self {
        let mut manifest = Self::default();

        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match ManifestRecord::parse(line) {
                Some(record) => manifest.records.push(record),
                None => {
                    debug!(line = number + 1, "Skipping unparsable manifest line");
                    manifest.skipped += 1;
                }
            }
        }

        manifest
    }

    /// Load a manifest file; an absent file is an empty manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read manifest {}", path.display()));
            }
        };

        // Fast path for the common all-UTF-8 case; fall back to lossy decoding
        // so a single odd file name does not make the whole manifest unreadable.
        let manifest = match simdutf8::basic::from_utf8(&bytes) {
            Ok(text) => Self::parse_str(text),
            Err(_) => Self::parse_str(&String::from_utf8_lossy(&bytes)),
        };

        debug!(
            manifest = %path.display(),
            records = manifest.records.len(),
            skipped = manifest.skipped,
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Records in file order
    #[must_use]
    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manifest holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of lines that were skipped as unparsable
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// The recorded-path set
    #[must_use]
    pub fn recorded_paths(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.path.as_str()).collect()
    }
}
