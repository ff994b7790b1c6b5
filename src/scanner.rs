//! File-set snapshots.
//!
//! A snapshot lists every regular file below a directory, as manifest-style
//! relative paths, in a deterministic depth-first, name-sorted order. Files
//! named like the manifest are left out wherever they appear, so nested
//! manifests from deeper batch runs never end up inside an outer manifest.

use crate::utils::ExcludeSet;
use crate::utils::paths::to_manifest_path;
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A regular file found by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path relative to the scanned directory, `/`-separated
    pub relative: String,
    /// Path usable for opening the file
    pub absolute: PathBuf,
}

/// Result of a scan
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Regular files, in walk order
    pub files: Vec<ScannedFile>,
    /// Regular files whose relative path is not valid UTF-8
    pub undecodable: Vec<PathBuf>,
}

/// Settings for a snapshot
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File name excluded at every level
    pub manifest_name: String,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Additional exclusions
    pub excludes: ExcludeSet,
}

/// Scanner producing file-set snapshots of one directory
pub struct DirectoryScanner<'a> {
    /// Directory being scanned
    root: &'a Path,
    /// Scan settings
    options: &'a ScanOptions,
}

impl<'a> DirectoryScanner<'a> {
    #[must_use]
    pub const fn new(root: &'a Path, options: &'a ScanOptions) -> Self {
        Self { root, options }
    }

    /// Walk the directory and return its file-set snapshot
    ///
    /// Dangling symlinks and symlink loops are skipped; they are not regular
    /// files. Files whose names are not valid UTF-8 are listed separately in
    /// [`Snapshot::undecodable`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The root is missing, not a directory, or unreadable
    /// - A subdirectory cannot be read
    pub fn snapshot(&self) -> Result<Snapshot> {
        let metadata = std::fs::metadata(self.root)
            .with_context(|| format!("Cannot read directory {}", self.root.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root.display());
        }
        // Opening the directory surfaces permission problems before the walk starts
        std::fs::read_dir(self.root)
            .with_context(|| format!("Cannot list directory {}", self.root.display()))?;

        let mut snapshot = Snapshot::default();

        let walker = WalkDir::new(self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!(path = ?e.path(), "Skipping symlink loop");
                    continue;
                }
                Err(e) if is_dangling_link(&e) => {
                    debug!(path = ?e.path(), "Skipping dangling symlink");
                    continue;
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.to_path_buf(), Path::to_path_buf);
                    return Err(anyhow::Error::new(e))
                        .with_context(|| format!("Cannot read {}", path.display()));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name() == OsStr::new(&self.options.manifest_name) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(self.root)
                .unwrap_or_else(|_| entry.path());
            match to_manifest_path(relative) {
                Some(relative) => snapshot.files.push(ScannedFile {
                    relative,
                    absolute: entry.path().to_path_buf(),
                }),
                None => {
                    debug!(path = ?entry.path(), "File name is not valid UTF-8");
                    snapshot.undecodable.push(entry.path().to_path_buf());
                }
            }
        }

        debug!(
            root = %self.root.display(),
            files = snapshot.files.len(),
            undecodable = snapshot.undecodable.len(),
            "Snapshot complete"
        );
        Ok(snapshot)
    }

    /// Whether an entry below the root matches an exclude pattern
    fn is_excluded(&self, path: &Path) -> bool {
        if self.options.excludes.is_empty() {
            return false;
        }
        let relative = path.strip_prefix(self.root).unwrap_or(path);
        self.options.excludes.matches(relative)
    }
}

/// A walk error caused by following a symlink whose target does not exist
fn is_dangling_link(error: &walkdir::Error) -> bool {
    let Some(path) = error.path() else {
        return false;
    };
    let target_missing = error
        .io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
    target_missing && path.is_symlink()
}
