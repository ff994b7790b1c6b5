//! File-type inventory and depth distribution.
//!
//! Both are single read-only passes over a tree. Entries that cannot be read
//! are logged and skipped; only an unreadable root is an error.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Label used for files without an extension
pub const NO_EXTENSION: &str = "(none)";

/// What a depth distribution counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthSubject {
    /// Regular files
    Files,
    /// Directories below the root
    Directories,
}

/// Walk `root` and yield readable entries
fn walk(root: &Path, follow_symlinks: bool) -> Result<impl Iterator<Item = DirEntry>> {
    let metadata = std::fs::metadata(root)
        .with_context(|| format!("Cannot read directory {}", root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    Ok(WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        }))
}

/// Count regular files by lower-cased extension
///
/// Sorted by count descending, then extension ascending.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn count_types(root: &Path, follow_symlinks: bool) -> Result<Vec<(String, usize)>> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for entry in walk(root, follow_symlinks)? {
        if !entry.file_type().is_file() {
            continue;
        }
        let extension = Path::new(entry.file_name())
            .extension()
            .map_or_else(
                || NO_EXTENSION.to_string(),
                |e| e.to_string_lossy().to_lowercase(),
            );
        *counts.entry(extension).or_default() += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(sorted)
}

/// Count entries per depth below `root` (a child of `root` is depth 1)
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn depth_distribution(
    root: &Path,
    follow_symlinks: bool,
    subject: DepthSubject,
) -> Result<BTreeMap<usize, usize>> {
    let mut histogram = BTreeMap::new();

    for entry in walk(root, follow_symlinks)? {
        let counted = match subject {
            DepthSubject::Files => entry.file_type().is_file(),
            DepthSubject::Directories => entry.depth() > 0 && entry.file_type().is_dir(),
        };
        if counted {
            *histogram.entry(entry.depth()).or_insert(0) += 1;
        }
    }

    Ok(histogram)
}
