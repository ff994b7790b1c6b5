//! Utility functions and helpers.
//!
//! - [`hash`]: Checksum algorithms and file hashing
//! - [`paths`]: Manifest path rendering
//! - [`thread_pool`]: Thread pool used for parallel batch runs
//!
//! # Examples
//!
//! ```
//! use sumkeep::utils::ExcludeSet;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let excludes = ExcludeSet::new(&["*.tmp".to_string(), ".cache/**".to_string()])?;
//! assert!(excludes.matches(Path::new("a/b.tmp")));
//! assert!(!excludes.matches(Path::new("a/b.jpg")));
//! # Ok(())
//! # }
//! ```

/// Checksum algorithms and file hashing
pub mod hash;
/// Manifest path rendering
pub mod paths;
/// Thread pool configuration for parallel batch runs
pub mod thread_pool;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Compiled glob patterns matched against paths relative to a scanned directory.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    /// Compiled patterns
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile `patterns`
    ///
    /// # Errors
    /// Returns an error naming the first pattern that does not compile.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether no pattern is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// A path is excluded when any pattern matches it or its final component.
    #[must_use]
    pub fn matches(&self, relative: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let name = relative.file_name().map(Path::new);

        self.patterns.iter().any(|pattern| {
            pattern.matches_path_with(relative, options)
                || name.is_some_and(|n| pattern.matches_path_with(n, options))
        })
    }
}

/// Pluralize a count for summary lines ("1 file", "3 files").
#[must_use]
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_set_matches_names_and_paths() -> Result<()> {
        let set = ExcludeSet::new(&[
            "*.part".to_string(),
            "Thumbs.db".to_string(),
            "cache/**".to_string(),
        ])?;

        assert!(set.matches(Path::new("video.part")));
        assert!(set.matches(Path::new("deep/dir/video.part")));
        assert!(set.matches(Path::new("albums/Thumbs.db")));
        assert!(set.matches(Path::new("cache/x/y.bin")));
        assert!(!set.matches(Path::new("albums/cover.jpg")));
        assert!(!set.is_empty());

        Ok(())
    }

    #[test]
    fn test_empty_exclude_set() -> Result<()> {
        let set = ExcludeSet::new(&[])?;
        assert!(set.is_empty());
        assert!(!set.matches(Path::new("anything")));
        Ok(())
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ExcludeSet::new(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file", "files"), "1 file");
        assert_eq!(plural(0, "file", "files"), "0 files");
        assert_eq!(plural(7, "directory", "directories"), "7 directories");
    }
}
