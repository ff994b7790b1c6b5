//! Direct-hash reconciliation.
//!
//! The manifest is diffed against a fresh snapshot of the directory:
//!
//! 1. the recorded-path set is read from the manifest
//! 2. the file-set snapshot is taken
//! 3. `new = snapshot - recorded`, `missing = recorded - snapshot`
//! 4. every new file is hashed and appended, one record at a time
//!
//! Files whose content changed under an unchanged name are neither new nor
//! missing, so their recorded checksum stands.

use super::{ChecksumStrategy, ReconcileReport};
use crate::config::ManifestConfig;
use crate::error::{MissingFileWarning, ReconcileError};
use crate::manifest::{Manifest, ManifestRecord, ManifestWriter};
use crate::output::Progress;
use crate::scanner::{DirectoryScanner, ScanOptions};
use crate::utils::ExcludeSet;
use crate::utils::hash::{HashAlgorithm, hash_file};
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::{Level, debug, info, span, warn};

/// Computes the checksum of one file.
pub trait FileHasher: Send + Sync {
    /// Hex digest of the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn hash_file(&self, path: &Path) -> Result<String>;

    /// Length of the hex digests this hasher produces, if fixed
    fn hex_len(&self) -> Option<usize> {
        None
    }
}

/// [`FileHasher`] backed by one of the built-in algorithms
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmHasher {
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Files at least this large are memory-mapped
    pub mmap_threshold: u64,
}

impl FileHasher for AlgorithmHasher {
    fn hash_file(&self, path: &Path) -> Result<String> {
        hash_file(path, self.algorithm, self.mmap_threshold)
    }

    fn hex_len(&self) -> Option<usize> {
        Some(self.algorithm.hex_len())
    }
}

/// Strategy that hashes newly discovered files itself
pub struct DirectHash<H = AlgorithmHasher> {
    /// Checksum function
    hasher: H,
    /// Snapshot settings, including the manifest name
    scan: ScanOptions,
    /// Whether to draw a progress line while hashing
    show_progress: bool,
}

impl DirectHash<AlgorithmHasher> {
    /// Build from the `[manifest]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern does not compile.
    pub fn try_from_config(config: &ManifestConfig) -> Result<Self> {
        let hasher = AlgorithmHasher {
            algorithm: config.algorithm,
            mmap_threshold: config.mmap_threshold,
        };
        let scan = ScanOptions {
            manifest_name: config.file_name.clone(),
            follow_symlinks: config.follow_symlinks,
            excludes: ExcludeSet::new(&config.exclude_patterns)?,
        };
        Ok(Self::with_hasher(hasher, scan))
    }
}

impl<H: FileHasher> DirectHash<H> {
    /// Build around an arbitrary checksum function
    #[must_use]
    pub fn with_hasher(hasher: H, scan: ScanOptions) -> Self {
        Self {
            hasher,
            scan,
            show_progress: false,
        }
    }

    /// Enable or disable the progress line
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Number of records whose checksum width differs from new ones
    fn foreign_digests(&self, manifest: &Manifest) -> usize {
        let Some(expected) = self.hasher.hex_len() else {
            return 0;
        };
        manifest
            .records()
            .iter()
            .filter(|r| r.checksum.len() != expected)
            .count()
    }
}

impl<H: FileHasher> ChecksumStrategy for DirectHash<H> {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn reconcile(&self, directory: &Path) -> Result<ReconcileReport, ReconcileError> {
        let span = span!(Level::INFO, "reconcile", dir = %directory.display());
        let _guard = span.enter();

        let manifest_path = directory.join(&self.scan.manifest_name);
        let mut report = ReconcileReport::new(directory, &manifest_path);

        let snapshot = DirectoryScanner::new(directory, &self.scan)
            .snapshot()
            .map_err(|e| ReconcileError::access(directory, e))?;
        let files = &snapshot.files;

        // Lock before reading so no other run can append between our read and our writes
        let mut writer = ManifestWriter::open(&manifest_path)
            .map_err(|e| ReconcileError::access(&manifest_path, e))?;
        let manifest = Manifest::load(&manifest_path)
            .map_err(|e| ReconcileError::access(&manifest_path, e))?;

        report.recorded = manifest.len();
        let foreign = self.foreign_digests(&manifest);
        if foreign > 0 {
            warn!(
                manifest = %manifest_path.display(),
                records = foreign,
                expected_width = ?self.hasher.hex_len(),
                "Existing checksums differ in width from new ones"
            );
        }
        let recorded = manifest.recorded_paths();
        let on_disk: HashSet<&str> = files.iter().map(|f| f.relative.as_str()).collect();

        let mut reported = HashSet::new();
        for record in manifest.records() {
            let path = record.path.as_str();
            if !on_disk.contains(path) && reported.insert(path) {
                report.missing.push(MissingFileWarning {
                    path: path.to_string(),
                });
            }
        }

        let new_files: Vec<_> = files
            .iter()
            .filter(|f| !recorded.contains(f.relative.as_str()))
            .collect();

        for path in &snapshot.undecodable {
            let shown = path
                .strip_prefix(directory)
                .unwrap_or(path)
                .to_string_lossy();
            warn!(file = %shown, "Skipping file with a non-UTF-8 name");
            let error = ReconcileError::hash(&shown, "file name is not valid UTF-8");
            report.unresolved.push(error);
        }

        debug!(
            recorded = report.recorded,
            skipped_lines = manifest.skipped(),
            on_disk = files.len(),
            new = new_files.len(),
            missing = report.missing.len(),
            "Diff computed"
        );

        let title = format!("Hashing {}", directory.display());
        let mut progress = if self.show_progress {
            Progress::new(&title, new_files.len())
        } else {
            Progress::hidden(&title, new_files.len())
        };

        for file in new_files {
            match self.hasher.hash_file(&file.absolute) {
                Ok(checksum) => {
                    let record = ManifestRecord::new(checksum, file.relative.clone());
                    writer
                        .append(&record)
                        .map_err(|e| ReconcileError::access(&manifest_path, e))?;
                    report.added.push(file.relative.clone());
                }
                Err(e) => {
                    warn!(file = %file.relative, error = %e, "Failed to hash file");
                    report
                        .unresolved
                        .push(ReconcileError::hash(&file.relative, e));
                }
            }
            progress.tick();
        }
        progress.finish();

        let appended = writer.appended();
        writer
            .finish()
            .map_err(|e| ReconcileError::access(&manifest_path, e))?;

        info!(
            added = appended,
            missing = report.missing.len(),
            unresolved = report.unresolved.len(),
            "Reconciled"
        );
        Ok(report)
    }
}
