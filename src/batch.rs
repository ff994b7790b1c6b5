//! Batch reconciliation.
//!
//! At depth 0 the root itself is the only target. At depth N every directory
//! exactly N levels below the root is a target and gets its own manifest
//! covering its own subtree. Targets are independent: a failure in one never
//! stops the others.

use crate::error::ReconcileError;
use crate::strategy::{ChecksumStrategy, ReconcileReport};
use crate::utils::thread_pool;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Targets found below a root
#[derive(Debug, Default)]
pub struct Discovery {
    /// Directories to reconcile, depth-first in file-name order
    pub targets: Vec<PathBuf>,
    /// Subtrees that could not be listed while looking for targets
    pub errors: Vec<ReconcileError>,
}

/// Find the directories at exactly `depth` below `root`
///
/// # Errors
///
/// Returns an error only if `root` itself is not a readable directory.
pub fn discover_targets(root: &Path, depth: usize, follow_symlinks: bool) -> Result<Discovery> {
    let metadata = std::fs::metadata(root)
        .with_context(|| format!("Cannot read root directory {}", root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    if depth == 0 {
        return Ok(Discovery {
            targets: vec![root.to_path_buf()],
            errors: Vec::new(),
        });
    }

    std::fs::read_dir(root)
        .with_context(|| format!("Cannot list root directory {}", root.display()))?;

    let mut discovery = Discovery::default();
    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir());

    for entry in walker {
        match entry {
            Ok(entry) if entry.depth() == depth => discovery.targets.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                warn!(path = %path.display(), error = %e, "Cannot list directory");
                discovery.errors.push(ReconcileError::access(&path, e));
            }
        }
    }

    debug!(root = %root.display(), depth, targets = discovery.targets.len(), "Targets discovered");
    Ok(discovery)
}

/// Result of one directory in a batch
#[derive(Debug)]
pub struct DirectoryOutcome {
    /// Directory that was processed
    pub directory: PathBuf,
    /// Report, or the error that aborted this directory
    pub result: Result<ReconcileReport, ReconcileError>,
}

/// Aggregate of a whole batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Per-directory outcomes, in target order
    pub outcomes: Vec<DirectoryOutcome>,
}

impl BatchSummary {
    /// Reports of directories that completed
    pub fn reports(&self) -> impl Iterator<Item = &ReconcileReport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Directories that were aborted, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &ReconcileError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.directory.as_path(), e)))
    }

    /// Records appended across the batch
    #[must_use]
    pub fn total_added(&self) -> usize {
        self.reports().map(|r| r.added.len()).sum()
    }

    /// Missing entries across the batch
    #[must_use]
    pub fn total_missing(&self) -> usize {
        self.reports().map(|r| r.missing.len()).sum()
    }

    /// Files left unresolved across the batch
    #[must_use]
    pub fn total_unresolved(&self) -> usize {
        self.reports().map(|r| r.unresolved.len()).sum()
    }

    /// Whether every directory completed and every file was hashed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none() && self.reports().all(ReconcileReport::is_complete)
    }
}

/// Reconcile every target with `strategy`
///
/// With `jobs <= 1` targets run one after another and `on_done` is called as
/// each finishes. With more jobs targets run on the batch thread pool and
/// `on_done` is called in target order once all are done.
///
/// # Errors
///
/// Returns an error only if the thread pool cannot be created; per-directory
/// failures are part of the summary.
pub fn run_batch<F>(
    strategy: &dyn ChecksumStrategy,
    targets: &[PathBuf],
    jobs: usize,
    mut on_done: F,
) -> Result<BatchSummary>
where
    F: FnMut(&DirectoryOutcome),
{
    let run_one = |directory: &PathBuf| {
        let result = strategy.reconcile(directory);
        if let Err(error) = &result {
            warn!(
                dir = %directory.display(),
                kind = error.kind(),
                error = %error,
                "Directory aborted"
            );
        }
        DirectoryOutcome {
            directory: directory.clone(),
            result,
        }
    };

    let mut summary = BatchSummary::default();

    if jobs <= 1 || targets.len() <= 1 {
        for directory in targets {
            let outcome = run_one(directory);
            on_done(&outcome);
            summary.outcomes.push(outcome);
        }
    } else {
        debug!(jobs, targets = targets.len(), "Running batch in parallel");
        let outcomes: Vec<DirectoryOutcome> =
            thread_pool::run_in_pool(jobs, || targets.par_iter().map(run_one).collect())?;
        for outcome in &outcomes {
            on_done(outcome);
        }
        summary.outcomes = outcomes;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManifestConfig;
    use crate::manifest::Manifest;
    use crate::strategy::DirectHash;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree(root: &Path) -> Result<()> {
        // root/
        //   top.txt
        //   2021/
        //     jan/a.jpg
        //     feb/b.jpg
        //   2020/
        //     dec/c.jpg
        //   notes.md
        fs::create_dir_all(root.join("2021/jan"))?;
        fs::create_dir_all(root.join("2021/feb"))?;
        fs::create_dir_all(root.join("2020/dec"))?;
        fs::write(root.join("top.txt"), "t")?;
        fs::write(root.join("notes.md"), "n")?;
        fs::write(root.join("2021/jan/a.jpg"), "a")?;
        fs::write(root.join("2021/feb/b.jpg"), "b")?;
        fs::write(root.join("2020/dec/c.jpg"), "c")?;
        Ok(())
    }

    fn names(root: &Path, targets: &[PathBuf]) -> Vec<String> {
        targets
            .iter()
            .map(|t| t.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_depth_zero_targets_root() -> Result<()> {
        let temp = TempDir::new()?;
        create_tree(temp.path())?;
        let discovery = discover_targets(temp.path(), 0, true)?;
        assert_eq!(discovery.targets, vec![temp.path().to_path_buf()]);
        Ok(())
    }

    #[test]
    fn test_targets_at_exact_depth_in_order() -> Result<()> {
        let temp = TempDir::new()?;
        create_tree(temp.path())?;

        let one = discover_targets(temp.path(), 1, true)?;
        assert_eq!(names(temp.path(), &one.targets), vec!["2020", "2021"]);

        let two = discover_targets(temp.path(), 2, true)?;
        assert_eq!(
            names(temp.path(), &two.targets),
            vec!["2020/dec", "2021/feb", "2021/jan"]
        );

        assert!(discover_targets(temp.path(), 5, true)?.targets.is_empty());
        Ok(())
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(discover_targets(&file, 0, true).is_err());
        let missing = temp.path().join("nope");
        assert!(discover_targets(&missing, 1, true).is_err());
    }

    #[test]
    fn test_batch_writes_one_manifest_per_target() -> Result<()> {
        let temp = TempDir::new()?;
        create_tree(temp.path())?;
        let strategy = DirectHash::try_from_config(&ManifestConfig::default())?;

        let discovery = discover_targets(temp.path(), 1, true)?;
        let mut seen = Vec::new();
        let summary = run_batch(&strategy, &discovery.targets, 1, |o| {
            seen.push(o.directory.clone());
        })?;

        assert_eq!(seen, discovery.targets);
        assert!(summary.is_success());
        assert_eq!(summary.total_added(), 3);
        assert!(!temp.path().join("checksums.txt").exists());

        let manifest = Manifest::load(&temp.path().join("2021/checksums.txt"))?;
        let paths: Vec<_> = manifest.records().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["feb/b.jpg", "jan/a.jpg"]);
        Ok(())
    }

    #[test]
    fn test_failed_directory_does_not_stop_batch() -> Result<()> {
        let temp = TempDir::new()?;
        create_tree(temp.path())?;
        let strategy = DirectHash::try_from_config(&ManifestConfig::default())?;

        let targets = vec![
            temp.path().join("2020"),
            temp.path().join("vanished"),
            temp.path().join("2021"),
        ];
        let summary = run_batch(&strategy, &targets, 1, |_| {})?;

        assert_eq!(summary.reports().count(), 2);
        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("vanished"));
        assert!(!summary.is_success());
        Ok(())
    }

    #[test]
    fn test_parallel_batch_matches_sequential() -> Result<()> {
        let temp = TempDir::new()?;
        create_tree(temp.path())?;
        let strategy = DirectHash::try_from_config(&ManifestConfig::default())?;

        let discovery = discover_targets(temp.path(), 2, true)?;
        let summary = run_batch(&strategy, &discovery.targets, 3, |_| {})?;

        let order: Vec<_> = summary
            .outcomes
            .iter()
            .map(|o| o.directory.clone())
            .collect();
        assert_eq!(order, discovery.targets);
        assert_eq!(summary.total_added(), 3);

        let again = run_batch(&strategy, &discovery.targets, 3, |_| {})?;
        assert_eq!(again.total_added(), 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_target_does_not_stop_siblings() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        create_tree(temp.path())?;
        let locked = temp.path().join("2020");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        // Permission bits do not bind a privileged user
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let strategy = DirectHash::try_from_config(&ManifestConfig::default())?;
        let discovery = discover_targets(temp.path(), 1, true)?;
        let summary = run_batch(&strategy, &discovery.targets, 1, |_| {})?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].0.ends_with("2020"));
        assert!(matches!(failures[0].1, ReconcileError::Access { .. }));

        assert_eq!(summary.total_added(), 2);
        assert!(temp.path().join("2021/checksums.txt").exists());
        assert!(!summary.is_success());
        Ok(())
    }
}
