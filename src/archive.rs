//! Archive extraction and directory packing.
//!
//! The codecs live in `7z` and `unrar`; this module only decides names,
//! skips work that is already done and runs the right tool. Every archive or
//! directory is handled on its own so one failure never stops the rest.

use crate::config::ToolsConfig;
use crate::error::ReconcileError;
use crate::tools;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Binary used for an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveTool {
    /// `7z`, for everything except RAR
    SevenZip,
    /// `unrar`
    Unrar,
}

impl ArchiveTool {
    /// Pick the tool by file extension
    #[must_use]
    pub fn for_archive(archive: &Path) -> Self {
        let is_rar = archive
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("rar"));
        if is_rar { Self::Unrar } else { Self::SevenZip }
    }

    /// Configured binary name for this tool
    #[must_use]
    pub fn binary(self, tools: &ToolsConfig) -> &str {
        match self {
            Self::SevenZip => &tools.seven_zip,
            Self::Unrar => &tools.unrar,
        }
    }
}

/// What happened to one archive or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Work done; the path of the produced directory or archive
    Done(PathBuf),
    /// Output already existed and `force` was not given
    Skipped(PathBuf),
}

/// Binaries needed to extract `archives`, without duplicates
#[must_use]
pub fn tools_for_archives<'a>(archives: &[PathBuf], tools: &'a ToolsConfig) -> Vec<&'a str> {
    let mut needed: Vec<&str> = Vec::new();
    for archive in archives {
        let binary = ArchiveTool::for_archive(archive).binary(tools);
        if !needed.contains(&binary) {
            needed.push(binary);
        }
    }
    needed
}

/// Directory an archive is extracted into: its stem, next to it
#[must_use]
pub fn extraction_dir(archive: &Path) -> PathBuf {
    let parent = archive.parent().unwrap_or_else(|| Path::new(""));
    match (archive.file_stem(), archive.extension()) {
        (Some(stem), Some(_)) => parent.join(stem),
        _ => {
            let mut name = archive.file_name().map(OsString::from).unwrap_or_default();
            name.push(".extracted");
            parent.join(name)
        }
    }
}

/// Archive a directory is packed into: `<dir>.7z`, next to it
#[must_use]
pub fn packed_archive(directory: &Path) -> PathBuf {
    let mut name = directory.file_name().map(OsString::from).unwrap_or_default();
    name.push(".7z");
    directory.with_file_name(name)
}

/// Working directory for a tool invocation on `path`
fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Extract `archive` into [`extraction_dir`]
///
/// A partially extracted directory is removed again if the tool fails.
///
/// # Errors
///
/// Returns `Access` if the archive is missing or the target cannot be
/// prepared, `ToolMissing`/`ToolFailed` if extraction fails.
pub fn extract(
    archive: &Path,
    tools: &ToolsConfig,
    force: bool,
) -> Result<ArchiveOutcome, ReconcileError> {
    if !archive.is_file() {
        return Err(ReconcileError::access(archive, "no such archive"));
    }

    let target = extraction_dir(archive);
    if target.exists() && !force {
        debug!(target = %target.display(), "Extraction target exists, skipping");
        return Ok(ArchiveOutcome::Skipped(target));
    }
    let created = !target.exists();
    std::fs::create_dir_all(&target).map_err(|e| ReconcileError::access(&target, e))?;

    let tool = ArchiveTool::for_archive(archive);
    let binary = tool.binary(tools);
    let archive_arg = archive.as_os_str().to_os_string();

    let args: Vec<OsString> = match tool {
        ArchiveTool::SevenZip => {
            let mut out_flag = OsString::from("-o");
            out_flag.push(target.as_os_str());
            vec!["x".into(), "-y".into(), out_flag, archive_arg]
        }
        ArchiveTool::Unrar => {
            let mut destination = target.as_os_str().to_os_string();
            destination.push(std::path::MAIN_SEPARATOR_STR);
            vec![
                "x".into(),
                "-o+".into(),
                "-y".into(),
                archive_arg,
                destination,
            ]
        }
    };

    if let Err(e) = tools::run_captured(parent_dir(archive), binary, &args) {
        if created && let Err(cleanup) = std::fs::remove_dir_all(&target) {
            warn!(
                target = %target.display(),
                error = %cleanup,
                "Failed to remove partially extracted directory"
            );
        }
        return Err(e);
    }

    info!(archive = %archive.display(), target = %target.display(), "Extracted");
    Ok(ArchiveOutcome::Done(target))
}

/// Pack `directory` into [`packed_archive`] with `7z`
///
/// With `remove`, the directory is deleted once the archive was written.
///
/// # Errors
///
/// Returns `Access` if the directory is missing or cannot be removed,
/// `ToolMissing`/`ToolFailed` if packing fails.
pub fn pack(
    directory: &Path,
    tools: &ToolsConfig,
    force: bool,
    remove: bool,
) -> Result<ArchiveOutcome, ReconcileError> {
    if !directory.is_dir() {
        return Err(ReconcileError::access(directory, "not a directory"));
    }
    let Some(name) = directory.file_name() else {
        let error = ReconcileError::access(directory, "cannot pack a root directory");
        return Err(error);
    };

    let archive = packed_archive(directory);
    if archive.exists() {
        if !force {
            debug!(archive = %archive.display(), "Archive exists, skipping");
            return Ok(ArchiveOutcome::Skipped(archive));
        }
        // 7z would add to the existing archive instead of replacing it
        std::fs::remove_file(&archive).map_err(|e| ReconcileError::access(&archive, e))?;
    }

    let archive_name = archive.file_name().map(OsString::from).unwrap_or_default();
    let args: Vec<OsString> = vec![
        "a".into(),
        "-t7z".into(),
        "-y".into(),
        archive_name,
        name.to_os_string(),
    ];
    tools::run_captured(parent_dir(directory), &tools.seven_zip, &args)?;

    if remove {
        std::fs::remove_dir_all(directory).map_err(|e| ReconcileError::access(directory, e))?;
    }

    info!(directory = %directory.display(), archive = %archive.display(), "Packed");
    Ok(ArchiveOutcome::Done(archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_tool_choice() {
        let tool = |name: &str| ArchiveTool::for_archive(Path::new(name));
        assert_eq!(tool("a.rar"), ArchiveTool::Unrar);
        assert_eq!(tool("a.RAR"), ArchiveTool::Unrar);
        assert_eq!(tool("a.zip"), ArchiveTool::SevenZip);
        assert_eq!(tool("a"), ArchiveTool::SevenZip);
    }

    #[test]
    fn test_tools_for_archives_deduplicates() {
        let tools = ToolsConfig::default();
        let archives = vec![
            PathBuf::from("a.zip"),
            PathBuf::from("b.rar"),
            PathBuf::from("c.7z"),
        ];
        assert_eq!(tools_for_archives(&archives, &tools), vec!["7z", "unrar"]);
    }

    #[test]
    fn test_output_names() {
        assert_eq!(
            extraction_dir(Path::new("/data/photos.zip")),
            PathBuf::from("/data/photos")
        );
        assert_eq!(
            extraction_dir(Path::new("/data/set.part1.rar")),
            PathBuf::from("/data/set.part1")
        );
        assert_eq!(
            extraction_dir(Path::new("/data/blob")),
            PathBuf::from("/data/blob.extracted")
        );
        assert_eq!(
            packed_archive(Path::new("/data/album")),
            PathBuf::from("/data/album.7z")
        );
    }

    #[test]
    fn test_existing_outputs_are_skipped() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let tools = ToolsConfig {
            seven_zip: "sumkeep-no-such-7z".to_string(),
            ..ToolsConfig::default()
        };

        let archive = temp.path().join("photos.zip");
        fs::write(&archive, "zip")?;
        fs::create_dir(temp.path().join("photos"))?;
        assert_eq!(
            extract(&archive, &tools, false)?,
            ArchiveOutcome::Skipped(temp.path().join("photos"))
        );

        let album = temp.path().join("album");
        fs::create_dir(&album)?;
        fs::write(temp.path().join("album.7z"), "7z")?;
        assert_eq!(
            pack(&album, &tools, false, false)?,
            ArchiveOutcome::Skipped(temp.path().join("album.7z"))
        );
        Ok(())
    }

    #[test]
    fn test_failed_extraction_cleans_up() {
        let temp = TempDir::new().unwrap();
        let tools = ToolsConfig {
            seven_zip: "sumkeep-no-such-7z".to_string(),
            ..ToolsConfig::default()
        };
        let archive = temp.path().join("broken.7z");
        fs::write(&archive, "not an archive").unwrap();

        let err = extract(&archive, &tools, false).unwrap_err();
        assert!(matches!(err, ReconcileError::ToolMissing { .. }));
        assert!(!temp.path().join("broken").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_pack_with_fake_tool_and_remove() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new()?;
        let fake = bin.path().join("7z");
        // Writes the archive named by its fourth argument
        fs::write(&fake, "#!/bin/sh\necho packed > \"$4\"\n")?;
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755))?;

        let temp = TempDir::new()?;
        let album = temp.path().join("album");
        fs::create_dir(&album)?;
        fs::write(album.join("a.jpg"), "a")?;

        let tools = ToolsConfig {
            seven_zip: fake.to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        };
        let outcome = pack(&album, &tools, false, true)?;

        assert_eq!(outcome, ArchiveOutcome::Done(temp.path().join("album.7z")));
        assert!(temp.path().join("album.7z").exists());
        assert!(!album.exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_failure_removes_partial_extraction() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new()?;
        let fake = bin.path().join("7z");
        // Leaves a partial file in the -o directory, then fails
        fs::write(
            &fake,
            "#!/bin/sh\ndir=\"${3#-o}\"\necho partial > \"$dir/part\"\nexit 2\n",
        )?;
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755))?;

        let temp = TempDir::new()?;
        let archive = temp.path().join("album.7z");
        fs::write(&archive, "7z")?;
        let tools = ToolsConfig {
            seven_zip: fake.to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        };

        let err = extract(&archive, &tools, false).unwrap_err();
        assert!(matches!(err, ReconcileError::ToolFailed { .. }));
        assert!(!temp.path().join("album").exists());
        Ok(())
    }
}
