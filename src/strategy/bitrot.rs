//! Delegation to the external `bitrot` tool.
//!
//! `bitrot` keeps its own SQLite database (`.bitrot.db`) in the directory it
//! runs in and takes care of both new-file detection and corruption checks.
//! Sumkeep only runs it and, on request, transcribes the database into the
//! manifest format so the checksums stay usable without `bitrot`.

use super::{ChecksumStrategy, ReconcileReport};
use crate::BITROT_DB_FILE;
use crate::config::Config;
use crate::error::ReconcileError;
use crate::manifest::{ManifestRecord, write_atomic};
use crate::tools;
use crate::utils::paths::normalize_recorded;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{Level, debug, info, span};

/// Query run against the bitrot database during export
const EXPORT_QUERY: &str = "SELECT hash, path FROM bitrot ORDER BY path";

/// One row of the bitrot database as emitted by `sqlite3 -json`
#[derive(Debug, Deserialize, PartialEq, Eq)]
struct BitrotRow {
    /// Hex digest recorded by bitrot
    hash: String,
    /// Path relative to the directory bitrot ran in
    path: String,
}

/// Strategy that delegates to `bitrot`
#[derive(Debug, Clone)]
pub struct BitrotTool {
    /// `bitrot` binary
    bitrot: String,
    /// Extra arguments passed to `bitrot`
    args: Vec<String>,
    /// `sqlite3` binary used for export
    sqlite3: String,
    /// Manifest written by export
    manifest_name: String,
    /// Whether to export after running
    export: bool,
}

impl BitrotTool {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if `tools.bitrot_args` cannot be split into arguments.
    pub fn from_config(config: &Config, export: bool) -> Result<Self> {
        let args = shell_words::split(&config.tools.bitrot_args)
            .with_context(|| format!("Invalid bitrot_args: {}", config.tools.bitrot_args))?;

        Ok(Self {
            bitrot: config.tools.bitrot.clone(),
            args,
            sqlite3: config.tools.sqlite3.clone(),
            manifest_name: config.manifest.file_name.clone(),
            export,
        })
    }
}

impl ChecksumStrategy for BitrotTool {
    fn name(&self) -> &'static str {
        "bitrot"
    }

    fn required_tools(&self) -> Vec<&str> {
        let mut tools = vec![self.bitrot.as_str()];
        if self.export {
            tools.push(self.sqlite3.as_str());
        }
        tools
    }

    fn reconcile(&self, directory: &Path) -> Result<ReconcileReport, ReconcileError> {
        let span = span!(Level::INFO, "bitrot", dir = %directory.display());
        let _guard = span.enter();

        if !directory.is_dir() {
            return Err(ReconcileError::access(directory, "not a directory"));
        }

        tools::run_inherited(directory, &self.bitrot, &self.args)?;

        let manifest_path = directory.join(&self.manifest_name);
        let mut report = ReconcileReport::new(directory, &manifest_path);

        if self.export {
            report.exported = Some(export_database(
                directory,
                &self.sqlite3,
                &self.manifest_name,
            )?);
        }

        Ok(report)
    }
}

/// Transcribe `directory`'s bitrot database into its manifest
///
/// The manifest is replaced as a whole: in this mode the database is the
/// authoritative record. Returns the number of records written.
///
/// # Errors
///
/// Returns `Access` if the database is absent or the manifest cannot be
/// written, `ToolMissing`/`ToolFailed` if `sqlite3` cannot be run or its
/// output cannot be decoded.
pub fn export_database(
    directory: &Path,
    sqlite3: &str,
    manifest_name: &str,
) -> Result<usize, ReconcileError> {
    let db_path = directory.join(BITROT_DB_FILE);
    if !db_path.is_file() {
        return Err(ReconcileError::access(
            &db_path,
            "no bitrot database (run bitrot in this directory first)",
        ));
    }

    let output = tools::run_captured(
        directory,
        sqlite3,
        ["-readonly", "-json", BITROT_DB_FILE, EXPORT_QUERY],
    )?;
    let rows = decode_rows(&output.stdout).map_err(|e| ReconcileError::tool_failed(sqlite3, e))?;

    let records: Vec<ManifestRecord> = rows
        .into_iter()
        .map(|row| ManifestRecord::new(row.hash, normalize_recorded(&row.path)))
        .filter(|record| record.path != manifest_name && !record.path.is_empty())
        .collect();

    let manifest_path = directory.join(manifest_name);
    write_atomic(&manifest_path, &records)
        .map_err(|e| ReconcileError::access(&manifest_path, e))?;

    info!(records = records.len(), manifest = %manifest_path.display(), "Exported bitrot database");
    Ok(records.len())
}

/// Decode `sqlite3 -json` output; an empty result prints nothing at all
fn decode_rows(stdout: &[u8]) -> Result<Vec<BitrotRow>> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        debug!("bitrot database is empty");
        return Ok(Vec::new());
    }
    serde_json::from_slice(stdout).context("Unexpected sqlite3 output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_decode_rows() -> Result<()> {
        let rows = decode_rows(
            br#"[{"hash":"aa11","path":"a.txt"},
{"hash":"bb22","path":"sub/b c.txt"}]
"#,
        )?;
        assert_eq!(
            rows,
            vec![
                BitrotRow {
                    hash: "aa11".to_string(),
                    path: "a.txt".to_string()
                },
                BitrotRow {
                    hash: "bb22".to_string(),
                    path: "sub/b c.txt".to_string()
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_decode_empty_and_garbage() {
        assert!(decode_rows(b"").unwrap().is_empty());
        assert!(decode_rows(b"\n").unwrap().is_empty());
        assert!(decode_rows(b"Error: no such table: bitrot").is_err());
    }

    #[test]
    fn test_export_without_database_is_access_error() {
        let temp = TempDir::new().unwrap();
        let err = export_database(temp.path(), "sqlite3", "checksums.txt").unwrap_err();
        assert!(matches!(err, ReconcileError::Access { .. }));
    }

    #[test]
    fn test_required_tools_depend_on_export() -> Result<()> {
        let config = Config::default();
        assert_eq!(
            BitrotTool::from_config(&config, false)?.required_tools(),
            vec!["bitrot"]
        );
        assert_eq!(
            BitrotTool::from_config(&config, true)?.required_tools(),
            vec!["bitrot", "sqlite3"]
        );
        Ok(())
    }

    /// Write an executable shell script standing in for an external tool
    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn test_run_and_export_with_fake_tools() -> Result<()> {
        let bin = TempDir::new()?;
        let target = TempDir::new()?;
        fs::write(target.path().join("a.txt"), "a")?;

        let bitrot = fake_tool(bin.path(), "bitrot", "touch .bitrot.db");
        let sqlite3 = fake_tool(
            bin.path(),
            "sqlite3",
            r#"echo '[{"hash":"aa11","path":"./a.txt"},{"hash":"ff00","path":"checksums.txt"}]'"#,
        );

        let mut config = Config::default();
        config.tools.bitrot = bitrot;
        config.tools.sqlite3 = sqlite3;
        let strategy = BitrotTool::from_config(&config, true)?;

        let report = strategy.reconcile(target.path())?;
        assert_eq!(report.exported, Some(1));
        assert!(report.added.is_empty());

        let manifest = Manifest::load(&target.path().join("checksums.txt"))?;
        assert_eq!(manifest.records(), &[ManifestRecord::new("aa11", "a.txt")]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_bitrot_aborts_directory() -> Result<()> {
        let bin = TempDir::new()?;
        let target = TempDir::new()?;

        let mut config = Config::default();
        config.tools.bitrot = fake_tool(bin.path(), "bitrot", "exit 1");
        let strategy = BitrotTool::from_config(&config, true)?;

        let err = strategy.reconcile(target.path()).unwrap_err();
        assert!(matches!(err, ReconcileError::ToolFailed { .. }));
        assert!(!target.path().join("checksums.txt").exists());
        Ok(())
    }
}
