//! External tool discovery and invocation.
//!
//! Sumkeep never implements archive codecs or the bit-rot database itself; it
//! runs the configured binaries. Tools are looked up on `PATH` before any
//! directory is touched so a missing binary fails the whole command early.

use crate::error::ReconcileError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// Resolve a tool name (or explicit path) to an executable
///
/// # Errors
///
/// Returns `ReconcileError::ToolMissing` if the binary cannot be found.
pub fn require(tool: &str) -> Result<PathBuf, ReconcileError> {
    which::which(tool).map_err(|_| ReconcileError::ToolMissing {
        tool: tool.to_string(),
    })
}

/// Resolve every tool in `tools`, failing on the first missing one
///
/// # Errors
///
/// Returns `ReconcileError::ToolMissing` for the first binary not found.
pub fn require_all<'a>(tools: impl IntoIterator<Item = &'a str>) -> Result<(), ReconcileError> {
    for tool in tools {
        let resolved = require(tool)?;
        debug!(tool, path = %resolved.display(), "Found external tool");
    }
    Ok(())
}

/// Build a command for `tool` running inside `dir` with no stdin
fn command<I, S>(dir: &Path, tool: &str, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(tool);
    cmd.args(args).current_dir(dir).stdin(Stdio::null());
    cmd
}

/// Run `tool` in `dir`, letting it write directly to the terminal
///
/// # Errors
///
/// Returns `ToolMissing` if it cannot be spawned because it does not exist,
/// `ToolFailed` if it cannot be spawned otherwise or exits unsuccessfully.
pub fn run_inherited<I, S>(dir: &Path, tool: &str, args: I) -> Result<(), ReconcileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!(tool, dir = %dir.display(), "Running external tool");
    let status = command(dir, tool, args)
        .status()
        .map_err(|e| spawn_error(tool, &e))?;

    if status.success() {
        Ok(())
    } else {
        Err(ReconcileError::tool_failed(tool, status))
    }
}

/// Run `tool` in `dir` and capture its output
///
/// # Errors
///
/// Returns `ToolMissing`/`ToolFailed` as [`run_inherited`] does; a non-zero
/// exit carries the tool's stderr in the message.
pub fn run_captured<I, S>(dir: &Path, tool: &str, args: I) -> Result<Output, ReconcileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!(tool, dir = %dir.display(), "Running external tool (captured)");
    let output = command(dir, tool, args)
        .output()
        .map_err(|e| spawn_error(tool, &e))?;

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        let message = if detail.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {detail}", output.status)
        };
        Err(ReconcileError::tool_failed(tool, message))
    }
}

/// Map a spawn failure to the error taxonomy
fn spawn_error(tool: &str, error: &std::io::Error) -> ReconcileError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ReconcileError::ToolMissing {
            tool: tool.to_string(),
        }
    } else {
        ReconcileError::tool_failed(tool, error)
    }
}
