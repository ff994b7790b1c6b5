//! Append-only manifest writer.
//!
//! The writer holds an exclusive advisory lock on the manifest for as long as
//! it lives, so two reconciliations of the same directory cannot interleave
//! their appends. Every record is written with a single `write_all` of the
//! complete line; an interrupted run leaves all earlier lines intact.

use super::ManifestRecord;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive, append-only handle on a manifest file
#[derive(Debug)]
pub struct ManifestWriter {
    /// Open manifest, in append mode
    file: File,
    /// Manifest location (for error messages)
    path: PathBuf,
    /// Records appended through this handle
    appended: usize,
}

impl ManifestWriter {
    /// Open (creating if needed) and lock a manifest for appending
    ///
    /// If a previous run was interrupted mid-line, the incomplete last line is
    /// cut off first so the next record starts on a line of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created, is locked by
    /// another process, or cannot be truncated.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open manifest {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(true) => {}
            Ok(false) => {
                anyhow::bail!("Manifest {} is locked by another process", path.display());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to lock manifest {}", path.display()));
            }
        }

        let mut writer = Self {
            file,
            path: path.to_path_buf(),
            appended: 0,
        };
        writer.discard_torn_line()?;
        Ok(writer)
    }

    /// Drop an unterminated last line left behind by an interrupted run
    ///
    /// The fragment is the record that was being written when the run died;
    /// its file is still unrecorded and will be hashed again.
    fn discard_torn_line(&mut self) -> Result<()> {
        let len = self.file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }

        let mut last = [0u8; 1];
        self.file.seek(SeekFrom::End(-1))?;
        self.file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(());
        }

        let mut content = Vec::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut content)?;

        let keep = content
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        warn!(
            manifest = %self.path.display(),
            discarded = %String::from_utf8_lossy(&content[keep..]),
            "Manifest ends with an incomplete line, discarding it"
        );
        self.file
            .set_len(keep as u64)
            .with_context(|| format!("Failed to truncate manifest {}", self.path.display()))?;
        Ok(())
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the line cannot be written.
    pub fn append(&mut self, record: &ManifestRecord) -> io::Result<()> {
        self.file.write_all(record.to_line().as_bytes())?;
        self.file.flush()?;
        self.appended += 1;
        Ok(())
    }

    /// Number of records appended through this handle
    #[must_use]
    pub const fn appended(&self) -> usize {
        self.appended
    }

    /// Flush appended data to stable storage and release the lock
    ///
    /// # Errors
    ///
    /// Returns an error if syncing fails.
    pub fn finish(self) -> Result<()> {
        if self.appended > 0 {
            self.file
                .sync_data()
                .with_context(|| format!("Failed to sync manifest {}", self.path.display()))?;
        }
        debug!(manifest = %self.path.display(), appended = self.appended, "Manifest closed");
        Ok(())
    }
}

/// Replace a manifest with `records` in one atomic rename
///
/// Used where another tool's database is authoritative and the manifest is a
/// transcription of it, never for reconciliation.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// renamed over `path`.
pub fn write_atomic(path: &Path, records: &[ManifestRecord]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    {
        let mut out = io::BufWriter::new(temp.as_file_mut());
        for record in records {
            out.write_all(record.to_line().as_bytes())?;
        }
        out.flush()?;
    }
    temp.as_file().sync_data()?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace manifest {}", path.display()))?;
    Ok(())
}
