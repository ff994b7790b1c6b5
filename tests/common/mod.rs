#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated environment for running the `sumkeep` binary
///
/// The configuration lives inside the temp dir so tests never touch the real
/// home directory, and output is uncolored for plain string matching.
pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("data"))?;
        Ok(Self { temp_dir })
    }

    /// Directory the commands operate on
    pub fn data(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config/sumkeep.toml")
    }

    /// Write a configuration file before running a command
    pub fn write_config(&self, toml: &str) -> Result<()> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Create `relative` below the data directory with `content`
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.data().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Manifest contents of a directory below the data directory
    pub fn manifest(&self, relative_dir: &str) -> Result<String> {
        let path = manifest_in(&self.data().join(relative_dir));
        Ok(fs::read_to_string(path)?)
    }

    /// `sumkeep` with the isolated configuration
    pub fn cmd(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("sumkeep")?;
        cmd.env("SUMKEEP_CONFIG_PATH", self.config_path())
            .env("HOME", self.temp_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("SUMKEEP_LOG");
        Ok(cmd)
    }
}

pub fn manifest_in(dir: &Path) -> PathBuf {
    dir.join("checksums.txt")
}
