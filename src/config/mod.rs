pub mod parser;

use crate::utils::hash::HashAlgorithm;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// External binaries sumkeep delegates to
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
    /// Glob patterns (relative to the reconciled directory) never entered into a manifest
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Files at least this large are hashed through a memory map
    #[serde(default = "default_mmap_threshold")]
    pub mmap_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_bitrot")]
    pub bitrot: String,
    /// Extra arguments for `bitrot`, split with shell quoting rules
    #[serde(default)]
    pub bitrot_args: String,
    #[serde(default = "default_sqlite3")]
    pub sqlite3: String,
    #[serde(default = "default_seven_zip")]
    pub seven_zip: String,
    #[serde(default = "default_unrar")]
    pub unrar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of directories reconciled at once in batch mode
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            algorithm: HashAlgorithm::default(),
            follow_symlinks: default_follow_symlinks(),
            exclude_patterns: Vec::new(),
            mmap_threshold: default_mmap_threshold(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bitrot: default_bitrot(),
            bitrot_args: String::new(),
            sqlite3: default_sqlite3(),
            seven_zip: default_seven_zip(),
            unrar: default_unrar(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A default configuration is written first when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML or invalid values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, field) = key.split_once('.')?;

        match (section, field) {
            ("manifest", "file_name") => Some(self.manifest.file_name.clone()),
            ("manifest", "algorithm") => Some(self.manifest.algorithm.as_str().to_string()),
            ("manifest", "follow_symlinks") => Some(self.manifest.follow_symlinks.to_string()),
            ("manifest", "exclude_patterns") => Some(self.manifest.exclude_patterns.join(",")),
            ("manifest", "mmap_threshold") => Some(self.manifest.mmap_threshold.to_string()),
            ("tools", "bitrot") => Some(self.tools.bitrot.clone()),
            ("tools", "bitrot_args") => Some(self.tools.bitrot_args.clone()),
            ("tools", "sqlite3") => Some(self.tools.sqlite3.clone()),
            ("tools", "seven_zip") => Some(self.tools.seven_zip.clone()),
            ("tools", "unrar") => Some(self.tools.unrar.clone()),
            ("performance", "jobs") => Some(self.performance.jobs.to_string()),
            _ => None,
        }
    }

    /// Every key understood by [`Config::get`] and [`Config::set`], in display order
    #[must_use]
    pub const fn keys() -> &'static [&'static str] {
        &[
            "manifest.file_name",
            "manifest.algorithm",
            "manifest.follow_symlinks",
            "manifest.exclude_patterns",
            "manifest.mmap_threshold",
            "tools.bitrot",
            "tools.bitrot_args",
            "tools.sqlite3",
            "tools.seven_zip",
            "tools.unrar",
            "performance.jobs",
        ]
    }

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value is invalid for the key
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| anyhow::anyhow!("Invalid configuration key: {key}"))?;

        match (section, field) {
            ("manifest", "file_name") => {
                parser::validate_file_name(&value)?;
                self.manifest.file_name = value;
            }
            ("manifest", "algorithm") => self.manifest.algorithm = value.parse()?,
            ("manifest", "follow_symlinks") => {
                self.manifest.follow_symlinks = value
                    .parse()
                    .with_context(|| format!("Invalid boolean: {value}"))?;
            }
            ("manifest", "exclude_patterns") => {
                let patterns: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
                parser::validate_patterns(&patterns)?;
                self.manifest.exclude_patterns = patterns;
            }
            ("manifest", "mmap_threshold") => {
                self.manifest.mmap_threshold = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
            }
            ("tools", "bitrot") => self.tools.bitrot = value,
            ("tools", "bitrot_args") => {
                shell_words::split(&value)
                    .with_context(|| format!("Invalid argument string: {value}"))?;
                self.tools.bitrot_args = value;
            }
            ("tools", "sqlite3") => self.tools.sqlite3 = value,
            ("tools", "seven_zip") => self.tools.seven_zip = value,
            ("tools", "unrar") => self.tools.unrar = value,
            ("performance", "jobs") => {
                let jobs: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if jobs == 0 {
                    return Err(anyhow::anyhow!("Jobs must be at least 1"));
                }
                self.performance.jobs = jobs;
            }
            _ => return Err(anyhow::anyhow!("Unknown configuration key: {key}")),
        }
        Ok(())
    }

    /// Reset a configuration value to its default
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Self::default();
        let value = defaults
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {key}"))?;
        self.set(key, value)
    }
}

// Default functions for serde
fn default_file_name() -> String {
    crate::DEFAULT_MANIFEST_NAME.to_string()
}

const fn default_follow_symlinks() -> bool {
    true
}

const fn default_mmap_threshold() -> u64 {
    1_048_576 // 1MB
}

fn default_bitrot() -> String {
    "bitrot".to_string()
}

fn default_sqlite3() -> String {
    "sqlite3".to_string()
}

fn default_seven_zip() -> String {
    "7z".to_string()
}

fn default_unrar() -> String {
    "unrar".to_string()
}

const fn default_jobs() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default_config() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/config.toml");

        let config = Config::load(&path)?;
        assert!(path.exists());
        assert_eq!(config.manifest.file_name, "checksums.txt");
        assert_eq!(config.manifest.algorithm, HashAlgorithm::Sha256);
        assert!(config.manifest.follow_symlinks);
        assert_eq!(config.performance.jobs, 1);

        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set("manifest.algorithm", "xxh3".to_string())?;
        config.set("manifest.exclude_patterns", "*.tmp, .cache/**".to_string())?;
        config.set("tools.seven_zip", "7zz".to_string())?;
        config.save(&path)?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.manifest.algorithm, HashAlgorithm::Xxh3);
        assert_eq!(
            loaded.manifest.exclude_patterns,
            vec!["*.tmp".to_string(), ".cache/**".to_string()]
        );
        assert_eq!(loaded.get("tools.seven_zip").as_deref(), Some("7zz"));

        Ok(())
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        let algorithm = "crc32".to_string();
        assert!(config.set("manifest.algorithm", algorithm).is_err());
        assert!(config.set("performance.jobs", "0".to_string()).is_err());
        assert!(config.set("manifest.file_name", "a/b".to_string()).is_err());
        assert!(config.set("nosuchkey", "x".to_string()).is_err());
        assert!(config.set("core.pager", "less".to_string()).is_err());
    }

    #[test]
    fn test_unset_restores_default() -> Result<()> {
        let mut config = Config::default();
        config.set("performance.jobs", "4".to_string())?;
        config.unset("performance.jobs")?;
        assert_eq!(config.performance.jobs, 1);
        Ok(())
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = Config::default();
        for key in Config::keys() {
            assert!(config.get(key).is_some(), "missing getter for {key}");
        }
    }
}
