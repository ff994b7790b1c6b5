use super::Config;
use anyhow::{Context, Result};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;

/// Parse and validate a configuration file
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid UTF-8 or TOML,
/// or holds invalid values.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)?;

    if metadata.len() < 4096 {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config_str(&content)
    } else {
        // Large file - use memory mapping
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let content = simdutf8::basic::from_utf8(&mmap)
            .map_err(|e| anyhow::anyhow!("Invalid UTF-8 in config file: {e}"))?;

        parse_config_str(content)
    }
}

/// Parse configuration from TOML text
///
/// # Errors
///
/// Returns an error if the text is not valid TOML or holds invalid values.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    validate_file_name(&config.manifest.file_name)?;
    validate_patterns(&config.manifest.exclude_patterns)?;

    if config.performance.jobs == 0 {
        anyhow::bail!("Jobs must be at least 1");
    }

    shell_words::split(&config.tools.bitrot_args)
        .with_context(|| format!("Invalid bitrot_args: {}", config.tools.bitrot_args))?;

    for (key, binary) in [
        ("bitrot", &config.tools.bitrot),
        ("sqlite3", &config.tools.sqlite3),
        ("seven_zip", &config.tools.seven_zip),
        ("unrar", &config.tools.unrar),
    ] {
        if binary.trim().is_empty() {
            anyhow::bail!("Tool '{key}' must not be empty");
        }
    }

    Ok(())
}

/// Manifest names are plain file names, never paths
///
/// # Errors
///
/// Returns an error if the name is empty, a dot entry, or contains a separator.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        anyhow::bail!("Invalid manifest file name: '{name}'");
    }
    if name.contains('/') || name.contains('\\') {
        anyhow::bail!("Manifest file name must not contain a path separator: '{name}'");
    }
    Ok(())
}

/// Check that every exclude pattern compiles
///
/// # Errors
///
/// Returns an error naming the first invalid glob pattern.
pub fn validate_patterns(patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::HashAlgorithm;

    #[test]
    fn test_partial_config_uses_defaults() -> Result<()> {
        let config = parse_config_str("[manifest]\nalgorithm = \"xxh3\"\n")?;
        assert_eq!(config.manifest.algorithm, HashAlgorithm::Xxh3);
        assert_eq!(config.manifest.file_name, "checksums.txt");
        assert_eq!(config.tools.bitrot, "bitrot");
        Ok(())
    }

    #[test]
    fn test_empty_config_is_valid() -> Result<()> {
        let config = parse_config_str("")?;
        assert_eq!(config.performance.jobs, 1);
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() {
        for input in [
            "[performance]\njobs = 0\n",
            "[manifest]\nfile_name = \"../x\"\n",
            "[manifest]\nexclude_patterns = [\"[\"]\n",
            "[manifest]\nalgorithm = \"md4\"\n",
            "[tools]\nbitrot_args = \"'unterminated\"\n",
            "[tools]\nunrar = \"\"\n",
        ] {
            assert!(parse_config_str(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_large_config_is_memory_mapped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("big.toml");

        let mut content = String::from("[manifest]\nexclude_patterns = [\n");
        for i in 0..500 {
            content.push_str(&format!("  \"cache_{i}/**\",\n"));
        }
        content.push_str("]\n");
        std::fs::write(&path, &content)?;

        let config = parse_config_file(&path)?;
        assert_eq!(config.manifest.exclude_patterns.len(), 500);
        Ok(())
    }
}
