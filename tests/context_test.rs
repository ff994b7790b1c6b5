use anyhow::Result;
use serial_test::serial;
use std::fs;
use sumkeep::config::Config;
use sumkeep::utils::hash::HashAlgorithm;
use sumkeep::{CONFIG_PATH_ENV, SumkeepContext};
use tempfile::TempDir;

#[test]
#[serial]
fn test_context_uses_config_path_override() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("nested/sumkeep.toml");

    unsafe {
        std::env::set_var(CONFIG_PATH_ENV, &config_path);
    }
    let ctx = SumkeepContext::new();
    unsafe {
        std::env::remove_var(CONFIG_PATH_ENV);
    }

    let ctx = ctx?;
    assert_eq!(ctx.config_path, config_path);
    assert!(config_path.exists(), "default configuration is written");
    assert_eq!(ctx.config.manifest.file_name, "checksums.txt");
    Ok(())
}

#[test]
#[serial]
fn test_context_falls_back_to_home() -> Result<()> {
    let temp = TempDir::new()?;
    let old_home = std::env::var_os("HOME");

    unsafe {
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::set_var("HOME", temp.path());
    }
    let ctx = SumkeepContext::new();
    unsafe {
        match old_home {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
    }

    let ctx = ctx?;
    assert_eq!(
        ctx.config_path,
        temp.path().join(".config/sumkeep/config.toml")
    );
    Ok(())
}

#[test]
fn test_existing_configuration_is_loaded() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("config.toml");
    fs::write(
        &config_path,
        "[manifest]\nalgorithm = \"xxh3\"\nfile_name = \"SHA256SUMS\"\n\n[performance]\njobs = 3\n",
    )?;

    let ctx = SumkeepContext::with_config_path(config_path)?;
    assert_eq!(ctx.config.manifest.algorithm, HashAlgorithm::Xxh3);
    assert_eq!(ctx.config.manifest.file_name, "SHA256SUMS");
    assert_eq!(ctx.config.performance.jobs, 3);
    // Untouched sections keep their defaults
    let defaults = Config::default();
    assert_eq!(ctx.config.tools.seven_zip, defaults.tools.seven_zip);
    Ok(())
}

#[test]
fn test_invalid_configuration_is_rejected() -> Result<()> {
    let temp = TempDir::new()?;
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "[performance]\njobs = 0\n")?;

    let err = SumkeepContext::with_config_path(config_path).unwrap_err();
    assert!(format!("{err:#}").contains("Jobs must be at least 1"));
    Ok(())
}
