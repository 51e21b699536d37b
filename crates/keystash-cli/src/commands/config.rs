//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use keystash_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "store_file": config.store_file,
                    "store_path": config.store_path(),
                    "quota_bytes": config.quota_bytes,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.store_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:    {}", config.data_dir.display());
            println!("  store_file:  {}", config.store_file);
            println!(
                "  quota_bytes: {}",
                config
                    .quota_bytes
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "  log_file:    {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);

    // Edit the file's own contents; env overrides must not be persisted
    let mut config = Config::read_file(&save_path).context("Failed to load configuration")?;
    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let unset = value.is_empty() || value == "none";

    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "store_file" => {
            if unset {
                bail!("store_file cannot be empty");
            }
            config.store_file = value.to_string();
        }
        "quota_bytes" => {
            config.quota_bytes = if unset {
                None
            } else {
                Some(
                    value
                        .parse()
                        .context("Invalid value for quota_bytes. Use a byte count or 'none'.")?,
                )
            };
        }
        "log_file" => {
            config.log_file = if unset { None } else { Some(value.into()) };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, store_file, quota_bytes, log_file",
                key
            );
        }
    }

    Ok(())
}
