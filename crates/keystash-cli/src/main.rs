//! keystash CLI
//!
//! Command-line interface over a file-backed keystash store.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keystash_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "keystash")]
#[command(about = "keystash - typed JSON values in a local key-value store")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        key: String,
        /// JSON value to print if the key is absent or unreadable
        #[arg(short, long)]
        default: Option<String>,
    },
    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON value (quote strings: '"text"')
        value: String,
    },
    /// Check whether a key exists (exit code 1 if not)
    Has { key: String },
    /// Append JSON elements to the array under a key
    Append {
        key: String,
        /// Elements to append; an array argument contributes its elements
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Add to the integer under a key
    Incr {
        key: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        by: i64,
    },
    /// Flip the boolean under a key
    Toggle { key: String },
    /// Show store location and size
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, store_file, quota_bytes, log_file)
        key: String,
        /// Configuration value ('none' to unset)
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let ls = commands::open_stash(&config, &output)?;

    match cli.command {
        Commands::Get { key, default } => {
            commands::entry::get(&ls, &key, default.as_deref(), &output)
        }
        Commands::Set { key, value } => commands::entry::set(&ls, &key, &value, &output),
        Commands::Has { key } => {
            if !commands::entry::has(&ls, &key, &output) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Append { key, values } => {
            commands::entry::append(&ls, &key, &values, &output)
        }
        Commands::Incr { key, by } => commands::entry::incr(&ls, &key, by, &output),
        Commands::Toggle { key } => commands::entry::toggle(&ls, &key, &output),
        Commands::Status => commands::status::show(&ls, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging to stderr, or to `log_file` if configured
///
/// `RUST_LOG` overrides the default filter.
fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("keystash_core={},keystash_cli={}", level, level))
    });

    if let Some(log_path) = &config.log_file {
        match File::create(log_path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(file)
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
