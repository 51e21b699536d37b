//! Command handlers

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::debug;

use keystash_core::{AccessError, Accessor, Config, DecodeFailure, FileStorage};

use crate::output::Output;

pub mod config;
pub mod entry;
pub mod status;

/// Accessor over the configured store file
pub type Stash = Accessor<FileStorage>;

/// Open the configured store, warning on stderr about unreadable entries
pub fn open_stash(config: &Config, output: &Output) -> Result<Stash> {
    let storage = FileStorage::from_config(config).map_err(|err| match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n{}", err, hint),
        None => anyhow!(err),
    })?;
    debug!(path = ?storage.path(), "Store opened");

    let warn_output = Output::new(output.format);
    Ok(Accessor::builder(storage)
        .on_decode_failure(move |failure| warn_output.warn(&decode_warning(failure)))
        .build())
}

fn decode_warning(failure: &DecodeFailure) -> String {
    format!(
        "Entry '{}' could not be read ({}); using default",
        failure.key, failure.error
    )
}

/// Parse a command-line argument as JSON
pub fn parse_json(arg: &str) -> Result<Value> {
    serde_json::from_str(arg).with_context(|| {
        format!(
            "Invalid JSON value: {}\nStrings must be quoted, e.g. '\"text\"'",
            arg
        )
    })
}

/// Turn a rejected write into an error carrying the recovery suggestion
pub fn write_failed(err: AccessError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n{}", err, hint),
        None => anyhow!(err),
    }
}
