//! Status command handler

use anyhow::Result;

use crate::commands::Stash;
use crate::output::{Output, OutputFormat};

/// Show store file location and size
pub fn show(ls: &Stash, output: &Output) -> Result<()> {
    let storage = ls.storage();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "store_path": storage.path(),
                    "store_exists": storage.exists(),
                    "entries": storage.len(),
                    "size_bytes": storage.size_bytes(),
                    "quota_bytes": storage.quota(),
                    "keys": storage.keys()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", storage.len());
        }
        OutputFormat::Human => {
            println!("keystash Status");
            println!("===============");
            println!();
            println!("Store:");
            println!("  Location: {}", storage.path().display());
            if !storage.exists() {
                println!("  (not created yet)");
            }
            println!();
            println!("Contents:");
            println!("  Entries: {}", storage.len());
            println!("  Size:    {}", format_size(storage.size_bytes()));
            match storage.quota() {
                Some(limit) => println!("  Quota:   {}", format_size(limit)),
                None => println!("  Quota:   (unlimited)"),
            }
        }
    }

    Ok(())
}

/// Human-readable byte count
fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
