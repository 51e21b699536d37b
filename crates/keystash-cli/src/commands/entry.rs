//! Entry command handlers

use anyhow::Result;
use serde_json::Value;

use crate::commands::{parse_json, write_failed, Stash};
use crate::output::Output;

/// Print the value under `key`, or the default
pub fn get(ls: &Stash, key: &str, default: Option<&str>, output: &Output) -> Result<()> {
    let default = match default {
        Some(raw) => parse_json(raw)?,
        None => Value::Null,
    };

    let present = ls.has(key);
    let value = ls.get(key, default);
    output.print_entry(key, &value, present);

    Ok(())
}

/// Store a JSON value under `key`
pub fn set(ls: &Stash, key: &str, raw: &str, output: &Output) -> Result<()> {
    let value = parse_json(raw)?;
    ls.set(key, value).map_err(write_failed)?;

    output.success(&format!("Set {}", key));
    Ok(())
}

/// Report whether `key` exists
pub fn has(ls: &Stash, key: &str, output: &Output) -> bool {
    let present = ls.has(key);

    if output.is_json() {
        println!("{}", serde_json::json!({"key": key, "present": present}));
    } else if !output.is_quiet() {
        println!("{}", present);
    }

    present
}

/// Append elements to the sequence under `key`
///
/// Each argument is one element, except a JSON array argument, which
/// contributes its elements.
pub fn append(ls: &Stash, key: &str, raw_values: &[String], output: &Output) -> Result<()> {
    let values = collect_elements(raw_values)?;
    let stored = ls.append_to_array(key, values).map_err(write_failed)?;

    output.print_entry(key, &Value::Array(stored), true);
    Ok(())
}

/// Add `by` to the integer under `key` (default 0)
pub fn incr(ls: &Stash, key: &str, by: i64, output: &Output) -> Result<()> {
    let value = ls
        .modify(key, 0i64, |n| n.saturating_add(by))
        .map_err(write_failed)?;

    output.print_entry(key, &Value::from(value), true);
    Ok(())
}

/// Flip the boolean under `key` (default false)
pub fn toggle(ls: &Stash, key: &str, output: &Output) -> Result<()> {
    let value = ls.modify(key, false, |b| !b).map_err(write_failed)?;

    output.print_entry(key, &Value::from(value), true);
    Ok(())
}

fn collect_elements(raw_values: &[String]) -> Result<Vec<Value>> {
    let mut elements = Vec::new();
    for raw in raw_values {
        match parse_json(raw)? {
            Value::Array(items) => elements.extend(items),
            other => elements.push(other),
        }
    }
    Ok(elements)
}
