//! Canonicalize raw reasoning-service output into [`Proposal`]s.
//!
//! Accepted document shapes:
//! - `{"commits": [entry, ...]}`
//! - `[entry, ...]`
//! - `entry`
//!
//! where an entry is `{"message": "...", "files": [...]}` or
//! `{"messages": ["...", ...], "files": [...]}`. Malformed entries are dropped
//! and logged; only a document that is not an object or list at all is fatal.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::error::BatchError;
use crate::core::types::Proposal;

/// Parse `raw` as JSON and normalize it.
pub fn normalize_document(raw: &str) -> Result<Vec<Proposal>, BatchError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| BatchError::InvalidInput(format!("invalid JSON: {err}")))?;
    normalize_value(value)
}

/// Normalize an already-parsed document.
///
/// Returns [`BatchError::EmptyBatch`] when no entry survives.
pub fn normalize_value(value: Value) -> Result<Vec<Proposal>, BatchError> {
    let entries = unwrap_entries(value)?;
    let total = entries.len();
    let proposals: Vec<Proposal> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| normalize_entry(index, entry))
        .collect();
    debug!(total, kept = proposals.len(), "normalized proposals");
    if proposals.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    Ok(proposals)
}

fn unwrap_entries(value: Value) -> Result<Vec<Value>, BatchError> {
    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("commits") {
            Some(Value::Array(entries)) => Ok(entries),
            // A null `commits` reads as absent: the object is a single entry.
            None | Some(Value::Null) => Ok(vec![Value::Object(map)]),
            Some(other) => Err(BatchError::InvalidInput(format!(
                "\"commits\" must be a list, got {}",
                kind(&other)
            ))),
        },
        other => Err(BatchError::InvalidInput(format!(
            "expected an object or a list, got {}",
            kind(&other)
        ))),
    }
}

fn normalize_entry(index: usize, entry: Value) -> Option<Proposal> {
    let map = match entry {
        Value::Object(map) => map,
        other => {
            warn!(index, kind = kind(&other), "skipping non-object entry");
            return None;
        }
    };

    let messages = entry_messages(&map);
    if messages.is_empty() {
        warn!(index, "skipping entry without messages");
        return None;
    }

    let files = entry_files(&map);
    if files.is_empty() {
        warn!(index, messages = %messages.join(", "), "skipping entry with no files");
        return None;
    }

    Some(Proposal { files, messages })
}

/// `messages` wins when it yields anything usable; otherwise a single
/// `message` is lifted into a one-element list.
fn entry_messages(map: &Map<String, Value>) -> Vec<String> {
    let listed = map.get("messages").map(string_list).unwrap_or_default();
    if !listed.is_empty() {
        return listed;
    }
    match map.get("message") {
        Some(Value::String(message)) if !message.trim().is_empty() => vec![message.clone()],
        _ => Vec::new(),
    }
}

fn entry_files(map: &Map<String, Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    map.get("files")
        .map(string_list)
        .unwrap_or_default()
        .into_iter()
        .filter(|file| seen.insert(file.clone()))
        .collect()
}

/// Non-blank strings of a JSON list, in order. Anything else yields nothing.
fn string_list(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|item| !item.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
