//! Mapfile reader.
//!
//! A mapfile is an ordered list of `{host, file, skip}` records. The
//! pipeline writes them as Python literals; older runs and test fixtures
//! use JSON. Both are accepted.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{ReadOutcome, outcome_from_io};

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid entry regex"));

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"](\w+)['"]\s*:\s*('(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|True|False|None|true|false|null|-?[\d.]+)"#)
        .expect("valid field regex")
});

/// One record of a mapfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub host: String,
    /// Value field; for verification mapfiles this is a literal boolean
    pub file: String,
    pub skip: bool,
}

impl MapEntry {
    /// True only for the literal boolean `True` (or JSON `true`)
    pub fn is_literal_true(&self) -> bool {
        matches!(self.file.trim(), "True" | "true")
    }
}

#[derive(Deserialize)]
struct JsonEntry {
    host: String,
    file: serde_json::Value,
    #[serde(default)]
    skip: bool,
}

/// Read a mapfile into its entries
pub fn read_mapfile(path: &Path) -> ReadOutcome<Vec<MapEntry>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return outcome_from_io(e),
    };

    match parse_mapfile(&content) {
        Ok(entries) => ReadOutcome::Present(entries),
        Err(reason) => {
            log::debug!("Mapfile {} not parsable: {}", path.display(), reason);
            ReadOutcome::Malformed(reason)
        }
    }
}

/// Read a verification mapfile: one literal boolean per host.
///
/// Returns `(host, passed)` pairs. Callers decide what absence means; for
/// the self-calibration gate it means "not verified".
pub fn read_verification(path: &Path) -> ReadOutcome<Vec<(String, bool)>> {
    read_mapfile(path).map(|entries| {
        entries
            .into_iter()
            .map(|entry| {
                let passed = entry.is_literal_true();
                (entry.host, passed)
            })
            .collect()
    })
}

/// Parse mapfile text in either Python-literal or JSON form
pub fn parse_mapfile(content: &str) -> std::result::Result<Vec<MapEntry>, String> {
    let trimmed = content.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return Err("mapfile is not a complete list".to_string());
    }

    if let Ok(entries) = serde_json::from_str::<Vec<JsonEntry>>(trimmed) {
        return Ok(entries
            .into_iter()
            .map(|e| MapEntry {
                host: e.host,
                file: json_value_text(&e.file),
                skip: e.skip,
            })
            .collect());
    }

    let mut entries = Vec::new();
    for caps in ENTRY_RE.captures_iter(trimmed) {
        let body = &caps[1];
        let mut host = None;
        let mut file = None;
        let mut skip = false;
        for field in FIELD_RE.captures_iter(body) {
            let value = unquote(&field[2]);
            match &field[1] {
                "host" => host = Some(value),
                "file" => file = Some(value),
                "skip" => skip = matches!(value.as_str(), "True" | "true"),
                _ => {}
            }
        }
        match (host, file) {
            (Some(host), Some(file)) => entries.push(MapEntry { host, file, skip }),
            _ => return Err(format!("mapfile entry missing host or file: {{{}}}", body)),
        }
    }

    let inner = trimmed[1..trimmed.len() - 1].trim();
    if entries.is_empty() && !inner.is_empty() {
        return Err("mapfile has content but no entries".to_string());
    }

    Ok(entries)
}

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\'')) || (raw.starts_with('"') && raw.ends_with('"')));
    if quoted {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}

fn json_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}
