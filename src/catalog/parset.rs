//! Minimal reader for pipeline parset files.
//!
//! A parset is a flat list of `key = value` lines with dotted keys. Only the
//! subset needed to resolve step declarations is supported: scalar strings
//! and bracketed string vectors. `#` starts a comment anywhere outside
//! quotes.

use std::fs;
use std::path::Path;

use crate::artifact::ReadOutcome;

/// Parsed parset, keys kept in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parset {
    entries: Vec<(String, String)>,
}

impl Parset {
    /// Parse parset text. Later duplicates of a key override earlier ones.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                existing.1 = value;
            } else {
                entries.push((key, value));
            }
        }
        Self { entries }
    }

    /// Read a parset from disk
    pub fn from_file(path: &Path) -> ReadOutcome<Self> {
        match fs::read_to_string(path) {
            Ok(text) => ReadOutcome::Present(Self::parse(&text)),
            Err(e) => crate::artifact::outcome_from_io(e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Resolve a short module name to its fully-qualified key prefix.
    ///
    /// `pipeline` resolves to `pipeline` when keys start with it, or to e.g.
    /// `ObsSW.pipeline` when that is the first key containing it as a
    /// component.
    pub fn full_module_name(&self, name: &str) -> Option<String> {
        let direct = format!("{}.", name);
        if self.entries.iter().any(|(k, _)| k.starts_with(&direct)) {
            return Some(name.to_string());
        }

        for (key, _) in &self.entries {
            let components: Vec<&str> = key.split('.').collect();
            // The last component is a leaf, never a module
            if let Some(idx) = components[..components.len().saturating_sub(1)]
                .iter()
                .position(|c| *c == name)
            {
                return Some(components[..=idx].join("."));
            }
        }
        None
    }

    /// Look up `<module>.<path>` with the module name fully qualified
    pub fn module_value(&self, module: &str, path: &str) -> Option<&str> {
        let prefix = self.full_module_name(module)?;
        self.get(&format!("{}.{}", prefix, path))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| unquote(v).to_string())
    }

    pub fn get_string_vector(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(parse_vector)
    }
}

/// Parse `[a, 'b', "c"]` into its items. A bare scalar is a one-item vector.
pub fn parse_vector(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    inner
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Drop a `#` comment, ignoring `#` inside quoted strings
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return &line[..idx],
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if open == c => quote = None,
            _ => {}
        }
    }
    line
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
