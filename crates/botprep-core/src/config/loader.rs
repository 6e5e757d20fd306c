//! Layered environment lookup.
//!
//! The project's `.env` is parsed into a map and never written into the
//! process environment; process variables take precedence over it.

use std::collections::HashMap;
use std::path::Path;

/// Snapshot of the variables visible to botprep: `.env` entries overlaid by
/// the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Load `<project_dir>/.env` (if present) and overlay the process environment.
    pub fn load(project_dir: &Path) -> Self {
        let mut vars: HashMap<String, String> = std::fs::read_to_string(project_dir.join(".env"))
            .map(|content| parse_dotenv(&content).into_iter().collect())
            .unwrap_or_default();
        if !vars.is_empty() {
            tracing::debug!(count = vars.len(), "Loaded .env entries");
        }
        vars.extend(std::env::vars());
        Self { vars }
    }

    /// Build a source from explicit pairs, later pairs winning.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Primary key or first set alias; blank values count as unset.
    pub fn optional(&self, primary: &str, aliases: &[&str]) -> Option<String> {
        std::iter::once(primary)
            .chain(aliases.iter().copied())
            .find_map(|k| {
                let v = self.vars.get(k)?.trim();
                if v.is_empty() {
                    None
                } else {
                    Some(v.to_string())
                }
            })
    }

    /// Like [`optional`](Self::optional), falling back to `default`.
    pub fn or<F>(&self, primary: &str, aliases: &[&str], default: F) -> String
    where
        F: FnOnce() -> String,
    {
        self.optional(primary, aliases).unwrap_or_else(default)
    }

    /// 1/true/yes/on are true, 0/false/no/off are false; anything else is true.
    pub fn flag(&self, primary: &str, aliases: &[&str], default: bool) -> bool {
        match self.optional(primary, aliases) {
            Some(s) => !matches!(
                s.to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
            None => default,
        }
    }
}

/// Parse `.env` content into key/value pairs.
///
/// Handles comments, `export ` prefixes, matching quotes and unquoted inline
/// `#` comments.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            out.push((key.to_string(), value.to_string()));
        }
    }
    out
}
