//! `botprep-stamp.json`: what was installed into an environment.
//!
//! Written after a clean install and read back by `botprep check` to tell
//! whether the environment still matches the pinned set.

use std::io;
use std::path::{Path, PathBuf};

use botprep_core::Requirement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const STAMP_FILE: &str = "botprep-stamp.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvStamp {
    pub interpreter: String,
    pub requirements: Vec<Requirement>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl EnvStamp {
    pub fn new(interpreter: &str, requirements: &[Requirement]) -> Self {
        Self {
            interpreter: interpreter.to_string(),
            requirements: requirements.to_vec(),
            fingerprint: fingerprint(requirements),
            created_at: Utc::now(),
        }
    }

    pub fn path(env_root: &Path) -> PathBuf {
        env_root.join(STAMP_FILE)
    }

    pub fn write(&self, env_root: &Path) -> io::Result<PathBuf> {
        let path = Self::path(env_root);
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// `Ok(None)` when the environment has no stamp.
    pub fn read(env_root: &Path) -> io::Result<Option<Self>> {
        let content = match std::fs::read_to_string(Self::path(env_root)) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn matches(&self, requirements: &[Requirement]) -> bool {
        self.fingerprint == fingerprint(requirements)
    }
}

/// SHA-256 over the sorted, name-normalized pins; independent of list order.
pub fn fingerprint(requirements: &[Requirement]) -> String {
    let mut lines: Vec<String> = requirements
        .iter()
        .map(|r| format!("{}=={}", normalize_name(&r.name), r.version))
        .collect();
    lines.sort();
    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Package index name normalization: lowercase, runs of `-_.` become `-`.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_sep {
                out.push('-');
            }
            last_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use botprep_core::requirement::default_requirements;

    #[test]
    fn test_fingerprint_ignores_order_and_name_style() {
        let a = vec![Requirement::new("SQLAlchemy", "2.0.23"), Requirement::new("python_dotenv", "1.0.1")];
        let b = vec![Requirement::new("python-dotenv", "1.0.1"), Requirement::new("sqlalchemy", "2.0.23")];
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);

        let c = vec![Requirement::new("sqlalchemy", "2.0.24"), Requirement::new("python-dotenv", "1.0.1")];
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EnvStamp::read(dir.path()).unwrap(), None);

        let reqs = default_requirements();
        let stamp = EnvStamp::new("Python 3.10.12", &reqs);
        let path = stamp.write(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(STAMP_FILE));

        let read = EnvStamp::read(dir.path()).unwrap().unwrap();
        assert_eq!(read, stamp);
        assert!(read.matches(&reqs));
        assert!(!read.matches(&reqs[..4]));
    }

    #[test]
    fn test_corrupt_stamp_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STAMP_FILE), "{not json").unwrap();
        let err = EnvStamp::read(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
