//! Optional `botprep.yaml` in the project directory.
//!
//! ```yaml
//! python_version: "3.11"
//! venv_dir: .venv
//! requirements:
//!   - python-telegram-bot==20.7
//!   - python-dotenv==1.0.1
//! migrate:
//!   program: alembic
//!   args: [upgrade, head]
//! entry_point: bot.py
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;

/// File names probed by [`Manifest::discover`], in order.
pub const MANIFEST_FILE_NAMES: &[&str] = &["botprep.yaml", "botprep.yml"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub python_version: Option<String>,
    pub venv_dir: Option<PathBuf>,
    pub tooling: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub migrate: Option<MigrateSpec>,
    pub entry_point: Option<String>,
    pub entry_args: Option<Vec<String>>,
}

/// Migration command run inside the environment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit, not a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::ParseManifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the first manifest found in `project_dir`, if any.
    pub fn discover(project_dir: &Path) -> Result<Option<Self>, ConfigError> {
        for name in MANIFEST_FILE_NAMES {
            let path = project_dir.join(name);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Using manifest");
                return Self::load(&path).map(Some);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
python_version: "3.11"
venv_dir: env
tooling: [pip]
requirements:
  - alembic==1.13.1
migrate:
  program: alembic
  args: [upgrade, head]
entry_point: bot_lp.py
entry_args: ["--polling"]
"#;
        let m = Manifest::parse(yaml, Path::new("botprep.yaml")).unwrap();
        assert_eq!(m.python_version.as_deref(), Some("3.11"));
        assert_eq!(m.venv_dir, Some(PathBuf::from("env")));
        assert_eq!(m.tooling, Some(vec!["pip".to_string()]));
        assert_eq!(
            m.migrate,
            Some(MigrateSpec {
                program: "alembic".into(),
                args: vec!["upgrade".into(), "head".into()],
            })
        );
        assert_eq!(m.entry_point.as_deref(), Some("bot_lp.py"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Manifest::parse("venv: .venv\n", Path::new("botprep.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseManifest { .. }));
    }

    #[test]
    fn test_discover_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Manifest::discover(dir.path()).unwrap(), None);
        std::fs::write(dir.path().join("botprep.yml"), "").unwrap();
        assert_eq!(
            Manifest::discover(dir.path()).unwrap(),
            Some(Manifest::default())
        );
    }
}
