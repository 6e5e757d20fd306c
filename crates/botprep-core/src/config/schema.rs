//! Configuration structs grouped by concern.
//!
//! Precedence: CLI flags (applied by the binary) > process env > `.env` >
//! manifest > built-in defaults.

use std::path::{Component, Path, PathBuf};

use super::env_keys::{observability as obv_keys, project};
use super::loader::EnvSource;
use super::manifest::{Manifest, MigrateSpec};
use crate::requirement::{self, Requirement, DEFAULT_TOOLING};
use crate::ConfigError;

pub const DEFAULT_PYTHON_VERSION: &str = "3.10";
pub const DEFAULT_VENV_DIR: &str = ".venv";
pub const DEFAULT_ENTRY_POINT: &str = "bot.py";

/// Logging configuration: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_source(env: &EnvSource) -> Self {
        Self {
            quiet: env.flag(obv_keys::BOTPREP_QUIET, &[], false),
            log_level: env.or(obv_keys::BOTPREP_LOG_LEVEL, &[], || {
                "botprep=info".to_string()
            }),
            log_json: env.flag(obv_keys::BOTPREP_LOG_JSON, &[], false),
        }
    }
}

/// An external program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// `alembic upgrade head`
    pub fn default_migrate() -> Self {
        Self {
            program: "alembic".to_string(),
            args: vec!["upgrade".to_string(), "head".to_string()],
        }
    }
}

impl From<MigrateSpec> for CommandSpec {
    fn from(spec: MigrateSpec) -> Self {
        Self {
            program: spec.program,
            args: spec.args,
        }
    }
}

/// Everything the provisioner needs, fully resolved.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    pub project_dir: PathBuf,
    /// Required interpreter version, e.g. `3.10`.
    pub python_version: String,
    /// Explicit interpreter executable; skips the versioned launcher.
    pub python: Option<PathBuf>,
    /// Environment location; relative paths are under `project_dir`.
    pub venv_dir: PathBuf,
    pub tooling: Vec<String>,
    pub requirements: Vec<Requirement>,
    pub migrate: CommandSpec,
    pub entry_point: String,
    pub entry_args: Vec<String>,
    /// Continue past failed steps instead of halting.
    pub keep_going: bool,
    pub skip_migrate: bool,
    pub launch: bool,
}

impl ProvisionConfig {
    pub fn resolve(
        project_dir: PathBuf,
        env: &EnvSource,
        manifest: Option<&Manifest>,
    ) -> Result<Self, ConfigError> {
        let manifest = manifest.cloned().unwrap_or_default();

        let python_version = env
            .optional(project::BOTPREP_PYTHON_VERSION, project::PYTHON_VERSION_ALIASES)
            .or(manifest.python_version)
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());
        validate_python_version(&python_version)?;

        let venv_dir = env
            .optional(project::BOTPREP_VENV_DIR, project::VENV_DIR_ALIASES)
            .map(PathBuf::from)
            .or(manifest.venv_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VENV_DIR));

        let requirements = match manifest.requirements {
            Some(lines) => requirement::parse_requirements(&lines)?,
            None => requirement::default_requirements(),
        };

        let tooling = manifest
            .tooling
            .unwrap_or_else(|| DEFAULT_TOOLING.iter().map(|s| s.to_string()).collect());

        let entry_point = env
            .optional(project::BOTPREP_ENTRY_POINT, &[])
            .or(manifest.entry_point)
            .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string());

        let config = Self {
            project_dir,
            python_version,
            python: env.optional(project::BOTPREP_PYTHON, &[]).map(PathBuf::from),
            venv_dir,
            tooling,
            requirements,
            migrate: manifest
                .migrate
                .map(CommandSpec::from)
                .unwrap_or_else(CommandSpec::default_migrate),
            entry_point,
            entry_args: manifest.entry_args.unwrap_or_default(),
            keep_going: env.flag(project::BOTPREP_KEEP_GOING, &[], false),
            skip_migrate: false,
            launch: true,
        };
        config.check_venv_path()?;
        Ok(config)
    }

    /// Absolute (or project-relative joined) environment path.
    pub fn venv_path(&self) -> PathBuf {
        if self.venv_dir.is_absolute() {
            self.venv_dir.clone()
        } else {
            self.project_dir.join(&self.venv_dir)
        }
    }

    /// The environment directory is removed recursively on every run, so it
    /// must not be the project directory or any of its ancestors.
    pub fn check_venv_path(&self) -> Result<(), ConfigError> {
        let venv = normalize(&self.venv_path());
        let project = normalize(&self.project_dir);
        let encloses_project = self.venv_dir.as_os_str().is_empty()
            || venv.as_os_str().is_empty()
            || project.starts_with(&venv)
            || match (venv.canonicalize(), project.canonicalize()) {
                (Ok(v), Ok(p)) => p.starts_with(v),
                _ => false,
            };
        if encloses_project {
            return Err(ConfigError::InvalidValue {
                key: project::BOTPREP_VENV_DIR.to_string(),
                value: self.venv_dir.display().to_string(),
            });
        }
        Ok(())
    }
}

/// Lexically drop `.` and resolve `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Accepts `3`, `3.10`, `3.10.12`.
pub fn validate_python_version(version: &str) -> Result<(), ConfigError> {
    let ok = !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: project::BOTPREP_PYTHON_VERSION.to_string(),
            value: version.to_string(),
        })
    }
}
