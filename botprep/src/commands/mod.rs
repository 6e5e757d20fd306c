//! Command handlers.
//!
//!   up: the full provisioning run (default command)
//!   plan: print the invocations without running them
//!   check: interpreter probe + environment stamp status
//!   clean: remove the environment directory

pub mod check;
pub mod clean;
pub mod plan;
pub mod up;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::{Context, Result};
use botprep_core::config::{EnvSource, Manifest, ProvisionConfig};
use botprep_core::config::schema::validate_python_version;

use crate::cli::GlobalArgs;

/// `-C` / `BOTPREP_PROJECT_DIR`, else the current directory; made absolute.
pub fn project_dir(global: &GlobalArgs) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let dir = match global.project_dir {
        Some(ref d) if d.is_absolute() => d.clone(),
        Some(ref d) => cwd.join(d),
        None => cwd,
    };
    if !dir.is_dir() {
        anyhow::bail!("Project directory {} does not exist", dir.display());
    }
    Ok(dir)
}

/// Resolve the layered config and apply CLI overrides on top.
pub fn load_config(global: &GlobalArgs, project_dir: PathBuf, env: &EnvSource) -> Result<ProvisionConfig> {
    let manifest = match global.manifest {
        Some(ref path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                project_dir.join(path)
            };
            Some(Manifest::load(&path)?)
        }
        None => Manifest::discover(&project_dir)?,
    };

    let mut config = ProvisionConfig::resolve(project_dir, env, manifest.as_ref())
        .context("Invalid configuration")?;

    if let Some(ref version) = global.python_version {
        validate_python_version(version)?;
        config.python_version = version.clone();
    }
    if let Some(ref python) = global.python {
        config.python = Some(python.clone());
    }
    if let Some(ref venv_dir) = global.venv_dir {
        config.venv_dir = venv_dir.clone();
    }
    config.check_venv_path().context("Invalid configuration")?;
    tracing::debug!(?config, "Resolved configuration");
    Ok(config)
}
