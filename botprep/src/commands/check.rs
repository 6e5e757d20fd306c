//! `botprep check`: interpreter probe plus environment status.

use std::path::PathBuf;

use anyhow::{Context, Result};
use botprep_core::config::EnvSource;
use botprep_core::Requirement;
use botprep_provision::{CommandRunner, EnvStamp, Provisioner, SystemRunner, VenvLayout};

use crate::cli::GlobalArgs;

/// How the environment on disk relates to the configured pins.
#[derive(Debug)]
enum StampStatus {
    NoEnvironment,
    Unstamped,
    Matches(EnvStamp),
    Differs {
        removed: Vec<Requirement>,
        added: Vec<Requirement>,
    },
}

pub fn cmd_check(global: &GlobalArgs, project_dir: PathBuf, env: &EnvSource) -> Result<i32> {
    let config = super::load_config(global, project_dir, env)?;
    check(&Provisioner::new(config, SystemRunner))
}

fn check<R: CommandRunner>(provisioner: &Provisioner<R>) -> Result<i32> {
    provisioner.check_interpreter()?;

    let layout = provisioner.layout();
    let requirements = &provisioner.config().requirements;
    let root = layout.root().display();
    match stamp_status(layout, requirements)? {
        StampStatus::NoEnvironment => {
            eprintln!("ℹ No environment at {} (run `botprep up`)", root);
        }
        StampStatus::Matches(stamp) => {
            eprintln!(
                "✅ {} matches the {} pinned package(s) (installed {} with {})",
                root,
                requirements.len(),
                stamp.created_at.format("%Y-%m-%d %H:%M UTC"),
                stamp.interpreter
            );
        }
        StampStatus::Differs { removed, added } => {
            eprintln!("⚠ {} was built from a different requirement set:", root);
            for req in &removed {
                eprintln!("  - {}", req);
            }
            for req in &added {
                eprintln!("  + {}", req);
            }
        }
        StampStatus::Unstamped => {
            eprintln!("⚠ {} has no botprep stamp (incomplete or foreign environment)", root);
        }
    }
    Ok(0)
}

fn stamp_status(layout: &VenvLayout, requirements: &[Requirement]) -> Result<StampStatus> {
    if !layout.exists() {
        return Ok(StampStatus::NoEnvironment);
    }
    let status = match EnvStamp::read(layout.root()).context("Read environment stamp")? {
        None => StampStatus::Unstamped,
        Some(stamp) if stamp.matches(requirements) => StampStatus::Matches(stamp),
        Some(stamp) => StampStatus::Differs {
            removed: stamp
                .requirements
                .iter()
                .filter(|r| !requirements.contains(r))
                .cloned()
                .collect(),
            added: requirements
                .iter()
                .filter(|r| !stamp.requirements.contains(r))
                .cloned()
                .collect(),
        },
    };
    Ok(status)
}
