//! `botprep plan`: show what `up` would run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use botprep_core::config::EnvSource;
use botprep_provision::{Provisioner, SystemRunner};

use crate::cli::GlobalArgs;

pub fn cmd_plan(global: &GlobalArgs, project_dir: PathBuf, env: &EnvSource, json: bool) -> Result<i32> {
    let config = super::load_config(global, project_dir, env)?;
    let plan = Provisioner::new(config, SystemRunner).plan()?;

    if json {
        let out = serde_json::to_string_pretty(&plan).context("Serialize plan")?;
        println!("{}", out);
    } else {
        for entry in &plan {
            println!("{}. {:<24} {}", entry.ordinal, entry.step.label(), entry.action);
        }
    }
    Ok(0)
}
