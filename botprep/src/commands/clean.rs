//! `botprep clean`: remove the environment directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use botprep_core::config::EnvSource;
use botprep_provision::VenvLayout;

use crate::cli::GlobalArgs;

pub fn cmd_clean(global: &GlobalArgs, project_dir: PathBuf, env: &EnvSource, dry_run: bool) -> Result<i32> {
    let config = super::load_config(global, project_dir, env)?;
    let layout = VenvLayout::new(config.venv_path());

    if !layout.exists() {
        eprintln!("No environment found at {}", layout.root().display());
        return Ok(0);
    }

    let size = dir_size(layout.root());
    eprintln!("🗂  Environment {} ({})", layout.root().display(), format_size(size));

    if dry_run {
        eprintln!("(Dry run: nothing removed. Drop --dry-run to delete.)");
        return Ok(0);
    }

    layout
        .remove()
        .with_context(|| format!("Failed to remove {}", layout.root().display()))?;
    tracing::info!(path = %layout.root().display(), "Removed environment");
    eprintln!("✓ Removed {}, freed {}", layout.root().display(), format_size(size));
    Ok(0)
}

/// Total size of regular files under `path`; symlinks are not followed.
fn dir_size(path: &Path) -> u64 {
    let mut total: u64 = 0;
    if let Ok(entries) = fs::read_dir(path) {
        for entry in entries.flatten() {
            let Ok(meta) = entry.path().symlink_metadata() else {
                continue;
            };
            if meta.is_dir() {
                total += dir_size(&entry.path());
            } else {
                total += meta.len();
            }
        }
    }
    total
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
