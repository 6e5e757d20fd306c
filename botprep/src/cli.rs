use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// botprep - recreate a bot project's Python environment, migrate, and launch it
#[derive(Parser, Debug)]
#[command(name = "botprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Defaults to `up`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Project directory (holds bot.py, .env, alembic.ini)
    #[arg(short = 'C', long, value_name = "DIR", env = "BOTPREP_PROJECT_DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Required interpreter version (default: from env or 3.10)
    #[arg(long, value_name = "VERSION", global = true)]
    pub python_version: Option<String>,

    /// Explicit interpreter executable instead of the versioned launcher
    #[arg(long, value_name = "PATH", global = true)]
    pub python: Option<PathBuf>,

    /// Environment directory, relative to the project directory (default: .venv)
    #[arg(long, value_name = "DIR", global = true)]
    pub venv_dir: Option<PathBuf>,

    /// YAML manifest (default: botprep.yaml in the project directory, if present)
    #[arg(long, value_name = "FILE", global = true)]
    pub manifest: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recreate the environment, install pinned deps, migrate, and launch
    Up(UpArgs),

    /// Print the commands `up` would run, without running anything
    Plan {
        /// Output as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Check the interpreter and whether the environment matches the pinned set
    Check,

    /// Remove the environment directory
    Clean {
        /// Show what would be removed
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpArgs {
    /// Continue past failed steps instead of stopping at the first one
    #[arg(long, default_value = "false")]
    pub keep_going: bool,

    /// Do not run database migrations
    #[arg(long, default_value = "false")]
    pub skip_migrate: bool,

    /// Stop after migrations instead of launching the entry point
    #[arg(long, default_value = "false")]
    pub no_launch: bool,
}
