//! botprep CLI library: argument parsing, config resolution, dispatch.

mod cli;
mod commands;

use anyhow::Result;
use botprep_core::config::{EnvSource, ObservabilityConfig};
use botprep_provision::ProvisionError;
use clap::Parser;
use cli::{Cli, Commands};

/// Parse args, run the command, and return the process exit code.
pub fn run_cli() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            exit_code_for(&e)
        }
    }
}

fn dispatch(cli: Cli) -> Result<i32> {
    let project_dir = commands::project_dir(&cli.global)?;
    let env = EnvSource::load(&project_dir);
    botprep_core::observability::init_tracing(&ObservabilityConfig::from_source(&env));
    tracing::debug!(project = %project_dir.display(), "Resolved project directory");

    match command_or_default(cli.command) {
        Commands::Up(args) => commands::up::cmd_up(&cli.global, project_dir, &env, &args),
        Commands::Plan { json } => commands::plan::cmd_plan(&cli.global, project_dir, &env, json),
        Commands::Check => commands::check::cmd_check(&cli.global, project_dir, &env),
        Commands::Clean { dry_run } => commands::clean::cmd_clean(&cli.global, project_dir, &env, dry_run),
    }
}

/// Bare `botprep` behaves like `botprep up`.
fn command_or_default(command: Option<Commands>) -> Commands {
    command.unwrap_or_else(|| Commands::Up(cli::UpArgs::default()))
}

/// Provisioning errors carry their own exit code; anything else is 1.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProvisionError>())
        .map(ProvisionError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use botprep_provision::Step;

    #[test]
    fn test_exit_code_for_wrapped_provision_error() {
        let err = Err::<(), _>(ProvisionError::StepFailed {
            step: Step::Migrate,
            code: Some(4),
        })
        .context("provisioning failed")
        .unwrap_err();
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn test_bare_invocation_runs_up() {
        let cli = Cli::try_parse_from(["botprep", "-C", "/srv/bot"]).unwrap();
        match command_or_default(cli.command) {
            Commands::Up(args) => {
                assert!(!args.keep_going);
                assert!(!args.skip_migrate);
                assert!(!args.no_launch);
            }
            other => panic!("expected up, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["botprep", "check"]).unwrap();
        assert!(matches!(command_or_default(cli.command), Commands::Check));
    }

    #[test]
    fn test_exit_code_for_other_errors() {
        let err = anyhow::anyhow!("bad manifest");
        assert_eq!(exit_code_for(&err), 1);
    }
}
