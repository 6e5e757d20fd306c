//! `botprep up`: the full run.

use std::path::PathBuf;

use anyhow::Result;
use botprep_core::config::{EnvSource, ProvisionConfig};
use botprep_provision::{CommandRunner, Provisioner, SystemRunner};

use crate::cli::{GlobalArgs, UpArgs};

/// Returns the launched application's exit code.
pub fn cmd_up(global: &GlobalArgs, project_dir: PathBuf, env: &EnvSource, args: &UpArgs) -> Result<i32> {
    let mut config = super::load_config(global, project_dir, env)?;
    apply_up_args(&mut config, args);

    eprintln!("🚀 Provisioning {}", config.project_dir.display());
    eprintln!();

    provision(Provisioner::new(config, SystemRunner))
}

/// `--keep-going` only ever turns keep-going on; the env setting survives an absent flag.
fn apply_up_args(config: &mut ProvisionConfig, args: &UpArgs) {
    config.keep_going |= args.keep_going;
    config.skip_migrate = args.skip_migrate;
    config.launch = !args.no_launch;
}

fn provision<R: CommandRunner>(provisioner: Provisioner<R>) -> Result<i32> {
    let report = provisioner.run()?;

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        eprintln!();
        eprintln!(
            "⚠ {} step(s) failed and were skipped over (--keep-going):",
            failures.len()
        );
        for f in &failures {
            eprintln!("  • {} ({:?})", f.step, f.outcome);
        }
    }
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::ScriptedRunner;
    use botprep_provision::{ProvisionError, Reporter, Step};

    fn project() -> (tempfile::TempDir, ProvisionConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bot.py"), "print('hi')\n").unwrap();
        let env = EnvSource::from_pairs([("BOTPREP_PYTHON", "/usr/bin/python3.10")]);
        let config = super::super::load_config(&GlobalArgs::default(), dir.path().to_path_buf(), &env).unwrap();
        (dir, config)
    }

    fn provisioner(config: ProvisionConfig, runner: &ScriptedRunner) -> Provisioner<&ScriptedRunner> {
        Provisioner::new(config, runner).with_reporter(Reporter::quiet())
    }

    #[test]
    fn test_up_flags_merge_into_config() {
        let (_dir, mut config) = project();
        apply_up_args(&mut config, &UpArgs::default());
        assert!(!config.keep_going);
        assert!(!config.skip_migrate);
        assert!(config.launch);

        apply_up_args(
            &mut config,
            &UpArgs {
                keep_going: true,
                skip_migrate: true,
                no_launch: true,
            },
        );
        assert!(config.keep_going);
        assert!(config.skip_migrate);
        assert!(!config.launch);
    }

    #[test]
    fn test_env_keep_going_survives_absent_flag() {
        let (_dir, mut config) = project();
        config.keep_going = true;
        apply_up_args(&mut config, &UpArgs::default());
        assert!(config.keep_going);
    }

    #[test]
    fn test_no_launch_skips_entry_point() {
        let (_dir, mut config) = project();
        apply_up_args(
            &mut config,
            &UpArgs {
                no_launch: true,
                skip_migrate: true,
                ..Default::default()
            },
        );
        let runner = ScriptedRunner::new("Python 3.10.12");
        assert_eq!(provision(provisioner(config, &runner)).unwrap(), 0);

        let programs = runner.argvs();
        assert!(!programs.iter().flatten().any(|a| a == "bot.py"));
        assert!(!programs.iter().flatten().any(|a| a == "alembic"));
        assert_eq!(programs.len(), 4);
    }

    #[test]
    fn test_keep_going_returns_app_code() {
        let (_dir, mut config) = project();
        apply_up_args(
            &mut config,
            &UpArgs {
                keep_going: true,
                ..Default::default()
            },
        );
        let runner = ScriptedRunner::new("Python 3.10.12")
            .fail_when("alembic", 2)
            .fail_when("bot.py", 7);
        assert_eq!(provision(provisioner(config, &runner)).unwrap(), 7);
    }

    #[test]
    fn test_halt_surfaces_step_exit_code() {
        let (_dir, config) = project();
        let runner = ScriptedRunner::new("Python 3.10.12").fail_when("alembic", 2);
        let err = provision(provisioner(config, &runner)).unwrap_err();
        let provision_err = err.downcast_ref::<ProvisionError>().unwrap();
        assert!(matches!(
            provision_err,
            ProvisionError::StepFailed {
                step: Step::Migrate,
                code: Some(2)
            }
        ));
        assert_eq!(crate::exit_code_for(&err), 2);
    }
}
