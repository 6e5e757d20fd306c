//! The provisioning procedure.
//!
//! Flow:
//!   1. Probe for the required interpreter; abort (exit 1) when absent
//!   2. Remove the existing environment directory, if any
//!   3. `python -m venv <dir>`
//!   4. Compute the activation context ([`ActivatedEnv`])
//!   5. `pip install --upgrade pip setuptools wheel`
//!   6. `pip install` the pinned set in one call
//!   7. Migration command (`alembic upgrade head`)
//!   8. Launch the entry point in the foreground
//!
//! Nothing before step 2 touches the filesystem.

use std::ffi::OsString;

use botprep_core::config::ProvisionConfig;
use serde::Serialize;

use crate::error::ProvisionError;
use crate::interpreter::{InterpreterProbe, InterpreterVersion};
use crate::reporter::Reporter;
use crate::runner::{CommandRunner, Invocation};
use crate::stamp::EnvStamp;
use crate::step::Step;
use crate::venv::{ActivatedEnv, VenvLayout};

/// What to do when an external command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failed step.
    #[default]
    Halt,
    /// Log the failure and carry on to the next step, up to launch.
    Continue,
}

impl FailurePolicy {
    pub fn from_keep_going(keep_going: bool) -> Self {
        if keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Halt
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
    /// Tolerated failure under [`FailurePolicy::Continue`]. `code` is `None`
    /// when the process was killed or never started.
    Failed { code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub interpreter: InterpreterVersion,
    pub steps: Vec<StepRecord>,
    /// Exit status of the launched application; `None` when not launched.
    pub app_exit: Option<Option<i32>>,
}

impl ProvisionReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Failed { .. }))
    }

    pub fn outcome(&self, step: Step) -> Option<StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| r.outcome)
    }

    /// The launched application's exit code (1 if it died from a signal).
    /// Without a launch: the first tolerated failure's code, else 0.
    pub fn exit_code(&self) -> i32 {
        match self.app_exit {
            Some(code) => code.unwrap_or(1),
            None => match self.failures().next() {
                Some(StepRecord {
                    outcome: StepOutcome::Failed { code },
                    ..
                }) => code.filter(|c| *c != 0).unwrap_or(1),
                _ => 0,
            },
        }
    }
}

/// One line of `botprep plan`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub ordinal: usize,
    pub step: Step,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argv: Option<Vec<String>>,
}

impl PlanEntry {
    fn command(step: Step, invocation: &Invocation) -> Self {
        Self {
            ordinal: step.ordinal(),
            step,
            action: invocation.to_string(),
            argv: Some(invocation.argv()),
        }
    }

    fn note(step: Step, action: String) -> Self {
        Self {
            ordinal: step.ordinal(),
            step,
            action,
            argv: None,
        }
    }
}

pub struct Provisioner<R: CommandRunner> {
    config: ProvisionConfig,
    runner: R,
    reporter: Reporter,
    policy: FailurePolicy,
    probe: InterpreterProbe,
    layout: VenvLayout,
    inherited_path: Option<OsString>,
}

impl<R: CommandRunner> Provisioner<R> {
    pub fn new(config: ProvisionConfig, runner: R) -> Self {
        let probe = InterpreterProbe::new(&config.python_version, config.python.as_deref());
        let layout = VenvLayout::new(config.venv_path());
        Self {
            policy: FailurePolicy::from_keep_going(config.keep_going),
            config,
            runner,
            reporter: Reporter::console(),
            probe,
            layout,
            inherited_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// PATH that activation prepends the environment's bin directory to.
    pub fn with_inherited_path(mut self, path: Option<OsString>) -> Self {
        self.inherited_path = path;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn layout(&self) -> &VenvLayout {
        &self.layout
    }

    fn activated(&self) -> Result<ActivatedEnv, ProvisionError> {
        self.layout
            .activate(self.inherited_path.as_ref())
            .map_err(|source| ProvisionError::Activation {
                path: self.layout.bin_dir(),
                source,
            })
    }

    fn tooling_invocation(&self, env: &ActivatedEnv) -> Invocation {
        env.python_invocation()
            .args(["-m", "pip", "install", "--upgrade"])
            .args(&self.config.tooling)
            .current_dir(&self.config.project_dir)
    }

    fn install_invocation(&self, env: &ActivatedEnv) -> Invocation {
        env.python_invocation()
            .args(["-m", "pip", "install"])
            .args(self.config.requirements.iter().map(|r| r.to_string()))
            .current_dir(&self.config.project_dir)
    }

    fn migrate_invocation(&self, env: &ActivatedEnv) -> Invocation {
        env.apply(Invocation::new(env.resolve_program(&self.config.migrate.program)))
            .args(&self.config.migrate.args)
            .current_dir(&self.config.project_dir)
    }

    fn launch_invocation(&self, env: &ActivatedEnv) -> Invocation {
        env.python_invocation()
            .arg(&self.config.entry_point)
            .args(&self.config.entry_args)
            .current_dir(&self.config.project_dir)
    }

    /// The steps `run` would take, without running or touching anything.
    pub fn plan(&self) -> Result<Vec<PlanEntry>, ProvisionError> {
        let env = self.activated()?;
        let root = self.layout.root().display();
        let mut entries = vec![
            PlanEntry::command(Step::VersionCheck, &self.probe.version_invocation()),
            PlanEntry::note(Step::Cleanup, format!("remove {} if present", root)),
            PlanEntry::command(
                Step::CreateEnv,
                &self.probe.venv_invocation(self.layout.root(), &self.config.project_dir),
            ),
            PlanEntry::note(
                Step::Activate,
                format!("VIRTUAL_ENV={} with {} first on PATH", root, env.bin_dir.display()),
            ),
        ];
        entries.push(if self.config.tooling.is_empty() {
            PlanEntry::note(Step::UpgradeTooling, "skipped: no tooling configured".to_string())
        } else {
            PlanEntry::command(Step::UpgradeTooling, &self.tooling_invocation(&env))
        });
        entries.push(PlanEntry::command(Step::InstallDeps, &self.install_invocation(&env)));
        entries.push(if self.config.skip_migrate {
            PlanEntry::note(Step::Migrate, "skipped (--skip-migrate)".to_string())
        } else {
            PlanEntry::command(Step::Migrate, &self.migrate_invocation(&env))
        });
        entries.push(if self.config.launch {
            PlanEntry::command(Step::Launch, &self.launch_invocation(&env))
        } else {
            PlanEntry::note(Step::Launch, "skipped (--no-launch)".to_string())
        });
        Ok(entries)
    }

    /// Step 1 alone.
    pub fn check_interpreter(&self) -> Result<InterpreterVersion, ProvisionError> {
        let step = Step::VersionCheck;
        if let Some(path) = self.probe.resolved_launcher() {
            tracing::debug!(launcher = %path.display(), "Resolved interpreter launcher");
        }
        match self.probe.detect(&self.runner) {
            Some(version) => {
                tracing::info!(version = %version, "Interpreter found");
                if !version.satisfies(&self.config.python_version) {
                    tracing::warn!(
                        found = %version,
                        required = %self.config.python_version,
                        launcher = %self.probe.launcher.display(),
                        "Interpreter version does not match the required version"
                    );
                    self.reporter.warn(
                        step,
                        &format!("{} does not match required Python {}", version, self.config.python_version),
                    );
                }
                self.reporter.done(step, &format!("Found {}", version));
                Ok(version)
            }
            None => {
                tracing::error!(version = %self.config.python_version, "Required interpreter not found");
                self.reporter.failed(
                    step,
                    &format!("Python {} is not installed", self.config.python_version),
                );
                Err(ProvisionError::InterpreterMissing {
                    version: self.config.python_version.clone(),
                })
            }
        }
    }

    /// Run all steps in order.
    pub fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        self.config.check_venv_path()?;
        let mut steps = Vec::with_capacity(Step::COUNT);

        let interpreter = self.check_interpreter()?;
        steps.push(StepRecord {
            step: Step::VersionCheck,
            outcome: StepOutcome::Done,
        });

        self.cleanup()?;
        steps.push(StepRecord {
            step: Step::Cleanup,
            outcome: StepOutcome::Done,
        });

        let root = self.layout.root().display().to_string();
        self.reporter
            .start(Step::CreateEnv, &format!("Creating environment at {}", root));
        let create = self
            .probe
            .venv_invocation(self.layout.root(), &self.config.project_dir);
        steps.push(self.execute(Step::CreateEnv, &create, &format!("Created environment at {}", root))?);

        let env = self.activated()?;
        tracing::debug!(venv = %env.root.display(), python = %env.python.display(), "Environment activated");
        self.reporter.done(
            Step::Activate,
            &format!("Using {}", env.python.display()),
        );
        steps.push(StepRecord {
            step: Step::Activate,
            outcome: StepOutcome::Done,
        });

        if self.config.tooling.is_empty() {
            self.reporter
                .skipped(Step::UpgradeTooling, "No packaging tooling configured");
            steps.push(StepRecord {
                step: Step::UpgradeTooling,
                outcome: StepOutcome::Skipped,
            });
        } else {
            let tooling = self.config.tooling.join(", ");
            self.reporter
                .start(Step::UpgradeTooling, &format!("Upgrading {}...", tooling));
            steps.push(self.execute(
                Step::UpgradeTooling,
                &self.tooling_invocation(&env),
                &format!("Upgraded {}", tooling),
            )?);
        }

        let count = self.config.requirements.len();
        self.reporter.start(
            Step::InstallDeps,
            &format!("Installing {} pinned package(s)...", count),
        );
        for req in &self.config.requirements {
            self.reporter.note(&format!("   • {}", req));
        }
        steps.push(self.execute(
            Step::InstallDeps,
            &self.install_invocation(&env),
            &format!("Installed {} package(s)", count),
        )?);
        if steps
            .iter()
            .all(|r| !matches!(r.outcome, StepOutcome::Failed { .. }))
        {
            self.write_stamp(&interpreter);
        }

        if self.config.skip_migrate {
            self.reporter.skipped(Step::Migrate, "Skipping migrations (--skip-migrate)");
            steps.push(StepRecord {
                step: Step::Migrate,
                outcome: StepOutcome::Skipped,
            });
        } else {
            let migrate = self.migrate_invocation(&env);
            self.reporter
                .start(Step::Migrate, &format!("Applying migrations: {}", migrate));
            steps.push(self.execute(Step::Migrate, &migrate, "Database is up to date")?);
        }

        let app_exit = if self.config.launch {
            let code = self.launch(&env)?;
            steps.push(StepRecord {
                step: Step::Launch,
                outcome: StepOutcome::Done,
            });
            Some(code)
        } else {
            self.reporter.skipped(Step::Launch, "Not launching (--no-launch)");
            steps.push(StepRecord {
                step: Step::Launch,
                outcome: StepOutcome::Skipped,
            });
            None
        };

        Ok(ProvisionReport {
            interpreter,
            steps,
            app_exit,
        })
    }

    fn cleanup(&self) -> Result<(), ProvisionError> {
        let step = Step::Cleanup;
        let root = self.layout.root();
        let removed = self.layout.remove().map_err(|source| {
            self.reporter
                .failed(step, &format!("Could not remove {}: {}", root.display(), source));
            ProvisionError::Cleanup {
                path: root.to_path_buf(),
                source,
            }
        })?;
        if removed {
            tracing::info!(path = %root.display(), "Removed existing environment");
            self.reporter
                .done(step, &format!("Removed existing environment at {}", root.display()));
        } else {
            self.reporter
                .done(step, &format!("No existing environment at {}", root.display()));
        }
        Ok(())
    }

    /// Run one step's command and apply the failure policy.
    fn execute(
        &self,
        step: Step,
        invocation: &Invocation,
        done_msg: &str,
    ) -> Result<StepRecord, ProvisionError> {
        tracing::debug!(step = %step, command = %invocation, "Running");
        let code = match self.runner.run(invocation) {
            Ok(status) if status.success() => {
                self.reporter.done(step, done_msg);
                return Ok(StepRecord {
                    step,
                    outcome: StepOutcome::Done,
                });
            }
            Ok(status) => status.code,
            Err(source) => {
                if self.policy == FailurePolicy::Halt {
                    self.reporter.failed(
                        step,
                        &format!("Could not start {}: {}", invocation.program_name(), source),
                    );
                    return Err(ProvisionError::Spawn {
                        step,
                        program: invocation.program_name(),
                        source,
                    });
                }
                tracing::warn!(step = %step, program = %invocation.program_name(), error = %source, "Command did not start; continuing");
                None
            }
        };

        let failure = ProvisionError::StepFailed { step, code };
        match self.policy {
            FailurePolicy::Halt => {
                self.reporter.failed(step, &failure.to_string());
                Err(failure)
            }
            FailurePolicy::Continue => {
                tracing::warn!(step = %step, code = ?code, "Step failed; continuing (--keep-going)");
                self.reporter
                    .warn(step, &format!("{}; continuing", failure));
                Ok(StepRecord {
                    step,
                    outcome: StepOutcome::Failed { code },
                })
            }
        }
    }

    fn write_stamp(&self, interpreter: &InterpreterVersion) {
        let stamp = EnvStamp::new(interpreter.as_str(), &self.config.requirements);
        match stamp.write(self.layout.root()) {
            Ok(path) => tracing::debug!(path = %path.display(), "Wrote environment stamp"),
            Err(e) => tracing::warn!(error = %e, "Could not write environment stamp"),
        }
    }

    /// Foreground launch; returns the application's exit code.
    fn launch(&self, env: &ActivatedEnv) -> Result<Option<i32>, ProvisionError> {
        let step = Step::Launch;
        let invocation = self.launch_invocation(env);
        self.reporter
            .done(step, &format!("Launching {}", self.config.entry_point));
        tracing::info!(command = %invocation, "Launching application");
        let status = self.runner.run(&invocation).map_err(|source| {
            self.reporter.failed(
                step,
                &format!("Could not start {}: {}", invocation.program_name(), source),
            );
            ProvisionError::Spawn {
                step,
                program: invocation.program_name(),
                source,
            }
        })?;
        tracing::info!(code = ?status.code, "Application exited");
        Ok(status.code)
    }
}
