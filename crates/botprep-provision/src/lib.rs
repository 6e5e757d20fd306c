//! Provisioner for a Python bot project.
//!
//! Recreates the project's virtual environment, upgrades packaging tooling,
//! installs the pinned requirement set, applies migrations and launches the
//! entry point. Every external program goes through [`CommandRunner`], and the
//! activated environment is passed explicitly to each invocation as an
//! [`ActivatedEnv`] value instead of being applied to this process.

pub mod error;
pub mod interpreter;
pub mod provisioner;
pub mod reporter;
pub mod runner;
pub mod stamp;
pub mod step;
pub mod venv;

pub use error::ProvisionError;
pub use interpreter::{InterpreterProbe, InterpreterVersion};
pub use provisioner::{FailurePolicy, PlanEntry, ProvisionReport, Provisioner, StepOutcome, StepRecord};
pub use reporter::Reporter;
pub use runner::{Captured, CommandRunner, Invocation, RunStatus, SystemRunner};
pub use stamp::EnvStamp;
pub use step::Step;
pub use venv::{ActivatedEnv, VenvLayout};
