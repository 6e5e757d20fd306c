use std::path::PathBuf;

use botprep_core::ConfigError;
use thiserror::Error;

use crate::step::Step;

/// Errors that stop a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Python {version} not found. Install it (or point BOTPREP_PYTHON at an interpreter) and retry")]
    InterpreterMissing { version: String },

    #[error("Failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot put {path} on PATH: {source}")]
    Activation {
        path: PathBuf,
        #[source]
        source: std::env::JoinPathsError,
    },

    #[error("{step}: failed to start '{program}': {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} failed ({})", describe_code(.code))]
    StepFailed { step: Step, code: Option<i32> },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "terminated by signal".to_string(),
    }
}

impl ProvisionError {
    /// Process exit code for this error: the failing command's own code where
    /// there is one, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::StepFailed {
                code: Some(c), ..
            } if *c != 0 => *c,
            _ => 1,
        }
    }
}
