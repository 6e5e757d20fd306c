//! Locate the required Python interpreter.
//!
//! Unix hosts are probed with the versioned executable (`python3.10`), Windows
//! hosts with the `py` launcher (`py -3.10`). An explicit interpreter path
//! replaces both; a relative one is anchored to the caller's working directory
//! so the probe and `-m venv` start the same executable.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runner::{is_path_like, CommandRunner, Invocation};

/// Version string reported by the interpreter, e.g. `Python 3.10.12`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterVersion(String);

impl InterpreterVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to invoke the required interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterProbe {
    pub version: String,
    pub launcher: PathBuf,
    pub launcher_args: Vec<OsString>,
}

impl InterpreterProbe {
    pub fn new(version: &str, explicit: Option<&Path>) -> Self {
        match explicit {
            Some(path) => Self {
                version: version.to_string(),
                launcher: anchor_to_cwd(path),
                launcher_args: Vec::new(),
            },
            None if cfg!(windows) => Self {
                version: version.to_string(),
                launcher: PathBuf::from("py"),
                launcher_args: vec![OsString::from(format!("-{}", version))],
            },
            None => Self {
                version: version.to_string(),
                launcher: PathBuf::from(format!("python{}", version)),
                launcher_args: Vec::new(),
            },
        }
    }

    fn base(&self) -> Invocation {
        Invocation::new(&self.launcher).args(&self.launcher_args)
    }

    /// `python3.10 --version`
    pub fn version_invocation(&self) -> Invocation {
        self.base().arg("--version")
    }

    /// `python3.10 -m venv <env_dir>`, run from `cwd`.
    pub fn venv_invocation(&self, env_dir: &Path, cwd: &Path) -> Invocation {
        self.base()
            .args(["-m", "venv"])
            .arg(env_dir)
            .current_dir(cwd)
    }

    /// Launcher location on PATH, for diagnostics only.
    pub fn resolved_launcher(&self) -> Option<PathBuf> {
        which::which(&self.launcher).ok()
    }

    /// Run the version probe. `None` when the interpreter cannot be started,
    /// exits non-zero, or prints nothing.
    pub fn detect<R: CommandRunner>(&self, runner: &R) -> Option<InterpreterVersion> {
        let invocation = self.version_invocation();
        let out = match runner.capture(&invocation) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(command = %invocation, error = %e, "Interpreter probe did not start");
                return None;
            }
        };
        if !out.status.success() {
            tracing::debug!(command = %invocation, code = ?out.status.code, "Interpreter probe failed");
            return None;
        }
        parse_version_output(&out.stdout, &out.stderr)
    }
}

fn anchor_to_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() || !is_path_like(path) {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

impl InterpreterVersion {
    /// Whether the reported version is `required` or a release of it:
    /// `Python 3.10.12` satisfies `3.10` but not `3.1` or `3.11`.
    pub fn satisfies(&self, required: &str) -> bool {
        let Some(found) = self
            .0
            .split_whitespace()
            .find(|w| w.starts_with(|c: char| c.is_ascii_digit()))
        else {
            return false;
        };
        let mut found = found.split('.');
        required
            .split('.')
            .all(|part| found.next() == Some(part))
    }
}

/// First non-empty line of stdout, falling back to stderr (Python 2 and
/// some launchers print the version there).
pub fn parse_version_output(stdout: &str, stderr: &str) -> Option<InterpreterVersion> {
    [stdout, stderr]
        .iter()
        .flat_map(|s| s.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| InterpreterVersion(l.to_string()))
}
