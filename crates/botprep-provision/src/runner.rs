//! External command seam.
//!
//! An [`Invocation`] carries everything a child process gets: program,
//! arguments, working directory and environment changes. Nothing is inherited
//! implicitly except the parent's environment, which the invocation edits.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
    pub env_remove: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            env_remove: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Self {
        self.env_remove.push(key.as_ref().to_os_string());
        self
    }

    /// Program followed by arguments, lossily converted for display and JSON.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect()
    }

    /// Value this invocation sets for `key`, if any.
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        for key in &self.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.argv().into_iter().map(|a| shell_quote(&a)).collect();
        f.write_str(&parts.join(" "))
    }
}

fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Exit status of a finished child. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub const SUCCESS: RunStatus = RunStatus { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for RunStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Output of a captured command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub status: RunStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands. Implemented by [`SystemRunner`]; tests substitute a
/// recording runner.
pub trait CommandRunner: Send + Sync {
    /// Run to completion collecting stdout/stderr.
    fn capture(&self, invocation: &Invocation) -> io::Result<Captured>;

    /// Run to completion with inherited stdio.
    fn run(&self, invocation: &Invocation) -> io::Result<RunStatus>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
        let out = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()?;
        Ok(Captured {
            status: out.status.into(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn run(&self, invocation: &Invocation) -> io::Result<RunStatus> {
        invocation.to_command().status().map(RunStatus::from)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
        (**self).capture(invocation)
    }

    fn run(&self, invocation: &Invocation) -> io::Result<RunStatus> {
        (**self).run(invocation)
    }
}

/// Whether `program` names a path rather than a bare command to look up on PATH.
pub(crate) fn is_path_like(program: &Path) -> bool {
    program.components().count() > 1 || program.is_absolute()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording runner for hermetic provisioner tests.

    use super::*;
    use std::sync::Mutex;

    type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;
    type Effect = Box<dyn Fn(&Invocation) + Send + Sync>;

    /// Scripted reply for one call.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Exit(i32),
        Output { code: i32, stdout: String, stderr: String },
        SpawnError,
    }

    /// Records every invocation. The first rule whose needle appears in the
    /// argv decides the reply; unmatched calls exit 0.
    #[derive(Default)]
    pub struct RecordingRunner {
        calls: Mutex<Vec<Invocation>>,
        rules: Mutex<Vec<(Matcher, Reply)>>,
        hooks: Mutex<Vec<(Matcher, Effect)>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every call whose argv contains `needle` gets `reply`.
        pub fn reply_when(self, needle: &str, reply: Reply) -> Self {
            let needle = needle.to_string();
            self.rules.lock().unwrap().push((
                Box::new(move |inv: &Invocation| inv.argv().iter().any(|a| a == &needle)),
                reply,
            ));
            self
        }

        /// Run `effect` whenever a call's argv contains `needle` (e.g. create a
        /// directory for `venv`).
        pub fn on_call<F>(self, needle: &str, effect: F) -> Self
        where
            F: Fn(&Invocation) + Send + Sync + 'static,
        {
            let needle = needle.to_string();
            self.hooks.lock().unwrap().push((
                Box::new(move |inv: &Invocation| inv.argv().iter().any(|a| a == &needle)),
                Box::new(effect),
            ));
            self
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        pub fn argvs(&self) -> Vec<Vec<String>> {
            self.calls().iter().map(Invocation::argv).collect()
        }

        fn reply_for(&self, inv: &Invocation) -> Reply {
            self.calls.lock().unwrap().push(inv.clone());
            for (matches, effect) in self.hooks.lock().unwrap().iter() {
                if matches(inv) {
                    effect(inv);
                }
            }
            self.rules
                .lock()
                .unwrap()
                .iter()
                .find(|(matches, _)| matches(inv))
                .map(|(_, reply)| reply.clone())
                .unwrap_or(Reply::Exit(0))
        }
    }

    impl CommandRunner for RecordingRunner {
        fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
            match self.reply_for(invocation) {
                Reply::Exit(code) => Ok(Captured {
                    status: RunStatus::from_code(code),
                    stdout: String::new(),
                    stderr: String::new(),
                }),
                Reply::Output {
                    code,
                    stdout,
                    stderr,
                } => Ok(Captured {
                    status: RunStatus::from_code(code),
                    stdout,
                    stderr,
                }),
                Reply::SpawnError => Err(io::Error::new(io::ErrorKind::NotFound, "not found")),
            }
        }

        fn run(&self, invocation: &Invocation) -> io::Result<RunStatus> {
            match self.reply_for(invocation) {
                Reply::Exit(code) | Reply::Output { code, .. } => Ok(RunStatus::from_code(code)),
                Reply::SpawnError => Err(io::Error::new(io::ErrorKind::NotFound, "not found")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_when_needed() {
        let inv = Invocation::new("python3.10")
            .args(["-m", "venv"])
            .arg("/tmp/my project/.venv");
        assert_eq!(inv.to_string(), "python3.10 -m venv '/tmp/my project/.venv'");
    }

    #[test]
    fn test_env_value_last_wins() {
        let inv = Invocation::new("pip")
            .env("VIRTUAL_ENV", "/a")
            .env("VIRTUAL_ENV", "/b")
            .env_remove("PYTHONHOME");
        assert_eq!(inv.env_value("VIRTUAL_ENV"), Some(OsStr::new("/b")));
        assert_eq!(inv.env_value("PATH"), None);
        assert_eq!(inv.env_remove, vec![OsString::from("PYTHONHOME")]);
    }

    #[test]
    fn test_is_path_like() {
        assert!(!is_path_like(Path::new("alembic")));
        assert!(is_path_like(Path::new("./bin/alembic")));
        assert!(is_path_like(Path::new("/usr/bin/python3")));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_capture_and_status() {
        let out = SystemRunner
            .capture(&Invocation::new("sh").args(["-c", "echo hi; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(out.status, RunStatus::from_code(3));
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "err");

        let status = SystemRunner
            .run(&Invocation::new("sh").args(["-c", "exit 0"]))
            .unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_applies_env_and_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let out = SystemRunner
            .capture(
                &Invocation::new("sh")
                    .args(["-c", "printf '%s|%s' \"$BOTPREP_PROBE\" \"$(pwd -P)\""])
                    .env("BOTPREP_PROBE", "set")
                    .current_dir(dir.path()),
            )
            .unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(out.stdout, format!("set|{}", canonical.display()));
    }

    #[test]
    fn test_spawn_error_for_missing_program() {
        let err = SystemRunner
            .capture(&Invocation::new("botprep-definitely-not-a-program"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
