//! In-memory [`CommandRunner`] for handler tests.

use std::io;
use std::sync::Mutex;

use botprep_provision::{Captured, CommandRunner, Invocation, RunStatus};

/// Every command succeeds unless an argument ends with a `fail_when` needle;
/// the version probe prints `version`.
pub struct ScriptedRunner {
    version: String,
    failures: Vec<(String, i32)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_when(mut self, needle: &str, code: i32) -> Self {
        self.failures.push((needle.to_string(), code));
        self
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().iter().map(Invocation::argv).collect()
    }

    fn record(&self, invocation: &Invocation) -> RunStatus {
        self.calls.lock().unwrap().push(invocation.clone());
        let argv = invocation.argv();
        self.failures
            .iter()
            .find(|(needle, _)| argv.iter().any(|a| a.ends_with(needle.as_str())))
            .map(|(_, code)| RunStatus::from_code(*code))
            .unwrap_or(RunStatus::SUCCESS)
    }
}

impl CommandRunner for ScriptedRunner {
    fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
        let status = self.record(invocation);
        Ok(Captured {
            status,
            stdout: format!("{}\n", self.version),
            stderr: String::new(),
        })
    }

    fn run(&self, invocation: &Invocation) -> io::Result<RunStatus> {
        Ok(self.record(invocation))
    }
}
