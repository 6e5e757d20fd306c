//! Human-readable progress on stderr, e.g. `✅ Step 3/8: Created .venv`.
//! Not a stable or machine-readable format.

use crate::step::Step;

#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn console() -> Self {
        Self { quiet: false }
    }

    /// Reporter that prints nothing.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn line(&self, icon: &str, step: Step, msg: &str) {
        if !self.quiet {
            eprintln!("{}", format_line(icon, step, msg));
        }
    }

    pub fn start(&self, step: Step, msg: &str) {
        self.line("⏳", step, msg);
    }

    pub fn done(&self, step: Step, msg: &str) {
        self.line("✅", step, msg);
    }

    pub fn skipped(&self, step: Step, msg: &str) {
        self.line("⏭ ", step, msg);
    }

    pub fn warn(&self, step: Step, msg: &str) {
        self.line("⚠ ", step, msg);
    }

    pub fn failed(&self, step: Step, msg: &str) {
        self.line("❌", step, msg);
    }

    /// Free-form line without a step prefix.
    pub fn note(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }
}

pub(crate) fn format_line(icon: &str, step: Step, msg: &str) -> String {
    format!("{} Step {}/{}: {}", icon, step.ordinal(), Step::COUNT, msg)
}
