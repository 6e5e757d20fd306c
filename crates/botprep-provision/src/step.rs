use std::fmt;

use serde::Serialize;

/// The provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    VersionCheck,
    Cleanup,
    CreateEnv,
    Activate,
    UpgradeTooling,
    InstallDeps,
    Migrate,
    Launch,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::VersionCheck,
        Step::Cleanup,
        Step::CreateEnv,
        Step::Activate,
        Step::UpgradeTooling,
        Step::InstallDeps,
        Step::Migrate,
        Step::Launch,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// 1-based position.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::VersionCheck => "version check",
            Step::Cleanup => "environment cleanup",
            Step::CreateEnv => "environment creation",
            Step::Activate => "activation",
            Step::UpgradeTooling => "tooling upgrade",
            Step::InstallDeps => "dependency installation",
            Step::Migrate => "migration",
            Step::Launch => "launch",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_declaration_order() {
        for (i, step) in Step::ALL.iter().enumerate() {
            assert_eq!(step.ordinal(), i + 1);
        }
        assert_eq!(Step::COUNT, 8);
        assert_eq!(Step::Launch.ordinal(), 8);
    }
}
