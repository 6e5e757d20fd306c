//! Exact-version package pins (`name==version`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Dependencies the bot is installed with on every run, in install order.
pub const DEFAULT_REQUIREMENTS: &[(&str, &str)] = &[
    ("python-telegram-bot", "20.7"),
    ("python-dotenv", "1.0.1"),
    ("SQLAlchemy", "2.0.23"),
    ("alembic", "1.13.1"),
    ("requests", "2.31.0"),
];

/// Packaging tooling upgraded to latest before installing requirements.
pub const DEFAULT_TOOLING: &[&str] = &["pip", "setuptools", "wheel"];

/// A single pinned package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    pub name: String,
    pub version: String,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// The built-in pinned set.
pub fn default_requirements() -> Vec<Requirement> {
    DEFAULT_REQUIREMENTS
        .iter()
        .map(|(name, version)| Requirement::new(*name, *version))
        .collect()
}

/// Parse a list of pins, rejecting an empty list.
pub fn parse_requirements<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Requirement>, ConfigError> {
    let reqs = lines
        .iter()
        .map(|l| l.as_ref().parse())
        .collect::<Result<Vec<Requirement>, _>>()?;
    if reqs.is_empty() {
        return Err(ConfigError::EmptyRequirements);
    }
    Ok(reqs)
}

impl FromStr for Requirement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRequirement(s.to_string());
        let (name, version) = s.trim().split_once("==").ok_or_else(invalid)?;
        let (name, version) = (name.trim(), version.trim());
        let name_ok = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        // Ranges, wildcards and extra specifiers are not pins.
        let version_ok = !version.is_empty()
            && !version
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '=' | '<' | '>' | '~' | '!' | '*' | ',' | ';'));
        if !name_ok || !version_ok {
            return Err(invalid());
        }
        Ok(Self::new(name, version))
    }
}

impl TryFrom<String> for Requirement {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Requirement> for String {
    fn from(value: Requirement) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}
