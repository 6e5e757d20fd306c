use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving configuration (env, `.env`, manifest).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read manifest {path}: {source}")]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {path}: {source}")]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid requirement '{0}': expected an exact pin like name==1.2.3")]
    InvalidRequirement(String),

    #[error("Requirement list is empty")]
    EmptyRequirements,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}
