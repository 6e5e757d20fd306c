//! botprep core: layered configuration, pinned requirements, YAML manifest and
//! tracing setup shared by the provisioner and the CLI.

pub mod config;
pub mod error;
pub mod observability;
pub mod requirement;

pub use error::ConfigError;
pub use requirement::Requirement;
