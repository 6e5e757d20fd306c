//! botprep configuration layer
//!
//! All environment lookups go through [`EnvSource`]; business code never calls
//! `std::env::var` directly.
//!
//! - `loader`: `.env` parsing and the layered [`EnvSource`]
//! - `schema`: [`ObservabilityConfig`] and the resolved [`ProvisionConfig`]
//! - `manifest`: optional `botprep.yaml`
//! - `env_keys`: key constants (with legacy aliases)

pub mod env_keys;
pub mod loader;
pub mod manifest;
pub mod schema;

pub use loader::{parse_dotenv, EnvSource};
pub use manifest::{Manifest, MigrateSpec};
pub use schema::{CommandSpec, ObservabilityConfig, ProvisionConfig};
