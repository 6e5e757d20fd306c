//! Tracing initialization.
//!
//! Uses [`ObservabilityConfig`] for BOTPREP_QUIET, BOTPREP_LOG_LEVEL and
//! BOTPREP_LOG_JSON. `RUST_LOG` wins when set. Logs go to stderr so plan
//! output on stdout stays clean.

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize tracing. Call once at process startup; later calls are no-ops.
pub fn init_tracing(cfg: &ObservabilityConfig) {
    let level = if cfg.quiet {
        "botprep=warn".to_string()
    } else {
        cfg.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
