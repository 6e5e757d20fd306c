//! Environment variable keys and aliases.
//!
//! Primary keys use the `BOTPREP_*` prefix; aliases keep older setups working.

/// Project and interpreter selection
pub mod project {
    pub const BOTPREP_PROJECT_DIR: &str = "BOTPREP_PROJECT_DIR";

    pub const BOTPREP_PYTHON_VERSION: &str = "BOTPREP_PYTHON_VERSION";
    pub const PYTHON_VERSION_ALIASES: &[&str] = &["PYTHON_VERSION"];

    /// Explicit interpreter executable; bypasses the versioned launcher.
    pub const BOTPREP_PYTHON: &str = "BOTPREP_PYTHON";

    pub const BOTPREP_VENV_DIR: &str = "BOTPREP_VENV_DIR";
    pub const VENV_DIR_ALIASES: &[&str] = &["VENV_DIR"];

    pub const BOTPREP_ENTRY_POINT: &str = "BOTPREP_ENTRY_POINT";

    pub const BOTPREP_KEEP_GOING: &str = "BOTPREP_KEEP_GOING";
}

/// Observability and logging
pub mod observability {
    pub const BOTPREP_QUIET: &str = "BOTPREP_QUIET";

    pub const BOTPREP_LOG_LEVEL: &str = "BOTPREP_LOG_LEVEL";

    pub const BOTPREP_LOG_JSON: &str = "BOTPREP_LOG_JSON";
}
