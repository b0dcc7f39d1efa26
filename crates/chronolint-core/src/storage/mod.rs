mod config;

pub use config::{Config, LintSection, LoggingSection, PlannerSection};

use std::path::PathBuf;

/// Returns `~/.config/chronolint[-dev]/` based on CHRONOLINT_ENV.
///
/// Set CHRONOLINT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CHRONOLINT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("chronolint-dev")
    } else {
        base_dir.join("chronolint")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
