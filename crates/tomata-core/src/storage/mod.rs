mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, Stats};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/tomata[-dev]/` based on TOMATA_ENV.
///
/// Set TOMATA_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TOMATA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomata-dev")
    } else {
        base_dir.join("tomata")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
