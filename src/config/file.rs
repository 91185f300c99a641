//! Configuration file loading.
//!
//! Loads configuration from TOML files at XDG-compliant locations.

use crate::config::types::DindConfig;
use crate::error::DindError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "dind-agent.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "dind-agent";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./dind-agent.toml` (project-local)
/// 2. `~/.config/dind-agent/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed or holds
/// invalid values.
pub fn load() -> Result<DindConfig, DindError> {
    match search_paths().into_iter().find(|path| path.exists()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            from_path(&path)
        }
        None => Ok(DindConfig::default()),
    }
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, does not
/// match the schema or holds invalid values.
pub fn from_path(path: &Path) -> Result<DindConfig, DindError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DindError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        DindError::configuration(
            "config_file",
            format!("failed to load '{}': {}", path.display(), e),
        )
    })
}

/// Parses and validates configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, doesn't match the schema or
/// fails [`DindConfig::validate`].
pub fn from_str(toml_str: &str) -> Result<DindConfig, DindError> {
    let config: DindConfig = toml::from_str(toml_str)
        .map_err(|e| DindError::configuration("config", format!("invalid TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the path to the XDG config directory, `~/.config/dind-agent` on
/// most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
