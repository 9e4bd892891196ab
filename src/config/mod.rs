//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the first CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.weather-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.weather-mcp\config.json`
//!
//! Unlike an explicit path, a missing default file is not an error: the
//! server starts with built-in defaults.
//!
//! # Credentials
//!
//! The API key is never stored in the file. It is read from the environment
//! variable named by `provider.api_key_env` (default `API_KEY`).

mod settings;

pub use settings::{Config, LoggingConfig, ProviderConfig, ServerConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::provider::ApiKey;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.weather-mcp/`
/// - **Windows:** `%USERPROFILE%\.weather-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".weather-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location and
/// falls back to defaults when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// Reads the provider credential from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] if the variable is unset or blank.
pub fn api_key_from_env(provider: &ProviderConfig) -> Result<ApiKey, ConfigError> {
    let var = provider.api_key_env.as_str();
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(ApiKey::new(value.trim())),
        _ => Err(ConfigError::MissingApiKey {
            var: var.to_string(),
        }),
    }
}
