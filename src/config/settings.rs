//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;

/// Smallest frame limit accepted from configuration.
const MIN_FRAME_BYTES: usize = 1024;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Weather provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Protocol server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=120).contains(&self.provider.timeout_secs) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid provider timeout {}s. Must be between 1 and 120",
                    self.provider.timeout_secs
                ),
            });
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid provider base_url '{}'. Must start with http:// or https://",
                    self.provider.base_url
                ),
            });
        }

        if self.provider.api_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "provider.api_key_env cannot be empty".to_string(),
            });
        }

        if self.server.max_frame_bytes < MIN_FRAME_BYTES {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid max_frame_bytes {}. Must be at least {MIN_FRAME_BYTES}",
                    self.server.max_frame_bytes
                ),
            });
        }

        Ok(())
    }
}

/// Weather provider configuration.
///
/// The credential itself never lives in the file; only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the OpenWeatherMap API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout in seconds for each provider call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Attach air quality to current readings.
    #[serde(default = "default_true")]
    pub air_quality: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            air_quality: default_true(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

const fn default_true() -> bool {
    true
}

/// Protocol server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Largest accepted incoming frame in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

const fn default_max_frame_bytes() -> usize {
    crate::mcp::transport::DEFAULT_MAX_FRAME_BYTES
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
