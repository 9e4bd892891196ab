//! Error types for weather-mcp.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include the provider
//! credential. Provider failures carry only a status or a URL-stripped
//! transport description.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },

    /// The API credential is not set in the environment.
    #[error("environment variable {var} is not set or empty")]
    MissingApiKey {
        /// Name of the environment variable that was consulted.
        var: String,
    },
}

/// Errors raised by the stdio transport.
///
/// Frame errors are fatal: once the byte stream loses its message
/// boundaries there is no way to resynchronise.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Reading from or writing to the stream failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the configured frame limit.
    #[error("frame exceeds maximum size of {limit} bytes")]
    FrameTooLarge {
        /// The configured limit in bytes.
        limit: usize,
    },

    /// A line was not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
}

impl TransportError {
    /// Returns `true` for errors that mean the peer closed its end.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::UnexpectedEof
            )
        )
    }
}

/// Failures reported by a weather provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider has no data for the requested place.
    #[error("no weather data found for '{place}'")]
    NotFound {
        /// The place that was looked up.
        place: String,
    },

    /// The provider throttled the request.
    #[error("weather provider rate limit exceeded")]
    RateLimited,

    /// The provider could not be reached or answered unexpectedly.
    #[error("weather provider unavailable: {reason}")]
    Unavailable {
        /// Short description, never containing request URLs.
        reason: String,
    },
}

impl ProviderError {
    /// Creates an `Unavailable` error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a `NotFound` error.
    pub fn not_found(place: impl Into<String>) -> Self {
        Self::NotFound {
            place: place.into(),
        }
    }
}
