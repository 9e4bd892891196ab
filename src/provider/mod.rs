//! Weather data providers.
//!
//! The MCP server only ever talks to a [`WeatherProvider`]. Everything about
//! HTTP, credentials and upstream payload shapes stays behind this seam.

pub mod model;
pub mod openweather;

use std::fmt;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use model::{
    places_summary, AirQuality, Coordinates, ForecastEntry, ForecastSeries, PlaceMatch, Units,
    WeatherReading, FORECAST_DAYS,
};
pub use openweather::OpenWeatherProvider;

/// A provider credential.
///
/// `Debug` never prints the value; use [`ApiKey::expose`] at the single
/// point where it is sent upstream.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Source of weather and geocoding data.
///
/// Implementations own their own timeouts and must not retry on behalf of
/// the server.
#[async_trait]
pub trait WeatherProvider: Send + Sync + fmt::Debug {
    /// Current conditions for a city.
    async fn fetch_current(&self, city: &str, units: Units)
        -> Result<WeatherReading, ProviderError>;

    /// Daily forecast for a city.
    async fn fetch_forecast(
        &self,
        city: &str,
        units: Units,
    ) -> Result<ForecastSeries, ProviderError>;

    /// Places matching a free-text query. An empty list is a success.
    async fn search_places(&self, query: &str, limit: u32)
        -> Result<Vec<PlaceMatch>, ProviderError>;
}
