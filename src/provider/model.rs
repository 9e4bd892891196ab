//! Domain types returned by weather providers.
//!
//! These are the values that flow out of the provider seam and into tool
//! results. They serialise with camelCase keys, matching the rest of the
//! MCP wire format.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Number of daily entries in a complete forecast.
pub const FORECAST_DAYS: usize = 5;

/// Measurement system for temperatures and speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius, metres per second.
    #[default]
    Metric,
    /// Fahrenheit, miles per hour.
    Imperial,
    /// Kelvin, metres per second.
    Standard,
}

impl Units {
    /// All accepted unit systems, in schema order.
    pub const ALL: [Self; 3] = [Self::Metric, Self::Imperial, Self::Standard];

    /// Returns the wire name of this unit system.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    /// Parses a wire name. Matching is exact.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == name)
    }

    /// Symbol appended to temperatures.
    #[must_use]
    pub const fn temperature_symbol(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }

    /// Symbol appended to wind speeds.
    #[must_use]
    pub const fn speed_symbol(self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric | Self::Standard => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// Air quality index on the 1 (good) to 5 (very poor) scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Index value.
    pub aqi: u8,
    /// Human-readable label.
    pub label: String,
}

impl AirQuality {
    /// Builds an air quality value from a raw index.
    ///
    /// Returns `None` for indices outside 1..=5.
    #[must_use]
    pub fn from_index(aqi: u8) -> Option<Self> {
        let label = match aqi {
            1 => "Good",
            2 => "Fair",
            3 => "Moderate",
            4 => "Poor",
            5 => "Very Poor",
            _ => return None,
        };
        Some(Self {
            aqi,
            label: label.to_string(),
        })
    }
}

/// Current conditions for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// Resolved city name.
    pub city: String,
    /// ISO country code, empty when unknown.
    pub country: String,
    /// Unit system of every measurement below.
    pub units: Units,
    /// Air temperature.
    pub temperature: f64,
    /// Perceived temperature.
    pub feels_like: f64,
    /// Short description, e.g. "light rain".
    pub conditions: String,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Wind speed.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: u16,
    /// Sea-level pressure in hPa.
    pub pressure: u32,
    /// Cloud cover in percent.
    pub cloudiness: u8,
    /// Visibility in kilometres.
    pub visibility_km: f64,
    /// Sunrise, when the provider reports one.
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset, when the provider reports one.
    pub sunset: Option<DateTime<Utc>>,
    /// Location of the observation.
    pub coordinates: Coordinates,
    /// Air quality, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
    /// Observation time.
    pub timestamp: DateTime<Utc>,
}

impl WeatherReading {
    /// Renders a short plain-text report.
    #[must_use]
    pub fn summary(&self) -> String {
        let t = self.units.temperature_symbol();
        let mut out = format!("Weather for {}", place_label(&self.city, &self.country));
        let _ = write!(
            out,
            "\n\nTemperature: {:.0}{t} (feels like {:.0}{t})",
            self.temperature, self.feels_like
        );
        let _ = write!(out, "\nConditions: {}", title_case(&self.conditions));
        let _ = write!(out, "\nHumidity: {}%", self.humidity);
        let _ = write!(
            out,
            "\nWind: {:.1} {} ({}°)",
            self.wind_speed,
            self.units.speed_symbol(),
            self.wind_direction
        );
        let _ = write!(out, "\nClouds: {}%", self.cloudiness);
        let _ = write!(out, "\nVisibility: {:.1} km", self.visibility_km);
        let _ = write!(out, "\nPressure: {} hPa", self.pressure);
        let _ = write!(out, "\nSunrise: {} UTC", clock(self.sunrise));
        let _ = write!(out, "\nSunset: {} UTC", clock(self.sunset));
        if let Some(aq) = &self.air_quality {
            let _ = write!(out, "\nAir Quality: {} (AQI: {})", aq.label, aq.aqi);
        }
        out
    }
}

/// One day of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    /// Time the entry applies to.
    pub timestamp: DateTime<Utc>,
    /// Air temperature.
    pub temperature: f64,
    /// Short description.
    pub conditions: String,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Wind speed.
    pub wind_speed: f64,
}

/// A daily forecast for one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSeries {
    /// Resolved city name.
    pub city: String,
    /// ISO country code, empty when unknown.
    pub country: String,
    /// Unit system of every entry.
    pub units: Units,
    /// One entry per day, oldest first.
    pub entries: Vec<ForecastEntry>,
}

impl ForecastSeries {
    /// Checks that the series has one entry per forecast day in order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] for truncated or unordered
    /// series.
    pub fn check_complete(&self) -> Result<(), ProviderError> {
        if self.entries.len() != FORECAST_DAYS {
            return Err(ProviderError::unavailable(format!(
                "incomplete forecast: expected {FORECAST_DAYS} days, got {}",
                self.entries.len()
            )));
        }
        if self
            .entries
            .windows(2)
            .any(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(ProviderError::unavailable(
                "forecast entries are not in chronological order",
            ));
        }
        Ok(())
    }

    /// Renders a short plain-text report.
    #[must_use]
    pub fn summary(&self) -> String {
        let t = self.units.temperature_symbol();
        let mut out = format!(
            "{}-Day Forecast for {}\n",
            self.entries.len(),
            place_label(&self.city, &self.country)
        );
        for entry in &self.entries {
            let _ = write!(
                out,
                "\n{}\n   {:.0}{t} - {}\n   {}% humidity, {:.1} {} wind\n",
                entry.timestamp.format("%a, %b %d"),
                entry.temperature,
                title_case(&entry.conditions),
                entry.humidity,
                entry.wind_speed,
                self.units.speed_symbol()
            );
        }
        out
    }
}

/// A geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceMatch {
    /// Place name.
    pub name: String,
    /// State or region, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ISO country code, empty when unknown.
    pub country: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl PlaceMatch {
    /// Returns "name, state, country" with empty parts left out.
    #[must_use]
    pub fn display_name(&self) -> String {
        [Some(self.name.as_str()), self.state.as_deref(), Some(self.country.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Renders search results as plain text.
#[must_use]
pub fn places_summary(query: &str, places: &[PlaceMatch]) -> String {
    if places.is_empty() {
        return format!("No cities found matching '{query}'. Try a different search term.");
    }

    let mut out = format!("Found {} cities matching '{query}':\n", places.len());
    for (i, place) in places.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {}\n   Coordinates: {:.2}, {:.2}\n",
            i + 1,
            place.display_name(),
            place.latitude,
            place.longitude
        );
    }
    out
}

fn place_label(city: &str, country: &str) -> String {
    if country.is_empty() {
        city.to_string()
    } else {
        format!("{city}, {country}")
    }
}

fn clock(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string())
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
