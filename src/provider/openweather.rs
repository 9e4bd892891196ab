//! OpenWeatherMap provider.
//!
//! Uses the free endpoints only: current weather, 5-day/3-hour forecast,
//! direct geocoding and air pollution.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

use super::model::{
    AirQuality, Coordinates, ForecastEntry, ForecastSeries, PlaceMatch, Units, WeatherReading,
    FORECAST_DAYS,
};
use super::{ApiKey, WeatherProvider};

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODING_PATH: &str = "/geo/1.0/direct";
const AIR_POLLUTION_PATH: &str = "/data/2.5/air_pollution";

/// Seconds after local midnight that daily entries are picked around.
const LOCAL_NOON_SECS: i64 = 12 * 3600;

/// OpenWeatherMap-backed [`WeatherProvider`].
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: ApiKey,
    base_url: String,
    air_quality: bool,
    http: Client,
}

impl OpenWeatherProvider {
    /// Creates a provider with the given credential and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: ApiKey, config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("weather-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            air_quality: config.air_quality,
            http,
        })
    }

    /// Performs a GET and decodes the JSON body.
    ///
    /// `place` is only used to label a 404.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        place: &str,
    ) -> Result<T, ProviderError> {
        debug!(path, "provider request");

        let res = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .query(&[("appid", self.api_key.expose())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        if let Some(err) = status_error(status, place) {
            debug!(path, %status, "provider returned an error status");
            return Err(err);
        }

        let body = res.text().await.map_err(transport_error)?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(path, error = %e, "undecodable provider payload");
            ProviderError::unavailable("unexpected response from weather provider")
        })
    }

    /// Resolves a place name to its first geocoding match.
    async fn geocode(&self, city: &str) -> Result<OwPlace, ProviderError> {
        let places: Vec<OwPlace> = self
            .get(
                GEOCODING_PATH,
                &[("q", city.to_string()), ("limit", "1".to_string())],
                city,
            )
            .await?;

        places
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::not_found(city))
    }

    /// Best-effort air quality lookup.
    async fn air_quality_at(&self, coordinates: Coordinates) -> Option<AirQuality> {
        let result: Result<OwAirPollution, _> = self
            .get(AIR_POLLUTION_PATH, &coordinate_query(coordinates), "")
            .await;

        match result {
            Ok(pollution) => pollution
                .list
                .first()
                .and_then(|entry| AirQuality::from_index(entry.main.aqi)),
            Err(e) => {
                debug!(error = %e, "air quality lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(
        &self,
        city: &str,
        units: Units,
    ) -> Result<WeatherReading, ProviderError> {
        let by_name = self
            .get::<OwCurrent>(
                CURRENT_PATH,
                &[("q", city.to_string()), ("units", units.as_str().to_string())],
                city,
            )
            .await;

        let mut reading = match by_name {
            Ok(current) => reading_from_current(current, units),
            Err(ProviderError::NotFound { .. }) => {
                // Some names only resolve through geocoding.
                let place = self.geocode(city).await?;
                let mut query = coordinate_query(place.coordinates());
                query.push(("units", units.as_str().to_string()));
                let current: OwCurrent = self.get(CURRENT_PATH, &query, city).await?;

                let mut reading = reading_from_current(current, units);
                reading.city = place.name;
                reading.country = place.country;
                reading
            }
            Err(e) => return Err(e),
        };

        if self.air_quality {
            reading.air_quality = self.air_quality_at(reading.coordinates).await;
        }

        Ok(reading)
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        units: Units,
    ) -> Result<ForecastSeries, ProviderError> {
        let place = self.geocode(city).await?;

        let mut query = coordinate_query(place.coordinates());
        query.push(("units", units.as_str().to_string()));
        let forecast: OwForecast = self.get(FORECAST_PATH, &query, city).await?;

        let mut series = condense_forecast(&forecast, units);
        series.city = place.name;
        series.country = place.country;
        Ok(series)
    }

    async fn search_places(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceMatch>, ProviderError> {
        let places: Vec<OwPlace> = self
            .get(
                GEOCODING_PATH,
                &[("q", query.to_string()), ("limit", limit.to_string())],
                query,
            )
            .await?;

        Ok(places.into_iter().map(OwPlace::into_match).collect())
    }
}

/// Maps an HTTP status onto the provider error taxonomy.
///
/// Returns `None` for success statuses.
fn status_error(status: StatusCode, place: &str) -> Option<ProviderError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::NOT_FOUND => ProviderError::not_found(place),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::unavailable("weather provider rejected the configured credential")
        }
        other => ProviderError::unavailable(format!("weather provider returned HTTP {other}")),
    })
}

/// Converts a reqwest failure without leaking the request URL (it carries
/// the credential as a query parameter).
fn transport_error(e: reqwest::Error) -> ProviderError {
    let e = e.without_url();
    if e.is_timeout() {
        ProviderError::unavailable("weather provider request timed out")
    } else if e.is_connect() {
        ProviderError::unavailable("could not connect to weather provider")
    } else {
        debug!(error = %e, "provider request failed");
        ProviderError::unavailable("weather provider request failed")
    }
}

fn coordinate_query(coordinates: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coordinates.latitude.to_string()),
        ("lon", coordinates.longitude.to_string()),
    ]
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map_or_else(|| "unknown".to_string(), |w| w.description.clone())
}

fn reading_from_current(current: OwCurrent, units: Units) -> WeatherReading {
    WeatherReading {
        conditions: first_description(&current.weather),
        city: current.name,
        country: current.sys.country,
        units,
        temperature: current.main.temp,
        feels_like: current.main.feels_like,
        humidity: current.main.humidity,
        wind_speed: current.wind.speed,
        wind_direction: current.wind.deg,
        pressure: current.main.pressure,
        cloudiness: current.clouds.all,
        visibility_km: f64::from(current.visibility) / 1000.0,
        sunrise: current.sys.sunrise.filter(|&ts| ts > 0).and_then(unix_to_utc),
        sunset: current.sys.sunset.filter(|&ts| ts > 0).and_then(unix_to_utc),
        coordinates: Coordinates {
            latitude: current.coord.lat,
            longitude: current.coord.lon,
        },
        air_quality: None,
        timestamp: unix_to_utc(current.dt).unwrap_or_else(Utc::now),
    }
}

/// Picks one entry per local calendar day, the one closest to local noon,
/// for the first [`FORECAST_DAYS`] days.
fn condense_forecast(forecast: &OwForecast, units: Units) -> ForecastSeries {
    let offset = forecast.city.timezone;
    let mut days: Vec<(NaiveDate, &OwForecastItem, i64)> = Vec::with_capacity(FORECAST_DAYS);

    for item in &forecast.list {
        let Some(local) = unix_to_utc(item.dt + offset) else {
            continue;
        };
        let date = local.date_naive();
        let distance = (i64::from(local.num_seconds_from_midnight()) - LOCAL_NOON_SECS).abs();

        if let Some(slot) = days.iter_mut().find(|slot| slot.0 == date) {
            if distance < slot.2 {
                slot.1 = item;
                slot.2 = distance;
            }
        } else if days.len() < FORECAST_DAYS {
            days.push((date, item, distance));
        }
    }

    let entries = days
        .into_iter()
        .filter_map(|(_, item, _)| {
            Some(ForecastEntry {
                timestamp: unix_to_utc(item.dt)?,
                temperature: item.main.temp,
                conditions: first_description(&item.weather),
                humidity: item.main.humidity,
                wind_speed: item.wind.speed,
            })
        })
        .collect();

    ForecastSeries {
        city: forecast.city.name.clone(),
        country: forecast.city.country.clone(),
        units,
        entries,
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: u16,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: Option<i64>,
    #[serde(default)]
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    #[serde(default)]
    visibility: u32,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastCity {
    name: String,
    #[serde(default)]
    country: String,
    /// Offset from UTC in seconds.
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecast {
    city: OwForecastCity,
    list: Vec<OwForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
}

impl OwPlace {
    const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.lat,
            longitude: self.lon,
        }
    }

    fn into_match(self) -> PlaceMatch {
        PlaceMatch {
            name: self.name,
            state: self.state.filter(|s| !s.is_empty()),
            country: self.country,
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwAirMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    main: OwAirMain,
}

#[derive(Debug, Deserialize)]
struct OwAirPollution {
    list: Vec<OwAirEntry>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    const CURRENT_JSON: &str = r#"{
        "coord": {"lon": 139.6917, "lat": 35.6895},
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}],
        "main": {"temp": 21.4, "feels_like": 20.9, "temp_min": 20.0, "temp_max": 22.8,
                 "pressure": 1012, "humidity": 60},
        "visibility": 10000,
        "wind": {"speed": 4.12, "deg": 180},
        "clouds": {"all": 20},
        "dt": 1772355600,
        "sys": {"country": "JP", "sunrise": 1772313600, "sunset": 1772355000},
        "timezone": 32400,
        "name": "Tokyo",
        "cod": 200
    }"#;

    fn forecast_item(dt: i64, temp: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "main": {"temp": temp, "feels_like": temp, "pressure": 1000, "humidity": 70},
            "weather": [{"description": "light rain"}],
            "wind": {"speed": 2.5, "deg": 90}
        })
    }

    /// 3-hourly items starting at `start` (UTC) for `count` slots.
    fn forecast_json(start: i64, count: i64, timezone: i64) -> serde_json::Value {
        let list: Vec<_> = (0..count)
            .map(|i| forecast_item(start + i * 3 * 3600, 10.0 + i as f64))
            .collect();
        json!({
            "city": {"name": "Berlin", "country": "DE", "timezone": timezone},
            "list": list
        })
    }

    fn forecast(start: i64, count: i64, timezone: i64) -> OwForecast {
        serde_json::from_value(forecast_json(start, count, timezone)).unwrap()
    }

    #[test]
    fn parse_current_payload() {
        let current: OwCurrent = serde_json::from_str(CURRENT_JSON).unwrap();
        let reading = reading_from_current(current, Units::Metric);

        assert_eq!(reading.city, "Tokyo");
        assert_eq!(reading.country, "JP");
        assert_eq!(reading.conditions, "few clouds");
        assert_eq!(reading.humidity, 60);
        assert_eq!(reading.wind_direction, 180);
        assert_eq!(reading.pressure, 1012);
        assert!((reading.visibility_km - 10.0).abs() < f64::EPSILON);
        assert!(reading.sunrise.is_some());
        assert_eq!(reading.timestamp.timestamp(), 1_772_355_600);
    }

    #[test]
    fn parse_sparse_current_payload() {
        let json = r#"{
            "coord": {"lon": 0.0, "lat": 0.0},
            "main": {"temp": 1.0, "humidity": 10},
            "dt": 0,
            "name": "Nowhere"
        }"#;
        let current: OwCurrent = serde_json::from_str(json).unwrap();
        let reading = reading_from_current(current, Units::Standard);

        assert_eq!(reading.conditions, "unknown");
        assert_eq!(reading.country, "");
        assert!(reading.sunrise.is_none());
        assert_eq!(reading.units, Units::Standard);
    }

    #[test]
    fn condense_full_forecast_to_five_days() {
        // 2026-03-01T00:00:00Z, 40 slots = 5 days.
        let data = forecast(1_772_323_200, 40, 0);
        let series = condense_forecast(&data, Units::Metric);

        assert_eq!(series.entries.len(), FORECAST_DAYS);
        assert!(series.check_complete().is_ok());
        for entry in &series.entries {
            assert_eq!(entry.timestamp.hour(), 12);
        }
    }

    #[test]
    fn condense_uses_city_offset() {
        // UTC+9: the slot at 03:00Z is local noon.
        let data = forecast(1_772_323_200, 40, 9 * 3600);
        let series = condense_forecast(&data, Units::Metric);

        assert_eq!(series.entries[1].timestamp.hour(), 3);
    }

    #[test]
    fn condense_late_start_still_covers_five_dates() {
        // Starts at 21:00Z, so the first day only has one slot.
        let data = forecast(1_772_323_200 + 21 * 3600, 40, 0);
        let series = condense_forecast(&data, Units::Metric);

        assert_eq!(series.entries.len(), FORECAST_DAYS);
        assert_eq!(series.entries[0].timestamp.hour(), 21);
    }

    #[test]
    fn condense_short_forecast_is_incomplete() {
        let data = forecast(1_772_323_200, 8, 0);
        let series = condense_forecast(&data, Units::Metric);

        assert_eq!(series.entries.len(), 1);
        assert!(series.check_complete().is_err());
    }

    #[test]
    fn status_mapping() {
        assert!(status_error(StatusCode::OK, "x").is_none());
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "Atlantis"),
            Some(ProviderError::not_found("Atlantis"))
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "x"),
            Some(ProviderError::RateLimited)
        );
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "x"),
            Some(ProviderError::Unavailable { .. })
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "x"),
            Some(ProviderError::Unavailable { .. })
        ));
    }

    #[test]
    fn geocoding_place_conversion() {
        let places: Vec<OwPlace> = serde_json::from_str(
            r#"[
                {"name": "Paris", "lat": 48.8589, "lon": 2.32, "country": "FR", "state": "Ile-de-France"},
                {"name": "Paris", "lat": 33.66, "lon": -95.55, "country": "US", "state": ""}
            ]"#,
        )
        .unwrap();
        let matches: Vec<PlaceMatch> = places.into_iter().map(OwPlace::into_match).collect();

        assert_eq!(matches[0].display_name(), "Paris, Ile-de-France, FR");
        assert_eq!(matches[1].state, None);
    }

    #[test]
    fn air_pollution_payload() {
        let data: OwAirPollution =
            serde_json::from_str(r#"{"list": [{"main": {"aqi": 2}, "components": {}}]}"#).unwrap();
        let aq = AirQuality::from_index(data.list[0].main.aqi).unwrap();
        assert_eq!(aq.label, "Fair");
    }

    #[test]
    fn provider_debug_hides_key() {
        let provider =
            OpenWeatherProvider::new(ApiKey::new("hunter2"), &ProviderConfig::default()).unwrap();
        assert!(!format!("{provider:?}").contains("hunter2"));
    }

    // -------------------------------------------------------------------------
    // HTTP behaviour against a mock OpenWeatherMap
    // -------------------------------------------------------------------------

    const TEST_KEY: &str = "test-key-0123";

    fn provider(base_url: String, air_quality: bool) -> OpenWeatherProvider {
        let config = ProviderConfig {
            base_url,
            air_quality,
            ..ProviderConfig::default()
        };
        OpenWeatherProvider::new(ApiKey::new(TEST_KEY), &config).unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> Matcher {
        Matcher::AllOf(
            pairs
                .iter()
                .map(|&(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn assert_key_hidden(err: &ProviderError) {
        assert!(!err.to_string().contains(TEST_KEY), "key leaked: {err}");
        assert!(!format!("{err:?}").contains(TEST_KEY), "key leaked: {err:?}");
    }

    #[tokio::test]
    async fn current_by_name_sends_key_and_units() {
        let mut server = mockito::Server::new_async().await;
        let weather = server
            .mock("GET", CURRENT_PATH)
            .match_query(query(&[("q", "Tokyo"), ("units", "imperial"), ("appid", TEST_KEY)]))
            .with_status(200)
            .with_body(CURRENT_JSON)
            .create_async()
            .await;
        let air = server
            .mock("GET", AIR_POLLUTION_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"list": [{"main": {"aqi": 2}}]}"#)
            .create_async()
            .await;

        let reading = provider(server.url(), true)
            .fetch_current("Tokyo", Units::Imperial)
            .await
            .unwrap();

        assert_eq!(reading.city, "Tokyo");
        assert_eq!(reading.units, Units::Imperial);
        assert_eq!(reading.air_quality.map(|aq| aq.aqi), Some(2));
        weather.assert_async().await;
        air.assert_async().await;
    }

    #[tokio::test]
    async fn current_falls_back_to_geocoding_on_404() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(query(&[("q", "Kiev")]))
            .with_status(404)
            .with_body(r#"{"cod": "404", "message": "city not found"}"#)
            .create_async()
            .await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(query(&[("q", "Kiev"), ("limit", "1")]))
            .with_status(200)
            .with_body(r#"[{"name": "Kyiv", "lat": 50.45, "lon": 30.52, "country": "UA"}]"#)
            .create_async()
            .await;
        let by_coordinates = server
            .mock("GET", CURRENT_PATH)
            .match_query(query(&[("lat", "50.45"), ("lon", "30.52")]))
            .with_status(200)
            .with_body(CURRENT_JSON)
            .create_async()
            .await;

        let reading = provider(server.url(), false)
            .fetch_current("Kiev", Units::Metric)
            .await
            .unwrap();

        assert_eq!(reading.city, "Kyiv");
        assert_eq!(reading.country, "UA");
        assert!(reading.air_quality.is_none());
        by_coordinates.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_place_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = provider(server.url(), true)
            .fetch_current("Atlantis", Units::Metric)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::not_found("Atlantis"));
    }

    #[tokio::test]
    async fn throttled_request_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = provider(server.url(), true)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::RateLimited);
    }

    #[tokio::test]
    async fn rejected_key_is_unavailable_without_leaking_it() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod": 401, "message": "Invalid API key"}"#)
            .create_async()
            .await;

        let err = provider(server.url(), true)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Unavailable { .. }));
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn undecodable_body_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = provider(server.url(), true)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::unavailable("unexpected response from weather provider")
        );
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable_without_leaking_key() {
        let err = provider("http://127.0.0.1:1".to_string(), true)
            .fetch_current("London", Units::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Unavailable { .. }));
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn air_quality_failure_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CURRENT_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(CURRENT_JSON)
            .create_async()
            .await;
        server
            .mock("GET", AIR_POLLUTION_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let reading = provider(server.url(), true)
            .fetch_current("Tokyo", Units::Metric)
            .await
            .unwrap();

        assert!(reading.air_quality.is_none());
    }

    #[tokio::test]
    async fn forecast_geocodes_then_condenses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(query(&[("q", "Berlin")]))
            .with_status(200)
            .with_body(r#"[{"name": "Berlin", "lat": 52.52, "lon": 13.4, "country": "DE"}]"#)
            .create_async()
            .await;
        let forecast_mock = server
            .mock("GET", FORECAST_PATH)
            .match_query(query(&[("lat", "52.52"), ("lon", "13.4"), ("units", "metric")]))
            .with_status(200)
            .with_body(forecast_json(1_772_323_200, 40, 3600).to_string())
            .create_async()
            .await;

        let series = provider(server.url(), true)
            .fetch_forecast("Berlin", Units::Metric)
            .await
            .unwrap();

        assert_eq!(series.city, "Berlin");
        assert_eq!(series.entries.len(), FORECAST_DAYS);
        assert!(series.check_complete().is_ok());
        forecast_mock.assert_async().await;
    }

    #[tokio::test]
    async fn forecast_for_unknown_place_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = provider(server.url(), true)
            .fetch_forecast("Atlantis", Units::Metric)
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::not_found("Atlantis"));
    }

    #[tokio::test]
    async fn search_passes_limit_and_allows_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(query(&[("q", "Paris"), ("limit", "3")]))
            .with_status(200)
            .with_body(
                r#"[
                    {"name": "Paris", "lat": 48.85, "lon": 2.35, "country": "FR", "state": "Ile-de-France"},
                    {"name": "Paris", "lat": 33.66, "lon": -95.55, "country": "US", "state": "Texas"}
                ]"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", GEOCODING_PATH)
            .match_query(query(&[("q", "Nowhere")]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let weather = provider(server.url(), true);
        let places = weather.search_places("Paris", 3).await.unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[1].state.as_deref(), Some("Texas"));

        assert!(weather.search_places("Nowhere", 5).await.unwrap().is_empty());
    }
}
