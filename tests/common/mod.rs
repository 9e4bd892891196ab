//! Shared fixtures for integration tests.
//!
//! [`FakeProvider`] answers from canned data. A few city names trigger
//! special behaviour:
//!
//! - `Atlantis`: not found
//! - `Throttled`: rate limited
//! - `Slowtown`: waits until [`FakeProvider::release_slow`] is called
//! - `Kaboom`: the handler panics

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use weather_mcp::error::{ProviderError, TransportError};
use weather_mcp::mcp::{Dispatcher, FrameReader, McpServer, Registry, ResponseSink};
use weather_mcp::provider::{
    Coordinates, ForecastEntry, ForecastSeries, PlaceMatch, Units, WeatherProvider,
    WeatherReading, FORECAST_DAYS,
};

/// Frame limit used by the test server.
pub const TEST_MAX_FRAME_BYTES: usize = 64 * 1024;

/// In-memory weather provider.
#[derive(Debug, Default)]
pub struct FakeProvider {
    calls: AtomicUsize,
    slow_gate: Notify,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Lets a pending `Slowtown` lookup finish.
    pub fn release_slow(&self) {
        self.slow_gate.notify_one();
    }

    async fn enter(&self, city: &str) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match city {
            "Atlantis" => Err(ProviderError::not_found(city)),
            "Throttled" => Err(ProviderError::RateLimited),
            "Slowtown" => {
                self.slow_gate.notified().await;
                Ok(())
            }
            "Kaboom" => panic!("provider exploded"),
            _ => Ok(()),
        }
    }
}

pub fn reading(city: &str, units: Units) -> WeatherReading {
    WeatherReading {
        city: city.to_string(),
        country: "ZZ".to_string(),
        units,
        temperature: 18.5,
        feels_like: 17.9,
        conditions: "scattered clouds".to_string(),
        humidity: 55,
        wind_speed: 4.1,
        wind_direction: 270,
        pressure: 1015,
        cloudiness: 40,
        visibility_km: 10.0,
        sunrise: None,
        sunset: None,
        coordinates: Coordinates {
            latitude: 35.68,
            longitude: 139.69,
        },
        air_quality: None,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_current(
        &self,
        city: &str,
        units: Units,
    ) -> Result<WeatherReading, ProviderError> {
        self.enter(city).await?;
        Ok(reading(city, units))
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        units: Units,
    ) -> Result<ForecastSeries, ProviderError> {
        self.enter(city).await?;
        let noon = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let entries = (0..FORECAST_DAYS)
            .map(|day| ForecastEntry {
                timestamp: noon + Duration::days(i64::try_from(day).unwrap()),
                temperature: 12.0,
                conditions: "light rain".to_string(),
                humidity: 70,
                wind_speed: 6.0,
            })
            .collect();

        Ok(ForecastSeries {
            city: city.to_string(),
            country: "ZZ".to_string(),
            units,
            entries,
        })
    }

    async fn search_places(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<PlaceMatch>, ProviderError> {
        self.enter(query).await?;
        let known = [("Paris", "FR"), ("Paris", "US"), ("Paris", "CA")];
        Ok(known
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(query))
            .take(limit as usize)
            .map(|&(name, country)| PlaceMatch {
                name: name.to_string(),
                state: None,
                country: country.to_string(),
                latitude: 48.85,
                longitude: 2.35,
            })
            .collect())
    }
}

/// Client side of an in-memory server connection.
pub struct TestClient {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
}

impl TestClient {
    /// Sends one frame.
    pub async fn send(&mut self, message: &Value) {
        self.send_raw(&message.to_string()).await;
    }

    /// Sends raw text followed by a newline.
    pub async fn send_raw(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Reads one response frame.
    pub async fn recv(&mut self) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .unwrap()
            .expect("server closed the connection");
        serde_json::from_str(&line).expect("every frame must be a complete JSON document")
    }

    /// Closes the client's write side, signalling end of input.
    pub async fn close(mut self) {
        self.writer.shutdown().await.unwrap();
    }
}

/// Starts a server over an in-memory pipe.
pub fn start(provider: Arc<FakeProvider>) -> (TestClient, JoinHandle<Result<(), TransportError>>) {
    let (client, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client);

    let dispatcher = Dispatcher::new(Arc::new(Registry::new()), provider);
    let server = McpServer::new(dispatcher, TEST_MAX_FRAME_BYTES);

    let handle = tokio::spawn(async move {
        server
            .serve(
                FrameReader::new(server_read, TEST_MAX_FRAME_BYTES),
                ResponseSink::new(server_write),
            )
            .await
    });

    let client = TestClient {
        writer: client_write,
        lines: BufReader::new(client_read).lines(),
    };
    (client, handle)
}

/// Builds a request frame.
pub fn request(id: i64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

/// Builds a tools/call request frame.
pub fn tool_call(id: i64, tool: &str, arguments: Value) -> Value {
    request(
        id,
        "tools/call",
        serde_json::json!({ "name": tool, "arguments": arguments }),
    )
}
