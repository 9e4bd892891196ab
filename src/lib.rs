//! weather-mcp: MCP server for current weather, forecasts and city search
//!
//! This library exposes an upstream weather service to AI assistants through
//! the Model Context Protocol over stdio.
//!
//! # Architecture
//!
//! The server is a thin, typed layer between the client and the provider:
//!
//! - **Transport**: newline-delimited JSON-RPC frames on stdin/stdout
//! - **Dispatch**: method routing, argument validation, error mapping
//! - **Provider**: upstream HTTP calls behind the [`provider::WeatherProvider`] trait
//!
//! Requests are handled concurrently; responses may be written in any order
//! and are matched to requests by ID.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`mcp`] - MCP protocol implementation
//! - [`provider`] - Weather data providers

pub mod config;
pub mod error;
pub mod mcp;
pub mod provider;
