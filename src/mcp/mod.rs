//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes current weather, forecasts and geocoding as MCP
//! tools and resources. The server communicates over stdio transport
//! using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│ Dispatcher  │───▶│  Validation  │     │
//! │   │   (stdio)   │    │  (routing)  │    │  (arguments) │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │          ▲                  │                   │            │
//! │          │                  ▼                   ▼            │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │ResponseSink │◀───│  Protocol   │◀───│   Provider   │     │
//! │   │  (1 frame)  │    │  (encoder)  │    │(OpenWeather) │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`registry::Registry`] of tools and resources is built once and
//! shared read-only between request tasks.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;
pub mod validation;

pub use dispatch::Dispatcher;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use registry::Registry;
pub use server::McpServer;
pub use transport::{FrameReader, ResponseSink};
