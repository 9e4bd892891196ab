//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the core message types used in the Model Context Protocol,
//! the error taxonomy surfaced to clients, and the response encoder.
//! All messages follow the JSON-RPC 2.0 specification with MCP-specific extensions.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `id`)
//! - **Response**: A reply to a request (success or error, never both)
//! - **Notification**: A one-way message (no `id`, no response expected)
//!
//! # Error Taxonomy
//!
//! Every error response carries `error.data.kind`, one of the names returned
//! by [`ErrorKind::name`]. Validation errors also carry `error.data.field`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::ProviderError;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "weather-mcp";

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
///
/// Requests expect a response from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Validates that this is a well-formed JSON-RPC 2.0 request.
    ///
    /// Returns an error message if validation fails.
    #[must_use]
    pub fn validate(&self) -> Option<&'static str> {
        if self.jsonrpc != "2.0" {
            return Some("jsonrpc field must be \"2.0\"");
        }
        if self.method.is_empty() {
            return Some("method field cannot be empty");
        }
        None
    }
}

/// A JSON-RPC 2.0 notification message (incoming).
///
/// Notifications do not have an ID and do not expect a response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// Must be "2.0".
    pub jsonrpc: String,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// Error kinds surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The message could not be decoded.
    ParseError,
    /// Unknown method, tool or resource.
    MethodNotFound,
    /// Arguments missing, out of range or of the wrong type.
    Validation,
    /// Upstream has no data for the place.
    ProviderNotFound,
    /// Upstream throttled the request.
    ProviderRateLimited,
    /// Upstream unreachable or answered unexpectedly.
    ProviderUnavailable,
    /// Anything unclassified.
    Internal,
}

impl ErrorKind {
    /// Returns the numeric JSON-RPC code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::Validation => -32602,
            Self::Internal => -32603,
            Self::ProviderNotFound => -32001,
            Self::ProviderRateLimited => -32002,
            Self::ProviderUnavailable => -32003,
        }
    }

    /// Returns the taxonomy name carried in `error.data.kind`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::MethodNotFound => "MethodNotFoundError",
            Self::Validation => "ValidationError",
            Self::ProviderNotFound => "ProviderNotFound",
            Self::ProviderRateLimited => "ProviderRateLimited",
            Self::ProviderUnavailable => "ProviderUnavailable",
            Self::Internal => "InternalError",
        }
    }

    /// Returns the default message for this error kind.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::Validation => "Invalid params",
            Self::ProviderNotFound => "No weather data found",
            Self::ProviderRateLimited => "Weather provider rate limit exceeded, retry later",
            Self::ProviderUnavailable => "Weather provider unavailable",
            Self::Internal => "Internal error",
        }
    }
}

/// Structured detail attached to every error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Taxonomy name, see [`ErrorKind::name`].
    pub kind: &'static str,

    /// Offending argument for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Taxonomy detail.
    pub data: ErrorDetail,
}

impl JsonRpcErrorData {
    /// Creates a new error from a kind.
    #[must_use]
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::with_message(kind, kind.default_message())
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
            data: ErrorDetail {
                kind: kind.name(),
                field: None,
            },
        }
    }

    /// Names the offending field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.data.field = Some(field.into());
        self
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to; `null` when unrecoverable.
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Returns the taxonomy kind name of this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.error.data.kind
    }

    /// Creates a parse error response.
    #[must_use]
    pub fn parse_error(id: Option<RequestId>) -> Self {
        Self::new(id, JsonRpcErrorData::from_kind(ErrorKind::ParseError))
    }

    /// Creates a parse error response with a reason.
    #[must_use]
    pub fn parse_error_with(id: Option<RequestId>, reason: &str) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorKind::ParseError, format!("Parse error: {reason}")),
        )
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorKind::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an unknown tool error response.
    #[must_use]
    pub fn tool_not_found(id: RequestId, name: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorKind::MethodNotFound, format!("Unknown tool: {name}")),
        )
    }

    /// Creates an unknown resource error response.
    #[must_use]
    pub fn resource_not_found(id: RequestId, uri: &str) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(
                ErrorKind::MethodNotFound,
                format!("Resource not found: {uri}"),
            ),
        )
    }

    /// Creates a validation error naming the offending field.
    #[must_use]
    pub fn invalid_params(id: RequestId, field: &str, message: impl Into<String>) -> Self {
        Self::new(
            Some(id),
            JsonRpcErrorData::with_message(ErrorKind::Validation, message).with_field(field),
        )
    }

    /// Maps a provider failure onto the taxonomy.
    #[must_use]
    pub fn provider(id: RequestId, error: &ProviderError) -> Self {
        let kind = match error {
            ProviderError::NotFound { .. } => ErrorKind::ProviderNotFound,
            ProviderError::RateLimited => ErrorKind::ProviderRateLimited,
            ProviderError::Unavailable { .. } => ErrorKind::ProviderUnavailable,
        };
        Self::new(Some(id), JsonRpcErrorData::with_message(kind, error.to_string()))
    }

    /// Creates an internal error response with the generic message only.
    #[must_use]
    pub fn internal_error(id: RequestId) -> Self {
        Self::new(Some(id), JsonRpcErrorData::from_kind(ErrorKind::Internal))
    }
}

/// An incoming message that could be either a request or notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcNotification),
}

impl IncomingMessage {
    /// Returns the method name of this message.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request(req) => &req.method,
            Self::Notification(notif) => &notif.method,
        }
    }

    /// Returns the request ID if this is a request.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Notification(_) => None,
        }
    }
}

/// A response frame ready for encoding.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// A success response.
    Response(JsonRpcResponse),
    /// An error response.
    Error(JsonRpcError),
}

impl OutgoingMessage {
    /// Returns the request ID this message answers, if known.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(resp) => Some(&resp.id),
            Self::Error(err) => err.id.as_ref(),
        }
    }

    /// Encodes the message as a single line of JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Encodes the message, falling back to a generic internal error for
    /// the same request if the payload cannot be serialised.
    ///
    /// # Errors
    ///
    /// Returns an error only if the message has no request ID to fall back
    /// on, or the fallback itself fails.
    pub fn encode_lossy(&self) -> Result<String, serde_json::Error> {
        self.encode().or_else(|e| {
            error!(error = %e, "Failed to serialise response");
            match self.id() {
                Some(id) => Self::from(JsonRpcError::internal_error(id.clone())).encode(),
                None => Err(e),
            }
        })
    }
}

impl From<JsonRpcResponse> for OutgoingMessage {
    fn from(resp: JsonRpcResponse) -> Self {
        Self::Response(resp)
    }
}

impl From<JsonRpcError> for OutgoingMessage {
    fn from(err: JsonRpcError) -> Self {
        Self::Error(err)
    }
}

/// Parses a JSON string into an incoming message.
///
/// # Errors
///
/// Returns a `ParseError` response if the JSON is malformed or not a valid
/// message. The request ID is echoed when it can be recovered.
pub fn parse_message(json: &str) -> Result<IncomingMessage, JsonRpcError> {
    let value: Value =
        serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error(None))?;

    let obj = value
        .as_object()
        .ok_or_else(|| JsonRpcError::parse_error_with(None, "message must be a JSON object"))?;

    let id = obj
        .get("id")
        .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());

    let jsonrpc = obj.get("jsonrpc").and_then(Value::as_str);
    if jsonrpc != Some("2.0") {
        return Err(JsonRpcError::parse_error_with(
            id,
            "jsonrpc field must be \"2.0\"",
        ));
    }

    if obj.contains_key("id") {
        let request: JsonRpcRequest = serde_json::from_value(value)
            .map_err(|_| JsonRpcError::parse_error_with(id, "malformed request"))?;

        if let Some(reason) = request.validate() {
            return Err(JsonRpcError::parse_error_with(Some(request.id), reason));
        }

        Ok(IncomingMessage::Request(request))
    } else {
        let notification: JsonRpcNotification = serde_json::from_value(value)
            .map_err(|_| JsonRpcError::parse_error_with(None, "malformed notification"))?;

        Ok(IncomingMessage::Notification(notification))
    }
}
