//! Request routing and result construction.
//!
//! The [`Dispatcher`] turns one decoded request into one outgoing message.
//! It owns no I/O: the server loop decides when and where the result is
//! written. Every failure is mapped onto the protocol error taxonomy here,
//! so nothing below this layer ever reaches the client unfiltered.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::error::ProviderError;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, OutgoingMessage, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::registry::{Registry, ResourceDefinition, ResourceTarget, POPULAR_CITIES};
use crate::mcp::validation::{validate, ToolRequest};
use crate::provider::{places_summary, Units, WeatherProvider};

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListCapabilities>,
    /// Resource-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ListCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ListCapabilities::default()),
            resources: Some(ListCapabilities::default()),
        }
    }
}

/// Capabilities shared by tools and resources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCapabilities {
    /// Whether the list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// URI of the resource.
    pub uri: String,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Human-readable rendering of the result.
    pub content: Vec<ToolContent>,
    /// The typed result.
    ///
    /// `structuredContent` is not part of the 2024-11-05 result shape. Clients
    /// on that revision skip the unknown field and read `content`; later
    /// revisions pick up the typed value.
    pub structured_content: Value,
}

impl ToolCallResult {
    /// Pairs a text summary with the structured value it describes.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn structured<T: Serialize>(
        summary: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            content: vec![ToolContent::Text {
                text: summary.into(),
            }],
            structured_content: serde_json::to_value(value)?,
        })
    }
}

/// One entry of a resources/read response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI that was read.
    pub uri: String,
    /// Content type of `text`.
    pub mime_type: &'static str,
    /// The resource body.
    pub text: String,
}

/// Routes requests to handlers.
///
/// Cheap to clone; every request task holds its own copy.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    provider: Arc<dyn WeatherProvider>,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry and a provider.
    #[must_use]
    pub fn new(registry: Arc<Registry>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { registry, provider }
    }

    /// Decodes one raw frame.
    ///
    /// Notifications are handled on the spot and yield `Ok(None)`. A frame
    /// that is not a valid message yields the parse-error response to send
    /// back.
    ///
    /// # Errors
    ///
    /// Returns the error message for an undecodable frame.
    pub fn decode(&self, raw: &str) -> Result<Option<JsonRpcRequest>, OutgoingMessage> {
        match parse_message(raw) {
            Ok(IncomingMessage::Request(req)) => Ok(Some(req)),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                Ok(None)
            }
            Err(error) => {
                debug!(id = ?error.id, "Rejecting undecodable message");
                Err(error.into())
            }
        }
    }

    /// Handles one raw message end to end.
    ///
    /// Returns the encoded response, or `None` for notifications.
    pub async fn handle(&self, raw: &str) -> Option<String> {
        let message = match self.decode(raw) {
            Ok(Some(req)) => self.handle_request(req).await,
            Ok(None) => return None,
            Err(rejection) => rejection,
        };

        message.encode_lossy().ok()
    }

    /// Handles a decoded request.
    pub async fn handle_request(&self, req: JsonRpcRequest) -> OutgoingMessage {
        debug!(method = %req.method, id = %req.id, "Handling request");

        let result = match req.method.as_str() {
            "initialize" => Self::handle_initialize(&req),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.tools() })),
            "tools/call" => self.handle_tools_call(&req).await,
            "resources/list" => Ok(json!({ "resources": self.registry.resources() })),
            "resources/read" => self.handle_resources_read(&req).await,
            _ => {
                debug!(method = %req.method, "Unknown method");
                Err(JsonRpcError::method_not_found(req.id.clone(), &req.method))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(req.id, value).into(),
            Err(error) => error.into(),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => info!("Client initialised"),
            "notifications/cancelled" => debug!(params = ?notif.params, "Cancellation ignored"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn handle_initialize(req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(req, "initialize")?;

        let client = params.client_info.as_ref();
        info!(
            client = client.map_or("unknown", |c| c.name.as_str()),
            client_version = client.and_then(|c| c.version.as_deref()).unwrap_or("unknown"),
            requested_version = %params.protocol_version,
            "Client connected"
        );

        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        }))
    }

    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: ToolCallParams = parse_params(req, "tools/call")?;

        let tool = self.registry.lookup_tool(&params.name).ok_or_else(|| {
            debug!(tool = %params.name, "Unknown tool");
            JsonRpcError::tool_not_found(req.id.clone(), &params.name)
        })?;

        let request = validate(tool.kind, params.arguments.as_ref()).map_err(|e| {
            debug!(tool = tool.name, field = e.field, "Rejected arguments");
            JsonRpcError::invalid_params(req.id.clone(), e.field, e.message)
        })?;

        info!(tool = tool.name, id = %req.id, "Calling tool");
        let result = self
            .call_tool(request)
            .await
            .map_err(|e| provider_failure(&req.id, tool.name, &e))?;

        to_json(&req.id, &result)
    }

    async fn call_tool(&self, request: ToolRequest) -> Result<ToolCallResult, ToolFailure> {
        let result = match request {
            ToolRequest::GetWeather(q) => {
                let reading = self.provider.fetch_current(&q.city, q.units).await?;
                ToolCallResult::structured(reading.summary(), &reading)?
            }
            ToolRequest::GetForecast(q) => {
                let series = self.provider.fetch_forecast(&q.city, q.units).await?;
                series.check_complete()?;
                ToolCallResult::structured(series.summary(), &series)?
            }
            ToolRequest::SearchCities(q) => {
                let places = self.provider.search_places(&q.query, q.limit).await?;
                ToolCallResult::structured(
                    places_summary(&q.query, &places),
                    &json!({ "query": q.query, "places": places }),
                )?
            }
        };
        Ok(result)
    }

    async fn handle_resources_read(&self, req: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = parse_params(req, "resources/read")?;

        let resource = self.registry.lookup_resource(&params.uri).ok_or_else(|| {
            debug!(uri = %params.uri, "Unknown resource");
            JsonRpcError::resource_not_found(req.id.clone(), &params.uri)
        })?;

        info!(uri = %resource.uri, id = %req.id, "Reading resource");
        let body = match resource.target {
            ResourceTarget::City(city) => {
                let reading = self
                    .provider
                    .fetch_current(city, Units::Metric)
                    .await
                    .map_err(|e| provider_failure(&req.id, &resource.uri, &ToolFailure::from(e)))?;
                to_json(&req.id, &reading)?
            }
            ResourceTarget::Search => self.search_usage(),
        };

        let contents = resource_contents(resource, &body).map_err(|e| {
            error!(error = %e, "Failed to serialise resource body");
            JsonRpcError::internal_error(req.id.clone())
        })?;

        Ok(json!({ "contents": [contents] }))
    }

    fn search_usage(&self) -> Value {
        let tools: Vec<&str> = self.registry.tools().iter().map(|t| t.name).collect();
        let cities: Vec<&str> = POPULAR_CITIES.iter().map(|&(_, name)| name).collect();
        json!({
            "description": "Use the get_weather or get_forecast tools with a city name, \
                            or search_cities to resolve ambiguous names",
            "availableTools": tools,
            "popularCities": cities,
        })
    }
}

/// Why a tool handler failed.
#[derive(Debug)]
enum ToolFailure {
    Provider(ProviderError),
    Encode(serde_json::Error),
}

impl From<ProviderError> for ToolFailure {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<serde_json::Error> for ToolFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

fn provider_failure(id: &RequestId, subject: &str, failure: &ToolFailure) -> JsonRpcError {
    match failure {
        ToolFailure::Provider(e @ ProviderError::NotFound { .. }) => {
            info!(subject, error = %e, "No data for request");
            JsonRpcError::provider(id.clone(), e)
        }
        ToolFailure::Provider(e) => {
            warn!(subject, error = %e, "Provider request failed");
            JsonRpcError::provider(id.clone(), e)
        }
        ToolFailure::Encode(e) => {
            error!(subject, error = %e, "Failed to serialise tool result");
            JsonRpcError::internal_error(id.clone())
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    method: &str,
) -> Result<T, JsonRpcError> {
    let params = req.params.clone().ok_or_else(|| {
        JsonRpcError::invalid_params(req.id.clone(), "params", format!("Missing {method} params"))
    })?;

    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::invalid_params(
            req.id.clone(),
            "params",
            format!("Invalid {method} params: {e}"),
        )
    })
}

fn to_json<T: Serialize>(id: &RequestId, value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to serialise result");
        JsonRpcError::internal_error(id.clone())
    })
}

fn resource_contents(
    resource: &ResourceDefinition,
    body: &Value,
) -> Result<ResourceContents, serde_json::Error> {
    Ok(ResourceContents {
        uri: resource.uri.clone(),
        mime_type: resource.mime_type,
        text: serde_json::to_string(body)?,
    })
}
