//! Capability registry: the fixed set of tools and resources.
//!
//! The registry is built once at startup and only read afterwards. It is
//! shared between request tasks behind an `Arc`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::mcp::validation::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, MIN_SEARCH_LIMIT};
use crate::provider::Units;

/// URI scheme of every resource.
pub const RESOURCE_SCHEME: &str = "weather://";

/// Identifier reserved for the free-text search resource.
pub const SEARCH_IDENTIFIER: &str = "search";

/// Cities exposed as resources, with their URI slugs.
pub const POPULAR_CITIES: [(&str, &str); 7] = [
    ("new-york", "New York"),
    ("london", "London"),
    ("tokyo", "Tokyo"),
    ("paris", "Paris"),
    ("sydney", "Sydney"),
    ("los-angeles", "Los Angeles"),
    ("berlin", "Berlin"),
];

/// Which handler a tool routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Current conditions.
    GetWeather,
    /// Daily forecast.
    GetForecast,
    /// Geocoding search.
    SearchCities,
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
    /// Handler selector.
    #[serde(skip)]
    pub kind: ToolKind,
}

/// What a resource resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTarget {
    /// Current weather for a named city.
    City(&'static str),
    /// Usage document for free-text lookups.
    Search,
}

/// A resource definition for resources/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    /// Unique resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Content type of the resource body.
    pub mime_type: &'static str,
    /// Handler selector.
    #[serde(skip)]
    pub target: ResourceTarget,
}

/// Immutable table of tools and resources.
#[derive(Debug, Clone)]
pub struct Registry {
    tools: Vec<ToolDefinition>,
    resources: Vec<ResourceDefinition>,
}

impl Registry {
    /// Builds the weather registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: tool_definitions(),
            resources: resource_definitions(),
        }
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn lookup_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Looks up a resource by exact URI.
    #[must_use]
    pub fn lookup_resource(&self, uri: &str) -> Option<&ResourceDefinition> {
        self.resources.iter().find(|resource| resource.uri == uri)
    }

    /// All tools, in listing order.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// All resources, in listing order.
    #[must_use]
    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn units_schema() -> Value {
    let names: Vec<&str> = Units::ALL.iter().map(|u| u.as_str()).collect();
    json!({
        "type": "string",
        "enum": names,
        "description": "Measurement units: metric (Celsius, m/s), imperial (Fahrenheit, mph) or standard (Kelvin, m/s)",
        "default": Units::default().as_str()
    })
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_weather",
            description: "Get current weather conditions for a specific city",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "Name of the city to get weather for"
                    },
                    "units": units_schema()
                },
                "required": ["city"]
            }),
            kind: ToolKind::GetWeather,
        },
        ToolDefinition {
            name: "get_forecast",
            description: "Get 5-day weather forecast for a specific city",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "Name of the city to get forecast for"
                    },
                    "units": units_schema()
                },
                "required": ["city"]
            }),
            kind: ToolKind::GetForecast,
        },
        ToolDefinition {
            name: "search_cities",
            description: "Search for cities and get their coordinates using geocoding",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "City name or partial name to search for"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": DEFAULT_SEARCH_LIMIT,
                        "minimum": MIN_SEARCH_LIMIT,
                        "maximum": MAX_SEARCH_LIMIT
                    }
                },
                "required": ["query"]
            }),
            kind: ToolKind::SearchCities,
        },
    ]
}

fn resource_definitions() -> Vec<ResourceDefinition> {
    let mut resources: Vec<ResourceDefinition> = POPULAR_CITIES
        .iter()
        .map(|&(slug, city)| ResourceDefinition {
            uri: format!("{RESOURCE_SCHEME}{slug}"),
            name: format!("Weather for {city}"),
            description: format!("Current weather conditions for {city}"),
            mime_type: "application/json",
            target: ResourceTarget::City(city),
        })
        .collect();

    resources.push(ResourceDefinition {
        uri: format!("{RESOURCE_SCHEME}{SEARCH_IDENTIFIER}"),
        name: "Weather Search".to_string(),
        description: "Search for weather information for any city worldwide".to_string(),
        mime_type: "application/json",
        target: ResourceTarget::Search,
    });

    resources
}
