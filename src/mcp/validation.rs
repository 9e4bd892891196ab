//! Argument validation for tool calls.
//!
//! Raw `arguments` objects never reach a handler. They are checked here
//! against the tool's schema and converted into a [`ToolRequest`].
//! Unknown extra arguments are ignored; `null` counts as absent.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::mcp::registry::ToolKind;
use crate::provider::Units;

/// Smallest accepted `search_cities` limit.
pub const MIN_SEARCH_LIMIT: u32 = 1;

/// Largest accepted `search_cities` limit.
pub const MAX_SEARCH_LIMIT: u32 = 50;

/// Limit used when `search_cities` is called without one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// Arguments of `get_weather` and `get_forecast`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    /// City name, trimmed and non-empty.
    pub city: String,
    /// Requested unit system.
    pub units: Units,
}

/// Arguments of `search_cities`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery {
    /// Free-text query, trimmed and non-empty.
    pub query: String,
    /// Maximum number of matches.
    pub limit: u32,
}

/// A fully validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// `get_weather`.
    GetWeather(CityQuery),
    /// `get_forecast`.
    GetForecast(CityQuery),
    /// `search_cities`.
    SearchCities(PlaceQuery),
}

/// An argument failed its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending argument.
    pub field: &'static str,
    /// Description naming the field.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validates `arguments` for the given tool.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first offending field.
pub fn validate(kind: ToolKind, arguments: Option<&Value>) -> Result<ToolRequest, ValidationError> {
    let empty = Map::new();
    let args = match arguments {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ValidationError::new(
                "arguments",
                "arguments must be a JSON object",
            ))
        }
    };

    match kind {
        ToolKind::GetWeather => city_query(args).map(ToolRequest::GetWeather),
        ToolKind::GetForecast => city_query(args).map(ToolRequest::GetForecast),
        ToolKind::SearchCities => place_query(args).map(ToolRequest::SearchCities),
    }
}

fn city_query(args: &Map<String, Value>) -> Result<CityQuery, ValidationError> {
    Ok(CityQuery {
        city: required_string(args, "city")?,
        units: optional_units(args)?,
    })
}

fn place_query(args: &Map<String, Value>) -> Result<PlaceQuery, ValidationError> {
    Ok(PlaceQuery {
        query: required_string(args, "query")?,
        limit: optional_limit(args)?,
    })
}

fn present<'a>(args: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    args.get(field).filter(|v| !v.is_null())
}

fn required_string(
    args: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = present(args, field)
        .ok_or_else(|| ValidationError::new(field, format!("{field} is required")))?;

    let text = value
        .as_str()
        .ok_or_else(|| ValidationError::new(field, format!("{field} must be a string")))?
        .trim();

    if text.is_empty() {
        return Err(ValidationError::new(
            field,
            format!("{field} must not be empty"),
        ));
    }

    Ok(text.to_string())
}

fn optional_units(args: &Map<String, Value>) -> Result<Units, ValidationError> {
    let Some(value) = present(args, "units") else {
        return Ok(Units::default());
    };

    value.as_str().and_then(Units::from_name).ok_or_else(|| {
        ValidationError::new(
            "units",
            "units must be one of \"metric\", \"imperial\", \"standard\"",
        )
    })
}

fn optional_limit(args: &Map<String, Value>) -> Result<u32, ValidationError> {
    let Some(value) = present(args, "limit") else {
        return Ok(DEFAULT_SEARCH_LIMIT);
    };

    let out_of_range = || {
        ValidationError::new(
            "limit",
            format!("limit must be between {MIN_SEARCH_LIMIT} and {MAX_SEARCH_LIMIT}"),
        )
    };

    let Value::Number(number) = value else {
        return Err(ValidationError::new("limit", "limit must be an integer"));
    };

    if let Some(n) = number.as_u64() {
        return u32::try_from(n)
            .ok()
            .filter(|n| (MIN_SEARCH_LIMIT..=MAX_SEARCH_LIMIT).contains(n))
            .ok_or_else(out_of_range);
    }

    if number.is_i64() {
        return Err(out_of_range());
    }

    Err(ValidationError::new("limit", "limit must be an integer"))
}
