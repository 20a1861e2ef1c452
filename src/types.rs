//! Core types shared by the binding engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute under which every node exposes its own descriptor document.
pub const DESCRIPTOR_KEY: &str = "infodoc";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Semantic kind of a call parameter, derived from its JSON-schema `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `any`: untyped, passed through as-is.
    Any,
    /// `array`: an ordered sequence.
    Array,
    Boolean,
    Integer,
    /// `number`: a float.
    Number,
    /// `object`: a structured mapping.
    Object,
    String,
}

impl ValueKind {
    /// Parse a JSON-schema type name.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "any" => Some(ValueKind::Any),
            "array" => Some(ValueKind::Array),
            "boolean" => Some(ValueKind::Boolean),
            "integer" => Some(ValueKind::Integer),
            "number" => Some(ValueKind::Number),
            "object" => Some(ValueKind::Object),
            "string" => Some(ValueKind::String),
            _ => None,
        }
    }

    /// Returns the schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Array => "array",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Object => "object",
            ValueKind::String => "string",
        }
    }

    /// Whether `value` already has this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Array => value.is_array(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Number => value.is_number(),
            ValueKind::Object => value.is_object(),
            ValueKind::String => value.is_string(),
        }
    }
}

/// Transport location of a parameter.
///
/// Only `Path` and `Query` take part in request resolution; everything else
/// is excluded from both partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    /// Any other declared location (e.g. `header`).
    Other(String),
    /// No `location` key at all.
    Unspecified,
}

impl Location {
    /// Parse an optional `location` value.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("path") => Location::Path,
            Some("query") => Location::Query,
            Some(other) => Location::Other(other.to_string()),
            None => Location::Unspecified,
        }
    }

    /// Returns the location name for messages.
    pub fn as_str(&self) -> &str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Other(s) => s,
            Location::Unspecified => "unspecified",
        }
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
