//! Translation of JSON-schema parameter definitions into call parameters.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::SchemaError;
use crate::types::{json_type_name, Location, ValueKind};

/// One parameter of an operation's call signature.
///
/// Every parameter can be supplied positionally or by keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallParameter {
    /// Identifier used for keyword binding.
    pub name: String,
    /// Name as declared in the document; used for placeholders and query keys.
    pub wire_name: String,
    pub kind: ValueKind,
    pub location: Location,
    /// Required parameters never carry a default.
    pub required: bool,
    /// Coerced default, or `None` when the parameter is unset by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Rewrite `name` into a legal identifier.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, and a leading digit
/// gets a `_` prefix. `"$.xgafv"` becomes `"__xgafv"`.
pub fn normalize_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Translate one parameter definition.
///
/// # Errors
///
/// Returns `SchemaError` if the definition is not an object, has a missing or
/// unknown `type`, or declares a default that cannot be coerced to that type.
pub fn translate(name: &str, decl: &Value) -> Result<CallParameter, SchemaError> {
    let path = format!("/parameters/{}", name);
    let decl = decl.as_object().ok_or_else(|| SchemaError::InvalidShape {
        path: path.clone(),
        expected: "object",
        actual: json_type_name(decl).to_string(),
    })?;

    let kind = match decl.get("type") {
        Some(Value::String(t)) => ValueKind::parse(t).ok_or_else(|| SchemaError::UnknownType {
            parameter: name.to_string(),
            value: t.clone(),
        })?,
        Some(other) => {
            return Err(SchemaError::UnknownType {
                parameter: name.to_string(),
                value: other.to_string(),
            })
        }
        None => {
            return Err(SchemaError::MissingType {
                parameter: name.to_string(),
            })
        }
    };

    let location = Location::parse(decl.get("location").and_then(Value::as_str));

    let required = match decl.get("required") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(SchemaError::InvalidShape {
                path: format!("{}/required", path),
                expected: "boolean",
                actual: json_type_name(other).to_string(),
            })
        }
    };

    // Null defaults behave as if no default were declared.
    let default = match decl.get("default") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(coerce_default(kind, raw, name)?),
    };

    Ok(CallParameter {
        name: normalize_identifier(name),
        wire_name: name.to_string(),
        kind,
        location,
        required,
        default: if required { None } else { default },
        description: decl
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

/// Coerce a declared default into `kind`.
///
/// Documents routinely declare defaults as strings (`"100"`, `"true"`), so
/// scalar kinds parse from their textual form.
///
/// A `string` parameter with a boolean or numeric default takes the JSON
/// spelling of that value (`true` becomes `"true"`, `1.5` becomes `"1.5"`).
/// That is the text sent on the wire, not a language-level cast.
fn coerce_default(kind: ValueKind, raw: &Value, parameter: &str) -> Result<Value, SchemaError> {
    let invalid = || SchemaError::InvalidDefault {
        parameter: parameter.to_string(),
        default: raw.to_string(),
        kind: kind.as_str(),
    };

    let coerced = match (kind, raw) {
        (ValueKind::Any, v) => Some(v.clone()),

        (ValueKind::Array, Value::Array(items)) => Some(Value::Array(items.clone())),
        (ValueKind::Array, Value::String(s)) => Some(Value::Array(
            s.chars().map(|c| Value::String(c.to_string())).collect(),
        )),
        (ValueKind::Array, Value::Object(map)) => Some(Value::Array(
            map.keys().cloned().map(Value::String).collect(),
        )),

        (ValueKind::Object, Value::Object(map)) => Some(Value::Object(map.clone())),
        (ValueKind::Object, Value::Array(pairs)) => pairs_to_object(pairs).map(Value::Object),

        (ValueKind::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
        (ValueKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (ValueKind::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),

        (ValueKind::Integer, Value::Number(n)) => integer_from_number(n),
        (ValueKind::Integer, Value::String(s)) => {
            s.trim().parse::<i64>().ok().map(|i| Value::Number(i.into()))
        }
        (ValueKind::Integer, Value::Bool(b)) => Some(Value::Number(i64::from(*b).into())),

        (ValueKind::Number, Value::Number(n)) => n.as_f64().and_then(float_value),
        (ValueKind::Number, Value::String(s)) => {
            s.trim().parse::<f64>().ok().and_then(float_value)
        }
        (ValueKind::Number, Value::Bool(b)) => float_value(if *b { 1.0 } else { 0.0 }),

        (ValueKind::String, Value::String(s)) => Some(Value::String(s.clone())),
        (ValueKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ValueKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        _ => None,
    };

    coerced.ok_or_else(invalid)
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    // Truncate toward zero, like an integer cast.
    let f = n.as_f64()?;
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(Value::Number((f.trunc() as i64).into()))
    } else {
        None
    }
}

fn float_value(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}

/// `[["k", v], ...]` into a mapping.
fn pairs_to_object(pairs: &[Value]) -> Option<Map<String, Value>> {
    pairs
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([Value::String(k), v]) => Some((k.clone(), v.clone())),
            _ => None,
        })
        .collect()
}
