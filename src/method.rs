//! Method binding: from a method's schema to a callable request builder.
//!
//! A [`BoundOperation`] holds an ordered call signature synthesized from the
//! merged API-wide and method parameters. Calling it binds positional and
//! keyword arguments against that signature, fills the path template, and
//! collects query parameters into a [`RequestDescriptor`].

use std::collections::BTreeMap;

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::document::{resource_pointer, string_field, SurfaceDocument};
use crate::error::{BindError, InvokeError, SchemaError, TemplateError};
use crate::param::{normalize_identifier, translate, CallParameter};
use crate::types::{json_type_name, Location};

/// Characters escaped in a simple `{name}` expansion (one path segment).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters escaped in a reserved `{+name}` expansion.
const RESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// The fully resolved request an operation call produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDescriptor {
    pub http_method: String,
    pub url: String,
    /// Query parameters keyed by their wire names, in signature order.
    pub query: Map<String, Value>,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// Positional and keyword arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keywords: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument. `name` may be the identifier or the wire name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.push((name.into(), value.into()));
        self
    }

    pub fn push_arg(&mut self, value: Value) {
        self.positional.push(value);
    }

    pub fn push_kwarg(&mut self, name: String, value: Value) {
        self.keywords.push((name, value));
    }
}

/// A callable operation bound to one method of a surface document.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOperation {
    name: String,
    resource_path: Vec<String>,
    description: Option<String>,
    http_method: String,
    url_template: String,
    signature: Vec<CallParameter>,
}

/// Bind the method `method` of the resource at `resource_path`.
///
/// `resource_path` holds raw schema names from the root, so a nested resource
/// is addressed as `&["files", "revisions"]`.
///
/// # Errors
///
/// Returns `SchemaError` if the method cannot be found or its parameter
/// schema is inconsistent.
pub fn bind_method(
    document: &SurfaceDocument<'_>,
    resource_path: &[&str],
    method: &str,
) -> Result<BoundOperation, SchemaError> {
    let decl = document.method_entry(resource_path, method)?;
    let owner: Vec<String> = resource_path.iter().map(|s| normalize_identifier(s)).collect();
    let pointer = format!("{}/methods/{}", resource_pointer(resource_path), method);
    BoundOperation::from_decl(document, owner, method, decl, &pointer)
}

impl BoundOperation {
    pub(crate) fn from_decl(
        document: &SurfaceDocument<'_>,
        resource_path: Vec<String>,
        method: &str,
        decl: &Map<String, Value>,
        pointer: &str,
    ) -> Result<Self, SchemaError> {
        let name = normalize_identifier(method);
        let path = string_field(decl, "path", pointer)?;
        let http_method = string_field(decl, "httpMethod", pointer)?;

        let mut merged = merge_parameters(document, decl, pointer)?;
        let mut signature = Vec::with_capacity(merged.len());

        match decl.get("parameterOrder") {
            None => {}
            Some(Value::Array(order)) => {
                for entry in order {
                    let raw = entry.as_str().ok_or_else(|| SchemaError::InvalidShape {
                        path: format!("{}/parameterOrder", pointer),
                        expected: "string",
                        actual: json_type_name(entry).to_string(),
                    })?;
                    let param = merged
                        .shift_remove(&normalize_identifier(raw))
                        .ok_or_else(|| SchemaError::UnknownOrderedParameter {
                            method: name.clone(),
                            parameter: raw.to_string(),
                        })?;
                    signature.push(param);
                }
            }
            Some(other) => {
                return Err(SchemaError::InvalidShape {
                    path: format!("{}/parameterOrder", pointer),
                    expected: "array",
                    actual: json_type_name(other).to_string(),
                })
            }
        }
        signature.extend(merged.into_values());

        let operation = Self {
            name,
            resource_path,
            description: decl
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            http_method: http_method.to_string(),
            url_template: join_url(document.base_url(), path),
            signature,
        };

        debug!(
            operation = %operation.qualified_name(),
            verb = %operation.http_method,
            url = %operation.url_template,
            parameters = operation.signature.len(),
            "bound operation"
        );

        Ok(operation)
    }

    /// Attribute name of this operation on its resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the API root, e.g. `files.revisions.get`.
    pub fn qualified_name(&self) -> String {
        let mut parts = self.resource_path.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }

    /// Identifiers of the owning resource chain.
    pub fn resource_path(&self) -> &[String] {
        &self.resource_path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn http_method(&self) -> &str {
        &self.http_method
    }

    /// Base URL joined with the method path, placeholders unresolved.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Call parameters in binding order.
    pub fn signature(&self) -> &[CallParameter] {
        &self.signature
    }

    /// Identifiers of path parameters, in signature order.
    pub fn path_names(&self) -> impl Iterator<Item = &str> {
        self.names_at(Location::Path)
    }

    /// Identifiers of query parameters, in signature order.
    pub fn query_names(&self) -> impl Iterator<Item = &str> {
        self.names_at(Location::Query)
    }

    fn names_at(&self, location: Location) -> impl Iterator<Item = &str> {
        self.signature
            .iter()
            .filter(move |p| p.location == location)
            .map(|p| p.name.as_str())
    }

    /// Render the signature as `name(a, b=default, ...)`.
    pub fn signature_string(&self) -> String {
        let params: Vec<String> = self
            .signature
            .iter()
            .map(|p| match (&p.default, p.required) {
                (_, true) => p.name.clone(),
                (Some(d), false) => format!("{}={}", p.name, d),
                (None, false) => format!("{}=None", p.name),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Bind `args` against the signature.
    ///
    /// Returns every parameter that ends up with a value, keyed by identifier.
    /// Defaults fill unbound optional parameters; parameters without a default
    /// stay absent, and so does an explicit `null`.
    ///
    /// # Errors
    ///
    /// Returns `BindError` on too many positional arguments, unknown or
    /// repeated keywords, or missing required arguments.
    pub fn bind_arguments(&self, args: &CallArgs) -> Result<IndexMap<String, Value>, BindError> {
        let given = args.positional.len();
        if given > self.signature.len() {
            return Err(BindError::TooManyPositional {
                operation: self.name.clone(),
                expected: self.signature.len(),
                given,
            });
        }

        let mut slots: Vec<Option<&Value>> = vec![None; self.signature.len()];
        for (slot, value) in slots.iter_mut().zip(&args.positional) {
            *slot = Some(value);
        }

        for (key, value) in &args.keywords {
            let index = self
                .signature
                .iter()
                .position(|p| p.name == *key)
                .or_else(|| self.signature.iter().position(|p| p.wire_name == *key))
                .ok_or_else(|| BindError::UnknownArgument {
                    operation: self.name.clone(),
                    name: key.clone(),
                })?;
            if slots[index].is_some() {
                return Err(BindError::MultipleValues {
                    operation: self.name.clone(),
                    name: self.signature[index].name.clone(),
                });
            }
            slots[index] = Some(value);
        }

        let missing: Vec<String> = self
            .signature
            .iter()
            .zip(&slots)
            .filter(|(p, slot)| p.required && slot.is_none())
            .map(|(p, _)| p.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(BindError::MissingArguments {
                operation: self.name.clone(),
                names: missing,
            });
        }

        let bound = self
            .signature
            .iter()
            .zip(slots)
            .filter_map(|(p, slot)| {
                let value = slot.or(p.default.as_ref())?;
                (!value.is_null()).then(|| (p.name.clone(), value.clone()))
            })
            .collect();
        Ok(bound)
    }

    /// Invoke the operation, producing the request it describes.
    ///
    /// # Errors
    ///
    /// Returns `InvokeError::Bind` if the arguments do not fit the signature,
    /// or `InvokeError::Template` if a path placeholder cannot be filled.
    pub fn call(&self, args: &CallArgs) -> Result<RequestDescriptor, InvokeError> {
        let bound = self.bind_arguments(args)?;
        let url = self.expand_path(&bound)?;

        let query: Map<String, Value> = self
            .signature
            .iter()
            .filter(|p| p.location == Location::Query)
            .filter_map(|p| bound.get(&p.name).map(|v| (p.wire_name.clone(), v.clone())))
            .collect();

        trace!(operation = %self.qualified_name(), %url, "resolved request");

        Ok(RequestDescriptor {
            http_method: self.http_method.clone(),
            url,
            query,
            headers: BTreeMap::new(),
            body: Vec::new(),
        })
    }

    fn expand_path(&self, bound: &IndexMap<String, Value>) -> Result<String, TemplateError> {
        let template = &self.url_template;
        let mut url = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find('{') {
            url.push_str(&rest[..start]);
            let end = rest[start..]
                .find('}')
                .ok_or_else(|| TemplateError::Unterminated {
                    template: template.clone(),
                })?;
            let expr = &rest[start + 1..start + end];
            let (name, reserved) = match expr.strip_prefix('+') {
                Some(name) => (name, true),
                None => (expr, false),
            };

            let param = self
                .signature
                .iter()
                .find(|p| p.wire_name == name)
                .or_else(|| self.signature.iter().find(|p| p.name == name))
                .ok_or_else(|| TemplateError::UnknownPlaceholder {
                    template: template.clone(),
                    name: name.to_string(),
                })?;
            if param.location != Location::Path {
                return Err(TemplateError::NotPathParameter {
                    name: name.to_string(),
                    location: param.location.as_str().to_string(),
                });
            }

            let value = bound.get(&param.name).ok_or_else(|| TemplateError::Unbound {
                name: name.to_string(),
            })?;
            let text = scalar_text(value).ok_or_else(|| TemplateError::NonScalar {
                name: name.to_string(),
                actual: json_type_name(value).to_string(),
            })?;

            let set = if reserved { RESERVED } else { SEGMENT };
            url.extend(utf8_percent_encode(&text, set));
            rest = &rest[start + end + 1..];
        }
        url.push_str(rest);

        Ok(url)
    }
}

/// API-wide parameters overlaid with the method's own, keyed by identifier.
///
/// An override keeps the position of the parameter it replaces.
fn merge_parameters(
    document: &SurfaceDocument<'_>,
    decl: &Map<String, Value>,
    pointer: &str,
) -> Result<IndexMap<String, CallParameter>, SchemaError> {
    let mut merged = IndexMap::new();

    let own = match decl.get("parameters") {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            return Err(SchemaError::InvalidShape {
                path: format!("{}/parameters", pointer),
                expected: "object",
                actual: json_type_name(other).to_string(),
            })
        }
    };

    for params in document.parameters().into_iter().chain(own) {
        for (raw, param_decl) in params {
            let param = translate(raw, param_decl)?;
            merged.insert(param.name.clone(), param);
        }
    }

    Ok(merged)
}

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
