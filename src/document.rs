//! Borrowed, shape-checked view over a surface document.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::types::json_type_name;

/// A surface document whose top-level shape has been checked.
///
/// The view borrows the underlying JSON; nothing is copied until nodes are built.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceDocument<'a> {
    root: &'a Map<String, Value>,
    base_url: &'a str,
}

impl<'a> SurfaceDocument<'a> {
    /// Check the top-level shape of `value` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the document is not an object, lacks a string
    /// `baseUrl`, or has a non-object `resources` or `parameters`.
    pub fn from_value(value: &'a Value) -> Result<Self, SchemaError> {
        let root = value.as_object().ok_or_else(|| SchemaError::InvalidShape {
            path: "/".to_string(),
            expected: "object",
            actual: json_type_name(value).to_string(),
        })?;

        let base_url = match root.get("baseUrl") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(SchemaError::InvalidShape {
                    path: "/baseUrl".to_string(),
                    expected: "string",
                    actual: json_type_name(other).to_string(),
                })
            }
            None => return Err(SchemaError::MissingField { field: "baseUrl" }),
        };

        object_field(root, "resources", "")?;
        object_field(root, "parameters", "")?;

        Ok(Self { root, base_url })
    }

    /// The whole document.
    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.root
    }

    pub fn base_url(&self) -> &'a str {
        self.base_url
    }

    pub fn description(&self) -> Option<&'a str> {
        self.root.get("description").and_then(Value::as_str)
    }

    /// API-wide parameters applied to every operation.
    pub fn parameters(&self) -> Option<&'a Map<String, Value>> {
        self.root.get("parameters").and_then(Value::as_object)
    }

    /// Top-level resources.
    pub fn resources(&self) -> Option<&'a Map<String, Value>> {
        self.root.get("resources").and_then(Value::as_object)
    }

    /// Walk `resources[a].resources[b]...` along `path` (raw schema names).
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownResource` if any link of the chain is
    /// missing, or `InvalidShape` if a link is not an object.
    pub fn resource_entry(&self, path: &[&str]) -> Result<&'a Map<String, Value>, SchemaError> {
        let mut children = self.resources();
        let mut found: Option<&'a Map<String, Value>> = None;
        let mut pointer = String::new();

        for (depth, name) in path.iter().enumerate() {
            pointer.push_str("/resources/");
            pointer.push_str(name);

            let value = children
                .and_then(|c| c.get(*name))
                .ok_or_else(|| SchemaError::UnknownResource {
                    path: path[..=depth].join("."),
                })?;
            let decl = value.as_object().ok_or_else(|| SchemaError::InvalidShape {
                path: pointer.clone(),
                expected: "object",
                actual: json_type_name(value).to_string(),
            })?;

            children = object_field(decl, "resources", &pointer)?;
            found = Some(decl);
        }

        found.ok_or_else(|| SchemaError::UnknownResource {
            path: String::new(),
        })
    }

    /// Look up the method `name` of the resource at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the resource or method does not exist.
    pub fn method_entry(
        &self,
        path: &[&str],
        name: &str,
    ) -> Result<&'a Map<String, Value>, SchemaError> {
        let resource = self.resource_entry(path)?;
        let pointer = resource_pointer(path);
        let unknown = || SchemaError::UnknownMethod {
            resource: path.join("."),
            method: name.to_string(),
        };

        let method = object_field(resource, "methods", &pointer)?
            .and_then(|m| m.get(name))
            .ok_or_else(unknown)?;

        method.as_object().ok_or_else(|| SchemaError::InvalidShape {
            path: format!("{}/methods/{}", pointer, name),
            expected: "object",
            actual: json_type_name(method).to_string(),
        })
    }
}

/// JSON pointer of the resource at `path`.
pub(crate) fn resource_pointer<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|name| format!("/resources/{}", name.as_ref()))
        .collect()
}

/// Fetch an optional object-valued field, failing if it has another type.
pub(crate) fn object_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, SchemaError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(other) => Err(SchemaError::InvalidShape {
            path: format!("{}/{}", path, key),
            expected: "object",
            actual: json_type_name(other).to_string(),
        }),
    }
}

/// Fetch a required string-valued field.
pub(crate) fn string_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, SchemaError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(SchemaError::InvalidShape {
            path: format!("{}/{}", path, key),
            expected: "string",
            actual: json_type_name(other).to_string(),
        }),
        None => Err(SchemaError::InvalidShape {
            path: format!("{}/{}", path, key),
            expected: "string",
            actual: "nothing".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drive() -> Value {
        json!({
            "baseUrl": "https://www.googleapis.com/drive/v3/",
            "description": "Manages files in Drive.",
            "resources": {
                "files": {
                    "methods": { "list": { "path": "files", "httpMethod": "GET" } },
                    "resources": {
                        "revisions": {
                            "methods": { "get": { "path": "x", "httpMethod": "GET" } }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn from_value_reads_top_level() {
        let value = drive();
        let doc = SurfaceDocument::from_value(&value).unwrap();
        assert_eq!(doc.base_url(), "https://www.googleapis.com/drive/v3/");
        assert_eq!(doc.description(), Some("Manages files in Drive."));
        assert!(doc.parameters().is_none());
        assert_eq!(doc.resources().unwrap().len(), 1);
    }

    #[test]
    fn from_value_rejects_non_object() {
        let value = json!(["baseUrl"]);
        let result = SurfaceDocument::from_value(&value);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidShape { actual, .. }) if actual == "array"
        ));
    }

    #[test]
    fn from_value_requires_base_url() {
        let value = json!({ "resources": {} });
        let result = SurfaceDocument::from_value(&value);
        assert!(matches!(
            result,
            Err(SchemaError::MissingField { field: "baseUrl" })
        ));
    }

    #[test]
    fn from_value_rejects_list_of_resources() {
        let value = json!({ "baseUrl": "https://x/", "resources": [] });
        let result = SurfaceDocument::from_value(&value);
        assert!(matches!(
            result,
            Err(SchemaError::InvalidShape { path, .. }) if path == "/resources"
        ));
    }

    #[test]
    fn resource_entry_walks_nested_chain() {
        let value = drive();
        let doc = SurfaceDocument::from_value(&value).unwrap();
        let decl = doc.resource_entry(&["files", "revisions"]).unwrap();
        assert!(decl["methods"].get("get").is_some());
    }

    #[test]
    fn resource_entry_unknown_link() {
        let value = drive();
        let doc = SurfaceDocument::from_value(&value).unwrap();
        let result = doc.resource_entry(&["files", "comments"]);
        assert!(matches!(
            result,
            Err(SchemaError::UnknownResource { path }) if path == "files.comments"
        ));
    }

    #[test]
    fn method_entry_unknown_method() {
        let value = drive();
        let doc = SurfaceDocument::from_value(&value).unwrap();
        assert!(doc.method_entry(&["files"], "list").is_ok());
        let result = doc.method_entry(&["files"], "delete");
        assert!(matches!(result, Err(SchemaError::UnknownMethod { .. })));
    }

    #[test]
    fn resource_pointer_joins_links() {
        assert_eq!(
            resource_pointer(&["files", "revisions"]),
            "/resources/files/resources/revisions"
        );
    }
}
