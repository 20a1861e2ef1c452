//! API roots: the entry point of a bound surface document.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::document::SurfaceDocument;
use crate::error::SchemaError;
use crate::resource::{insert_member, Attribute, Namespace, ResourceNode};
use crate::types::{json_type_name, DESCRIPTOR_KEY};

/// The root node of a bound API, exposing every top-level resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRoot {
    name: String,
    base_url: String,
    document: Value,
    resources: IndexMap<String, ResourceNode>,
    extras: IndexMap<String, Value>,
}

/// Build the object graph for the surface document `document`.
///
/// The whole graph is built eagerly; any malformed resource aborts the build.
///
/// # Errors
///
/// Returns `SchemaError` if the document lacks a `baseUrl`, has the wrong
/// top-level shape, or any resource or method in it is malformed.
pub fn build_api(name: &str, document: &Value) -> Result<ApiRoot, SchemaError> {
    let surface = SurfaceDocument::from_value(document)?;
    ApiRoot::from_document(name, &surface)
}

impl ApiRoot {
    /// Build from an already shape-checked document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if any resource or method is malformed.
    pub fn from_document(name: &str, surface: &SurfaceDocument<'_>) -> Result<Self, SchemaError> {
        let owner = format!("api {}", name);
        let mut resources = IndexMap::new();

        for (raw, decl) in surface.resources().into_iter().flatten() {
            let decl = decl.as_object().ok_or_else(|| SchemaError::InvalidShape {
                path: format!("/resources/{}", raw),
                expected: "object",
                actual: json_type_name(decl).to_string(),
            })?;
            let node = ResourceNode::from_decl(surface, std::slice::from_ref(raw), decl)?;
            insert_member(&mut resources, &owner, raw, node)?;
        }

        debug!(api = %name, resources = resources.len(), "built api");

        Ok(Self {
            name: name.to_string(),
            base_url: surface.base_url().to_string(),
            document: Value::Object(surface.as_map().clone()),
            resources,
            extras: IndexMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation string, taken from the document's `description`.
    pub fn doc(&self) -> Option<&str> {
        self.document.get("description").and_then(Value::as_str)
    }

    /// The full surface document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceNode> {
        self.resources.get(name)
    }

    /// Top-level resources in declaration order. Each call starts a fresh pass.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.resources.values()
    }

    /// Resolve a dotted attribute path such as `files.revisions.get`.
    pub fn lookup(&self, dotted: &str) -> Option<Attribute<'_>> {
        let mut names = dotted.split('.');
        let first = names.next()?;
        let rest: Vec<&str> = names.collect();
        if rest.is_empty() {
            return self.attribute(first);
        }
        self.resource(first)?.lookup(rest)
    }
}

impl Namespace for ApiRoot {
    fn owner(&self) -> String {
        format!("api {}", self.name)
    }

    fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        if name == DESCRIPTOR_KEY {
            return Some(Attribute::Descriptor(&self.document));
        }
        match self.resources.get(name) {
            Some(node) => Some(Attribute::Resource(node)),
            None => self.extras.get(name).map(Attribute::Extra),
        }
    }

    fn extras_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.extras
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImmutableAttributeError;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "baseUrl": "https://x/",
            "description": "Files service.",
            "resources": {
                "files": {
                    "methods": { "list": { "path": "files", "httpMethod": "GET" } }
                },
                "about": {
                    "methods": { "get": { "path": "about", "httpMethod": "GET" } }
                }
            }
        })
    }

    #[test]
    fn exposes_top_level_resources_in_order() {
        let api = build_api("drive", &document()).unwrap();
        let names: Vec<&str> = api.resources().map(|r| r.name()).collect();
        assert_eq!(names, ["files", "about"]);
        assert_eq!(api.doc(), Some("Files service."));
        assert_eq!(api.base_url(), "https://x/");
    }

    #[test]
    fn descriptor_is_full_document() {
        let api = build_api("drive", &document()).unwrap();
        match api.attribute(DESCRIPTOR_KEY) {
            Some(Attribute::Descriptor(doc)) => assert_eq!(doc, &document()),
            other => panic!("expected descriptor, got {:?}", other),
        }
        assert_eq!(api.document()["baseUrl"], "https://x/");
    }

    #[test]
    fn lookup_dotted_paths() {
        let api = build_api("drive", &document()).unwrap();
        assert!(matches!(api.lookup("files"), Some(Attribute::Resource(_))));
        assert!(matches!(api.lookup("files.list"), Some(Attribute::Method(_))));
        assert!(api.lookup("files.delete").is_none());
        assert!(api.lookup("nothing.list").is_none());
    }

    #[test]
    fn missing_resources_builds_empty_root() {
        let api = build_api("empty", &json!({ "baseUrl": "https://x/" })).unwrap();
        assert_eq!(api.resources().count(), 0);
    }

    #[test]
    fn reserved_top_level_resource() {
        let doc = json!({ "baseUrl": "https://x/", "resources": { "infodoc": {} } });
        let result = build_api("bad", &doc);
        assert!(matches!(result, Err(SchemaError::ReservedName { .. })));
    }

    #[test]
    fn malformed_nested_method_aborts_build() {
        let doc = json!({
            "baseUrl": "https://x/",
            "resources": {
                "files": {
                    "resources": {
                        "comments": {
                            "methods": {
                                "list": {
                                    "path": "c",
                                    "httpMethod": "GET",
                                    "parameters": { "p": { "type": "date" } }
                                }
                            }
                        }
                    }
                }
            }
        });
        let result = build_api("bad", &doc);
        assert!(matches!(result, Err(SchemaError::UnknownType { .. })));
    }

    #[test]
    fn root_resources_are_immutable() {
        let mut api = build_api("drive", &document()).unwrap();
        assert!(matches!(
            api.set_attribute("files", json!(null)),
            Err(ImmutableAttributeError::CannotSet { .. })
        ));
        assert!(matches!(
            api.delete_attribute("about"),
            Err(ImmutableAttributeError::CannotDelete { .. })
        ));
        assert!(api.set_attribute("session", json!("s1")).is_ok());
    }
}
