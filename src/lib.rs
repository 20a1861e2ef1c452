//! Surface document binding
//!
//! Turns an API discovery document (a "surface document") into a navigable
//! object graph: one node per resource, one callable operation per method.
//! Calling an operation performs no I/O; it returns the fully resolved
//! [`RequestDescriptor`] for an HTTP transport to execute.
//!
//! # Example
//!
//! ```
//! use surface_bind::{build_api, CallArgs};
//! use serde_json::json;
//!
//! let document = json!({
//!     "baseUrl": "https://x/",
//!     "resources": {
//!         "files": {
//!             "methods": {
//!                 "list": {
//!                     "path": "files",
//!                     "httpMethod": "GET",
//!                     "parameters": {
//!                         "q": { "type": "string", "location": "query" }
//!                     }
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let api = build_api("drive", &document).unwrap();
//! let list = api.resource("files").unwrap().method("list").unwrap();
//! let request = list.call(&CallArgs::new().kwarg("q", "a")).unwrap();
//!
//! assert_eq!(request.http_method, "GET");
//! assert_eq!(request.url, "https://x/files");
//! assert_eq!(request.query["q"], "a");
//! assert!(request.headers.is_empty() && request.body.is_empty());
//! ```
//!
//! # Parameters
//!
//! Each operation's signature merges the document-wide `parameters` with the
//! method's own (method entries win), ordered by `parameterOrder` first and
//! then by declaration. Names are rewritten into identifiers (`$.xgafv`
//! becomes `__xgafv`); keywords may use either form.
//!
//! | `location` | Effect on the request |
//! |------------|-----------------------|
//! | `"path"` | Substituted into `{name}` / `{+name}` placeholders |
//! | `"query"` | Added to the query map when set |
//! | anything else | Dropped |

mod api;
mod cache;
mod directory;
mod document;
mod error;
mod loader;
mod method;
mod param;
mod resource;
mod types;

pub use api::{build_api, ApiRoot};
pub use cache::DocumentCache;
pub use directory::{
    DirectoryEntry, DirectoryList, DiscoveryEndpoints, DISCOVERY_ROOT, V2_DISCOVERY_TEMPLATE,
};
pub use document::SurfaceDocument;
pub use error::{
    BindError, DiscoveryError, ImmutableAttributeError, InvokeError, LoadError, SchemaError,
    TemplateError,
};
pub use loader::{is_url, load_document, load_document_auto, load_document_str};
pub use method::{bind_method, join_url, BoundOperation, CallArgs, RequestDescriptor};
pub use param::{normalize_identifier, translate, CallParameter};
pub use resource::{build_resource, Attribute, Member, Namespace, ResourceNode};
pub use types::{json_type_name, Location, ValueKind, DESCRIPTOR_KEY};

#[cfg(feature = "remote")]
pub use directory::discover;
#[cfg(feature = "remote")]
pub use loader::load_document_url;
