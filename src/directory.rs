//! API directory lookup: choosing which surface document to fetch.
//!
//! A directory listing has the form
//! `{"items": [{"name": "drive", "version": "v3", "preferred": true}, ...]}`.
//! When no version is requested, the entry marked `preferred` wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DiscoveryError;

#[cfg(feature = "remote")]
use crate::cache::DocumentCache;
#[cfg(feature = "remote")]
use crate::loader::load_document_url;
#[cfg(feature = "remote")]
use tracing::{debug, warn};

/// Root of the public discovery service.
pub const DISCOVERY_ROOT: &str = "https://www.googleapis.com/discovery/v1";

/// Public per-API discovery endpoint.
pub const V2_DISCOVERY_TEMPLATE: &str =
    "https://{name}.googleapis.com/$discovery/rest?version={version}";

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        rename = "discoveryRestUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub discovery_rest_url: Option<String>,
}

/// A parsed directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryList {
    #[serde(default)]
    pub items: Vec<DirectoryEntry>,
}

impl DirectoryList {
    /// # Errors
    ///
    /// Returns `DiscoveryError::InvalidListing` if `value` does not have the
    /// listing shape.
    pub fn from_value(value: &Value) -> Result<Self, DiscoveryError> {
        Self::deserialize(value).map_err(|e| DiscoveryError::InvalidListing {
            message: e.to_string(),
        })
    }

    /// Versions available per API name, in listing order.
    pub fn versions(&self) -> IndexMap<&str, Vec<&str>> {
        let mut apis: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for entry in &self.items {
            apis.entry(entry.name.as_str())
                .or_default()
                .push(entry.version.as_str());
        }
        apis
    }

    /// The preferred version of `name`.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::NotFound` if no entry for `name` is preferred.
    pub fn preferred_version(&self, name: &str) -> Result<&str, DiscoveryError> {
        self.items
            .iter()
            .find(|e| e.name == name && e.preferred)
            .map(|e| e.version.as_str())
            .ok_or_else(|| DiscoveryError::NotFound {
                name: name.to_string(),
            })
    }

    /// The listed entry for `name` at `version`, if any.
    pub fn entry(&self, name: &str, version: &str) -> Option<&DirectoryEntry> {
        self.items
            .iter()
            .find(|e| e.name == name && e.version == version)
    }
}

/// Where the directory listing and surface documents are fetched from.
///
/// Documents are looked up under the directory root first, then through the
/// per-API template, in which `{name}` and `{version}` are substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEndpoints {
    root: String,
    v2_template: String,
}

impl Default for DiscoveryEndpoints {
    fn default() -> Self {
        Self::new(DISCOVERY_ROOT)
    }
}

impl DiscoveryEndpoints {
    pub fn new(root: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
            v2_template: V2_DISCOVERY_TEMPLATE.to_string(),
        }
    }

    pub fn with_v2_template(mut self, template: impl Into<String>) -> Self {
        self.v2_template = template.into();
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// URL of the directory listing.
    pub fn directory_url(&self) -> String {
        format!("{}/apis", self.root)
    }

    /// Candidate document URLs for `name`/`version`, in the order to try them.
    pub fn document_urls(&self, name: &str, version: &str) -> Vec<String> {
        vec![
            format!("{}/apis/{}/{}/rest", self.root, name, version),
            self.v2_template
                .replace("{name}", name)
                .replace("{version}", version),
        ]
    }
}

/// Fetch the surface document for `name`.
///
/// The directory listing is consulted only when `version` is `None`, to pick
/// the preferred version. A `discoveryRestUrl` on that listing entry is tried
/// before the endpoint candidates.
///
/// With a cache, both the listing and the document are read from it when
/// present and stored after a successful fetch.
///
/// # Errors
///
/// Returns `DiscoveryError::NotFound` if the API has no preferred version,
/// or the last fetch error if every candidate URL fails.
#[cfg(feature = "remote")]
pub fn discover(
    endpoints: &DiscoveryEndpoints,
    name: &str,
    version: Option<&str>,
    cache: Option<&DocumentCache>,
) -> Result<Value, DiscoveryError> {
    let (version, listed) = match version {
        Some(v) => (v.to_string(), None),
        None => {
            let listing_url = endpoints.directory_url();
            let listing = match cache {
                Some(cache) => cache
                    .get_or_insert_with("directory", "apis", || load_document_url(&listing_url))?,
                None => load_document_url(&listing_url)?,
            };
            let listing = DirectoryList::from_value(&listing)?;
            let version = listing.preferred_version(name)?.to_string();
            let listed = listing
                .entry(name, &version)
                .and_then(|e| e.discovery_rest_url.clone());
            (version, listed)
        }
    };

    let mut urls: Vec<String> = listed.into_iter().collect();
    for url in endpoints.document_urls(name, &version) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    let fetch = || -> Result<Value, DiscoveryError> {
        let mut last = None;
        for url in &urls {
            match load_document_url(url) {
                Ok(doc) => {
                    debug!(api = name, version = %version, %url, "fetched surface document");
                    return Ok(doc);
                }
                Err(e) => {
                    warn!(api = name, version = %version, %url, error = %e, "discovery url failed");
                    last = Some(e);
                }
            }
        }
        match last {
            Some(e) => Err(e.into()),
            None => Err(DiscoveryError::NotFound {
                name: name.to_string(),
            }),
        }
    };

    match cache {
        Some(cache) => cache.get_or_insert_with(name, &version, fetch),
        None => fetch(),
    }
}
