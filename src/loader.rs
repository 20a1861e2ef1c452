//! Fetching raw surface documents.
//!
//! Every loader returns the document as untyped JSON; shape checks happen
//! later in [`crate::SurfaceDocument::from_value`]. Directory listings are
//! fetched through the same path.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a document saved on disk, e.g. by `surface-bind discover --output`
/// or a [`crate::DocumentCache`] entry.
///
/// # Errors
///
/// `LoadError::FileNotFound` for a missing path, `LoadError::ReadError` if
/// the file cannot be read, and `LoadError::InvalidJson` for non-JSON text.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "loaded document");
    load_document_str(&content)
}

/// Parse document text. Member order of the input is kept, which fixes the
/// order of resources, methods, and parameters in the bound graph.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` for non-JSON text.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// GET a document or directory listing from a discovery endpoint.
///
/// Discovery services serve large documents gzip-compressed; reqwest
/// decodes them. Any non-2xx status is an error so that [`crate::discover`]
/// can move on to its next candidate URL.
///
/// # Errors
///
/// `LoadError::NetworkError` on connection failure, timeout, or error
/// status; `LoadError::InvalidJson` for a non-JSON body.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    debug!(%url, "fetching document");
    let response = client.get(url).send().map_err(network)?;

    let response = response.error_for_status().map_err(network)?;

    let text = response.text().map_err(network)?;
    load_document_str(&text)
}

/// Whether a CLI document argument names a remote document.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load the document named by a CLI argument: `http(s)://` sources are
/// fetched, anything else is read from disk.
///
/// Without the `remote` feature a URL source reports `FileNotFound`.
///
/// # Errors
///
/// The errors of [`load_document`] or [`load_document_url`].
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}
