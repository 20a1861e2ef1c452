//! On-disk cache for fetched surface documents.
//!
//! Entries are keyed by `(name, version)` and stored as raw JSON under a
//! cache directory. Entries never expire; delete the file to refetch.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;
use crate::loader::load_document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the entry for `name`/`version`.
    pub fn entry_path(&self, name: &str, version: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", sanitize(name), sanitize(version)))
    }

    /// Read a cached entry.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the entry exists but cannot be read or parsed.
    pub fn get(&self, name: &str, version: &str) -> Result<Option<Value>, LoadError> {
        let path = self.entry_path(name, version);
        if !path.exists() {
            return Ok(None);
        }
        load_document(&path).map(Some)
    }

    /// Store `value`, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::WriteError` if the entry cannot be written.
    pub fn put(&self, name: &str, version: &str, value: &Value) -> Result<PathBuf, LoadError> {
        let write_error = |source| LoadError::WriteError {
            path: self.dir.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(write_error)?;

        let path = self.entry_path(name, version);
        std::fs::write(&path, value.to_string()).map_err(|source| LoadError::WriteError {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "cached document");
        Ok(path)
    }

    /// Return the cached entry, or compute, store, and return it.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch`, or a `LoadError` from the cache itself.
    pub fn get_or_insert_with<E, F>(&self, name: &str, version: &str, fetch: F) -> Result<Value, E>
    where
        E: From<LoadError>,
        F: FnOnce() -> Result<Value, E>,
    {
        if let Some(value) = self.get(name, version)? {
            debug!(api = name, version, "cache hit");
            return Ok(value);
        }
        let value = fetch()?;
        self.put(name, version, &value)?;
        Ok(value)
    }
}

/// Keep cache file names portable.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
