//! Error types for surface document binding and invocation.

use std::path::PathBuf;
use thiserror::Error;

/// The surface document is malformed or self-inconsistent.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid document at {path}: expected {expected}, got {actual}")]
    InvalidShape {
        path: String,
        expected: &'static str,
        actual: String,
    },

    #[error("document is missing required field \"{field}\"")]
    MissingField { field: &'static str },

    #[error("parameter \"{parameter}\" has no type")]
    MissingType { parameter: String },

    #[error("parameter \"{parameter}\" has unknown type \"{value}\"")]
    UnknownType { parameter: String, value: String },

    #[error("parameter \"{parameter}\": cannot coerce default {default} to {kind}")]
    InvalidDefault {
        parameter: String,
        default: String,
        kind: &'static str,
    },

    #[error("method \"{method}\": parameterOrder names undefined parameter \"{parameter}\"")]
    UnknownOrderedParameter { method: String, parameter: String },

    #[error("unknown resource \"{path}\"")]
    UnknownResource { path: String },

    #[error("resource \"{resource}\" has no method \"{method}\"")]
    UnknownMethod { resource: String, method: String },

    #[error("\"{name}\" in {owner} collides with the reserved descriptor key")]
    ReservedName { owner: String, name: String },

    #[error("\"{name}\" is declared more than once in {owner}")]
    DuplicateMember { owner: String, name: String },
}

/// Caller-supplied arguments do not satisfy an operation's signature.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("{operation}() missing required argument(s): {}", names.join(", "))]
    MissingArguments { operation: String, names: Vec<String> },

    #[error("{operation}() got an unexpected keyword argument \"{name}\"")]
    UnknownArgument { operation: String, name: String },

    #[error("{operation}() takes {expected} positional argument(s) but {given} were given")]
    TooManyPositional {
        operation: String,
        expected: usize,
        given: usize,
    },

    #[error("{operation}() got multiple values for argument \"{name}\"")]
    MultipleValues { operation: String, name: String },
}

/// A path placeholder could not be filled from the bound path parameters.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("placeholder {{{name}}} in \"{template}\" has no matching parameter")]
    UnknownPlaceholder { template: String, name: String },

    #[error("placeholder {{{name}}} is bound to a {location} parameter, not a path parameter")]
    NotPathParameter { name: String, location: String },

    #[error("placeholder {{{name}}} has no bound value")]
    Unbound { name: String },

    #[error("placeholder {{{name}}} cannot take a {actual} value")]
    NonScalar { name: String, actual: String },

    #[error("unterminated placeholder in \"{template}\"")]
    Unterminated { template: String },
}

/// An attempt to mutate a fixed attribute of a constructed node.
#[derive(Debug, Error)]
pub enum ImmutableAttributeError {
    #[error("cannot set attribute \"{name}\" of {owner}")]
    CannotSet { owner: String, name: String },

    #[error("cannot delete attribute \"{name}\" of {owner}")]
    CannotDelete { owner: String, name: String },
}

/// Failure of a single operation invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors while loading a surface document from disk or the network.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while selecting an API from a discovery directory listing.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no service with such name: {name}")]
    NotFound { name: String },

    #[error("invalid directory listing: {message}")]
    InvalidListing { message: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl SchemaError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl InvokeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. }
            | LoadError::ReadError { .. }
            | LoadError::WriteError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl DiscoveryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DiscoveryError::Load(e) => e.exit_code(),
            DiscoveryError::NotFound { .. } | DiscoveryError::InvalidListing { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("drive.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::InvalidJson {
            source: serde_json::from_str::<serde_json::Value>("nope").unwrap_err(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn discovery_error_exit_codes() {
        let err = DiscoveryError::NotFound {
            name: "nosuchapi".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = DiscoveryError::Load(LoadError::FileNotFound {
            path: PathBuf::from("listing.json"),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn bind_error_lists_missing_names() {
        let err = BindError::MissingArguments {
            operation: "get".into(),
            names: vec!["fileId".into(), "revisionId".into()],
        };
        assert_eq!(
            err.to_string(),
            "get() missing required argument(s): fileId, revisionId"
        );
    }

    #[test]
    fn template_error_display_braces() {
        let err = TemplateError::Unbound {
            name: "fileId".into(),
        };
        assert_eq!(err.to_string(), "placeholder {fileId} has no bound value");
    }

    #[test]
    fn invoke_error_is_transparent() {
        let err: InvokeError = TemplateError::Unbound { name: "id".into() }.into();
        assert_eq!(err.to_string(), "placeholder {id} has no bound value");
        assert_eq!(err.exit_code(), 1);
    }
}
