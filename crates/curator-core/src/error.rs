//! Error types for configuration loading, persistence and mutation.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Scope;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CuratorError>;

/// Failures surfaced by the store, the resolver and the service.
#[derive(Error, Debug)]
pub enum CuratorError {
    /// The named server does not exist in the target scope.
    #[error("Server '{name}' not found in {scope}")]
    ServerNotFound { scope: Scope, name: String },

    /// The project is not registered in the user document.
    #[error("Project '{path}' not found")]
    ProjectNotFound { path: String },

    /// A server with this name already exists in the target scope.
    #[error("Server '{name}' already exists in {scope}")]
    ServerExists { scope: Scope, name: String },

    /// An operation needed a loaded configuration but none was loaded.
    #[error("Configuration not loaded")]
    NotLoaded,

    /// Filesystem read, write or backup failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not parseable JSON.
    #[error("Invalid JSON in {}: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but its root is not a JSON object.
    #[error("Expected JSON object at root: {}", path.display())]
    NotAnObject { path: PathBuf },

    /// The document could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No home directory could be determined for the user document.
    #[error("Could not determine home directory")]
    HomeDirUnavailable,

    /// A pasted server snippet did not describe exactly one server.
    #[error("Invalid server JSON: {0}")]
    InvalidServerJson(String),

    /// The settings file could not be read or validated.
    #[error("Invalid settings file {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
}

impl CuratorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the NotFound family (server or project).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ServerNotFound { .. } | Self::ProjectNotFound { .. }
        )
    }

    /// True when the failure is a name conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ServerExists { .. })
    }
}
