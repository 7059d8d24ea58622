//! Shared core types used across the store, resolver and service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a server definition lives in the user document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Scope {
    /// Top-level `mcpServers`.
    Global,
    /// `projects[path].mcpServers`.
    Project(String),
}

impl Scope {
    pub fn project(path: impl Into<String>) -> Self {
        Self::Project(path.into())
    }

    pub fn project_path(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Project(path) => Some(path),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global scope"),
            Self::Project(path) => write!(f, "project '{path}'"),
        }
    }
}

/// Configuration layers in ascending precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    /// Top-level `mcpServers` of the user document.
    Global,
    /// `projects[path].mcpServers` of the user document.
    ProjectSettings,
    /// `<project>/.mcp.json`
    ProjectFile,
    /// `<project>/.mcp.local.json`
    ProjectLocalFile,
}

impl Layer {
    /// All layers, lowest precedence first.
    pub const ALL: [Layer; 4] = [
        Layer::Global,
        Layer::ProjectSettings,
        Layer::ProjectFile,
        Layer::ProjectLocalFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Global => "global",
            Layer::ProjectSettings => "project-settings",
            Layer::ProjectFile => ".mcp.json",
            Layer::ProjectLocalFile => ".mcp.local.json",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server addressed by scope and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerRef {
    pub scope: Scope,
    pub name: String,
}

impl ServerRef {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            scope: Scope::Global,
            name: name.into(),
        }
    }

    pub fn project(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Scope::Project(path.into()),
            name: name.into(),
        }
    }
}
