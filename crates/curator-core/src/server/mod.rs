//! MCP server descriptors
//!
//! A descriptor mirrors one entry of an `mcpServers` object. The name is not
//! part of the JSON entry; it is copied from the map key whenever a
//! descriptor is stored or read back.

pub mod codec;

use std::collections::BTreeMap;
use std::fmt;

pub use codec::{
    parse_server, parse_server_map, parse_server_snippet, server_to_value, servers_to_value,
};

/// Servers keyed by name.
pub type ServerMap = BTreeMap<String, McpServer>;

/// Transport declared by the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerType {
    Stdio,
    Http,
    Sse,
    /// Any other value, kept verbatim so it survives a save.
    Other(String),
}

impl ServerType {
    pub fn as_str(&self) -> &str {
        match self {
            ServerType::Stdio => "stdio",
            ServerType::Http => "http",
            ServerType::Sse => "sse",
            ServerType::Other(value) => value,
        }
    }
}

impl From<&str> for ServerType {
    fn from(value: &str) -> Self {
        match value {
            "stdio" => ServerType::Stdio,
            "http" => ServerType::Http,
            "sse" => ServerType::Sse,
            other => ServerType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured MCP server.
///
/// `Clone` produces an independent copy: `args`, `headers` and `env` are
/// owned collections, so mutating a clone never reaches the original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McpServer {
    /// Denormalized copy of the map key.
    pub name: String,
    pub server_type: Option<ServerType>,
    pub command: String,
    pub args: Vec<String>,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    /// Milliseconds; zero means unset.
    pub timeout: u64,
}

impl McpServer {
    /// Stdio server launched from `command`.
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            server_type: Some(ServerType::Stdio),
            command: command.into(),
            args,
            ..Self::default()
        }
    }

    /// Remote server of the given transport reachable at `url`.
    pub fn remote(server_type: ServerType, url: impl Into<String>) -> Self {
        Self {
            server_type: Some(server_type),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns a copy carrying `name`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declared `stdio`, or has a command.
    pub fn is_stdio(&self) -> bool {
        self.server_type == Some(ServerType::Stdio) || !self.command.is_empty()
    }

    /// Declared `http`/`sse`, or has a url.
    ///
    /// Independent of [`McpServer::is_stdio`]: an entry with both a command
    /// and a url satisfies both.
    pub fn is_http(&self) -> bool {
        matches!(
            self.server_type,
            Some(ServerType::Http) | Some(ServerType::Sse)
        ) || !self.url.is_empty()
    }

    /// Short transport description for listings.
    pub fn transport_label(&self) -> &str {
        if let Some(server_type) = &self.server_type {
            return server_type.as_str();
        }
        if self.is_stdio() {
            "stdio"
        } else if self.is_http() {
            "http"
        } else {
            "unknown"
        }
    }

    /// Command line or url, whichever identifies the endpoint.
    pub fn endpoint(&self) -> String {
        if !self.command.is_empty() {
            if self.args.is_empty() {
                self.command.clone()
            } else {
                format!("{} {}", self.command, self.args.join(" "))
            }
        } else {
            self.url.clone()
        }
    }
}
