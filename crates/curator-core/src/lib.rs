//! MCP Curator Core Library
//!
//! Loads, edits and resolves MCP server configuration spread across the
//! user-level `~/.claude.json` and the `.mcp.json` / `.mcp.local.json` files
//! of each project.

pub mod config;
pub mod context;
pub mod error;
pub mod server;
pub mod service;
pub mod settings;
pub mod tree;
pub mod types;

pub use error::{CuratorError, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigRepository, ConfigStore, Configuration, EffectiveServer, Project,
        effective_servers, resolve_layers,
    };

    // Servers
    pub use crate::server::{McpServer, ServerMap, ServerType};

    // Application
    pub use crate::context::AppContext;
    pub use crate::service::{CloneReport, McpService};
    pub use crate::settings::Settings;
    pub use crate::tree::{NodeId, TreeNode, build_tree};
    pub use crate::types::{Layer, Scope, ServerRef};

    pub use crate::error::{CuratorError, Result};
}
