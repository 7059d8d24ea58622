//! Configuration management across the four MCP layers
//!
//! - Global: `mcpServers` in `~/.claude.json`
//! - Project settings: `projects[path].mcpServers` in `~/.claude.json`
//! - Project file: `<project>/.mcp.json`
//! - Project local file: `<project>/.mcp.local.json`

pub mod backup;
pub mod merge;
pub mod model;
pub mod paths;
pub mod project_files;
pub mod store;

pub use backup::{BackupManager, DEFAULT_BACKUP_RETENTION};
pub use merge::{EffectiveServer, effective_servers, layer_servers, resolve_layers};
pub use model::{Configuration, Project};
pub use project_files::project_file_servers;
pub use store::{ConfigRepository, ConfigStore};
