//! Read-only access to `.mcp.json` and `.mcp.local.json` inside a project.

use std::path::Path;

use serde_json::Value;

use super::paths::layer_file_path;
use crate::error::{CuratorError, Result};
use crate::server::codec::MCP_SERVERS_KEY;
use crate::server::{ServerMap, parse_server_map};
use crate::types::Layer;

/// Load the servers declared by one project-file layer.
///
/// A missing file yields an empty map. Layers stored in the user document
/// also yield an empty map.
pub fn load_layer(project_root: &Path, layer: Layer) -> Result<ServerMap> {
    let Some(path) = layer_file_path(layer, project_root) else {
        return Ok(ServerMap::new());
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ServerMap::new()),
        Err(e) => return Err(CuratorError::io(&path, e)),
    };

    let root: Value = serde_json::from_slice(&bytes)
        .map_err(|source| CuratorError::MalformedDocument {
            path: path.clone(),
            source,
        })?;

    Ok(root
        .get(MCP_SERVERS_KEY)
        .map(parse_server_map)
        .unwrap_or_default())
}

/// Like [`load_layer`], but an unreadable or malformed file counts as empty.
pub fn load_layer_lenient(project_root: &Path, layer: Layer) -> ServerMap {
    load_layer(project_root, layer).unwrap_or_else(|e| {
        tracing::warn!(layer = %layer, error = %e, "Ignoring unreadable project file");
        ServerMap::new()
    })
}

/// Servers from both project files, `.mcp.local.json` winning on name clashes.
pub fn project_file_servers(project_root: &Path) -> ServerMap {
    let mut servers = load_layer_lenient(project_root, Layer::ProjectFile);
    servers.extend(load_layer_lenient(project_root, Layer::ProjectLocalFile));
    servers
}

/// Presence of (`.mcp.json`, `.mcp.local.json`).
pub fn probe(project_root: &Path) -> (bool, bool) {
    let exists = |layer| {
        layer_file_path(layer, project_root)
            .map(|path| path.is_file())
            .unwrap_or(false)
    };
    (exists(Layer::ProjectFile), exists(Layer::ProjectLocalFile))
}
