//! Effective server resolution
//!
//! Implements the 4-layer merge:
//! Global -> Project settings -> .mcp.json -> .mcp.local.json
//!
//! A later layer replaces a same-named server wholesale; fields are never
//! merged across layers.

use std::path::Path;

use super::model::Configuration;
use super::project_files::load_layer_lenient;
use crate::server::{McpServer, ServerMap};
use crate::types::Layer;

/// A resolved server together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveServer {
    pub server: McpServer,
    /// Layer that supplied the winning definition.
    pub origin: Layer,
    /// Lower layers that also define this name, lowest first.
    pub shadowed: Vec<Layer>,
}

/// Servers visible to `project_path` after applying every layer.
///
/// Missing or unreadable project files contribute nothing. The returned
/// descriptors are independent copies of the configuration's.
pub fn effective_servers(config: &Configuration, project_path: &str) -> ServerMap {
    resolve_layers(config, project_path)
        .into_iter()
        .map(|entry| (entry.server.name.clone(), entry.server))
        .collect()
}

/// Like [`effective_servers`], keeping origin and shadowing information.
pub fn resolve_layers(config: &Configuration, project_path: &str) -> Vec<EffectiveServer> {
    let mut resolved: std::collections::BTreeMap<String, EffectiveServer> = Default::default();

    for layer in Layer::ALL {
        for (name, server) in layer_servers(config, project_path, layer) {
            let server = server.with_name(name.clone());
            match resolved.get_mut(&name) {
                Some(existing) => {
                    existing.shadowed.push(existing.origin);
                    existing.origin = layer;
                    existing.server = server;
                }
                None => {
                    resolved.insert(
                        name,
                        EffectiveServer {
                            server,
                            origin: layer,
                            shadowed: Vec::new(),
                        },
                    );
                }
            }
        }
    }

    tracing::debug!(
        project = project_path,
        count = resolved.len(),
        "Resolved effective servers"
    );
    resolved.into_values().collect()
}

/// Servers defined by a single layer for `project_path`.
pub fn layer_servers(config: &Configuration, project_path: &str, layer: Layer) -> ServerMap {
    match layer {
        Layer::Global => config.global_servers.clone(),
        Layer::ProjectSettings => config
            .project(project_path)
            .map(|project| project.servers.clone())
            .unwrap_or_default(),
        Layer::ProjectFile | Layer::ProjectLocalFile => {
            load_layer_lenient(Path::new(project_path), layer)
        }
    }
}
