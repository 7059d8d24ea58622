//! Navigation tree over a loaded configuration.
//!
//! Front ends render this hierarchy:
//!
//! ```text
//! Global
//!   <server>...
//! Projects
//!   <project>
//!     <server> (project settings, then .mcp.json / .mcp.local.json)
//! ```
//!
//! Nodes are addressed by [`NodeId`], so names and paths may contain any
//! character without confusing the lookup.

use std::fmt;

use crate::config::{Configuration, layer_servers};
use crate::server::McpServer;
use crate::types::Layer;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    GlobalRoot,
    ProjectsRoot,
    GlobalServer {
        name: String,
    },
    Project {
        path: String,
    },
    ProjectServer {
        path: String,
        layer: Layer,
        name: String,
    },
}

impl NodeId {
    /// Text shown for the node.
    pub fn label(&self, config: &Configuration) -> String {
        match self {
            NodeId::GlobalRoot => "Global".to_string(),
            NodeId::ProjectsRoot => "Projects".to_string(),
            NodeId::GlobalServer { name } | NodeId::ProjectServer { name, .. } => name.clone(),
            NodeId::Project { path } => config
                .project(path)
                .map(|project| project.name.clone())
                .unwrap_or_else(|| path.clone()),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            NodeId::GlobalRoot | NodeId::ProjectsRoot | NodeId::Project { .. }
        )
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::GlobalRoot => f.write_str("global"),
            NodeId::ProjectsRoot => f.write_str("projects"),
            NodeId::GlobalServer { name } => write!(f, "global/{name:?}"),
            NodeId::Project { path } => write!(f, "project/{path:?}"),
            NodeId::ProjectServer { path, layer, name } => {
                write!(f, "project/{path:?}/{layer}/{name:?}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(id: NodeId, label: String) -> Self {
        Self {
            id,
            label,
            children: Vec::new(),
        }
    }

    /// Number of direct children; shown next to branch labels.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Build the two top-level branches, children sorted by name or path.
pub fn build_tree(config: &Configuration) -> Vec<TreeNode> {
    let global = TreeNode {
        id: NodeId::GlobalRoot,
        label: NodeId::GlobalRoot.label(config),
        children: config
            .global_servers
            .keys()
            .map(|name| TreeNode::leaf(NodeId::GlobalServer { name: name.clone() }, name.clone()))
            .collect(),
    };

    let projects = TreeNode {
        id: NodeId::ProjectsRoot,
        label: NodeId::ProjectsRoot.label(config),
        children: config
            .projects
            .values()
            .map(|project| {
                let children = [Layer::ProjectSettings, Layer::ProjectFile, Layer::ProjectLocalFile]
                    .into_iter()
                    .flat_map(|layer| {
                        layer_servers(config, &project.path, layer)
                            .into_keys()
                            .map(move |name| (layer, name))
                    })
                    .map(|(layer, name)| {
                        TreeNode::leaf(
                            NodeId::ProjectServer {
                                path: project.path.clone(),
                                layer,
                                name: name.clone(),
                            },
                            name,
                        )
                    })
                    .collect();
                TreeNode {
                    id: NodeId::Project {
                        path: project.path.clone(),
                    },
                    label: project.name.clone(),
                    children,
                }
            })
            .collect(),
    };

    vec![global, projects]
}

/// Descriptor a server node points at, if it still exists.
pub fn find_server(config: &Configuration, id: &NodeId) -> Option<McpServer> {
    match id {
        NodeId::GlobalServer { name } => config.global_server(name),
        NodeId::ProjectServer { path, layer, name } => layer_servers(config, path, *layer)
            .remove(name)
            .map(|server| server.with_name(name.clone())),
        NodeId::GlobalRoot | NodeId::ProjectsRoot | NodeId::Project { .. } => None,
    }
}
