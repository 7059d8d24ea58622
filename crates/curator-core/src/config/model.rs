//! In-memory configuration aggregate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::paths::project_display_name;
use super::project_files;
use crate::server::{McpServer, ServerMap};
use crate::types::Scope;

/// A directory registered in the user document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Key under `projects`, exactly as written in the document.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// Project-settings servers (`projects[path].mcpServers`).
    pub servers: ServerMap,
    /// `.mcp.json` existed when the project was created.
    pub has_local_file: bool,
    /// `.mcp.local.json` existed when the project was created.
    pub has_local_private_file: bool,
}

impl Project {
    /// Empty project without probing the filesystem.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: project_display_name(&path),
            path,
            servers: ServerMap::new(),
            has_local_file: false,
            has_local_private_file: false,
        }
    }

    /// Empty project with presence flags probed from disk.
    pub fn discover(path: impl Into<String>) -> Self {
        let mut project = Self::new(path);
        let (has_local_file, has_local_private_file) = project_files::probe(project.root());
        project.has_local_file = has_local_file;
        project.has_local_private_file = has_local_private_file;
        project
    }

    pub fn root(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn server(&self, name: &str) -> Option<McpServer> {
        self.servers
            .get(name)
            .map(|server| server.clone().with_name(name))
    }

    pub fn contains_server(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// Insert or replace; the stored name is taken from `name`.
    pub fn insert_server(&mut self, name: &str, server: McpServer) {
        self.servers
            .insert(name.to_string(), server.with_name(name));
    }

    pub fn remove_server(&mut self, name: &str) -> Option<McpServer> {
        self.servers.remove(name)
    }
}

/// Aggregate root: global servers plus every registered project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub global_servers: ServerMap,
    pub projects: BTreeMap<String, Project>,
    pub source_path: PathBuf,
}

impl Configuration {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            global_servers: ServerMap::new(),
            projects: BTreeMap::new(),
            source_path: source_path.into(),
        }
    }

    pub fn global_server(&self, name: &str) -> Option<McpServer> {
        self.global_servers
            .get(name)
            .map(|server| server.clone().with_name(name))
    }

    pub fn insert_global_server(&mut self, name: &str, server: McpServer) {
        self.global_servers
            .insert(name.to_string(), server.with_name(name));
    }

    pub fn remove_global_server(&mut self, name: &str) -> Option<McpServer> {
        self.global_servers.remove(name)
    }

    pub fn project(&self, path: &str) -> Option<&Project> {
        self.projects.get(path)
    }

    pub fn project_mut(&mut self, path: &str) -> Option<&mut Project> {
        self.projects.get_mut(path)
    }

    pub fn insert_project(&mut self, project: Project) {
        self.projects.insert(project.path.clone(), project);
    }

    /// Existing project, or a newly registered one probed from disk.
    pub fn project_or_insert(&mut self, path: &str) -> &mut Project {
        self.projects
            .entry(path.to_string())
            .or_insert_with(|| Project::discover(path))
    }

    /// Servers stored directly in `scope`, if the scope exists.
    pub fn servers_in(&self, scope: &Scope) -> Option<&ServerMap> {
        match scope {
            Scope::Global => Some(&self.global_servers),
            Scope::Project(path) => self.projects.get(path).map(|p| &p.servers),
        }
    }

    /// Server stored directly in `scope`, with its name refreshed.
    pub fn server_in(&self, scope: &Scope, name: &str) -> Option<McpServer> {
        self.servers_in(scope)?
            .get(name)
            .map(|server| server.clone().with_name(name))
    }
}
