//! Use cases over the loaded configuration.
//!
//! Every mutation validates first, changes the in-memory configuration, then
//! saves exactly once. A rejected mutation leaves memory and disk untouched.
//! A failed save is not rolled back: the in-memory state keeps the change and
//! callers reload to get back in sync with disk.

use std::path::Path;

use tracing::info;

use crate::config::{ConfigRepository, ConfigStore, Configuration, EffectiveServer, merge};
use crate::error::{CuratorError, Result};
use crate::server::{McpServer, ServerMap};
use crate::types::{Scope, ServerRef};

/// Per-destination outcome of [`McpService::clone_server`].
#[derive(Debug)]
pub struct CloneReport {
    pub name: String,
    pub cloned: Vec<Scope>,
    pub failed: Vec<(Scope, CuratorError)>,
}

#[derive(Debug)]
pub struct McpService<R = ConfigStore> {
    repository: R,
    config: Option<Configuration>,
}

impl<R: ConfigRepository> McpService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            config: None,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config_path(&self) -> &Path {
        self.repository.config_path()
    }

    pub fn is_loaded(&self) -> bool {
        self.config.is_some()
    }

    /// Load (or reload) from the repository, replacing in-memory state.
    ///
    /// On failure the previously loaded state, if any, is kept.
    pub fn load(&mut self) -> Result<&Configuration> {
        let config = self.repository.load()?;
        Ok(&*self.config.insert(config))
    }

    pub fn configuration(&self) -> Result<&Configuration> {
        self.config.as_ref().ok_or(CuratorError::NotLoaded)
    }

    pub fn global_server(&self, name: &str) -> Result<McpServer> {
        self.configuration()?
            .global_server(name)
            .ok_or_else(|| not_found(Scope::Global, name))
    }

    pub fn project_server(&self, project_path: &str, name: &str) -> Result<McpServer> {
        let project = self
            .configuration()?
            .project(project_path)
            .ok_or_else(|| project_not_found(project_path))?;
        project
            .server(name)
            .ok_or_else(|| not_found(Scope::project(project_path), name))
    }

    /// Server stored directly in `scope`.
    pub fn server(&self, server: &ServerRef) -> Result<McpServer> {
        match &server.scope {
            Scope::Global => self.global_server(&server.name),
            Scope::Project(path) => self.project_server(path, &server.name),
        }
    }

    /// Effective servers for `project_path`; see [`merge::effective_servers`].
    pub fn effective_servers(&self, project_path: &str) -> Result<ServerMap> {
        Ok(merge::effective_servers(self.configuration()?, project_path))
    }

    pub fn resolve_layers(&self, project_path: &str) -> Result<Vec<EffectiveServer>> {
        Ok(merge::resolve_layers(self.configuration()?, project_path))
    }

    pub fn add_global_server(&mut self, name: &str, server: McpServer) -> Result<()> {
        let config = self.loaded_mut()?;
        if config.global_servers.contains_key(name) {
            return Err(conflict(Scope::Global, name));
        }
        config.insert_global_server(name, server);
        info!(server = name, "Added global server");
        self.persist()
    }

    pub fn add_project_server(
        &mut self,
        project_path: &str,
        name: &str,
        server: McpServer,
    ) -> Result<()> {
        let config = self.loaded_mut()?;
        if config
            .project(project_path)
            .is_some_and(|project| project.contains_server(name))
        {
            return Err(conflict(Scope::project(project_path), name));
        }
        config
            .project_or_insert(project_path)
            .insert_server(name, server);
        info!(server = name, project = project_path, "Added project server");
        self.persist()
    }

    pub fn remove_global_server(&mut self, name: &str) -> Result<()> {
        let config = self.loaded_mut()?;
        if config.remove_global_server(name).is_none() {
            return Err(not_found(Scope::Global, name));
        }
        info!(server = name, "Removed global server");
        self.persist()
    }

    pub fn remove_project_server(&mut self, project_path: &str, name: &str) -> Result<()> {
        let project = self
            .loaded_mut()?
            .project_mut(project_path)
            .ok_or_else(|| project_not_found(project_path))?;
        if project.remove_server(name).is_none() {
            return Err(not_found(Scope::project(project_path), name));
        }
        info!(server = name, project = project_path, "Removed project server");
        self.persist()
    }

    pub fn update_global_server(&mut self, name: &str, server: McpServer) -> Result<()> {
        let config = self.loaded_mut()?;
        if !config.global_servers.contains_key(name) {
            return Err(not_found(Scope::Global, name));
        }
        config.insert_global_server(name, server);
        info!(server = name, "Updated global server");
        self.persist()
    }

    pub fn update_project_server(
        &mut self,
        project_path: &str,
        name: &str,
        server: McpServer,
    ) -> Result<()> {
        let project = self
            .loaded_mut()?
            .project_mut(project_path)
            .ok_or_else(|| project_not_found(project_path))?;
        if !project.contains_server(name) {
            return Err(not_found(Scope::project(project_path), name));
        }
        project.insert_server(name, server);
        info!(server = name, project = project_path, "Updated project server");
        self.persist()
    }

    /// Move a global server into a project's settings.
    ///
    /// The project is created if needed. Fails with a conflict if the project
    /// already defines `name`.
    pub fn move_server_to_project(&mut self, name: &str, project_path: &str) -> Result<()> {
        let config = self.loaded_mut()?;
        let server = config
            .global_server(name)
            .ok_or_else(|| not_found(Scope::Global, name))?;
        if config
            .project(project_path)
            .is_some_and(|project| project.contains_server(name))
        {
            return Err(conflict(Scope::project(project_path), name));
        }

        config
            .project_or_insert(project_path)
            .insert_server(name, server);
        config.remove_global_server(name);
        info!(server = name, project = project_path, "Moved server to project");
        self.persist()
    }

    /// Move a project-settings server to the global scope.
    pub fn move_server_to_global(&mut self, project_path: &str, name: &str) -> Result<()> {
        let config = self.loaded_mut()?;
        let server = config
            .project(project_path)
            .ok_or_else(|| project_not_found(project_path))?
            .server(name)
            .ok_or_else(|| not_found(Scope::project(project_path), name))?;
        if config.global_servers.contains_key(name) {
            return Err(conflict(Scope::Global, name));
        }

        config.insert_global_server(name, server);
        if let Some(project) = config.project_mut(project_path) {
            project.remove_server(name);
        }
        info!(server = name, project = project_path, "Moved server to global");
        self.persist()
    }

    /// Copy a server to several scopes, saving once.
    ///
    /// Destinations that already define the name are reported in
    /// [`CloneReport::failed`] without stopping the others. When every
    /// destination fails, the first failure is returned and nothing is saved.
    pub fn clone_server(&mut self, source: &ServerRef, destinations: &[Scope]) -> Result<CloneReport> {
        let server = self.server(source)?;
        let config = self.loaded_mut()?;

        let mut report = CloneReport {
            name: source.name.clone(),
            cloned: Vec::new(),
            failed: Vec::new(),
        };

        for destination in destinations {
            if *destination == source.scope || report.cloned.contains(destination) {
                continue;
            }
            let exists = config
                .servers_in(destination)
                .is_some_and(|servers| servers.contains_key(&source.name));
            if exists {
                report
                    .failed
                    .push((destination.clone(), conflict(destination.clone(), &source.name)));
                continue;
            }

            match destination {
                Scope::Global => config.insert_global_server(&source.name, server.clone()),
                Scope::Project(path) => config
                    .project_or_insert(path)
                    .insert_server(&source.name, server.clone()),
            }
            report.cloned.push(destination.clone());
        }

        if report.cloned.is_empty() {
            if !report.failed.is_empty() {
                return Err(report.failed.swap_remove(0).1);
            }
            return Ok(report);
        }

        info!(
            server = %source.name,
            destinations = report.cloned.len(),
            "Cloned server"
        );
        self.persist()?;
        Ok(report)
    }

    fn loaded_mut(&mut self) -> Result<&mut Configuration> {
        self.config.as_mut().ok_or(CuratorError::NotLoaded)
    }

    fn persist(&mut self) -> Result<()> {
        let config = self.config.as_ref().ok_or(CuratorError::NotLoaded)?;
        self.repository.save(config)
    }
}

fn not_found(scope: Scope, name: &str) -> CuratorError {
    CuratorError::ServerNotFound {
        scope,
        name: name.to_string(),
    }
}

fn project_not_found(path: &str) -> CuratorError {
    CuratorError::ProjectNotFound {
        path: path.to_string(),
    }
}

fn conflict(scope: Scope, name: &str) -> CuratorError {
    CuratorError::ServerExists {
        scope,
        name: name.to_string(),
    }
}
