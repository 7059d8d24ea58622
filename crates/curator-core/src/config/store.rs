//! Config store for loading and saving the user-level JSON document.
//!
//! The store keeps the raw JSON tree from the last load so a save only
//! rewrites the server maps it owns. Every other key, at the top level or
//! inside a project entry, is written back untouched and in its original
//! position.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::backup::{BackupManager, DEFAULT_BACKUP_RETENTION};
use super::model::{Configuration, Project};
use crate::error::{CuratorError, Result};
use crate::server::codec::MCP_SERVERS_KEY;
use crate::server::{parse_server_map, servers_to_value};

const PROJECTS_KEY: &str = "projects";

/// Persistence seam used by the service.
pub trait ConfigRepository {
    /// Location of the backing document.
    fn config_path(&self) -> &Path;

    fn load(&mut self) -> Result<Configuration>;

    fn save(&mut self, config: &Configuration) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    backups: BackupManager,
    raw: Option<Map<String, Value>>,
}

impl ConfigStore {
    pub fn from_path(config_path: PathBuf) -> Self {
        Self::with_retention(config_path, DEFAULT_BACKUP_RETENTION)
    }

    pub fn with_retention(config_path: PathBuf, backup_retention: usize) -> Self {
        Self {
            backups: BackupManager::new(config_path.clone(), backup_retention),
            config_path,
            raw: None,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Raw tree captured by the last load or save.
    pub fn raw_document(&self) -> Option<&Map<String, Value>> {
        self.raw.as_ref()
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        let bytes = match std::fs::read(&self.config_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CuratorError::io(&self.config_path, e)),
        };

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|source| CuratorError::MalformedDocument {
                path: self.config_path.clone(),
                source,
            })?;
        match value {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(CuratorError::NotAnObject {
                path: self.config_path.clone(),
            }),
        }
    }

    /// Merge the model's server maps into a copy of the raw tree.
    fn merged_document(&self, config: &Configuration) -> Map<String, Value> {
        let mut root = self.raw.clone().unwrap_or_default();

        root.insert(
            MCP_SERVERS_KEY.to_string(),
            servers_to_value(&config.global_servers),
        );

        let projects = root
            .entry(PROJECTS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !projects.is_object() {
            *projects = Value::Object(Map::new());
        }
        let Value::Object(projects) = projects else {
            return root;
        };
        for (path, project) in &config.projects {
            let entry = projects
                .entry(path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(fields) = entry {
                fields.insert(
                    MCP_SERVERS_KEY.to_string(),
                    servers_to_value(&project.servers),
                );
            }
        }

        root
    }
}

impl ConfigRepository for ConfigStore {
    fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn load(&mut self) -> Result<Configuration> {
        let mut config = Configuration::new(self.config_path.clone());

        let Some(root) = self.read_document()? else {
            debug!("No document at {}, starting empty", self.config_path.display());
            self.raw = None;
            return Ok(config);
        };

        if let Some(servers) = root.get(MCP_SERVERS_KEY) {
            config.global_servers = parse_server_map(servers);
        }

        match root.get(PROJECTS_KEY) {
            Some(Value::Object(projects)) => {
                for (path, entry) in projects {
                    let Value::Object(fields) = entry else {
                        warn!(project = %path, "Skipping malformed project entry");
                        continue;
                    };
                    let mut project = Project::discover(path.clone());
                    if let Some(servers) = fields.get(MCP_SERVERS_KEY) {
                        project.servers = parse_server_map(servers);
                    }
                    config.insert_project(project);
                }
            }
            Some(_) => warn!("Ignoring 'projects' value that is not a JSON object"),
            None => {}
        }

        debug!(
            "Loaded {} global servers and {} projects from {}",
            config.global_servers.len(),
            config.projects.len(),
            self.config_path.display()
        );
        self.raw = Some(root);
        Ok(config)
    }

    fn save(&mut self, config: &Configuration) -> Result<()> {
        self.backups.create_backup()?;

        let root = self.merged_document(config);
        let bytes = serde_json::to_vec_pretty(&root).map_err(CuratorError::Serialize)?;

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CuratorError::io(parent, e))?;
        }
        std::fs::write(&self.config_path, bytes)
            .map_err(|e| CuratorError::io(&self.config_path, e))?;

        debug!("Saved configuration to {}", self.config_path.display());
        self.raw = Some(root);
        Ok(())
    }
}
