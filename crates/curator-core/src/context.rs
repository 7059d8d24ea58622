//! Application context for explicit dependency injection.

use std::path::{Path, PathBuf};

use crate::config::ConfigStore;
use crate::config::paths::user_document_path;
use crate::error::{CuratorError, Result};
use crate::service::McpService;
use crate::settings::Settings;

/// Paths and settings shared by every component.
///
/// Front ends create this once and pass it to whatever needs it.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    document_path: PathBuf,
    settings: Settings,
    /// File the settings were read from, if any.
    settings_path: Option<PathBuf>,
}

impl AppContext {
    /// Context rooted at the current user's home directory.
    pub fn from_home(settings: Settings) -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or(CuratorError::HomeDirUnavailable)?;
        Ok(Self::new(home_dir, settings))
    }

    /// Context with an explicit home directory (for testing).
    pub fn new(home_dir: PathBuf, settings: Settings) -> Self {
        let document_path = settings
            .document_path
            .clone()
            .unwrap_or_else(|| user_document_path(&home_dir));
        Self {
            home_dir,
            document_path,
            settings,
            settings_path: None,
        }
    }

    /// Replace the document location, taking precedence over settings.
    pub fn with_document_path(mut self, document_path: PathBuf) -> Self {
        self.document_path = document_path;
        self
    }

    /// Record where the settings came from.
    pub fn with_settings_path(mut self, settings_path: PathBuf) -> Self {
        self.settings_path = Some(settings_path);
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::with_retention(self.document_path.clone(), self.settings.backup_retention)
    }

    /// A service over [`AppContext::config_store`], not yet loaded.
    pub fn service(&self) -> McpService {
        McpService::new(self.config_store())
    }
}
