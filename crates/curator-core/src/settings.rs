//! Application settings read from `curator.toml`.
//!
//! ```toml
//! # Defaults to ~/.claude.json
//! document_path = "/home/me/.claude.json"
//! backup_retention = 5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BACKUP_RETENTION;
use crate::error::{CuratorError, Result};

/// Directory name under the platform config dir.
pub const SETTINGS_DIR_NAME: &str = "mcp-curator";
pub const SETTINGS_FILE_NAME: &str = "curator.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Overrides the user document location.
    pub document_path: Option<PathBuf>,
    /// Timestamped backups to keep.
    pub backup_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_path: None,
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }
}

impl Settings {
    /// `<config_dir>/mcp-curator/curator.toml`, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(CuratorError::io(path, e)),
        };

        Self::from_toml_str(&content).map_err(|message| CuratorError::Settings {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse and validate settings content.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| describe_toml_error(&e, content))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.backup_retention == 0 {
            return Err("backup_retention must be at least 1".to_string());
        }
        if let Some(path) = &self.document_path
            && path.as_os_str().is_empty()
        {
            return Err("document_path must not be empty".to_string());
        }
        Ok(())
    }
}

/// TOML error message with the offending line quoted.
fn describe_toml_error(error: &toml::de::Error, content: &str) -> String {
    let message = error.message().to_string();
    let Some(span) = error.span() else {
        return format!("TOML parsing error: {message}");
    };

    let line_num = content[..span.start.min(content.len())].matches('\n').count() + 1;
    let line = content.lines().nth(line_num - 1).unwrap_or_default();
    format!("TOML parsing error at line {line_num}:\n>>> {line_num:4} | {line}\n\nError: {message}")
}
