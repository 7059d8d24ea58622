//! Config path resolution helpers.

use std::path::{Path, PathBuf};

use crate::types::Layer;

/// File name of the user-level document inside the home directory.
pub const USER_DOCUMENT_NAME: &str = ".claude.json";
/// Shared project file.
pub const PROJECT_FILE_NAME: &str = ".mcp.json";
/// Private project file.
pub const PROJECT_LOCAL_FILE_NAME: &str = ".mcp.local.json";

pub fn user_document_path(home_dir: &Path) -> PathBuf {
    home_dir.join(USER_DOCUMENT_NAME)
}

pub fn project_file_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_FILE_NAME)
}

pub fn project_local_file_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_LOCAL_FILE_NAME)
}

/// Location of a project-file layer. `None` for layers stored in the user document.
pub fn layer_file_path(layer: Layer, project_root: &Path) -> Option<PathBuf> {
    match layer {
        Layer::ProjectFile => Some(project_file_path(project_root)),
        Layer::ProjectLocalFile => Some(project_local_file_path(project_root)),
        Layer::Global | Layer::ProjectSettings => None,
    }
}

/// Last path segment, or the whole string when there is none.
pub fn project_display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
