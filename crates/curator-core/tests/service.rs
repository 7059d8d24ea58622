use std::path::{Path, PathBuf};

use tempfile::TempDir;

use curator_core::CuratorError;
use curator_core::config::{ConfigRepository, ConfigStore, Configuration};
use curator_core::server::{McpServer, ServerType};
use curator_core::service::McpService;
use curator_core::types::{Scope, ServerRef};

/// In-memory repository that records every save.
#[derive(Debug)]
struct MemoryRepository {
    path: PathBuf,
    stored: Configuration,
    saves: Vec<Configuration>,
    fail_saves: bool,
}

impl MemoryRepository {
    fn new(stored: Configuration) -> Self {
        Self {
            path: stored.source_path.clone(),
            stored,
            saves: Vec::new(),
            fail_saves: false,
        }
    }
}

impl ConfigRepository for MemoryRepository {
    fn config_path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> curator_core::Result<Configuration> {
        Ok(self.stored.clone())
    }

    fn save(&mut self, config: &Configuration) -> curator_core::Result<()> {
        if self.fail_saves {
            return Err(CuratorError::Io {
                path: self.path.clone(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.saves.push(config.clone());
        self.stored = config.clone();
        Ok(())
    }
}

fn stdio(command: &str) -> McpServer {
    McpServer::stdio(command, vec!["a".to_string(), "b".to_string()])
}

fn loaded_service(setup: impl FnOnce(&mut Configuration)) -> McpService<MemoryRepository> {
    let mut config = Configuration::new("/virtual/.claude.json");
    setup(&mut config);
    let mut service = McpService::new(MemoryRepository::new(config));
    service.load().unwrap();
    service
}

const PROJECT: &str = "/nonexistent/project";

#[test]
fn operations_before_load_fail_with_not_loaded() {
    let mut service = McpService::new(MemoryRepository::new(Configuration::new("/virtual")));
    assert!(!service.is_loaded());

    assert!(matches!(
        service.add_global_server("x", stdio("x")),
        Err(CuratorError::NotLoaded)
    ));
    assert!(matches!(
        service.effective_servers(PROJECT),
        Err(CuratorError::NotLoaded)
    ));
    assert!(matches!(service.configuration(), Err(CuratorError::NotLoaded)));
    assert!(service.repository().saves.is_empty());

    service.load().unwrap();
    assert!(service.is_loaded());
    service.add_global_server("x", stdio("x")).unwrap();
    assert_eq!(service.repository().saves.len(), 1);
}

#[test]
fn add_global_server_saves_once() {
    let mut service = loaded_service(|_| {});

    service.add_global_server("x", stdio("run")).unwrap();

    assert_eq!(service.repository().saves.len(), 1);
    assert_eq!(service.global_server("x").unwrap().command, "run");
    assert_eq!(service.global_server("x").unwrap().name, "x");
}

#[test]
fn add_existing_global_server_conflicts_without_change() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("x", stdio("original"));
    });

    let err = service.add_global_server("x", stdio("replacement")).unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(service.global_server("x").unwrap().command, "original");
    assert!(service.repository().saves.is_empty());
}

#[test]
fn add_project_server_creates_project() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("foo", McpServer::stdio("npx", Vec::new()));
    });

    service
        .add_project_server(PROJECT, "bar", McpServer::remote(ServerType::Http, "http://x"))
        .unwrap();

    let config = service.configuration().unwrap();
    assert_eq!(config.projects[PROJECT].name, "project");
    assert!(config.projects[PROJECT].contains_server("bar"));
    let effective = service.effective_servers(PROJECT).unwrap();
    assert_eq!(effective.keys().collect::<Vec<_>>(), vec!["bar", "foo"]);
    assert_eq!(service.repository().saves.len(), 1);
}

#[test]
fn add_existing_project_server_conflicts() {
    let mut service = loaded_service(|config| {
        config
            .project_or_insert(PROJECT)
            .insert_server("x", stdio("original"));
    });

    let err = service
        .add_project_server(PROJECT, "x", stdio("other"))
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(service.repository().saves.is_empty());
}

#[test]
fn remove_missing_project_server_is_not_found_and_does_not_write() {
    let mut service = loaded_service(|config| {
        config.project_or_insert(PROJECT);
    });

    let err = service.remove_project_server(PROJECT, "x").unwrap_err();

    assert!(matches!(err, CuratorError::ServerNotFound { .. }));
    assert!(service.repository().saves.is_empty());
}

#[test]
fn remove_from_unknown_project_is_not_found() {
    let mut service = loaded_service(|_| {});

    let err = service.remove_project_server(PROJECT, "x").unwrap_err();

    assert!(matches!(err, CuratorError::ProjectNotFound { .. }));
    assert!(err.is_not_found());
    assert!(service.configuration().unwrap().projects.is_empty());
}

#[test]
fn remove_and_update_existing_servers() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("g", stdio("g"));
        config
            .project_or_insert(PROJECT)
            .insert_server("p", stdio("p"));
    });

    service.update_global_server("g", stdio("g2")).unwrap();
    service
        .update_project_server(PROJECT, "p", stdio("p2"))
        .unwrap();
    assert_eq!(service.global_server("g").unwrap().command, "g2");
    assert_eq!(service.project_server(PROJECT, "p").unwrap().command, "p2");

    service.remove_global_server("g").unwrap();
    service.remove_project_server(PROJECT, "p").unwrap();
    assert!(service.global_server("g").unwrap_err().is_not_found());
    assert!(service.project_server(PROJECT, "p").unwrap_err().is_not_found());

    assert_eq!(service.repository().saves.len(), 4);
}

#[test]
fn update_missing_servers_is_not_found() {
    let mut service = loaded_service(|_| {});

    assert!(service.update_global_server("x", stdio("x")).unwrap_err().is_not_found());
    assert!(
        service
            .update_project_server(PROJECT, "x", stdio("x"))
            .unwrap_err()
            .is_not_found()
    );
    assert!(service.repository().saves.is_empty());
}

#[test]
fn move_global_server_to_project() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("x", stdio("x"));
    });

    service.move_server_to_project("x", PROJECT).unwrap();

    let config = service.configuration().unwrap();
    assert!(!config.global_servers.contains_key("x"));
    assert_eq!(config.projects[PROJECT].servers["x"].command, "x");
    assert_eq!(service.repository().saves.len(), 1);
    let saved = &service.repository().saves[0];
    assert!(saved.global_servers.is_empty());
    assert!(saved.projects[PROJECT].contains_server("x"));
}

#[test]
fn move_project_server_to_global() {
    let mut service = loaded_service(|config| {
        config
            .project_or_insert(PROJECT)
            .insert_server("x", stdio("x"));
    });

    service.move_server_to_global(PROJECT, "x").unwrap();

    let config = service.configuration().unwrap();
    assert_eq!(config.global_servers["x"].name, "x");
    assert!(!config.projects[PROJECT].contains_server("x"));
    assert_eq!(service.repository().saves.len(), 1);
}

#[test]
fn move_onto_existing_name_conflicts() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("x", stdio("global"));
        config
            .project_or_insert(PROJECT)
            .insert_server("x", stdio("project"));
    });

    assert!(service.move_server_to_project("x", PROJECT).unwrap_err().is_conflict());
    assert!(service.move_server_to_global(PROJECT, "x").unwrap_err().is_conflict());

    let config = service.configuration().unwrap();
    assert_eq!(config.global_servers["x"].command, "global");
    assert_eq!(config.projects[PROJECT].servers["x"].command, "project");
    assert!(service.repository().saves.is_empty());
}

#[test]
fn move_missing_server_is_not_found() {
    let mut service = loaded_service(|_| {});

    assert!(service.move_server_to_project("x", PROJECT).unwrap_err().is_not_found());
    assert!(service.move_server_to_global(PROJECT, "x").unwrap_err().is_not_found());
    assert!(service.configuration().unwrap().projects.is_empty());
}

#[test]
fn failed_save_after_move_is_not_rolled_back() {
    let mut stored = Configuration::new("/virtual/.claude.json");
    stored.insert_global_server("x", stdio("x"));
    let mut failing = MemoryRepository::new(stored);
    failing.fail_saves = true;
    let mut service = McpService::new(failing);
    service.load().unwrap();

    let err = service.move_server_to_project("x", PROJECT).unwrap_err();

    assert!(matches!(err, CuratorError::Io { .. }));
    let config = service.configuration().unwrap();
    assert!(!config.global_servers.contains_key("x"));
    assert!(config.projects[PROJECT].contains_server("x"));

    let reloaded = service.load().unwrap();
    assert!(reloaded.global_servers.contains_key("x"));
    assert!(reloaded.projects.is_empty());
}

#[test]
fn clone_server_reports_per_destination() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("x", stdio("x"));
        config
            .project_or_insert("/nonexistent/taken")
            .insert_server("x", stdio("already"));
    });

    let report = service
        .clone_server(
            &ServerRef::global("x"),
            &[
                Scope::Global,
                Scope::project("/nonexistent/a"),
                Scope::project("/nonexistent/taken"),
                Scope::project("/nonexistent/b"),
            ],
        )
        .unwrap();

    assert_eq!(
        report.cloned,
        vec![Scope::project("/nonexistent/a"), Scope::project("/nonexistent/b")]
    );
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_conflict());
    assert_eq!(service.repository().saves.len(), 1);
    assert_eq!(
        service.project_server("/nonexistent/taken", "x").unwrap().command,
        "already"
    );
    assert!(service.global_server("x").is_ok());
}

#[test]
fn clone_server_mutating_copy_leaves_source() {
    let mut service = loaded_service(|config| {
        config
            .project_or_insert(PROJECT)
            .insert_server("x", stdio("x"));
    });

    service
        .clone_server(&ServerRef::project(PROJECT, "x"), &[Scope::Global])
        .unwrap();
    let mut copy = service.global_server("x").unwrap();
    copy.args.push("c".to_string());
    service.update_global_server("x", copy).unwrap();

    assert_eq!(service.project_server(PROJECT, "x").unwrap().args, vec!["a", "b"]);
    assert_eq!(service.global_server("x").unwrap().args, vec!["a", "b", "c"]);
}

#[test]
fn clone_server_with_only_conflicts_fails_without_saving() {
    let mut service = loaded_service(|config| {
        config.insert_global_server("x", stdio("x"));
        config
            .project_or_insert(PROJECT)
            .insert_server("x", stdio("x"));
    });

    let err = service
        .clone_server(&ServerRef::global("x"), &[Scope::project(PROJECT)])
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(service.repository().saves.is_empty());
}

#[test]
fn service_over_file_store_roundtrips() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".claude.json");
    std::fs::write(&path, r#"{"mcpServers": {"foo": {"command": "npx"}}, "projects": {}}"#).unwrap();
    let mut service = McpService::new(ConfigStore::from_path(path.clone()));
    service.load().unwrap();

    service
        .add_project_server("/repo", "bar", McpServer::remote(ServerType::Http, "http://x"))
        .unwrap();

    let mut fresh = McpService::new(ConfigStore::from_path(path));
    let config = fresh.load().unwrap();
    assert_eq!(config.projects["/repo"].servers["bar"].url, "http://x");
    assert_eq!(config.global_servers["foo"].command, "npx");
    let effective = fresh.effective_servers("/repo").unwrap();
    assert_eq!(effective.keys().collect::<Vec<_>>(), vec!["bar", "foo"]);
}
