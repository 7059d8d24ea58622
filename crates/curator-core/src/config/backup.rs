//! Backups of the user document taken before every save.
//!
//! Two copies are written: `<doc>.bak`, always overwritten, and
//! `<doc>.<YYYYMMDD-HHMMSS>.bak`, of which only the most recent few are kept.
//! A second backup within the same second gets a counter suffix
//! (`<doc>.<YYYYMMDD-HHMMSS>-1.bak`) instead of replacing the first.

use std::ffi::OsString;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use crate::error::{CuratorError, Result};

/// Timestamped backups kept by default.
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone)]
pub struct BackupManager {
    document_path: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(document_path: PathBuf, retention: usize) -> Self {
        Self {
            document_path,
            retention: retention.max(1),
        }
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// `<doc>.bak`
    pub fn latest_backup_path(&self) -> PathBuf {
        self.sibling_with_suffix(".bak")
    }

    /// `<doc>.<timestamp>.bak`
    pub fn timestamped_backup_path<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        self.sibling_with_suffix(&format!(".{}.bak", at.format(TIMESTAMP_FORMAT)))
    }

    /// Back up the current document. Returns `None` when there is nothing to back up.
    pub fn create_backup(&self) -> Result<Option<PathBuf>> {
        self.create_backup_at(&Local::now())
    }

    pub fn create_backup_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> Result<Option<PathBuf>>
    where
        Tz::Offset: std::fmt::Display,
    {
        let contents = match std::fs::read(&self.document_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CuratorError::io(&self.document_path, e)),
        };

        let latest = self.latest_backup_path();
        std::fs::write(&latest, &contents).map_err(|e| CuratorError::io(&latest, e))?;

        let stamped = self.unused_timestamped_path(at);
        std::fs::write(&stamped, &contents).map_err(|e| CuratorError::io(&stamped, e))?;
        debug!("Created backup at {}", stamped.display());

        if let Err(e) = self.prune() {
            warn!("Failed to prune old backups: {e}");
        }

        Ok(Some(stamped))
    }

    /// Timestamped backups, oldest first.
    pub fn timestamped_backups(&self) -> Result<Vec<PathBuf>> {
        let dir = self.backup_dir();
        let Some(base) = self.document_path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{base}.");

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CuratorError::io(&dir, e)),
        };

        let mut backups: Vec<(BackupKey, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let key = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix(&prefix))
                    .and_then(|rest| rest.strip_suffix(".bak"))
                    .and_then(parse_backup_key)?;
                Some((key, entry.path()))
            })
            .collect();
        backups.sort();
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete all but the newest `retention` timestamped backups.
    pub fn prune(&self) -> Result<Vec<PathBuf>> {
        let backups = self.timestamped_backups()?;
        if backups.len() <= self.retention {
            return Ok(Vec::new());
        }

        let excess = backups.len() - self.retention;
        let mut removed = Vec::with_capacity(excess);
        for path in backups.into_iter().take(excess) {
            std::fs::remove_file(&path).map_err(|e| CuratorError::io(&path, e))?;
            debug!("Removed old backup {}", path.display());
            removed.push(path);
        }
        Ok(removed)
    }

    /// Timestamped path for `at`, suffixed with a counter if already taken.
    fn unused_timestamped_path<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        let stamp = at.format(TIMESTAMP_FORMAT).to_string();
        let mut candidate = self.timestamped_backup_path(at);
        let mut counter = 1u32;
        while candidate.exists() {
            candidate = self.sibling_with_suffix(&format!(".{stamp}-{counter}.bak"));
            counter += 1;
        }
        candidate
    }

    fn backup_dir(&self) -> PathBuf {
        match self.document_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn sibling_with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.document_path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Ordering key of a backup: its timestamp, then its collision counter.
type BackupKey = (NaiveDateTime, u32);

fn parse_backup_key(value: &str) -> Option<BackupKey> {
    if let Ok(at) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Some((at, 0));
    }
    let (stamp, counter) = value.rsplit_once('-')?;
    if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((at, counter.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn no_backup_without_document() {
        let temp = TempDir::new().unwrap();
        let manager = BackupManager::new(temp.path().join(".claude.json"), 5);

        assert!(manager.create_backup().unwrap().is_none());
        assert!(!manager.latest_backup_path().exists());
    }

    #[test]
    fn backup_paths_append_to_file_name() {
        let manager = BackupManager::new(PathBuf::from("/home/me/.claude.json"), 5);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            manager.latest_backup_path(),
            PathBuf::from("/home/me/.claude.json.bak")
        );
        assert_eq!(
            manager.timestamped_backup_path(&at),
            PathBuf::from("/home/me/.claude.json.20240309-140507.bak")
        );
    }

    #[test]
    fn listing_ignores_foreign_files() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join(".claude.json");
        std::fs::write(&doc, "{}").unwrap();
        std::fs::write(temp.path().join(".claude.json.bak"), "{}").unwrap();
        std::fs::write(temp.path().join(".claude.json.manual.bak"), "{}").unwrap();
        std::fs::write(temp.path().join(".claude.json.20240101-000000.bak"), "{}").unwrap();

        let manager = BackupManager::new(doc, 5);
        let backups = manager.timestamped_backups().unwrap();

        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(".claude.json.20240101-000000.bak"));
    }

    #[test]
    fn backups_in_the_same_second_do_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join(".claude.json");
        let manager = BackupManager::new(doc.clone(), 5);
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        std::fs::write(&doc, "first").unwrap();
        let first = manager.create_backup_at(&at).unwrap().unwrap();
        std::fs::write(&doc, "second").unwrap();
        let second = manager.create_backup_at(&at).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with(".claude.json.20240309-140507-1.bak"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "second");
        assert_eq!(manager.timestamped_backups().unwrap(), vec![first, second]);
    }

    #[test]
    fn counters_sort_numerically_within_a_second() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join(".claude.json");
        for name in [
            ".claude.json.20240101-000000-10.bak",
            ".claude.json.20240101-000000-2.bak",
            ".claude.json.20240101-000000.bak",
            ".claude.json.20240101-000001.bak",
            ".claude.json.20240101-000000-x.bak",
        ] {
            std::fs::write(temp.path().join(name), "{}").unwrap();
        }

        let names: Vec<String> = BackupManager::new(doc, 5)
            .timestamped_backups()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec![
                ".claude.json.20240101-000000.bak",
                ".claude.json.20240101-000000-2.bak",
                ".claude.json.20240101-000000-10.bak",
                ".claude.json.20240101-000001.bak",
            ]
        );
    }

    #[test]
    fn retention_is_at_least_one() {
        let manager = BackupManager::new(PathBuf::from("doc.json"), 0);
        assert_eq!(manager.retention(), 1);
    }
}
