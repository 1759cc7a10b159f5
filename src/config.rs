// YAML configuration for the taskboard binary

use crate::filter::SortBy;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage, SqliteStorage};
use crate::store::DEFAULT_ARCHIVE_THRESHOLD_MS;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where persisted state lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per key
    #[default]
    File,
    Sqlite,
    /// Nothing is written
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage directory; defaults to `<data dir>/taskboard`
    pub data_dir: Option<PathBuf>,
    pub backend: Backend,
    /// Done tasks older than this are archived at startup
    pub archive_after_hours: u32,
    pub sort_by: SortBy,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: Backend::default(),
            archive_after_hours: (DEFAULT_ARCHIVE_THRESHOLD_MS / 3_600_000) as u32,
            sort_by: SortBy::default(),
            color: true,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file gives the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory on this platform, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!(path = ?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))?;

        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn archive_threshold_ms(&self) -> i64 {
        i64::from(self.archive_after_hours) * 3_600_000
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStorage>> {
        let storage: Box<dyn KeyValueStorage> = match self.backend {
            Backend::File => Box::new(FileStorage::open(self.resolved_data_dir())?),
            Backend::Sqlite => Box::new(SqliteStorage::open(self.resolved_data_dir())?),
            Backend::Memory => Box::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskboard").join("config.yaml"))
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(&temp.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.archive_after_hours, 24);
        assert_eq!(config.archive_threshold_ms(), DEFAULT_ARCHIVE_THRESHOLD_MS);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: sqlite\nsort_by: priority\narchive_after_hours: 48\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.sort_by, SortBy::Priority);
        assert_eq!(config.archive_threshold_ms(), 2 * DEFAULT_ARCHIVE_THRESHOLD_MS);
        assert!(config.color);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "backend: [not, a, backend]\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_open_storage_in_data_dir() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(temp.path().join("data")),
            backend: Backend::Sqlite,
            ..Default::default()
        };

        let mut storage = config.open_storage().unwrap();
        storage.set("theme", "dark").unwrap();
        assert!(temp.path().join("data/taskboard.db").exists());
    }
}
