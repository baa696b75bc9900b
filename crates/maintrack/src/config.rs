//! Configuration management for maintrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "maintrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Default backup file name, as offered by the page download button.
const BACKUP_FILE_NAME: &str = "backup.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MAINTRACK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/maintrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Backup configuration.
    pub backup: BackupConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/maintrack/records.db`
    pub database_path: Option<PathBuf>,
    /// What to do when a stored collection fails to decode.
    pub on_corrupt: CorruptPolicy,
}

/// How the store reacts to a stored value that is not valid JSON for its collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Log a warning and treat the collection as empty.
    #[default]
    Fallback,
    /// Surface `Error::CorruptRecord` to the caller.
    Fail,
}

/// Backup-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// File name used by `backup export` when no output path is given.
    pub file_name: String,
    /// Which collections an export contains.
    pub variant: BackupVariant,
    /// Pretty-print exported JSON.
    pub pretty: bool,
}

/// Shape of an exported backup document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupVariant {
    /// Equipment, tasks, work orders and checklists.
    #[default]
    Full,
    /// Equipment, tasks and work orders only.
    Reduced,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            file_name: BACKUP_FILE_NAME.to_string(),
            variant: BackupVariant::Full,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration, reading `config_path` or the default file location.
    ///
    /// Top-level TOML tables map directly onto the `[storage]` and `[backup]`
    /// sections.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("MAINTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.backup.file_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "backup.file_name must not be empty".to_string(),
            });
        }

        if self
            .storage
            .database_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "storage.database_path must not be empty when set".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the default backup output path (relative to the working directory).
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        PathBuf::from(&self.backup.file_name)
    }
}
