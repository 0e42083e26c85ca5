//! User configuration stored in `~/.mypeople/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::util::state_dir;

/// File name of the config inside the state directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// File name of the group metadata snapshot inside the state directory.
pub const METADATA_FILENAME: &str = "group_metadata.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Overrides the location of the group metadata snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,
}

impl Config {
    /// Where the group metadata snapshot lives for this config.
    pub fn metadata_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.metadata_path {
            return Ok(path.clone());
        }
        let dir = state_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(dir.join(METADATA_FILENAME))
    }
}

/// Get the canonical config file path (~/.mypeople/config.json)
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = state_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(dir.join(CONFIG_FILENAME))
}

/// Load configuration from ~/.mypeople/config.json, defaulting when absent.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?)
}

/// Load configuration from an explicit path. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
