//! On-disk snapshot of locally owned group metadata.
//!
//! One JSON document holds the display order of groups and each group's
//! color. The contacts gateway never sees this file:
//!   { "groupOrder": ["<id>", ...], "groupMetas": { "<id>": { "color": "peach" } } }

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::StoreError;
use crate::types::{GroupId, GroupMeta};
use crate::util::atomic_write_str;

/// Persisted `{ordering, metas}` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSnapshot {
    #[serde(default)]
    pub group_order: Vec<GroupId>,
    #[serde(default)]
    pub group_metas: HashMap<GroupId, GroupMeta>,
}

/// Reads and writes the metadata snapshot at a fixed path.
///
/// Not locked: the owning `StateController` is the only caller.
#[derive(Debug, Clone)]
pub struct GroupMetadataStore {
    path: PathBuf,
}

impl GroupMetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the location named by the user config (or the default).
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let path = config
            .metadata_path()
            .map_err(|_| StoreError::HomeDirNotFound)?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. Callers treat any error as "no persisted metadata".
    pub fn load(&self) -> Result<MetadataSnapshot, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the snapshot atomically. On failure the previous file is left as it was.
    pub fn save(&self, snapshot: &MetadataSnapshot) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(snapshot).map_err(StoreError::Encode)?;
        atomic_write_str(&self.path, &content)?;
        log::debug!(
            "Saved metadata for {} groups to {}",
            snapshot.group_order.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Remove the snapshot file. Removing an absent file is not an error.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
