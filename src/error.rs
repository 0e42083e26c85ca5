//! Error types for the group state layer
//!
//! Errors are classified by where they originate:
//! - Store: reading/writing the group metadata file
//! - Gateway: the contacts database rejected or failed an operation
//! - State: a caller asked for something the in-memory tables don't hold

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{AuthorizationStatus, GroupId, PersonId};

/// Errors from the on-disk group metadata snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Metadata file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to decode metadata at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode metadata: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,
}

impl StoreError {
    /// Returns true if the failure only means "nothing persisted yet".
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors reported by a contacts gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Contacts access denied")]
    Denied,

    #[error("Record does not exist: {0}")]
    RecordNotFound(String),

    #[error("Contacts store error: {0}")]
    Backend(String),
}

/// Errors surfaced by `StateController` to its callers.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("No group identified by {0}")]
    GroupNotFound(GroupId),

    #[error("No person identified by {0}")]
    PersonNotFound(PersonId),

    #[error("Person {person} is not a member of group {group}")]
    NotAMember { person: PersonId, group: GroupId },

    #[error("Contacts access is {0:?}")]
    NotAuthorized(AuthorizationStatus),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl StateError {
    /// Returns true if the error is a lookup miss rather than a failed write.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StateError::GroupNotFound(_) | StateError::PersonNotFound(_)
        )
    }
}

/// Errors loading `~/.mypeople/config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
