//! MyPeople core: colored contact groups over the system address book.
//!
//! The contacts gateway owns people, groups and membership. This crate keeps
//! an in-memory view of them ([`StateController`]) and persists what the
//! gateway cannot hold: the display order of groups and each group's color
//! ([`GroupMetadataStore`]).

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metadata;
pub mod state;
pub mod types;
pub mod util;

pub use error::{ConfigError, GatewayError, StateError, StoreError};
pub use gateway::{ContactsGateway, MemoryGateway};
pub use metadata::{GroupMetadataStore, MetadataSnapshot};
pub use state::{StateController, StateEvent, StateListener};
pub use types::{
    AccessResult, AuthorizationStatus, Channel, Color, Group, GroupId, GroupMeta, GroupSummary,
    Person, PersonId,
};
