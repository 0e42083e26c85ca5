//! Seam between the state layer and the platform contacts database.
//!
//! The platform address book is canonical for groups, contacts and
//! membership. `StateController` only ever reaches it through
//! [`ContactsGateway`]; [`MemoryGateway`] is the in-process implementation.

pub mod memory;

pub use memory::{GatewayOp, MemoryGateway};

use crate::error::GatewayError;
use crate::types::{AccessResult, AuthorizationStatus, GroupId, GroupRecord, PersonId, PersonRecord};

/// Invoked whenever the contacts database changes, possibly from another thread.
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// Invoked exactly once with the outcome of an access request.
pub type AccessCallback = Box<dyn FnOnce(AccessResult) + Send>;

/// Operations the state layer needs from a contacts database.
///
/// Calls are synchronous and may block. No retries are attempted by callers.
pub trait ContactsGateway: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for contacts access. `callback` runs once, on any thread.
    fn request_access(&self, callback: AccessCallback);

    fn all_groups(&self) -> Result<Vec<GroupRecord>, GatewayError>;

    fn fetch_people(&self, group: &GroupId) -> Result<Vec<PersonRecord>, GatewayError>;

    fn fetch_person(&self, person: &PersonId) -> Result<Option<PersonRecord>, GatewayError>;

    fn add_group(&self, name: &str) -> Result<GroupRecord, GatewayError>;

    /// Delete a group. Deleting a group that no longer exists succeeds.
    fn delete_group(&self, group: &GroupId) -> Result<(), GatewayError>;

    fn add_member(&self, person: &PersonId, group: &GroupId) -> Result<(), GatewayError>;

    fn remove_member(&self, person: &PersonId, group: &GroupId) -> Result<(), GatewayError>;

    /// Register for "database changed" notifications.
    fn subscribe(&self, listener: ChangeListener);
}
