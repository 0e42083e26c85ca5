//! In-process contacts database.
//!
//! Mirrors the platform contract closely enough to drive `StateController`
//! without an address book: groups keep creation order, every successful
//! write notifies subscribers, deleting a missing group succeeds, and single
//! operations can be made to fail for exercising error paths.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::{AccessCallback, ChangeListener, ContactsGateway};
use crate::error::GatewayError;
use crate::types::{AccessResult, AuthorizationStatus, GroupId, GroupRecord, PersonId, PersonRecord};

/// Gateway operations that can be made to fail once with [`MemoryGateway::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    AllGroups,
    FetchPeople,
    FetchPerson,
    AddGroup,
    DeleteGroup,
    AddMember,
    RemoveMember,
}

#[derive(Debug, Default)]
struct Contacts {
    people: HashMap<PersonId, PersonRecord>,
    groups: Vec<GroupRecord>,
    members: HashMap<GroupId, Vec<PersonId>>,
    failures: HashSet<GatewayOp>,
}

impl Contacts {
    fn check(&mut self, op: GatewayOp) -> Result<(), GatewayError> {
        if self.failures.remove(&op) {
            return Err(GatewayError::Backend(format!("injected failure for {op:?}")));
        }
        Ok(())
    }

    fn has_group(&self, group: &GroupId) -> bool {
        self.groups.iter().any(|g| &g.identifier == group)
    }
}

enum AccessMode {
    Immediate(AccessResult),
    Deferred(AccessResult),
}

pub struct MemoryGateway {
    contacts: Mutex<Contacts>,
    listeners: Mutex<Vec<ChangeListener>>,
    status: Mutex<AuthorizationStatus>,
    access: Mutex<AccessMode>,
    pending_access: Mutex<Option<AccessCallback>>,
}

impl MemoryGateway {
    /// An authorized, empty contacts database.
    pub fn new() -> Self {
        Self::with_status(AuthorizationStatus::Authorized)
    }

    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            contacts: Mutex::new(Contacts::default()),
            listeners: Mutex::new(Vec::new()),
            status: Mutex::new(status),
            access: Mutex::new(AccessMode::Immediate(AccessResult::Granted)),
            pending_access: Mutex::new(None),
        }
    }

    /// Answer future access requests with `result`, on the requesting thread.
    pub fn answer_access_with(&self, result: AccessResult) {
        *self.access.lock() = AccessMode::Immediate(result);
    }

    /// Hold future access requests until [`complete_access`](Self::complete_access).
    pub fn defer_access(&self, result: AccessResult) {
        *self.access.lock() = AccessMode::Deferred(result);
    }

    /// Deliver a held access answer. Returns false if nothing was waiting.
    pub fn complete_access(&self) -> bool {
        let Some(callback) = self.pending_access.lock().take() else {
            return false;
        };
        let result = match &*self.access.lock() {
            AccessMode::Immediate(result) | AccessMode::Deferred(result) => result.clone(),
        };
        self.settle_access(&result);
        callback(result);
        true
    }

    /// Make the next call of `op` fail with a backend error.
    pub fn fail_next(&self, op: GatewayOp) {
        self.contacts.lock().failures.insert(op);
    }

    /// Add or replace a contact, as if edited in another app.
    pub fn insert_contact(&self, record: PersonRecord) {
        self.contacts
            .lock()
            .people
            .insert(record.identifier.clone(), record);
        self.notify_changed();
    }

    /// Create a group with a chosen identifier, as if created in another app.
    pub fn insert_group(&self, identifier: impl Into<GroupId>, name: impl Into<String>) -> GroupRecord {
        let record = GroupRecord {
            identifier: identifier.into(),
            name: name.into(),
        };
        {
            let mut contacts = self.contacts.lock();
            contacts.groups.retain(|g| g.identifier != record.identifier);
            contacts.groups.push(record.clone());
            contacts.members.entry(record.identifier.clone()).or_default();
        }
        self.notify_changed();
        record
    }

    /// Add a membership directly, as if edited in another app.
    pub fn insert_member(&self, person: &PersonId, group: &GroupId) {
        {
            let mut contacts = self.contacts.lock();
            let members = contacts.members.entry(group.clone()).or_default();
            if !members.contains(person) {
                members.push(person.clone());
            }
        }
        self.notify_changed();
    }

    pub fn group_count(&self) -> usize {
        self.contacts.lock().groups.len()
    }

    pub fn member_ids(&self, group: &GroupId) -> Vec<PersonId> {
        self.contacts
            .lock()
            .members
            .get(group)
            .cloned()
            .unwrap_or_default()
    }

    /// Fire a "database changed" notification to every subscriber.
    pub fn notify_changed(&self) {
        for listener in self.listeners.lock().iter() {
            listener();
        }
    }

    fn settle_access(&self, result: &AccessResult) {
        *self.status.lock() = match result {
            AccessResult::Granted => AuthorizationStatus::Authorized,
            AccessResult::Failed(_) => AuthorizationStatus::Denied,
        };
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactsGateway for MemoryGateway {
    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    fn request_access(&self, callback: AccessCallback) {
        let immediate = match &*self.access.lock() {
            AccessMode::Immediate(result) => Some(result.clone()),
            AccessMode::Deferred(_) => None,
        };
        match immediate {
            Some(result) => {
                self.settle_access(&result);
                callback(result);
            }
            None => *self.pending_access.lock() = Some(callback),
        }
    }

    fn all_groups(&self) -> Result<Vec<GroupRecord>, GatewayError> {
        let mut contacts = self.contacts.lock();
        contacts.check(GatewayOp::AllGroups)?;
        Ok(contacts.groups.clone())
    }

    fn fetch_people(&self, group: &GroupId) -> Result<Vec<PersonRecord>, GatewayError> {
        let mut contacts = self.contacts.lock();
        contacts.check(GatewayOp::FetchPeople)?;
        if !contacts.has_group(group) {
            return Err(GatewayError::RecordNotFound(group.to_string()));
        }
        let ids = contacts.members.get(group).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| contacts.people.get(id).cloned())
            .collect())
    }

    fn fetch_person(&self, person: &PersonId) -> Result<Option<PersonRecord>, GatewayError> {
        let mut contacts = self.contacts.lock();
        contacts.check(GatewayOp::FetchPerson)?;
        Ok(contacts.people.get(person).cloned())
    }

    fn add_group(&self, name: &str) -> Result<GroupRecord, GatewayError> {
        let record = {
            let mut contacts = self.contacts.lock();
            contacts.check(GatewayOp::AddGroup)?;
            let record = GroupRecord {
                identifier: GroupId::new(uuid::Uuid::new_v4().to_string()),
                name: name.to_string(),
            };
            contacts.groups.push(record.clone());
            contacts.members.insert(record.identifier.clone(), Vec::new());
            record
        };
        self.notify_changed();
        Ok(record)
    }

    fn delete_group(&self, group: &GroupId) -> Result<(), GatewayError> {
        let existed = {
            let mut contacts = self.contacts.lock();
            contacts.check(GatewayOp::DeleteGroup)?;
            let before = contacts.groups.len();
            contacts.groups.retain(|g| &g.identifier != group);
            contacts.members.remove(group);
            contacts.groups.len() != before
        };
        if existed {
            self.notify_changed();
        } else {
            log::debug!("Group {group} doesn't exist to delete, treating as deleted");
        }
        Ok(())
    }

    fn add_member(&self, person: &PersonId, group: &GroupId) -> Result<(), GatewayError> {
        {
            let mut contacts = self.contacts.lock();
            contacts.check(GatewayOp::AddMember)?;
            if !contacts.people.contains_key(person) {
                return Err(GatewayError::RecordNotFound(person.to_string()));
            }
            if !contacts.has_group(group) {
                return Err(GatewayError::RecordNotFound(group.to_string()));
            }
            let members = contacts.members.entry(group.clone()).or_default();
            if !members.contains(person) {
                members.push(person.clone());
            }
        }
        self.notify_changed();
        Ok(())
    }

    fn remove_member(&self, person: &PersonId, group: &GroupId) -> Result<(), GatewayError> {
        {
            let mut contacts = self.contacts.lock();
            contacts.check(GatewayOp::RemoveMember)?;
            if !contacts.has_group(group) {
                return Err(GatewayError::RecordNotFound(group.to_string()));
            }
            if let Some(members) = contacts.members.get_mut(group) {
                members.retain(|id| id != person);
            }
        }
        self.notify_changed();
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) {
        self.listeners.lock().push(listener);
    }
}
