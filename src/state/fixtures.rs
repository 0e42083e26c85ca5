//! Shared setup for state tests: a seeded in-memory address book and a
//! metadata store in a temp dir.

use std::sync::Arc;

use tempfile::TempDir;

use super::StateController;
use crate::gateway::MemoryGateway;
use crate::metadata::GroupMetadataStore;
use crate::types::{GroupId, PersonId, PersonRecord};

pub(crate) const FAMILY: &str = "g-family";
pub(crate) const WORK: &str = "g-work";
pub(crate) const CLUB: &str = "g-club";

pub(crate) const ADA: &str = "p-ada";
pub(crate) const BOB: &str = "p-bob";
pub(crate) const CY: &str = "p-cy";
pub(crate) const DEE: &str = "p-dee";

/// Family {Ada, Bob}, Work {Bob, Cy}, Club {}. Dee belongs to no group.
pub(crate) fn seed(gateway: &MemoryGateway) {
    gateway.insert_contact(
        PersonRecord::new(ADA, "Ada")
            .with_email("ada@example.com")
            .with_phone("+1 555 0100"),
    );
    gateway.insert_contact(PersonRecord::new(BOB, "Bob").with_phone("+1 555 0101"));
    gateway.insert_contact(PersonRecord::new(CY, "Cy").with_email("cy@example.com"));
    gateway.insert_contact(PersonRecord::new(DEE, "Dee"));

    gateway.insert_group(FAMILY, "Family");
    gateway.insert_group(WORK, "Work");
    gateway.insert_group(CLUB, "Club");

    gateway.insert_member(&PersonId::from(ADA), &GroupId::from(FAMILY));
    gateway.insert_member(&PersonId::from(BOB), &GroupId::from(FAMILY));
    gateway.insert_member(&PersonId::from(BOB), &GroupId::from(WORK));
    gateway.insert_member(&PersonId::from(CY), &GroupId::from(WORK));
}

pub(crate) struct Fixture {
    pub gateway: Arc<MemoryGateway>,
    pub store: GroupMetadataStore,
    pub dir: TempDir,
}

impl Fixture {
    pub fn seeded() -> Self {
        let gateway = Arc::new(MemoryGateway::new());
        seed(&gateway);
        Self::with_gateway(gateway)
    }

    pub fn with_gateway(gateway: Arc<MemoryGateway>) -> Self {
        crate::logging::init_for_tests();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GroupMetadataStore::new(dir.path().join("group_metadata.json"));
        Self {
            gateway,
            store,
            dir,
        }
    }

    pub fn controller(&self) -> StateController {
        StateController::new(self.gateway.clone(), self.store.clone())
    }
}

pub(crate) fn ids(raw: &[&str]) -> Vec<PersonId> {
    let mut ids: Vec<PersonId> = raw.iter().map(|id| PersonId::from(*id)).collect();
    ids.sort();
    ids
}

/// Sorted member IDs of a group.
pub(crate) fn member_ids(controller: &StateController, group: &str) -> Vec<PersonId> {
    let mut members: Vec<PersonId> = controller
        .members_of_group(&GroupId::from(group))
        .expect("group")
        .iter()
        .map(|p| p.identifier.clone())
        .collect();
    members.sort();
    members
}
