use std::collections::HashMap;

use super::{StateController, StateEvent};
use crate::error::{GatewayError, StateError};
use crate::metadata::MetadataSnapshot;
use crate::types::{AuthorizationStatus, Group, GroupId, GroupMeta, Person, PersonId};

/// Tables rebuilt from the gateway before being swapped into the controller.
#[derive(Default)]
struct Rebuilt {
    groups: HashMap<GroupId, Group>,
    people: HashMap<PersonId, Person>,
    ordered_group_ids: Vec<GroupId>,
    minted_metas: usize,
}

impl StateController {
    /// Rebuild the group and person tables from the gateway.
    ///
    /// Pending metadata is flushed first. Persisted colors and order are
    /// merged in; groups without a persisted color get the fallback color
    /// and the snapshot is marked dirty. On a gateway failure the tables are
    /// left empty, and later saves add to the persisted snapshot instead of
    /// replacing it.
    pub fn refresh_state(&mut self) -> Result<(), StateError> {
        if self.authorization != AuthorizationStatus::Authorized {
            return Err(StateError::NotAuthorized(self.authorization));
        }

        let _ = self.save_if_needed();

        self.groups.clear();
        self.people.clear();
        self.ordered_group_ids.clear();
        self.loaded = false;

        let snapshot = self.load_snapshot();
        let rebuilt = match self.fetch_tables(&snapshot) {
            Ok(rebuilt) => rebuilt,
            Err(e) => {
                log::error!("Failed to refresh contacts state: {e}");
                return Err(e.into());
            }
        };

        if rebuilt.minted_metas > 0 || rebuilt.ordered_group_ids != snapshot.group_order {
            self.needs_to_save = true;
        }
        self.groups = rebuilt.groups;
        self.people = rebuilt.people;
        self.ordered_group_ids = rebuilt.ordered_group_ids;
        self.loaded = true;

        log::info!(
            "Refreshed state: {} groups, {} people ({} new colors)",
            self.groups.len(),
            self.people.len(),
            rebuilt.minted_metas
        );
        self.emit(StateEvent::Refreshed);
        Ok(())
    }

    pub(super) fn load_snapshot(&self) -> MetadataSnapshot {
        match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_missing() => {
                log::debug!("No persisted group metadata yet");
                MetadataSnapshot::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable group metadata: {e}");
                MetadataSnapshot::default()
            }
        }
    }

    fn fetch_tables(&self, snapshot: &MetadataSnapshot) -> Result<Rebuilt, GatewayError> {
        let mut rebuilt = Rebuilt::default();
        let mut fetch_order = Vec::new();

        for record in self.gateway.all_groups()? {
            let id = record.identifier.clone();
            let meta = match snapshot.group_metas.get(&id) {
                Some(meta) => *meta,
                None => {
                    rebuilt.minted_metas += 1;
                    GroupMeta::fallback_for(&id)
                }
            };
            if rebuilt
                .groups
                .insert(id.clone(), Group::from_record(record, meta))
                .is_none()
            {
                fetch_order.push(id);
            }
        }

        for group_id in &fetch_order {
            for record in self.gateway.fetch_people(group_id)? {
                let person_id = record.identifier.clone();
                // One contact can sit in many groups; keep a single Person.
                let person = rebuilt
                    .people
                    .entry(person_id.clone())
                    .or_insert_with(|| Person::from_record(record));
                person.group_ids.insert(group_id.clone());
                if let Some(group) = rebuilt.groups.get_mut(group_id) {
                    group.member_ids.insert(person_id);
                }
            }
        }

        rebuilt.ordered_group_ids = merge_order(&fetch_order, &snapshot.group_order);
        Ok(rebuilt)
    }
}

/// Order fetched groups by the persisted order.
///
/// Groups known to the persisted order come first, in that order. Groups it
/// doesn't mention follow in fetch order. Persisted IDs that no longer exist
/// are dropped.
pub(crate) fn merge_order(fetched: &[GroupId], persisted: &[GroupId]) -> Vec<GroupId> {
    let mut rank: HashMap<&GroupId, usize> = HashMap::new();
    for (index, id) in persisted.iter().enumerate() {
        rank.entry(id).or_insert(index);
    }

    let mut ordered = fetched.to_vec();
    ordered.sort_by_key(|id| match rank.get(id) {
        Some(&index) => (0, index),
        None => (1, 0),
    });
    ordered
}
