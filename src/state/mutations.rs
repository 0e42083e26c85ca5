use super::{StateController, StateEvent};
use crate::error::StateError;
use crate::types::{Group, GroupId, GroupMeta, PersonId};

/// Suffix appended to the name of a duplicated group.
pub const COPY_SUFFIX: &str = " - Copy";

impl StateController {
    // =========================================================================
    // Operations
    //
    // Every write goes to the gateway first. Memory changes only once the
    // gateway accepts it; a rejected write is logged and returned unchanged.
    // =========================================================================

    /// Create a group in the contacts store, in memory and on disk.
    ///
    /// The group goes to the end of the display order. Members are added one
    /// at a time; a member that fails to add is logged and skipped.
    pub fn create_group(
        &mut self,
        name: &str,
        meta: GroupMeta,
        members: &[PersonId],
    ) -> Result<Group, StateError> {
        self.ignore_refresh_during(|this| {
            let record = this.gateway.add_group(name).map_err(|e| {
                log::warn!("Failed to create group {name:?}: {e}");
                e
            })?;

            let group = Group::from_record(record, meta);
            let id = group.identifier.clone();
            this.groups.insert(id.clone(), group);
            this.ordered_group_ids.push(id.clone());
            this.needs_to_save = true;
            this.emit(StateEvent::GroupCreated(id.clone()));

            this.add_people(members, &id);
            let _ = this.save_if_needed();

            this.group(&id).cloned()
        })
    }

    /// Add the person to the group, in the contacts store and in memory.
    ///
    /// A person not yet in memory is fetched and cached first.
    pub fn add_person(&mut self, person: &PersonId, group: &GroupId) -> Result<(), StateError> {
        self.group(group)?;
        self.person(person)?;

        if let Err(e) = self.gateway.add_member(person, group) {
            log::warn!("Failed to add person {person} to group {group}: {e}");
            return Err(e.into());
        }

        self.link(person, group);
        self.emit(StateEvent::MembershipChanged(group.clone()));
        Ok(())
    }

    /// Add each person in turn. Not transactional: earlier successes stand
    /// when a later person fails. Returns how many were added.
    pub fn add_people(&mut self, people: &[PersonId], group: &GroupId) -> usize {
        people
            .iter()
            .filter(|person| self.add_person(person, group).is_ok())
            .count()
    }

    /// Remove the person from the group, in the contacts store and in memory.
    pub fn remove_person(&mut self, person: &PersonId, group: &GroupId) -> Result<(), StateError> {
        if !self.group(group)?.member_ids.contains(person) {
            return Err(StateError::NotAMember {
                person: person.clone(),
                group: group.clone(),
            });
        }

        if let Err(e) = self.gateway.remove_member(person, group) {
            log::warn!("Failed to remove person {person} from group {group}: {e}");
            return Err(e.into());
        }

        self.unlink(person, group);
        self.emit(StateEvent::MembershipChanged(group.clone()));
        Ok(())
    }

    /// Remove each person in turn. Not transactional. Returns how many were removed.
    pub fn remove_people(&mut self, people: &[PersonId], group: &GroupId) -> usize {
        people
            .iter()
            .filter(|person| self.remove_person(person, group).is_ok())
            .count()
    }

    /// Delete the group from the contacts store, memory and the display order.
    ///
    /// Deleting a group that is already gone succeeds.
    pub fn delete_group(&mut self, identifier: &GroupId) -> Result<(), StateError> {
        if let Err(e) = self.gateway.delete_group(identifier) {
            log::warn!("Failed to delete group {identifier}: {e}");
            return Err(e.into());
        }

        if let Some(group) = self.groups.remove(identifier) {
            for person in &group.member_ids {
                if let Some(p) = self.people.get_mut(person) {
                    p.group_ids.remove(identifier);
                }
            }
        }
        self.ordered_group_ids.retain(|id| id != identifier);
        self.needs_to_save = true;
        let _ = self.save_if_needed();

        self.emit(StateEvent::GroupDeleted(identifier.clone()));
        Ok(())
    }

    /// Copy a group: same color, name with " - Copy", same members, placed
    /// directly after the original.
    pub fn duplicate_group(&mut self, identifier: &GroupId) -> Result<Group, StateError> {
        let original = self.group(identifier)?.clone();
        let members: Vec<PersonId> = original.member_ids.iter().cloned().collect();
        let name = format!("{}{COPY_SUFFIX}", original.name);

        self.ignore_refresh_during(|this| {
            let copy = this.create_group(&name, original.meta, &members)?;
            this.move_group(&copy.identifier, identifier)?;
            let _ = this.save_if_needed();
            this.group(&copy.identifier).cloned()
        })
    }

    /// Position `moving` directly after `reference` in the display order.
    pub fn move_group(&mut self, moving: &GroupId, reference: &GroupId) -> Result<(), StateError> {
        let from = self
            .position_of(moving)
            .ok_or_else(|| StateError::GroupNotFound(moving.clone()))?;
        if self.position_of(reference).is_none() {
            return Err(StateError::GroupNotFound(reference.clone()));
        }
        if moving == reference {
            return Ok(());
        }

        let id = self.ordered_group_ids.remove(from);
        let to = self
            .position_of(reference)
            .map(|index| index + 1)
            .ok_or_else(|| StateError::GroupNotFound(reference.clone()))?;
        self.ordered_group_ids.insert(to, id);
        self.needs_to_save = true;

        self.emit(StateEvent::OrderChanged);
        Ok(())
    }
}
