use std::collections::HashSet;

use super::StateController;
use crate::error::StateError;
use crate::types::{Channel, Color, Group, GroupId, GroupSummary, PersonId};

impl StateController {
    /// All groups in display order.
    pub fn ordered_groups(&self) -> Vec<&Group> {
        self.ordered_group_ids
            .iter()
            .filter_map(|id| self.groups.get(id))
            .collect()
    }

    /// One row per group for the group list, in display order.
    pub fn group_summaries(&self) -> Vec<GroupSummary> {
        self.ordered_groups()
            .into_iter()
            .map(|group| GroupSummary {
                id: group.identifier.clone(),
                name: group.name.clone(),
                color: group.meta.color,
                member_count: group.member_count(),
            })
            .collect()
    }

    /// Colors of the groups a person belongs to, in display order.
    pub fn group_colors_for_person(&self, identifier: &PersonId) -> Result<Vec<Color>, StateError> {
        let person = self
            .people
            .get(identifier)
            .ok_or_else(|| StateError::PersonNotFound(identifier.clone()))?;
        let ordered = self.order(&person.group_ids)?;
        Ok(ordered
            .iter()
            .filter_map(|id| self.groups.get(id))
            .map(|group| group.meta.color)
            .collect())
    }

    /// Addresses for messaging a whole group.
    ///
    /// Members without a value for the channel are skipped. Duplicate
    /// addresses are listed once.
    pub fn contact_recipients(
        &self,
        identifier: &GroupId,
        channel: Channel,
    ) -> Result<Vec<String>, StateError> {
        let mut seen = HashSet::new();
        Ok(self
            .members_of_group(identifier)?
            .into_iter()
            .filter_map(|person| match channel {
                Channel::Text => person.phone.as_deref(),
                Channel::Email => person.email.as_deref(),
            })
            .filter(|address| seen.insert(*address))
            .map(str::to_string)
            .collect())
    }
}
