//! Group and person state of the app.
//!
//! `StateController` is the only mutable cache between the contacts gateway
//! and the UI. It owns the group table, the person table, the display order
//! of groups and a dirty flag for the metadata snapshot. The gateway stays
//! canonical for names and membership; the tables are rebuilt on every
//! external change.

mod mutations;
mod refresh;
mod signal;
mod views;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{StateError, StoreError};
use crate::gateway::ContactsGateway;
use crate::metadata::{GroupMetadataStore, MetadataSnapshot};
use crate::types::{AccessResult, AuthorizationStatus, Group, GroupId, Person, PersonId};

use signal::{RefreshSignal, SuppressionGuard};

/// Change broadcast to observers after memory has been updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    Refreshed,
    GroupCreated(GroupId),
    GroupDeleted(GroupId),
    MembershipChanged(GroupId),
    OrderChanged,
}

pub type StateListener = Box<dyn FnMut(&StateEvent) + Send>;

/// Manages the Group and Person state of the app.
pub struct StateController {
    gateway: Arc<dyn ContactsGateway>,
    store: GroupMetadataStore,
    groups: HashMap<GroupId, Group>,
    people: HashMap<PersonId, Person>,
    ordered_group_ids: Vec<GroupId>,
    needs_to_save: bool,
    /// False until a refresh succeeds, and again after one fails.
    loaded: bool,
    authorization: AuthorizationStatus,
    signal: Arc<RefreshSignal>,
    listeners: Vec<StateListener>,
}

impl StateController {
    /// Wire up to the gateway and load state if contacts access allows it.
    ///
    /// - Authorized: refreshes immediately.
    /// - Not determined: requests access; the answer is applied by
    ///   [`process_pending_changes`](Self::process_pending_changes).
    /// - Restricted or denied: tables stay empty for this session.
    pub fn new(gateway: Arc<dyn ContactsGateway>, store: GroupMetadataStore) -> Self {
        let authorization = gateway.authorization_status();
        let signal = Arc::new(RefreshSignal::default());

        let weak = Arc::downgrade(&signal);
        gateway.subscribe(Box::new(move || {
            if let Some(signal) = weak.upgrade() {
                signal.raise();
            }
        }));

        let mut controller = Self {
            gateway,
            store,
            groups: HashMap::new(),
            people: HashMap::new(),
            ordered_group_ids: Vec::new(),
            needs_to_save: false,
            loaded: false,
            authorization,
            signal,
            listeners: Vec::new(),
        };

        match authorization {
            AuthorizationStatus::Authorized => {
                let _ = controller.refresh_state();
            }
            AuthorizationStatus::NotDetermined => {
                let weak = Arc::downgrade(&controller.signal);
                controller.gateway.request_access(Box::new(move |result| {
                    if let Some(signal) = weak.upgrade() {
                        signal.record_access(result);
                    }
                }));
                // A gateway may answer on the calling thread.
                controller.process_pending_changes();
            }
            AuthorizationStatus::Restricted | AuthorizationStatus::Denied => {
                log::warn!("Could not fetch state because contacts access is blocked");
            }
        }

        controller
    }

    /// Apply access answers and change notifications received since the last call.
    ///
    /// Call from the thread that owns the controller. Returns true if a
    /// refresh ran.
    pub fn process_pending_changes(&mut self) -> bool {
        let mut refreshed = false;

        if let Some(result) = self.signal.take_access() {
            match result {
                AccessResult::Granted => {
                    log::info!("Contacts access granted");
                    self.authorization = AuthorizationStatus::Authorized;
                    // Anything queued before access is covered by this refresh.
                    self.signal.take_pending();
                    refreshed = self.refresh_state().is_ok();
                }
                AccessResult::Failed(reason) => {
                    log::warn!("Contacts access not granted: {reason}");
                    self.authorization = AuthorizationStatus::Denied;
                }
            }
        }

        if self.signal.take_pending() {
            if self.authorization == AuthorizationStatus::Authorized {
                refreshed = self.refresh_state().is_ok();
            } else {
                log::debug!("Dropping contacts change notification without access");
            }
        }

        refreshed
    }

    /// Run `op` with external change notifications ignored.
    ///
    /// Notifications that arrive during `op` are dropped, not replayed.
    /// Scopes nest; the previous state is restored on exit.
    pub fn ignore_refresh_during<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        let _guard = SuppressionGuard::enter(self.signal.clone());
        op(self)
    }

    /// Register an observer for state changes.
    pub fn subscribe(&mut self, listener: StateListener) {
        self.listeners.push(listener);
    }

    fn emit(&mut self, event: StateEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
    }

    /// All group IDs in display order.
    pub fn ordered_group_ids(&self) -> &[GroupId] {
        &self.ordered_group_ids
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn needs_to_save(&self) -> bool {
        self.needs_to_save
    }

    pub fn group(&self, identifier: &GroupId) -> Result<&Group, StateError> {
        self.groups
            .get(identifier)
            .ok_or_else(|| StateError::GroupNotFound(identifier.clone()))
    }

    /// A person from memory, or fetched from the gateway and cached if absent.
    pub fn person(&mut self, identifier: &PersonId) -> Result<&Person, StateError> {
        if !self.people.contains_key(identifier) {
            let record = self
                .gateway
                .fetch_person(identifier)
                .map_err(|e| {
                    log::warn!("Failed to fetch person {identifier}: {e}");
                    e
                })?
                .ok_or_else(|| StateError::PersonNotFound(identifier.clone()))?;
            self.people
                .insert(identifier.clone(), Person::from_record(record));
        }
        self.people
            .get(identifier)
            .ok_or_else(|| StateError::PersonNotFound(identifier.clone()))
    }

    /// A person already held in memory. Never touches the gateway.
    pub fn cached_person(&self, identifier: &PersonId) -> Option<&Person> {
        self.people.get(identifier)
    }

    /// The groups the given person belongs to.
    pub fn groups_for_person(&self, identifier: &PersonId) -> Result<Vec<&Group>, StateError> {
        let person = self
            .people
            .get(identifier)
            .ok_or_else(|| StateError::PersonNotFound(identifier.clone()))?;
        Ok(person
            .group_ids
            .iter()
            .filter_map(|id| self.groups.get(id))
            .collect())
    }

    /// The members of the given group.
    pub fn members_of_group(&self, identifier: &GroupId) -> Result<Vec<&Person>, StateError> {
        Ok(self
            .group(identifier)?
            .member_ids
            .iter()
            .filter_map(|id| self.people.get(id))
            .collect())
    }

    /// Sort a subset of group IDs by their position in the display order.
    pub fn order<'a, I>(&self, group_ids: I) -> Result<Vec<GroupId>, StateError>
    where
        I: IntoIterator<Item = &'a GroupId>,
    {
        let mut ranked = group_ids
            .into_iter()
            .map(|id| {
                self.position_of(id)
                    .map(|rank| (rank, id.clone()))
                    .ok_or_else(|| StateError::GroupNotFound(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, id)| id).collect())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save order and colors to disk if anything changed since the last save.
    ///
    /// The dirty flag is cleared only when the write succeeds.
    pub fn save_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.needs_to_save {
            return Ok(());
        }
        match self.store.save(&self.snapshot()) {
            Ok(()) => {
                self.needs_to_save = false;
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "Failed to save group metadata to {}: {e}",
                    self.store.path().display()
                );
                Err(e)
            }
        }
    }

    fn snapshot(&self) -> MetadataSnapshot {
        if !self.loaded {
            // The tables don't mirror the gateway; fold them into what is on disk.
            let mut snapshot = self.load_snapshot();
            for id in &self.ordered_group_ids {
                if !snapshot.group_order.contains(id) {
                    snapshot.group_order.push(id.clone());
                }
            }
            for (id, group) in &self.groups {
                snapshot.group_metas.insert(id.clone(), group.meta);
            }
            return snapshot;
        }
        MetadataSnapshot {
            group_order: self.ordered_group_ids.clone(),
            group_metas: self
                .groups
                .iter()
                .map(|(id, group)| (id.clone(), group.meta))
                .collect(),
        }
    }

    // =========================================================================
    // Index maintenance
    // =========================================================================

    fn position_of(&self, identifier: &GroupId) -> Option<usize> {
        self.ordered_group_ids.iter().position(|id| id == identifier)
    }

    /// Connect person and group in both directions.
    fn link(&mut self, person: &PersonId, group: &GroupId) {
        debug_assert!(self.groups.contains_key(group), "linking unknown group");
        debug_assert!(self.people.contains_key(person), "linking unknown person");
        if let Some(g) = self.groups.get_mut(group) {
            g.member_ids.insert(person.clone());
        }
        if let Some(p) = self.people.get_mut(person) {
            p.group_ids.insert(group.clone());
        }
    }

    /// Disconnect person and group in both directions.
    fn unlink(&mut self, person: &PersonId, group: &GroupId) {
        if let Some(g) = self.groups.get_mut(group) {
            g.member_ids.remove(person);
        }
        if let Some(p) = self.people.get_mut(person) {
            p.group_ids.remove(group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::gateway::{GatewayOp, MemoryGateway};
    use crate::types::{Color, GroupMeta};

    #[test]
    fn test_unknown_group_is_typed_not_found() {
        let fx = Fixture::seeded();
        let controller = fx.controller();

        let err = controller.group(&GroupId::from("missing")).unwrap_err();

        assert!(matches!(err, StateError::GroupNotFound(_)));
    }

    #[test]
    fn test_person_fetches_and_caches_non_members() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        assert!(controller.cached_person(&PersonId::from(DEE)).is_none());

        let person = controller.person(&PersonId::from(DEE)).unwrap();

        assert_eq!(person.name, "Dee");
        assert!(controller.cached_person(&PersonId::from(DEE)).is_some());
    }

    #[test]
    fn test_person_unknown_to_gateway_is_not_found() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();

        let err = controller.person(&PersonId::from("ghost")).unwrap_err();

        assert!(matches!(err, StateError::PersonNotFound(_)));
    }

    #[test]
    fn test_members_and_groups_are_mirrored() {
        let fx = Fixture::seeded();
        let controller = fx.controller();

        let members = member_ids(&controller, FAMILY);
        assert_eq!(members, ids(&[ADA, BOB]));

        let mut bob_groups: Vec<String> = controller
            .groups_for_person(&PersonId::from(BOB))
            .unwrap()
            .iter()
            .map(|g| g.identifier.to_string())
            .collect();
        bob_groups.sort();
        assert_eq!(bob_groups, vec![FAMILY.to_string(), WORK.to_string()]);
    }

    #[test]
    fn test_order_sorts_subset_by_display_order() {
        let fx = Fixture::seeded();
        let controller = fx.controller();
        let subset = [GroupId::from(CLUB), GroupId::from(FAMILY)];

        let ordered = controller.order(&subset).unwrap();

        assert_eq!(ordered, vec![GroupId::from(FAMILY), GroupId::from(CLUB)]);
    }

    #[test]
    fn test_order_rejects_unknown_ids() {
        let fx = Fixture::seeded();
        let controller = fx.controller();
        let subset = [GroupId::from("missing")];

        assert!(controller.order(&subset).is_err());
    }

    #[test]
    fn test_suppression_scope_drops_notifications() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();

        controller.ignore_refresh_during(|_| fx.gateway.notify_changed());
        assert!(!controller.process_pending_changes());

        fx.gateway.notify_changed();
        assert!(controller.process_pending_changes());
    }

    #[test]
    fn test_nested_suppression_restores_outer_scope() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();

        controller.ignore_refresh_during(|c| {
            c.ignore_refresh_during(|_| ());
            // Still inside the outer scope.
            fx.gateway.notify_changed();
        });

        assert!(!controller.process_pending_changes());
    }

    #[test]
    fn test_external_change_rebuilds_tables() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        fx.gateway.insert_member(&PersonId::from(CY), &GroupId::from(CLUB));

        assert!(controller.process_pending_changes());

        assert_eq!(member_ids(&controller, CLUB), ids(&[CY]));
    }

    #[test]
    fn test_denied_access_leaves_tables_empty() {
        let gateway = Arc::new(MemoryGateway::with_status(AuthorizationStatus::Denied));
        seed(&gateway);
        let fx = Fixture::with_gateway(gateway);

        let mut controller = fx.controller();
        fx.gateway.notify_changed();

        assert!(!controller.process_pending_changes());
        assert_eq!(controller.group_count(), 0);
        assert_eq!(controller.authorization_status(), AuthorizationStatus::Denied);
    }

    #[test]
    fn test_access_granted_immediately_refreshes() {
        let gateway = Arc::new(MemoryGateway::with_status(AuthorizationStatus::NotDetermined));
        seed(&gateway);
        let fx = Fixture::with_gateway(gateway);

        let controller = fx.controller();

        assert_eq!(controller.authorization_status(), AuthorizationStatus::Authorized);
        assert_eq!(controller.group_count(), 3);
    }

    #[test]
    fn test_access_answer_from_other_thread_applies_on_owner_thread() {
        let gateway = Arc::new(MemoryGateway::with_status(AuthorizationStatus::NotDetermined));
        gateway.defer_access(AccessResult::Granted);
        seed(&gateway);
        let fx = Fixture::with_gateway(gateway);
        let mut controller = fx.controller();
        assert_eq!(controller.group_count(), 0);

        let remote = fx.gateway.clone();
        std::thread::spawn(move || remote.complete_access())
            .join()
            .expect("access thread");
        assert_eq!(controller.group_count(), 0);

        assert!(controller.process_pending_changes());
        assert_eq!(controller.group_count(), 3);
    }

    #[test]
    fn test_access_granted_but_refresh_failed_reports_no_refresh() {
        let gateway = Arc::new(MemoryGateway::with_status(AuthorizationStatus::NotDetermined));
        gateway.defer_access(AccessResult::Granted);
        seed(&gateway);
        let fx = Fixture::with_gateway(gateway);
        let mut controller = fx.controller();
        fx.gateway.complete_access();
        fx.gateway.fail_next(GatewayOp::AllGroups);

        assert!(!controller.process_pending_changes());
        assert_eq!(controller.authorization_status(), AuthorizationStatus::Authorized);
        assert_eq!(controller.group_count(), 0);
    }

    #[test]
    fn test_failed_refresh_after_change_reports_no_refresh() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        fx.gateway.fail_next(GatewayOp::FetchPeople);

        fx.gateway.notify_changed();

        assert!(!controller.process_pending_changes());
        assert_eq!(controller.group_count(), 0);
    }

    #[test]
    fn test_access_failure_is_terminal() {
        let gateway = Arc::new(MemoryGateway::with_status(AuthorizationStatus::NotDetermined));
        gateway.answer_access_with(AccessResult::Failed("user declined".to_string()));
        seed(&gateway);
        let fx = Fixture::with_gateway(gateway);

        let mut controller = fx.controller();
        fx.gateway.notify_changed();

        assert!(!controller.process_pending_changes());
        assert_eq!(controller.authorization_status(), AuthorizationStatus::Denied);
        assert_eq!(controller.group_count(), 0);
    }

    #[test]
    fn test_save_if_needed_is_noop_when_clean() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        controller.save_if_needed().unwrap();
        std::fs::remove_file(fx.store.path()).unwrap();

        controller.save_if_needed().unwrap();

        assert!(!fx.store.path().exists());
    }

    #[test]
    fn test_save_failure_keeps_dirty_flag() {
        let fx = Fixture::seeded();
        // The tempdir itself cannot be replaced by a file.
        let blocked = GroupMetadataStore::new(fx.dir.path().to_path_buf());
        let mut controller = StateController::new(fx.gateway.clone(), blocked);
        assert!(controller.needs_to_save());

        assert!(controller.save_if_needed().is_err());

        assert!(controller.needs_to_save());
    }

    #[test]
    fn test_observers_hear_refresh() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = events.clone();
        controller.subscribe(Box::new(move |event| sink.lock().push(event.clone())));

        controller.refresh_state().unwrap();

        assert_eq!(*events.lock(), vec![StateEvent::Refreshed]);
    }

    #[test]
    fn test_snapshot_carries_current_colors() {
        let fx = Fixture::seeded();
        let mut controller = fx.controller();
        let created = controller
            .create_group("Book club", GroupMeta::new(Color::Slate), &[])
            .unwrap();

        let snapshot = fx.store.load().unwrap();

        assert_eq!(
            snapshot.group_metas[&created.identifier],
            GroupMeta::new(Color::Slate)
        );
        assert_eq!(snapshot.group_order.last(), Some(&created.identifier));
    }
}
