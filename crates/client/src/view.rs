//! Client-side mirrors of inventories.
//!
//! A view never mutates on its own. It only follows what the server
//! reports, so it can be rebuilt at any time from a full resync. Every
//! inventory message names its owner; a viewer watching other players keeps
//! one [`InventoryView`] per owner in an [`InventoryMirrors`].

use std::collections::BTreeMap;

use gridstash_core::{ContainerId, ItemId, SlotCoord};
use gridstash_inventory::{Container, InventoryRequest, Slot};
use gridstash_net::{PlayerId, ServerMessage};
use tracing::{debug, trace};

/// Mirrored containers of one player's inventory, in the order the server
/// reported them.
#[derive(Debug, Clone)]
pub struct InventoryView {
    owner: PlayerId,
    containers: Vec<Container>,
    resyncs: u64,
}

impl InventoryView {
    /// Empty mirror of `owner`'s inventory.
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            containers: Vec::new(),
            resyncs: 0,
        }
    }

    /// Player whose inventory this mirrors.
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Apply one server message. Returns true when the mirror changed.
    ///
    /// Messages about another player's inventory are ignored.
    pub fn apply(&mut self, message: &ServerMessage) -> bool {
        match message.owner() {
            Some(owner) if owner == self.owner => {}
            Some(owner) => {
                trace!(owner, mirror = self.owner, "ignoring message for another inventory");
                return false;
            }
            None => return false,
        }

        match message {
            ServerMessage::ContainerAdded { info, .. } => {
                if let Some(existing) = self.containers.iter_mut().find(|c| c.id() == info.id) {
                    *existing = Container::new(info.clone());
                } else {
                    self.containers.push(Container::new(info.clone()));
                }
                true
            }
            ServerMessage::ContainerRemoved { id, container_type, .. } => {
                let position = self
                    .containers
                    .iter()
                    .position(|c| c.id() == *id)
                    .or_else(|| {
                        self.containers
                            .iter()
                            .position(|c| c.container_type() == container_type)
                    });
                match position {
                    Some(index) => {
                        self.containers.remove(index);
                        true
                    }
                    None => {
                        debug!(?id, %container_type, "removal for unknown container");
                        false
                    }
                }
            }
            ServerMessage::SlotUpdated { update, .. } => {
                let applied = self
                    .containers
                    .iter_mut()
                    .find(|c| c.id() == update.container)
                    .is_some_and(|c| c.replace_slot(update.slot));
                if !applied {
                    trace!(
                        container = ?update.container,
                        coord = ?update.slot.coord(),
                        "ignoring slot update"
                    );
                }
                applied
            }
            ServerMessage::FullResync { snapshot, .. } => {
                self.containers = snapshot.containers.clone();
                self.resyncs += 1;
                true
            }
            ServerMessage::HandshakeResponse { .. } | ServerMessage::Disconnect { .. } => false,
        }
    }

    /// Request moving the whole stack at `from_coord` onto `to_coord`.
    ///
    /// `None` when the source is empty or unknown, or both ends are the same slot.
    pub fn move_stack_request(
        &self,
        from: ContainerId,
        from_coord: SlotCoord,
        to: ContainerId,
        to_coord: SlotCoord,
    ) -> Option<InventoryRequest> {
        if from == to && from_coord == to_coord {
            return None;
        }
        let amount = self.slot(from, from_coord)?.amount();
        if amount == 0 {
            return None;
        }
        Some(InventoryRequest::MoveItem {
            from,
            from_coord,
            to,
            to_coord,
            amount,
        })
    }

    /// Mirrored containers in inventory order.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Mirrored container with this id.
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id() == id)
    }

    /// First mirrored container of the given type.
    pub fn container_of_type(&self, container_type: &str) -> Option<&Container> {
        self.containers
            .iter()
            .find(|c| c.container_type() == container_type)
    }

    /// Mirrored slot at `coord` inside container `id`.
    pub fn slot(&self, id: ContainerId, coord: SlotCoord) -> Option<&Slot> {
        self.container(id)?.slot(coord)
    }

    /// Total amount of `item_id` across all mirrored containers.
    pub fn count_item(&self, item_id: ItemId) -> u64 {
        self.containers.iter().map(|c| c.count_item(item_id)).sum()
    }

    /// Number of full resyncs applied so far.
    pub fn resync_count(&self) -> u64 {
        self.resyncs
    }

    /// Whether nothing is mirrored yet.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// The local player's own mirror plus one per watched inventory.
#[derive(Debug, Clone)]
pub struct InventoryMirrors {
    own: InventoryView,
    watched: BTreeMap<PlayerId, InventoryView>,
}

impl InventoryMirrors {
    /// Mirrors for a viewer playing as `local`.
    pub fn new(local: PlayerId) -> Self {
        Self {
            own: InventoryView::new(local),
            watched: BTreeMap::new(),
        }
    }

    /// Route a message to the mirror of the inventory it describes. Mirrors
    /// for other owners are created on first contact.
    pub fn apply(&mut self, message: &ServerMessage) -> bool {
        match message.owner() {
            Some(owner) if owner == self.own.owner() => self.own.apply(message),
            Some(owner) => self
                .watched
                .entry(owner)
                .or_insert_with(|| InventoryView::new(owner))
                .apply(message),
            None => false,
        }
    }

    /// The local player's inventory.
    pub fn own(&self) -> &InventoryView {
        &self.own
    }

    /// Mirror of another player's inventory, once anything about it arrived.
    pub fn watched(&self, owner: PlayerId) -> Option<&InventoryView> {
        self.watched.get(&owner)
    }

    /// Owners of watched inventories, in id order.
    pub fn watched_owners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.watched.keys().copied()
    }

    /// Drop the mirror of a watched inventory. The own mirror is kept.
    pub fn forget(&mut self, owner: PlayerId) -> bool {
        self.watched.remove(&owner).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstash_core::GridSize;
    use gridstash_inventory::{ContainerInfo, InventorySnapshot, SlotUpdate};
    use gridstash_server::{Delivery, Server, ServerSettings};
    use gridstash_testkit::{sample_catalog, APPLE};
    use std::sync::Arc;

    const OWNER: PlayerId = 1;

    fn added(id: u32, container_type: &str) -> ServerMessage {
        ServerMessage::ContainerAdded {
            owner: OWNER,
            info: info(id, container_type),
        }
    }

    fn removed(id: u32, container_type: &str) -> ServerMessage {
        ServerMessage::ContainerRemoved {
            owner: OWNER,
            id: ContainerId(id),
            container_type: container_type.into(),
        }
    }

    fn info(id: u32, container_type: &str) -> ContainerInfo {
        ContainerInfo {
            id: ContainerId(id),
            container_type: container_type.into(),
            display_name: "Default".into(),
            size: GridSize::new(2, 2),
            linked_item: None,
        }
    }

    fn slot_update(id: u32, x: u32, y: u32, item: ItemId, amount: u32) -> ServerMessage {
        ServerMessage::SlotUpdated {
            owner: OWNER,
            update: SlotUpdate {
                container: ContainerId(id),
                slot: Slot::with_contents(SlotCoord::new(x, y), item, amount),
            },
        }
    }

    #[test]
    fn added_containers_start_empty() {
        let mut view = InventoryView::new(OWNER);
        assert!(view.apply(&added(0, "Pockets")));
        let pockets = view.container(ContainerId(0)).unwrap();
        assert_eq!(pockets.slots().len(), 4);
        assert!(pockets.slots().iter().all(Slot::is_empty));
    }

    #[test]
    fn slot_updates_replace_mirrored_slots() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Pockets"));
        assert!(view.apply(&slot_update(0, 1, 1, 5, 3)));
        let slot = view.slot(ContainerId(0), SlotCoord::new(1, 1)).unwrap();
        assert_eq!(slot.item_id(), Some(5));
        assert_eq!(slot.amount(), 3);
        assert_eq!(view.count_item(5), 3);
    }

    #[test]
    fn unknown_slot_targets_are_ignored() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Pockets"));
        assert!(!view.apply(&slot_update(7, 0, 0, 5, 1)));
        assert!(!view.apply(&slot_update(0, 9, 9, 5, 1)));
        assert_eq!(view.count_item(5), 0);
    }

    #[test]
    fn removal_takes_the_matching_container() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Bag"));
        view.apply(&added(1, "Bag"));
        assert!(view.apply(&removed(1, "Bag")));
        assert_eq!(view.containers().len(), 1);
        assert_eq!(view.containers()[0].id(), ContainerId(0));
    }

    #[test]
    fn removal_falls_back_to_first_of_type() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Bag"));
        view.apply(&added(1, "Bag"));
        assert!(view.apply(&removed(9, "Bag")));
        assert_eq!(view.containers()[0].id(), ContainerId(1));
        assert!(!view.apply(&removed(9, "Chest")));
    }

    #[test]
    fn full_resync_replaces_the_mirror() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Stale"));
        let mut fresh = Container::new(info(3, "Pockets"));
        fresh.replace_slot(Slot::with_contents(SlotCoord::new(0, 0), 7, 4));
        let snapshot = InventorySnapshot {
            containers: vec![fresh],
        };

        assert!(view.apply(&ServerMessage::FullResync {
            owner: OWNER,
            snapshot,
        }));
        assert_eq!(view.containers().len(), 1);
        assert!(view.container_of_type("Stale").is_none());
        assert_eq!(view.count_item(7), 4);
        assert_eq!(view.resync_count(), 1);
    }

    #[test]
    fn messages_for_other_owners_are_ignored() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Pockets"));
        let foreign = ServerMessage::FullResync {
            owner: OWNER + 1,
            snapshot: InventorySnapshot { containers: vec![] },
        };
        assert!(!view.apply(&foreign));
        assert_eq!(view.containers().len(), 1);
        assert_eq!(view.resync_count(), 0);
    }

    fn feed(mirrors: &mut InventoryMirrors, viewer: PlayerId, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            if delivery.viewer == viewer {
                mirrors.apply(&delivery.message);
            }
        }
    }

    #[test]
    fn watching_another_player_keeps_own_mirror_intact() {
        let mut server = Server::new(
            Arc::new(sample_catalog()),
            ServerSettings {
                resync_interval_ticks: 0,
                ..ServerSettings::default()
            },
        );
        let mut mirrors = InventoryMirrors::new(2);

        server.join(1).unwrap();
        let joined = server.join(2).unwrap();
        feed(&mut mirrors, 2, joined);
        let watching = server.subscribe(2, 1).unwrap();
        feed(&mut mirrors, 2, watching);
        let (_, given) = server.give_item(1, ContainerId(0), APPLE, 5).unwrap();
        feed(&mut mirrors, 2, given);

        let own = server.inventory(2).unwrap();
        assert_eq!(mirrors.own().containers(), own.containers());
        assert_eq!(mirrors.own().count_item(APPLE), 0);

        let watched = mirrors.watched(1).unwrap();
        assert_eq!(watched.containers(), server.inventory(1).unwrap().containers());
        assert_eq!(watched.count_item(APPLE), 5);
        assert_eq!(mirrors.watched_owners().collect::<Vec<_>>(), vec![1]);

        assert!(mirrors.forget(1));
        assert!(mirrors.watched(1).is_none());
        assert_eq!(mirrors.own().containers(), own.containers());
    }

    #[test]
    fn move_stack_request_uses_mirrored_amount() {
        let mut view = InventoryView::new(OWNER);
        view.apply(&added(0, "Pockets"));
        view.apply(&slot_update(0, 0, 0, 5, 6));

        let request = view
            .move_stack_request(
                ContainerId(0),
                SlotCoord::new(0, 0),
                ContainerId(0),
                SlotCoord::new(1, 0),
            )
            .unwrap();
        assert_eq!(
            request,
            InventoryRequest::MoveItem {
                from: ContainerId(0),
                from_coord: SlotCoord::new(0, 0),
                to: ContainerId(0),
                to_coord: SlotCoord::new(1, 0),
                amount: 6,
            }
        );

        assert!(view
            .move_stack_request(
                ContainerId(0),
                SlotCoord::new(0, 0),
                ContainerId(0),
                SlotCoord::new(0, 0)
            )
            .is_none());
        assert!(view
            .move_stack_request(
                ContainerId(0),
                SlotCoord::new(1, 1),
                ContainerId(0),
                SlotCoord::new(0, 0)
            )
            .is_none());
    }
}
