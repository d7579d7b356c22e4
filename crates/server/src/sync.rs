//! Fan-out of controller events to viewers.
//!
//! The controller only reports what changed; this module decides who hears
//! about it. Every inventory has a [`SubscriberList`] whose first member is
//! always the owner.

use std::collections::BTreeSet;

use gridstash_inventory::{Audience, InventoryEvent, InventoryState};
use gridstash_net::{PlayerId, ServerMessage};

/// A message addressed to one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Receiving player.
    pub viewer: PlayerId,
    /// Message to send.
    pub message: ServerMessage,
}

/// Viewers watching one inventory.
#[derive(Debug, Clone)]
pub struct SubscriberList {
    owner: PlayerId,
    viewers: BTreeSet<PlayerId>,
}

impl SubscriberList {
    /// A list containing only the owner.
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            viewers: BTreeSet::new(),
        }
    }

    /// Owner of the inventory.
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Add a viewer. Returns false for the owner or an existing viewer.
    pub fn add(&mut self, viewer: PlayerId) -> bool {
        viewer != self.owner && self.viewers.insert(viewer)
    }

    /// Remove a viewer. The owner cannot be removed.
    pub fn remove(&mut self, viewer: PlayerId) -> bool {
        self.viewers.remove(&viewer)
    }

    /// Whether `viewer` receives this inventory's broadcasts.
    pub fn contains(&self, viewer: PlayerId) -> bool {
        viewer == self.owner || self.viewers.contains(&viewer)
    }

    /// Owner first, then other viewers in id order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> + '_ {
        std::iter::once(self.owner).chain(self.viewers.iter().copied())
    }

    /// Number of subscribers, owner included.
    pub fn len(&self) -> usize {
        1 + self.viewers.len()
    }

    /// Always false; the owner is always subscribed.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Address events to their audience, keeping emission order per viewer.
pub fn route_events(subscribers: &SubscriberList, events: Vec<InventoryEvent>) -> Vec<Delivery> {
    let owner = subscribers.owner();
    let mut deliveries = Vec::with_capacity(events.len());
    for event in events {
        match event.audience() {
            Audience::Owner => deliveries.push(Delivery {
                viewer: owner,
                message: ServerMessage::from_event(owner, event),
            }),
            Audience::Subscribers => {
                let message = ServerMessage::from_event(owner, event);
                for viewer in subscribers.iter() {
                    deliveries.push(Delivery {
                        viewer,
                        message: message.clone(),
                    });
                }
            }
        }
    }
    deliveries
}

/// Full snapshot of `owner`'s inventory for one viewer.
pub fn full_resync(viewer: PlayerId, owner: PlayerId, state: &InventoryState) -> Delivery {
    Delivery {
        viewer,
        message: ServerMessage::FullResync {
            owner,
            snapshot: state.snapshot(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstash_core::{ContainerId, GridSize, SlotCoord};
    use gridstash_inventory::{ContainerInfo, Slot, SlotUpdate};

    fn slot_event() -> InventoryEvent {
        InventoryEvent::SlotUpdated(SlotUpdate {
            container: ContainerId(0),
            slot: Slot::with_contents(SlotCoord::new(0, 0), 5, 1),
        })
    }

    #[test]
    fn owner_is_always_subscribed() {
        let mut list = SubscriberList::new(1);
        assert!(list.contains(1));
        assert!(!list.add(1));
        assert!(!list.remove(1));
        assert!(list.add(3));
        assert!(list.add(2));
        assert!(!list.add(2));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn container_added_goes_to_owner_only() {
        let mut list = SubscriberList::new(1);
        list.add(2);
        let info = ContainerInfo {
            id: ContainerId(0),
            container_type: "Pockets".into(),
            display_name: "Default".into(),
            size: GridSize::new(4, 2),
            linked_item: None,
        };
        let deliveries = route_events(&list, vec![InventoryEvent::ContainerAdded(info)]);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].viewer, 1);
    }

    #[test]
    fn broadcasts_keep_order_per_viewer() {
        let mut list = SubscriberList::new(1);
        list.add(2);
        let removed = InventoryEvent::ContainerRemoved {
            id: ContainerId(1),
            container_type: "Bag".into(),
        };
        let deliveries = route_events(&list, vec![slot_event(), removed]);
        assert_eq!(deliveries.len(), 4);

        let for_viewer = |viewer| {
            deliveries
                .iter()
                .filter(|d| d.viewer == viewer)
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(for_viewer(1), for_viewer(2));
        assert!(matches!(
            for_viewer(2)[0],
            ServerMessage::SlotUpdated { owner: 1, .. }
        ));
        assert!(matches!(
            for_viewer(2)[1],
            ServerMessage::ContainerRemoved { owner: 1, .. }
        ));
    }

    #[test]
    fn resync_names_the_inventory_owner() {
        let state = InventoryState::new();
        let delivery = full_resync(2, 1, &state);
        assert_eq!(delivery.viewer, 2);
        assert_eq!(delivery.message.owner(), Some(1));
    }
}
