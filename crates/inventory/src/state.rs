//! Ordered collection of one player's containers.

use gridstash_core::{ContainerId, ItemId};
use serde::{Deserialize, Serialize};

use crate::container::{Container, ContainerInfo};
use crate::slot::Slot;

/// Most containers one inventory may hold.
pub const MAX_CONTAINERS: usize = 64;

/// Most slots one inventory may hold across all of its containers.
pub const MAX_TOTAL_SLOTS: usize = 16_384;

/// Full copy of an inventory, used for periodic resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Containers in inventory order, each with all of its slots.
    pub containers: Vec<Container>,
}

/// Authoritative inventory data.
///
/// Owned by exactly one host; only an
/// [`InventoryController`](crate::InventoryController) mutates it.
#[derive(Debug, Clone, Default)]
pub struct InventoryState {
    containers: Vec<Container>,
    next_id: u32,
}

impl InventoryState {
    /// Create an inventory with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Containers in inventory order.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Number of containers.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether there are no containers.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Look up a container by id.
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|container| container.id() == id)
    }

    /// Slot at `offset` inside container `id`.
    pub fn slot(&self, id: ContainerId, offset: usize) -> Option<&Slot> {
        self.container(id).and_then(|container| container.slots().get(offset))
    }

    /// Slots across all containers.
    pub fn total_slots(&self) -> usize {
        self.containers
            .iter()
            .map(|container| container.size().slot_count())
            .sum()
    }

    /// Total units of `item_id` across all containers.
    pub fn count_item(&self, item_id: ItemId) -> u64 {
        self.containers
            .iter()
            .map(|container| container.count_item(item_id))
            .sum()
    }

    /// Copy the whole inventory.
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            containers: self.containers.clone(),
        }
    }

    pub(crate) fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers
            .iter_mut()
            .find(|container| container.id() == id)
    }

    pub(crate) fn slot_mut(&mut self, id: ContainerId, offset: usize) -> Option<&mut Slot> {
        self.container_mut(id)
            .and_then(|container| container.slots_mut().get_mut(offset))
    }

    /// Reserve the next container id.
    pub(crate) fn allocate_id(&mut self) -> ContainerId {
        let id = ContainerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn push(&mut self, info: ContainerInfo) -> &Container {
        self.containers.push(Container::new(info));
        let last = self.containers.len() - 1;
        &self.containers[last]
    }

    /// Remove the first container whose type matches.
    pub(crate) fn remove_first_of_type(&mut self, container_type: &str) -> Option<Container> {
        let position = self
            .containers
            .iter()
            .position(|container| container.container_type() == container_type)?;
        Some(self.containers.remove(position))
    }
}
