//! State-change events produced by the controller.

use gridstash_core::ContainerId;
use serde::{Deserialize, Serialize};

use crate::container::ContainerInfo;
use crate::slot::Slot;

/// Who must receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Only the inventory owner's viewer.
    Owner,
    /// Every viewer subscribed to the inventory (the owner included).
    Subscribers,
}

/// New contents of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    /// Container holding the slot.
    pub container: ContainerId,
    /// The slot after the change.
    pub slot: Slot,
}

/// Change to an inventory that viewers must mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    /// A container was appended.
    ContainerAdded(ContainerInfo),
    /// A container was removed.
    ContainerRemoved {
        /// Removed container.
        id: ContainerId,
        /// Its type identifier.
        container_type: String,
    },
    /// A slot changed.
    SlotUpdated(SlotUpdate),
}

impl InventoryEvent {
    /// Delivery audience for this event.
    pub fn audience(&self) -> Audience {
        match self {
            InventoryEvent::ContainerAdded(_) => Audience::Owner,
            InventoryEvent::ContainerRemoved { .. } | InventoryEvent::SlotUpdated(_) => {
                Audience::Subscribers
            }
        }
    }
}
