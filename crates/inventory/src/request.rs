//! Untrusted mutation requests sent by viewers.

use gridstash_core::{ContainerId, GridSize, ItemId, SlotCoord};
use serde::{Deserialize, Serialize};

/// Mutation a viewer asks the authoritative host to perform.
///
/// Requests are untrusted; the controller revalidates every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryRequest {
    /// Append a new container.
    AddContainer {
        /// Grid dimensions.
        size: GridSize,
        /// Type identifier.
        container_type: String,
        /// Item backing the container, if any.
        linked_item: Option<ItemId>,
    },
    /// Remove the first container of a type.
    RemoveContainer {
        /// Type identifier.
        container_type: String,
    },
    /// Destroy units from a slot.
    DropItem {
        /// Container holding the slot.
        container: ContainerId,
        /// Slot coordinates.
        coord: SlotCoord,
        /// Units to drop.
        amount: u32,
    },
    /// Move units between slots.
    MoveItem {
        /// Source container.
        from: ContainerId,
        /// Source slot.
        from_coord: SlotCoord,
        /// Destination container.
        to: ContainerId,
        /// Destination slot.
        to_coord: SlotCoord,
        /// Units to move.
        amount: u32,
    },
}

impl InventoryRequest {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryRequest::AddContainer { .. } => "add_container",
            InventoryRequest::RemoveContainer { .. } => "remove_container",
            InventoryRequest::DropItem { .. } => "drop_item",
            InventoryRequest::MoveItem { .. } => "move_item",
        }
    }
}
