//! Fixed-size rectangular grid of slots.

use gridstash_core::{ContainerId, GridSize, ItemId, SlotCoord};
use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Display name given to containers created without one.
pub const DEFAULT_DISPLAY_NAME: &str = "Default";

/// Container metadata sent to viewers when a container appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Stable address within the owning inventory.
    pub id: ContainerId,
    /// Type identifier, e.g. `"Pockets"`. Removal matches on this.
    pub container_type: String,
    /// Name shown to the player.
    pub display_name: String,
    /// Grid dimensions.
    pub size: GridSize,
    /// Item whose presence provides this container (e.g. a backpack).
    pub linked_item: Option<ItemId>,
}

/// A grid of `width * height` slots stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    info: ContainerInfo,
    slots: Vec<Slot>,
}

impl Container {
    /// Create a container with every slot empty.
    pub fn new(info: ContainerInfo) -> Self {
        let slots = (0..info.size.slot_count())
            .map(|index| Slot::empty(info.size.coord_of(index)))
            .collect();
        Self { info, slots }
    }

    /// Container metadata.
    pub fn info(&self) -> &ContainerInfo {
        &self.info
    }

    /// Stable container address.
    pub fn id(&self) -> ContainerId {
        self.info.id
    }

    /// Type identifier.
    pub fn container_type(&self) -> &str {
        &self.info.container_type
    }

    /// Grid dimensions.
    pub fn size(&self) -> GridSize {
        self.info.size
    }

    /// All slots in storage order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Storage offset of a coordinate.
    pub fn slot_index(&self, coord: SlotCoord) -> Option<usize> {
        self.info.size.index_of(coord)
    }

    /// Slot at a coordinate.
    pub fn slot(&self, coord: SlotCoord) -> Option<&Slot> {
        self.slot_index(coord).and_then(|index| self.slots.get(index))
    }

    /// Mutable slot at a coordinate.
    pub fn slot_mut(&mut self, coord: SlotCoord) -> Option<&mut Slot> {
        let index = self.slot_index(coord)?;
        self.slots.get_mut(index)
    }

    /// Replace the slot at the slot's own coordinate. Returns false if it lies outside the grid.
    pub fn replace_slot(&mut self, slot: Slot) -> bool {
        match self.slot_mut(slot.coord()) {
            Some(existing) => {
                *existing = slot;
                true
            }
            None => false,
        }
    }

    /// Number of empty slots.
    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_empty()).count()
    }

    /// Total units of `item_id` held.
    pub fn count_item(&self, item_id: ItemId) -> u64 {
        self.slots
            .iter()
            .filter(|slot| slot.holds(item_id))
            .map(|slot| slot.amount() as u64)
            .sum()
    }

    /// Whether the slot list matches the grid: right length, row-major coordinates.
    pub fn is_well_formed(&self) -> bool {
        self.slots.len() == self.info.size.slot_count()
            && self
                .slots
                .iter()
                .enumerate()
                .all(|(index, slot)| slot.coord() == self.info.size.coord_of(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pockets() -> Container {
        Container::new(ContainerInfo {
            id: ContainerId(0),
            container_type: "Pockets".into(),
            display_name: DEFAULT_DISPLAY_NAME.into(),
            size: GridSize::new(4, 2),
            linked_item: None,
        })
    }

    #[test]
    fn new_container_is_row_major_and_empty() {
        let container = pockets();
        assert_eq!(container.slots().len(), 8);
        assert_eq!(container.empty_slots(), 8);
        assert!(container.is_well_formed());
        assert_eq!(container.slots()[5].coord(), SlotCoord::new(1, 1));
    }

    #[test]
    fn slot_lookup_rejects_out_of_bounds() {
        let container = pockets();
        assert!(container.slot(SlotCoord::new(3, 1)).is_some());
        assert!(container.slot(SlotCoord::new(4, 0)).is_none());
        assert!(container.slot(SlotCoord::new(0, 2)).is_none());
    }

    #[test]
    fn replace_slot_updates_in_place() {
        let mut container = pockets();
        assert!(container.replace_slot(Slot::with_contents(SlotCoord::new(2, 1), 5, 3)));
        assert_eq!(container.count_item(5), 3);
        assert!(!container.replace_slot(Slot::with_contents(SlotCoord::new(9, 9), 5, 3)));
    }
}
