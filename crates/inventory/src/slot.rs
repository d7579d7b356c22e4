//! Single grid cell holding at most one item stack.

use gridstash_core::{ItemId, SlotCoord};
use serde::{Deserialize, Serialize};

/// Units of one item occupying a slot. `amount` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStack {
    /// Item held by the slot.
    pub item_id: ItemId,
    /// Number of units (1..=stack limit).
    pub amount: u32,
}

/// Storage cell inside a container.
///
/// An empty slot has no item and zero amount; an occupied slot always holds at
/// least one unit. Both facts follow from `contents` being an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    coord: SlotCoord,
    contents: Option<SlotStack>,
}

impl Slot {
    /// Create an empty slot at `coord`.
    pub fn empty(coord: SlotCoord) -> Self {
        Self {
            coord,
            contents: None,
        }
    }

    /// Create a slot with the given contents; a zero amount yields an empty slot.
    pub fn with_contents(coord: SlotCoord, item_id: ItemId, amount: u32) -> Self {
        let mut slot = Self::empty(coord);
        slot.put(item_id, amount);
        slot
    }

    /// Grid coordinates of this slot.
    pub fn coord(&self) -> SlotCoord {
        self.coord
    }

    /// Stack held by this slot, if any.
    pub fn stack(&self) -> Option<SlotStack> {
        self.contents
    }

    /// Whether the slot holds nothing.
    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }

    /// Item held by this slot.
    pub fn item_id(&self) -> Option<ItemId> {
        self.contents.map(|stack| stack.item_id)
    }

    /// Units held (zero when empty).
    pub fn amount(&self) -> u32 {
        self.contents.map_or(0, |stack| stack.amount)
    }

    /// Whether the slot holds `item_id`.
    pub fn holds(&self, item_id: ItemId) -> bool {
        self.item_id() == Some(item_id)
    }

    /// Add `units` of `item_id`. An occupied slot must already hold the same item.
    pub(crate) fn put(&mut self, item_id: ItemId, units: u32) {
        if units == 0 {
            return;
        }
        match &mut self.contents {
            Some(stack) => {
                debug_assert_eq!(stack.item_id, item_id, "put into foreign stack");
                stack.amount += units;
            }
            None => {
                self.contents = Some(SlotStack {
                    item_id,
                    amount: units,
                });
            }
        }
    }

    /// Remove `units`, emptying the slot when it reaches zero.
    pub(crate) fn take(&mut self, units: u32) {
        if let Some(stack) = &mut self.contents {
            stack.amount = stack.amount.saturating_sub(units);
            if stack.amount == 0 {
                self.contents = None;
            }
        }
    }
}
