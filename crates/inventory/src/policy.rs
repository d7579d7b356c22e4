//! Where AddItem puts units left over after topping up existing stacks.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Placement rule for leftover units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Fill the first empty slot up to the stack limit and discard the rest.
    #[default]
    DiscardRemainder,
    /// Keep filling empty slots in storage order until the units run out.
    SpreadAcrossEmptySlots,
}

impl OverflowPolicy {
    /// Plan the placement of `amount` units with per-slot `limit`.
    ///
    /// Returns `(slot offset, units)` pairs in storage order. Units not covered
    /// by the plan are discarded.
    pub fn plan_leftover(self, slots: &[Slot], amount: u32, limit: u32) -> Vec<(usize, u32)> {
        let max_slots = match self {
            OverflowPolicy::DiscardRemainder => 1,
            OverflowPolicy::SpreadAcrossEmptySlots => usize::MAX,
        };

        let mut remaining = amount;
        let mut plan = Vec::new();
        for (offset, slot) in slots.iter().enumerate() {
            if remaining == 0 || plan.len() == max_slots {
                break;
            }
            if slot.is_empty() {
                let units = remaining.min(limit);
                plan.push((offset, units));
                remaining -= units;
            }
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstash_core::SlotCoord;

    fn row(occupied: &[bool]) -> Vec<Slot> {
        occupied
            .iter()
            .enumerate()
            .map(|(x, &full)| {
                let coord = SlotCoord::new(x as u32, 0);
                if full {
                    Slot::with_contents(coord, 1, 1)
                } else {
                    Slot::empty(coord)
                }
            })
            .collect()
    }

    #[test]
    fn discard_uses_one_slot() {
        let slots = row(&[true, false, false, false]);
        let plan = OverflowPolicy::DiscardRemainder.plan_leftover(&slots, 25, 10);
        assert_eq!(plan, vec![(1, 10)]);
    }

    #[test]
    fn spread_fills_empty_slots_in_order() {
        let slots = row(&[false, true, false, false]);
        let plan = OverflowPolicy::SpreadAcrossEmptySlots.plan_leftover(&slots, 25, 10);
        assert_eq!(plan, vec![(0, 10), (2, 10), (3, 5)]);
    }

    #[test]
    fn spread_stops_when_slots_run_out() {
        let slots = row(&[false, true]);
        let plan = OverflowPolicy::SpreadAcrossEmptySlots.plan_leftover(&slots, 25, 10);
        assert_eq!(plan, vec![(0, 10)]);
    }
}
