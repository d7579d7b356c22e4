#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod grid;
pub mod item;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use grid::{ContainerId, GridSize, SlotCoord};
pub use item::{CatalogError, ItemCatalog, ItemId, ItemRecord, ItemRegistry};

/// Fixed tick type driving the authoritative host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Ticks elapsed since `earlier` (zero if `earlier` is in the future).
    pub fn since(self, earlier: SimTick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advance_and_since() {
        let start = SimTick::ZERO;
        let later = start.advance(300);
        assert_eq!(later.since(start), 300);
        assert_eq!(start.since(later), 0);
    }
}
