//! Grid geometry shared by containers and the wire protocol.
//!
//! Slots are stored row-major: the slot at storage offset `i` sits at
//! `(i mod width, i div width)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable address of a container inside one player's inventory.
///
/// Allocated from a per-inventory counter and never reused, so removing a
/// container never shifts the address of another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot coordinates within a container grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl SlotCoord {
    /// Create a coordinate pair.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for SlotCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a container grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl GridSize {
    /// Create a grid size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A grid is only usable when both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Total number of slots.
    pub fn slot_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check whether a coordinate lies inside the grid.
    pub fn contains(&self, coord: SlotCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Storage offset of a coordinate, or `None` if it lies outside the grid.
    pub fn index_of(&self, coord: SlotCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        Some(coord.x as usize + coord.y as usize * self.width as usize)
    }

    /// Coordinate of a storage offset.
    ///
    /// The caller must pass an offset below [`GridSize::slot_count`].
    pub fn coord_of(&self, index: usize) -> SlotCoord {
        let width = self.width as usize;
        SlotCoord {
            x: (index % width) as u32,
            y: (index / width) as u32,
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
