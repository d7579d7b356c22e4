//! Rejection reasons for inventory operations.

use gridstash_core::{ContainerId, GridSize, ItemId, SlotCoord};
use thiserror::Error;

/// Broad failure classes. None of them is fatal; the request is simply not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Malformed request: bad index, coordinates, item or size.
    Validation,
    /// Nowhere to put the items.
    Capacity,
    /// Destination holds something incompatible.
    Conflict,
    /// The slot holds fewer units than requested.
    InsufficientAmount,
}

/// Reason an inventory operation was rejected. State is unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Container dimensions must both be non-zero.
    #[error("invalid container size {0}")]
    InvalidSize(GridSize),
    /// The inventory already holds the maximum number of containers.
    #[error("inventory already holds {0} containers")]
    TooManyContainers(usize),
    /// The new container would push the inventory past its slot limit.
    #[error("{requested} slots exceeds the inventory limit of {limit}")]
    TooManySlots {
        /// Slots the inventory would hold after the add.
        requested: usize,
        /// Slot limit.
        limit: usize,
    },
    /// No container with this id.
    #[error("unknown container {0}")]
    UnknownContainer(ContainerId),
    /// No container of this type to remove.
    #[error("no container of type '{0}'")]
    ContainerTypeNotFound(String),
    /// Coordinates outside the container grid.
    #[error("coordinates {coord} outside container {container}")]
    InvalidCoordinates {
        /// Addressed container.
        container: ContainerId,
        /// Offending coordinates.
        coord: SlotCoord,
    },
    /// Item id missing from the catalog.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
    /// Amount must be positive.
    #[error("amount must be greater than zero")]
    ZeroAmount,
    /// No container can take the item.
    #[error("no space for {amount} of item {item_id}")]
    NoSpace {
        /// Item being added.
        item_id: ItemId,
        /// Requested units.
        amount: u32,
    },
    /// Source slot is empty.
    #[error("slot {coord} in container {container} is empty")]
    EmptySource {
        /// Addressed container.
        container: ContainerId,
        /// Addressed slot.
        coord: SlotCoord,
    },
    /// Slot holds fewer units than requested.
    #[error("requested {requested} units but slot holds {available}")]
    InsufficientAmount {
        /// Units requested.
        requested: u32,
        /// Units present.
        available: u32,
    },
    /// Destination holds a different or non-stackable item.
    #[error("destination holds item {occupant}, cannot accept item {incoming}")]
    IncompatibleDestination {
        /// Item being moved.
        incoming: ItemId,
        /// Item already in the destination.
        occupant: ItemId,
    },
    /// Destination stack is already at its limit.
    #[error("destination stack of item {0} is full")]
    DestinationFull(ItemId),
    /// Source and destination are the same slot.
    #[error("source and destination are the same slot")]
    SameSlot,
}

impl InventoryError {
    /// Classify the failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            InventoryError::InvalidSize(_)
            | InventoryError::UnknownContainer(_)
            | InventoryError::ContainerTypeNotFound(_)
            | InventoryError::InvalidCoordinates { .. }
            | InventoryError::UnknownItem(_)
            | InventoryError::ZeroAmount
            | InventoryError::EmptySource { .. }
            | InventoryError::SameSlot => FailureKind::Validation,
            InventoryError::NoSpace { .. }
            | InventoryError::TooManyContainers(_)
            | InventoryError::TooManySlots { .. } => FailureKind::Capacity,
            InventoryError::IncompatibleDestination { .. }
            | InventoryError::DestinationFull(_) => FailureKind::Conflict,
            InventoryError::InsufficientAmount { .. } => FailureKind::InsufficientAmount,
        }
    }
}
