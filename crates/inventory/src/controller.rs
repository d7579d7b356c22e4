//! Validation and mutation of inventory state.
//!
//! Every operation either applies completely or returns an
//! [`InventoryError`] without touching the state. Successful operations
//! record the [`InventoryEvent`]s viewers need; the caller drains them with
//! [`InventoryController::take_events`] and hands them to the sync layer.

use gridstash_core::{ContainerId, GridSize, ItemCatalog, ItemId, ItemRecord, SlotCoord};
use tracing::{debug, warn};

use crate::container::{Container, ContainerInfo, DEFAULT_DISPLAY_NAME};
use crate::error::InventoryError;
use crate::event::{InventoryEvent, SlotUpdate};
use crate::policy::OverflowPolicy;
use crate::request::InventoryRequest;
use crate::state::{InventoryState, MAX_CONTAINERS, MAX_TOTAL_SLOTS};

/// Result of a successful AddItem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Container that received the units (may differ from the one requested).
    pub container: ContainerId,
    /// Units stored.
    pub added: u32,
    /// Units dropped by the overflow policy.
    pub discarded: u32,
}

/// Result of a successful MoveItem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Units transferred. May be below the requested amount when the
    /// destination stack runs out of room.
    pub moved: u32,
}

/// Result of a successful DropItem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    /// Units left in the slot.
    pub remaining: u32,
}

/// Result of applying an [`InventoryRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A container was created.
    ContainerAdded(ContainerId),
    /// A container was removed.
    ContainerRemoved(ContainerId),
    /// Units were dropped.
    Dropped(DropOutcome),
    /// Units were moved.
    Moved(MoveOutcome),
}

/// Applies operations to one inventory.
///
/// Borrows the catalog and the state for the duration of a batch of
/// operations; the borrow makes it the only writer.
pub struct InventoryController<'a, C: ItemCatalog + ?Sized> {
    catalog: &'a C,
    state: &'a mut InventoryState,
    policy: OverflowPolicy,
    events: Vec<InventoryEvent>,
}

impl<'a, C: ItemCatalog + ?Sized> InventoryController<'a, C> {
    /// Create a controller using the default overflow policy.
    pub fn new(catalog: &'a C, state: &'a mut InventoryState) -> Self {
        Self {
            catalog,
            state,
            policy: OverflowPolicy::default(),
            events: Vec::new(),
        }
    }

    /// Select the overflow policy used by AddItem.
    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read access to the state being mutated.
    pub fn state(&self) -> &InventoryState {
        self.state
    }

    /// Events recorded so far.
    pub fn events(&self) -> &[InventoryEvent] {
        &self.events
    }

    /// Drain recorded events in emission order.
    pub fn take_events(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Consume the controller, returning the recorded events.
    pub fn into_events(self) -> Vec<InventoryEvent> {
        self.events
    }

    /// Dispatch a viewer request.
    pub fn apply(&mut self, request: &InventoryRequest) -> Result<RequestOutcome, InventoryError> {
        match request {
            InventoryRequest::AddContainer {
                size,
                container_type,
                linked_item,
            } => self
                .add_container(*size, container_type.clone(), *linked_item)
                .map(RequestOutcome::ContainerAdded),
            InventoryRequest::RemoveContainer { container_type } => self
                .remove_container(container_type)
                .map(RequestOutcome::ContainerRemoved),
            InventoryRequest::DropItem {
                container,
                coord,
                amount,
            } => self
                .drop_item(*container, *coord, *amount)
                .map(RequestOutcome::Dropped),
            InventoryRequest::MoveItem {
                from,
                from_coord,
                to,
                to_coord,
                amount,
            } => self
                .move_item(*from, *from_coord, *to, *to_coord, *amount)
                .map(RequestOutcome::Moved),
        }
    }

    /// Append an empty container.
    pub fn add_container(
        &mut self,
        size: GridSize,
        container_type: impl Into<String>,
        linked_item: Option<ItemId>,
    ) -> Result<ContainerId, InventoryError> {
        if !size.is_valid() {
            debug!(%size, "rejected container with empty dimension");
            return Err(InventoryError::InvalidSize(size));
        }
        if self.state.len() >= MAX_CONTAINERS {
            debug!(containers = self.state.len(), "rejected container past the container limit");
            return Err(InventoryError::TooManyContainers(self.state.len()));
        }
        let requested = self.state.total_slots().saturating_add(size.slot_count());
        if requested > MAX_TOTAL_SLOTS {
            debug!(requested, "rejected container past the slot limit");
            return Err(InventoryError::TooManySlots {
                requested,
                limit: MAX_TOTAL_SLOTS,
            });
        }

        let id = self.state.allocate_id();
        let info = self
            .state
            .push(ContainerInfo {
                id,
                container_type: container_type.into(),
                display_name: DEFAULT_DISPLAY_NAME.to_string(),
                size,
                linked_item,
            })
            .info()
            .clone();

        debug!(container = %id, %size, container_type = %info.container_type, "container added");
        self.events.push(InventoryEvent::ContainerAdded(info));
        Ok(id)
    }

    /// Remove the first container of `container_type`.
    pub fn remove_container(
        &mut self,
        container_type: &str,
    ) -> Result<ContainerId, InventoryError> {
        let removed = self
            .state
            .remove_first_of_type(container_type)
            .ok_or_else(|| InventoryError::ContainerTypeNotFound(container_type.to_string()))?;

        let id = removed.id();
        debug!(container = %id, container_type, "container removed");
        self.events.push(InventoryEvent::ContainerRemoved {
            id,
            container_type: container_type.to_string(),
        });
        Ok(id)
    }

    /// Store `amount` units of `item_id`, preferring `container`.
    ///
    /// When `container` has no room, the first container with room is used
    /// instead. Existing stacks of the item are topped up in storage order
    /// before the overflow policy places the rest into empty slots.
    pub fn add_item(
        &mut self,
        container: ContainerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<AddOutcome, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::ZeroAmount);
        }
        let requested = self
            .state
            .container(container)
            .ok_or(InventoryError::UnknownContainer(container))?;
        let record = self.record(item_id)?;

        let target = if container_has_space(requested, record, amount) {
            container
        } else {
            match self.find_container_with_space(item_id, amount) {
                Some(other) => {
                    debug!(
                        requested = %container,
                        target = %other,
                        item_id,
                        "container full, using fallback"
                    );
                    other
                }
                None => {
                    debug!(item_id, amount, "no container has space");
                    return Err(InventoryError::NoSpace { item_id, amount });
                }
            }
        };

        let limit = record.stack_limit();
        let policy = self.policy;
        let slots = self
            .state
            .container_mut(target)
            .ok_or(InventoryError::UnknownContainer(target))?
            .slots_mut();

        let mut remaining = amount;
        let mut touched = Vec::new();

        if record.stackable {
            for (offset, slot) in slots.iter_mut().enumerate() {
                if remaining == 0 {
                    break;
                }
                if slot.holds(item_id) && slot.amount() < limit {
                    let added = (limit - slot.amount()).min(remaining);
                    slot.put(item_id, added);
                    remaining -= added;
                    touched.push(offset);
                }
            }
        }

        if remaining > 0 {
            for (offset, units) in policy.plan_leftover(slots, remaining, limit) {
                slots[offset].put(item_id, units);
                remaining -= units;
                touched.push(offset);
            }
        }

        for offset in touched {
            self.emit_slot(target, offset);
        }

        if remaining > 0 {
            warn!(
                item_id,
                discarded = remaining,
                container = %target,
                "add_item overflow discarded"
            );
        }
        debug!(item_id, added = amount - remaining, container = %target, "items added");

        Ok(AddOutcome {
            container: target,
            added: amount - remaining,
            discarded: remaining,
        })
    }

    /// Move `amount` units from one slot to another.
    ///
    /// An empty destination takes all units. A destination holding the same
    /// stackable item takes as many as fit. Anything else is rejected and
    /// logged as a warning.
    pub fn move_item(
        &mut self,
        from: ContainerId,
        from_coord: SlotCoord,
        to: ContainerId,
        to_coord: SlotCoord,
        amount: u32,
    ) -> Result<MoveOutcome, InventoryError> {
        let result = self.try_move(from, from_coord, to, to_coord, amount);
        if let Err(err) = &result {
            warn!(%from, %from_coord, %to, %to_coord, amount, error = %err, "cannot move item");
        }
        result
    }

    fn try_move(
        &mut self,
        from: ContainerId,
        from_coord: SlotCoord,
        to: ContainerId,
        to_coord: SlotCoord,
        amount: u32,
    ) -> Result<MoveOutcome, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::ZeroAmount);
        }
        let from_offset = self.locate(from, from_coord)?;
        let to_offset = self.locate(to, to_coord)?;
        if from == to && from_offset == to_offset {
            return Err(InventoryError::SameSlot);
        }

        let source = self
            .state
            .slot(from, from_offset)
            .copied()
            .ok_or(InventoryError::UnknownContainer(from))?;
        let destination = self
            .state
            .slot(to, to_offset)
            .copied()
            .ok_or(InventoryError::UnknownContainer(to))?;

        let stack = source.stack().ok_or(InventoryError::EmptySource {
            container: from,
            coord: from_coord,
        })?;
        if stack.amount < amount {
            return Err(InventoryError::InsufficientAmount {
                requested: amount,
                available: stack.amount,
            });
        }
        let record = self.record(stack.item_id)?;

        let moved = match destination.stack() {
            None => amount,
            Some(occupant) if occupant.item_id == stack.item_id && record.stackable => {
                let space = record.stack_limit().saturating_sub(occupant.amount);
                if space == 0 {
                    return Err(InventoryError::DestinationFull(stack.item_id));
                }
                space.min(amount)
            }
            Some(occupant) => {
                return Err(InventoryError::IncompatibleDestination {
                    incoming: stack.item_id,
                    occupant: occupant.item_id,
                });
            }
        };

        if let Some(slot) = self.state.slot_mut(from, from_offset) {
            slot.take(moved);
        }
        if let Some(slot) = self.state.slot_mut(to, to_offset) {
            slot.put(stack.item_id, moved);
        }
        self.emit_slot(from, from_offset);
        self.emit_slot(to, to_offset);

        debug!(item_id = stack.item_id, moved, requested = amount, "item moved");
        Ok(MoveOutcome { moved })
    }

    /// Destroy `amount` units held in a slot.
    pub fn drop_item(
        &mut self,
        container: ContainerId,
        coord: SlotCoord,
        amount: u32,
    ) -> Result<DropOutcome, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::ZeroAmount);
        }
        let offset = self.locate(container, coord)?;
        let available = self
            .state
            .slot(container, offset)
            .map(|slot| slot.amount())
            .unwrap_or(0);
        if available == 0 {
            debug!(%container, %coord, "drop from empty slot ignored");
            return Err(InventoryError::EmptySource { container, coord });
        }
        if available < amount {
            debug!(%container, %coord, amount, available, "drop exceeds slot contents");
            return Err(InventoryError::InsufficientAmount {
                requested: amount,
                available,
            });
        }

        if let Some(slot) = self.state.slot_mut(container, offset) {
            slot.take(amount);
        }
        self.emit_slot(container, offset);

        Ok(DropOutcome {
            remaining: available - amount,
        })
    }

    /// Whether `container` can absorb `amount` units of `item_id`, either by
    /// topping up existing stacks or through at least one empty slot.
    pub fn has_space(&self, container: ContainerId, item_id: ItemId, amount: u32) -> bool {
        match (self.state.container(container), self.catalog.get_item(item_id)) {
            (Some(container), Some(record)) => container_has_space(container, record, amount),
            _ => false,
        }
    }

    /// First container, in inventory order, with space for the item.
    pub fn find_container_with_space(&self, item_id: ItemId, amount: u32) -> Option<ContainerId> {
        let record = self.catalog.get_item(item_id)?;
        self.state
            .containers()
            .iter()
            .find(|container| container_has_space(container, record, amount))
            .map(Container::id)
    }

    fn record(&self, item_id: ItemId) -> Result<&'a ItemRecord, InventoryError> {
        let catalog: &'a C = self.catalog;
        catalog
            .get_item(item_id)
            .ok_or(InventoryError::UnknownItem(item_id))
    }

    fn locate(&self, container: ContainerId, coord: SlotCoord) -> Result<usize, InventoryError> {
        self.state
            .container(container)
            .ok_or(InventoryError::UnknownContainer(container))?
            .slot_index(coord)
            .ok_or(InventoryError::InvalidCoordinates { container, coord })
    }

    fn emit_slot(&mut self, container: ContainerId, offset: usize) {
        if let Some(slot) = self.state.slot(container, offset).copied() {
            self.events
                .push(InventoryEvent::SlotUpdated(SlotUpdate { container, slot }));
        }
    }
}

fn container_has_space(container: &Container, record: &ItemRecord, amount: u32) -> bool {
    if record.stackable {
        let limit = record.stack_limit();
        let mut remaining = amount;
        for slot in container.slots() {
            if slot.holds(record.id) && slot.amount() < limit {
                remaining -= (limit - slot.amount()).min(remaining);
                if remaining == 0 {
                    return true;
                }
            }
        }
    }
    container.slots().iter().any(|slot| slot.is_empty())
}
