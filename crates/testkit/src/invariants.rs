//! Structural checks every inventory must pass after any operation.

use std::collections::HashSet;

use gridstash_core::ItemCatalog;
use gridstash_inventory::{Container, InventoryState};

/// Check one container against the catalog, returning the first violation.
pub fn check_container<C: ItemCatalog + ?Sized>(
    container: &Container,
    catalog: &C,
) -> Result<(), String> {
    if !container.size().is_valid() {
        return Err(format!("container {} has size {}", container.id(), container.size()));
    }
    if !container.is_well_formed() {
        return Err(format!(
            "container {} slot layout does not match {}",
            container.id(),
            container.size()
        ));
    }
    for slot in container.slots() {
        let Some(stack) = slot.stack() else {
            continue;
        };
        let record = catalog.get_item(stack.item_id).ok_or_else(|| {
            format!(
                "slot {} in {} holds unknown item {}",
                slot.coord(),
                container.id(),
                stack.item_id
            )
        })?;
        if stack.amount == 0 || stack.amount > record.stack_limit() {
            return Err(format!(
                "slot {} in {} holds {} of item {} (limit {})",
                slot.coord(),
                container.id(),
                stack.amount,
                stack.item_id,
                record.stack_limit()
            ));
        }
    }
    Ok(())
}

/// Check every container plus id uniqueness.
pub fn check_inventory<C: ItemCatalog + ?Sized>(
    state: &InventoryState,
    catalog: &C,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for container in state.containers() {
        if !seen.insert(container.id()) {
            return Err(format!("container id {} appears twice", container.id()));
        }
        check_container(container, catalog)?;
    }
    Ok(())
}

/// Panic with a readable message if the inventory violates an invariant.
pub fn assert_inventory_invariants<C: ItemCatalog + ?Sized>(state: &InventoryState, catalog: &C) {
    if let Err(violation) = check_inventory(state, catalog) {
        panic!("inventory invariant violated: {violation}");
    }
}
