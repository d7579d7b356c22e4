#![warn(missing_docs)]
//! Shared fixtures for inventory tests: a sample catalog and invariant checks.

mod invariants;

use gridstash_core::{ItemId, ItemRecord, ItemRegistry};

pub use invariants::*;

/// Stackable item, limit 10.
pub const APPLE: ItemId = 5;
/// Stackable item, limit 10.
pub const STONE: ItemId = 7;
/// Non-stackable item.
pub const SWORD: ItemId = 9;

/// Catalog used across test suites.
pub fn sample_catalog() -> ItemRegistry {
    let mut sword = ItemRecord::single(SWORD, "Sword");
    sword.equipable = true;
    ItemRegistry::new(vec![
        ItemRecord::stackable(APPLE, "Apple", 10),
        ItemRecord::stackable(STONE, "Stone", 10),
        sword,
    ])
    .unwrap_or_else(|err| panic!("sample catalog is invalid: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstash_core::ItemCatalog;

    #[test]
    fn sample_catalog_has_three_items() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get_item(APPLE).unwrap().stack_limit(), 10);
        assert_eq!(catalog.get_item(SWORD).unwrap().stack_limit(), 1);
        assert!(catalog.get_item(SWORD).unwrap().equipable);
    }
}
