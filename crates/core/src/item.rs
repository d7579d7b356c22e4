//! Item catalog - read-only item properties keyed by item id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Item identifier. Assigned once by content authoring and never reused.
pub type ItemId = u32;

/// Catalog entry describing how an item behaves in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Unique item identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Whether several units may share one slot.
    pub stackable: bool,
    /// Maximum units per slot for stackable items (at least 1).
    pub max_stack_size: u32,
    /// Whether the item can be equipped.
    pub equipable: bool,
}

impl ItemRecord {
    /// Create a stackable item.
    pub fn stackable(id: ItemId, name: impl Into<String>, max_stack_size: u32) -> Self {
        Self {
            id,
            name: name.into(),
            stackable: true,
            max_stack_size,
            equipable: false,
        }
    }

    /// Create an item that never stacks.
    pub fn single(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            stackable: false,
            max_stack_size: 1,
            equipable: false,
        }
    }

    /// Most units of this item one slot may hold.
    ///
    /// Non-stackable items are capped at one regardless of `max_stack_size`.
    pub fn stack_limit(&self) -> u32 {
        if self.stackable {
            self.max_stack_size.max(1)
        } else {
            1
        }
    }
}

/// Read-only lookup the inventory controller depends on.
pub trait ItemCatalog {
    /// Look up an item by id.
    fn get_item(&self, id: ItemId) -> Option<&ItemRecord>;

    /// Check whether an item id is known.
    fn item_exists(&self, id: ItemId) -> bool {
        self.get_item(id).is_some()
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two records share the same id.
    #[error("duplicate item id {id}: '{first}' and '{second}'")]
    DuplicateId {
        /// Conflicting id.
        id: ItemId,
        /// Name of the record registered first.
        first: String,
        /// Name of the rejected record.
        second: String,
    },
    /// A record declares a zero stack size.
    #[error("item {id} ('{name}') has max_stack_size 0")]
    ZeroStackSize {
        /// Offending id.
        id: ItemId,
        /// Offending name.
        name: String,
    },
}

/// Hash-map backed catalog with O(1) lookups.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: HashMap<ItemId, ItemRecord>,
}

impl ItemRegistry {
    /// Build a registry, rejecting duplicate ids and zero stack sizes.
    pub fn new(records: impl IntoIterator<Item = ItemRecord>) -> Result<Self, CatalogError> {
        let mut items: HashMap<ItemId, ItemRecord> = HashMap::new();
        for record in records {
            if record.max_stack_size == 0 {
                return Err(CatalogError::ZeroStackSize {
                    id: record.id,
                    name: record.name,
                });
            }
            if let Some(existing) = items.get(&record.id) {
                return Err(CatalogError::DuplicateId {
                    id: record.id,
                    first: existing.name.clone(),
                    second: record.name,
                });
            }
            items.insert(record.id, record);
        }
        Ok(Self { items })
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over records in ascending id order.
    pub fn records(&self) -> Vec<&ItemRecord> {
        let mut records: Vec<&ItemRecord> = self.items.values().collect();
        records.sort_by_key(|record| record.id);
        records
    }
}

impl ItemCatalog for ItemRegistry {
    fn get_item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.items.get(&id)
    }
}

impl<T: ItemCatalog + ?Sized> ItemCatalog for std::sync::Arc<T> {
    fn get_item(&self, id: ItemId) -> Option<&ItemRecord> {
        (**self).get_item(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_stackable_limit_is_one() {
        let mut record = ItemRecord::single(3, "sword");
        record.max_stack_size = 16;
        assert_eq!(record.stack_limit(), 1);
        assert_eq!(ItemRecord::stackable(5, "apple", 10).stack_limit(), 10);
    }

    #[test]
    fn registry_lookup() {
        let registry = ItemRegistry::new(vec![
            ItemRecord::stackable(5, "apple", 10),
            ItemRecord::single(9, "sword"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.item_exists(5));
        assert!(!registry.item_exists(6));
        assert_eq!(registry.get_item(9).unwrap().name, "sword");
        let ids: Vec<ItemId> = registry.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 9]);
    }

    #[test]
    fn registry_rejects_duplicates() {
        let err = ItemRegistry::new(vec![
            ItemRecord::stackable(5, "apple", 10),
            ItemRecord::stackable(5, "pear", 10),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateId {
                id: 5,
                first: "apple".into(),
                second: "pear".into(),
            }
        );
    }

    #[test]
    fn registry_rejects_zero_stack() {
        let err = ItemRegistry::new(vec![ItemRecord::stackable(1, "dust", 0)]).unwrap_err();
        assert!(matches!(err, CatalogError::ZeroStackSize { id: 1, .. }));
    }
}
