#![warn(missing_docs)]
//! Item pack schema + validation helpers.

mod loader;

pub use loader::{catalog_from_file, catalog_from_str};

use gridstash_core::{CatalogError, ItemId, ItemRecord};
use serde::Deserialize;
use thiserror::Error;

fn default_max_stack_size() -> u32 {
    1
}

/// Item definition as authored in a JSON pack.
#[derive(Debug, Deserialize)]
pub struct ItemDefinition {
    /// Unique numeric identifier.
    pub id: ItemId,
    /// Human-readable name (e.g., "apple").
    pub name: String,
    /// Whether units of this item share a slot.
    #[serde(default)]
    pub stackable: bool,
    /// Maximum units per slot (defaults to 1).
    #[serde(default = "default_max_stack_size")]
    pub max_stack_size: u32,
    /// Whether the item can be equipped.
    #[serde(default)]
    pub equipable: bool,
}

impl From<ItemDefinition> for ItemRecord {
    fn from(def: ItemDefinition) -> Self {
        ItemRecord {
            id: def.id,
            name: def.name,
            stackable: def.stackable,
            max_stack_size: def.max_stack_size,
            equipable: def.equipable,
        }
    }
}

/// Errors emitted during pack loading.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Wrap IO errors when reading packs.
    #[error("failed to read item pack: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde parsing issues.
    #[error("failed to parse item pack: {0}")]
    Parse(#[from] serde_json::Error),
    /// The pack parsed but describes an inconsistent catalog.
    #[error("invalid item pack: {0}")]
    Catalog(#[from] CatalogError),
}

/// Parse a JSON string into a list of item definitions.
pub fn load_items_from_str(input: &str) -> Result<Vec<ItemDefinition>, AssetError> {
    Ok(serde_json::from_str(input)?)
}
