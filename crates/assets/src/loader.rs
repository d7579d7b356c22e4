use std::fs;
use std::path::Path;

use gridstash_core::{ItemRecord, ItemRegistry};
use tracing::debug;

use crate::AssetError;

/// Load an item catalog from the provided JSON file path.
pub fn catalog_from_file(path: &Path) -> Result<ItemRegistry, AssetError> {
    let data = fs::read_to_string(path)?;
    let registry = catalog_from_str(&data)?;
    debug!(path = %path.display(), items = registry.len(), "loaded item pack");
    Ok(registry)
}

/// Load an item catalog from an in-memory JSON string.
pub fn catalog_from_str(input: &str) -> Result<ItemRegistry, AssetError> {
    let defs = crate::load_items_from_str(input)?;
    Ok(ItemRegistry::new(defs.into_iter().map(ItemRecord::from))?)
}
