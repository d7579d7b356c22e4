use std::path::Path;
use std::sync::Arc;

use gridstash_client::{Client, LOCAL_PLAYER};
use gridstash_core::{ContainerId, GridSize, ItemCatalog, ItemId, SlotCoord};
use gridstash_inventory::InventoryRequest;
use gridstash_server::ServerSettings;
use gridstash_testkit::assert_inventory_invariants;

const ARROW: ItemId = 3;
const IRON_SWORD: ItemId = 10;

fn shipped_catalog() -> gridstash_core::ItemRegistry {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/items.json");
    gridstash_assets::catalog_from_file(&path).expect("shipped pack loads")
}

#[test]
fn shipped_item_pack_loads() {
    let catalog = shipped_catalog();
    assert!(catalog.len() >= 3);
    let apple = catalog.get_item(1).expect("apple present");
    assert!(apple.stackable);
    assert!(catalog.get_item(IRON_SWORD).expect("sword present").equipable);
}

#[test]
fn singleplayer_session_with_shipped_pack() {
    let catalog = Arc::new(shipped_catalog());
    let mut client = Client::with_settings(
        catalog.clone(),
        ServerSettings {
            resync_interval_ticks: 2,
            ..ServerSettings::default()
        },
    )
    .expect("session starts");

    let arrows = client.give_item(ContainerId(0), ARROW, 40).unwrap();
    assert_eq!((arrows.added, arrows.discarded), (32, 8));
    client.give_item(ContainerId(0), IRON_SWORD, 1).unwrap();
    client
        .request(&InventoryRequest::AddContainer {
            size: GridSize::new(2, 1),
            container_type: "Quiver".into(),
            linked_item: None,
        })
        .unwrap();
    assert!(client
        .move_stack(
            ContainerId(0),
            SlotCoord::new(0, 0),
            ContainerId(1),
            SlotCoord::new(1, 0),
        )
        .unwrap());

    for _ in 0..4 {
        client.frame();
    }
    assert_eq!(client.view().resync_count(), 2);

    let host = client.server().inventory(LOCAL_PLAYER).unwrap();
    assert_inventory_invariants(host, catalog.as_ref());
    assert_eq!(client.view().containers(), host.containers());
    assert_eq!(
        client.view().container(ContainerId(1)).unwrap().count_item(ARROW),
        32
    );
    assert_eq!(client.view().count_item(IRON_SWORD), 1);
}
