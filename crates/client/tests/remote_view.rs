//! A networked client's mirror tracks the host's authoritative inventory.

use std::sync::Arc;
use std::time::Duration;

use gridstash_client::{InventoryView, MultiplayerClient};
use gridstash_core::{ContainerId, GridSize, SlotCoord};
use gridstash_inventory::InventoryRequest;
use gridstash_server::multiplayer::MultiplayerServer;
use gridstash_server::{Server, ServerSettings};
use gridstash_testkit::{sample_catalog, STONE};

fn bind_host() -> MultiplayerServer {
    let server = Server::new(
        Arc::new(sample_catalog()),
        ServerSettings {
            resync_interval_ticks: 0,
            ..ServerSettings::default()
        },
    );
    MultiplayerServer::bind("127.0.0.1:0".parse().unwrap(), server).expect("Failed to bind host")
}

/// Tick the host until the client's view satisfies `done`.
async fn settle(
    host: &mut MultiplayerServer,
    client: &mut MultiplayerClient,
    done: impl Fn(&InventoryView) -> bool,
) {
    for _ in 0..500 {
        host.tick().await.expect("host tick");
        client.poll();
        if done(client.view()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("client view never settled: {:?}", client.view());
}

async fn connect(host: &mut MultiplayerServer) -> MultiplayerClient {
    let addr = host.local_addr();
    let connecting = tokio::spawn(MultiplayerClient::connect(addr));
    for _ in 0..500 {
        if connecting.is_finished() {
            break;
        }
        host.tick().await.expect("host tick");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    connecting
        .await
        .expect("connect task panicked")
        .expect("Failed to connect")
}

#[tokio::test]
async fn view_mirrors_host_inventory() {
    let mut host = bind_host();
    let mut client = connect(&mut host).await;
    let player = client.player_id();
    assert_eq!(player, 1);

    settle(&mut host, &mut client, |view| {
        view.container_of_type("Pockets").is_some()
    })
    .await;

    let (outcome, deliveries) = host
        .server_mut()
        .give_item(player, ContainerId(0), STONE, 6)
        .unwrap();
    assert_eq!(outcome.added, 6);
    host.send(deliveries).await;
    settle(&mut host, &mut client, |view| view.count_item(STONE) == 6).await;

    client
        .send_request(InventoryRequest::AddContainer {
            size: GridSize::new(3, 3),
            container_type: "Bag".into(),
            linked_item: None,
        })
        .await
        .unwrap();
    settle(&mut host, &mut client, |view| view.container(ContainerId(1)).is_some()).await;

    assert!(client
        .move_stack(
            ContainerId(0),
            SlotCoord::new(0, 0),
            ContainerId(1),
            SlotCoord::new(2, 2)
        )
        .await
        .unwrap());
    settle(&mut host, &mut client, |view| {
        view.slot(ContainerId(1), SlotCoord::new(2, 2))
            .is_some_and(|slot| slot.amount() == 6)
    })
    .await;

    let authoritative = host.server().inventory(player).unwrap();
    assert_eq!(client.view().containers(), authoritative.containers());

    client.disconnect("done").await.unwrap();
    host.shutdown("test over").await;
}

#[tokio::test]
async fn host_shutdown_ends_the_session() {
    let mut host = bind_host();
    let mut client = connect(&mut host).await;
    assert!(client.is_connected());

    host.shutdown("maintenance").await;

    let waited = client
        .wait_until(Duration::from_secs(5), |_| false)
        .await;
    assert!(waited.is_err());
    assert!(!client.is_connected());
    assert!(client
        .send_request(InventoryRequest::RemoveContainer {
            container_type: "Pockets".into(),
        })
        .await
        .is_err());
}
