#![warn(missing_docs)]
//! Viewer side of the inventory system.
//!
//! A client never mutates inventory data itself: it sends requests and
//! mirrors whatever the authoritative host reports back.

pub mod multiplayer;
pub mod view;

pub use multiplayer::MultiplayerClient;
pub use view::{InventoryMirrors, InventoryView};

use gridstash_core::{ContainerId, ItemId, SlotCoord};
use gridstash_inventory::{AddOutcome, InventoryRequest};
use gridstash_net::PlayerId;
use gridstash_server::{Delivery, Server, ServerError, ServerSettings, SharedCatalog};
use tracing::{debug, info};

/// Player id used by the embedded host in single-player sessions.
pub const LOCAL_PLAYER: PlayerId = 1;

/// Single-player client with an embedded authoritative host.
///
/// Requests go through the same controller and event routing a networked
/// session uses; only the transport is skipped.
pub struct Client {
    server: Server,
    view: InventoryView,
}

impl Client {
    /// Embedded host with default settings.
    pub fn singleplayer(catalog: SharedCatalog) -> Result<Self, ServerError> {
        Self::with_settings(catalog, ServerSettings::default())
    }

    /// Embedded host with custom settings.
    pub fn with_settings(
        catalog: SharedCatalog,
        settings: ServerSettings,
    ) -> Result<Self, ServerError> {
        let mut client = Self {
            server: Server::new(catalog, settings),
            view: InventoryView::new(LOCAL_PLAYER),
        };
        let joined = client.server.join(LOCAL_PLAYER)?;
        client.deliver(joined);
        info!("Single-player session started");
        Ok(client)
    }

    /// Submit a request; the view reflects its events on success.
    pub fn request(&mut self, request: &InventoryRequest) -> Result<(), ServerError> {
        let deliveries = self.server.handle_request(LOCAL_PLAYER, request)?;
        self.deliver(deliveries);
        Ok(())
    }

    /// Drag-and-drop of a whole stack, built from the mirrored slot.
    ///
    /// Returns false when there was nothing to move.
    pub fn move_stack(
        &mut self,
        from: ContainerId,
        from_coord: SlotCoord,
        to: ContainerId,
        to_coord: SlotCoord,
    ) -> Result<bool, ServerError> {
        match self.view.move_stack_request(from, from_coord, to, to_coord) {
            Some(request) => self.request(&request).map(|()| true),
            None => Ok(false),
        }
    }

    /// Grant items through the host (pickups, rewards).
    pub fn give_item(
        &mut self,
        container: ContainerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<AddOutcome, ServerError> {
        let (outcome, deliveries) = self
            .server
            .give_item(LOCAL_PLAYER, container, item_id, amount)?;
        self.deliver(deliveries);
        Ok(outcome)
    }

    /// Advance the embedded host one tick.
    pub fn frame(&mut self) {
        let deliveries = self.server.tick();
        self.deliver(deliveries);
    }

    /// Mirrored inventory.
    pub fn view(&self) -> &InventoryView {
        &self.view
    }

    /// The embedded host.
    pub fn server(&self) -> &Server {
        &self.server
    }

    fn deliver(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            if delivery.viewer == LOCAL_PLAYER {
                self.view.apply(&delivery.message);
            } else {
                debug!(viewer = delivery.viewer, "no local viewer for delivery");
            }
        }
    }
}
