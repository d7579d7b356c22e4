#![warn(missing_docs)]
//! Authoritative inventory host.
//!
//! [`Server`] owns every player's [`InventoryState`] and applies requests one
//! at a time, so each inventory has exactly one writer. Results come back as
//! [`Delivery`] lists for the transport to send in order.

pub mod multiplayer;
pub mod sync;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use gridstash_core::{ContainerId, GridSize, ItemCatalog, ItemId, SimTick};
use gridstash_inventory::{
    AddOutcome, InventoryController, InventoryError, InventoryRequest, InventoryState,
    OverflowPolicy,
};
use gridstash_net::{PlayerId, ReplayPlayer, RequestLogger};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use sync::{full_resync, route_events, Delivery, SubscriberList};

/// Shared, read-only item catalog.
pub type SharedCatalog = Arc<dyn ItemCatalog + Send + Sync>;

/// Container every player starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarterContainer {
    /// Grid dimensions.
    pub size: GridSize,
    /// Type identifier.
    pub container_type: String,
}

impl Default for StarterContainer {
    fn default() -> Self {
        Self {
            size: GridSize::new(4, 2),
            container_type: "Pockets".to_string(),
        }
    }
}

/// Host tuning.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Ticks between full resyncs of an inventory. Zero disables them.
    pub resync_interval_ticks: u64,
    /// Leftover placement used by AddItem.
    pub overflow_policy: OverflowPolicy,
    /// Container created when a player joins.
    pub starter_container: Option<StarterContainer>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            resync_interval_ticks: 300,
            overflow_policy: OverflowPolicy::default(),
            starter_container: Some(StarterContainer::default()),
        }
    }
}

/// Why the host refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// No inventory for this player.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The player already has an inventory.
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),
    /// The controller rejected the operation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

struct PlayerInventory {
    state: InventoryState,
    subscribers: SubscriberList,
    last_resync: SimTick,
}

/// Authoritative host for all player inventories.
pub struct Server {
    catalog: SharedCatalog,
    settings: ServerSettings,
    inventories: BTreeMap<PlayerId, PlayerInventory>,
    current_tick: SimTick,
    request_log: Option<RequestLogger>,
}

impl Server {
    /// Create a host with no players.
    pub fn new(catalog: SharedCatalog, settings: ServerSettings) -> Self {
        Self {
            catalog,
            settings,
            inventories: BTreeMap::new(),
            current_tick: SimTick::ZERO,
            request_log: None,
        }
    }

    /// Host settings.
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Current host tick.
    pub fn current_tick(&self) -> SimTick {
        self.current_tick
    }

    /// Number of players with an inventory.
    pub fn player_count(&self) -> usize {
        self.inventories.len()
    }

    /// Read access to a player's inventory.
    pub fn inventory(&self, player: PlayerId) -> Option<&InventoryState> {
        self.inventories.get(&player).map(|inventory| &inventory.state)
    }

    /// Write every accepted client request to `log_dir/requests.jsonl`.
    pub fn enable_request_log(&mut self, log_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(log_dir)?;
        let path = log_dir.join("requests.jsonl");
        self.request_log = Some(RequestLogger::create(&path)?);
        info!("Request logging enabled to {:?}", path);
        Ok(path)
    }

    /// Create a player's inventory, including the starter container.
    #[instrument(skip(self))]
    pub fn join(&mut self, player: PlayerId) -> Result<Vec<Delivery>, ServerError> {
        if self.inventories.contains_key(&player) {
            return Err(ServerError::AlreadyJoined(player));
        }

        let mut inventory = PlayerInventory {
            state: InventoryState::new(),
            subscribers: SubscriberList::new(player),
            last_resync: self.current_tick,
        };

        let mut deliveries = Vec::new();
        if let Some(starter) = &self.settings.starter_container {
            let mut ctl = InventoryController::new(&*self.catalog, &mut inventory.state);
            ctl.add_container(starter.size, starter.container_type.clone(), None)?;
            deliveries = route_events(&inventory.subscribers, ctl.into_events());
        }

        self.inventories.insert(player, inventory);
        info!(player, "player joined");
        Ok(deliveries)
    }

    /// Drop a player's inventory and every subscription they hold.
    pub fn leave(&mut self, player: PlayerId) -> bool {
        let removed = self.inventories.remove(&player).is_some();
        for inventory in self.inventories.values_mut() {
            inventory.subscribers.remove(player);
        }
        if removed {
            info!(player, "player left");
        }
        removed
    }

    /// Let `viewer` watch `owner`'s inventory. The viewer receives a snapshot
    /// immediately so its mirror starts consistent.
    pub fn subscribe(
        &mut self,
        viewer: PlayerId,
        owner: PlayerId,
    ) -> Result<Vec<Delivery>, ServerError> {
        if !self.inventories.contains_key(&viewer) {
            return Err(ServerError::UnknownPlayer(viewer));
        }
        let inventory = self
            .inventories
            .get_mut(&owner)
            .ok_or(ServerError::UnknownPlayer(owner))?;

        if !inventory.subscribers.add(viewer) {
            return Ok(Vec::new());
        }
        debug!(viewer, owner, "viewer subscribed");
        Ok(vec![full_resync(viewer, owner, &inventory.state)])
    }

    /// Stop `viewer` watching `owner`'s inventory.
    pub fn unsubscribe(&mut self, viewer: PlayerId, owner: PlayerId) -> bool {
        self.inventories
            .get_mut(&owner)
            .map(|inventory| inventory.subscribers.remove(viewer))
            .unwrap_or(false)
    }

    /// Apply a client request to the sender's own inventory.
    #[instrument(skip(self, request), fields(kind = request.kind()))]
    pub fn handle_request(
        &mut self,
        player: PlayerId,
        request: &InventoryRequest,
    ) -> Result<Vec<Delivery>, ServerError> {
        let inventory = self
            .inventories
            .get_mut(&player)
            .ok_or(ServerError::UnknownPlayer(player))?;

        let mut ctl = InventoryController::new(&*self.catalog, &mut inventory.state)
            .with_policy(self.settings.overflow_policy);
        if let Err(err) = ctl.apply(request) {
            debug!(player, %err, "request rejected");
            return Err(err.into());
        }
        let deliveries = route_events(&inventory.subscribers, ctl.into_events());

        if let Some(log) = &mut self.request_log {
            if let Err(err) = log.log(self.current_tick.0, player, request) {
                warn!("Failed to log request: {:#}", err);
            }
        }
        Ok(deliveries)
    }

    /// Server-side AddItem (loot, rewards, admin tooling).
    #[instrument(skip(self))]
    pub fn give_item(
        &mut self,
        player: PlayerId,
        container: ContainerId,
        item_id: ItemId,
        amount: u32,
    ) -> Result<(AddOutcome, Vec<Delivery>), ServerError> {
        let inventory = self
            .inventories
            .get_mut(&player)
            .ok_or(ServerError::UnknownPlayer(player))?;

        let mut ctl = InventoryController::new(&*self.catalog, &mut inventory.state)
            .with_policy(self.settings.overflow_policy);
        let outcome = ctl.add_item(container, item_id, amount)?;
        Ok((outcome, route_events(&inventory.subscribers, ctl.into_events())))
    }

    /// Immediate full resync of `owner`'s inventory to every subscriber.
    pub fn resync(&mut self, owner: PlayerId) -> Result<Vec<Delivery>, ServerError> {
        let tick = self.current_tick;
        let inventory = self
            .inventories
            .get_mut(&owner)
            .ok_or(ServerError::UnknownPlayer(owner))?;
        inventory.last_resync = tick;
        Ok(resync_all(inventory))
    }

    /// Advance one tick and emit any full resyncs that are due.
    ///
    /// Runs between requests, so a snapshot never interleaves with a mutation.
    pub fn tick(&mut self) -> Vec<Delivery> {
        self.current_tick = self.current_tick.advance(1);
        let tick = self.current_tick;
        let interval = self.settings.resync_interval_ticks;

        let mut deliveries = Vec::new();
        if interval > 0 {
            for inventory in self.inventories.values_mut() {
                if tick.since(inventory.last_resync) >= interval {
                    inventory.last_resync = tick;
                    deliveries.extend(resync_all(inventory));
                }
            }
        }

        if let Some(log) = &mut self.request_log {
            if let Err(err) = log.flush() {
                warn!("Failed to flush request log: {:#}", err);
            }
        }

        if !deliveries.is_empty() {
            debug!(tick = tick.0, count = deliveries.len(), "full resync");
        }
        deliveries
    }

    /// Apply the logged requests recorded for the current tick.
    ///
    /// Players missing from this host are joined first.
    pub fn replay_tick(&mut self, replay: &mut ReplayPlayer) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        for entry in replay.requests_for_tick(self.current_tick.0) {
            if !self.inventories.contains_key(&entry.player_id) {
                if let Ok(joined) = self.join(entry.player_id) {
                    deliveries.extend(joined);
                }
            }
            match self.handle_request(entry.player_id, &entry.request) {
                Ok(applied) => deliveries.extend(applied),
                Err(err) => warn!(player = entry.player_id, %err, "replayed request rejected"),
            }
        }
        deliveries
    }
}

fn resync_all(inventory: &PlayerInventory) -> Vec<Delivery> {
    inventory
        .subscribers
        .iter()
        .map(|viewer| full_resync(viewer, inventory.subscribers.owner(), &inventory.state))
        .collect()
}
