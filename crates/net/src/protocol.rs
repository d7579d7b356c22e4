//! Protocol message definitions for client-server communication.
//!
//! All messages use postcard serialization for compact binary encoding.

use gridstash_core::ContainerId;
use gridstash_inventory::{
    ContainerInfo, InventoryEvent, InventoryRequest, InventorySnapshot, SlotUpdate,
    MAX_CONTAINERS, MAX_TOTAL_SLOTS,
};
use serde::{Deserialize, Serialize};

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u16 = 2;

/// Protocol magic bytes.
pub const PROTOCOL_MAGIC: &[u8; 8] = b"GSTASH\x00\x01";

/// Player identifier assigned by the server at handshake.
pub type PlayerId = u64;

/// Maximum length of a container type or display name (bytes).
pub const MAX_CONTAINER_TYPE_LEN: usize = 64;

/// Maximum container width or height accepted from the wire.
pub const MAX_GRID_DIMENSION: u32 = 64;

/// Maximum length of a disconnect or rejection reason (bytes).
pub const MAX_REASON_LEN: usize = 256;

/// Maximum containers in one full resync. The host never lets an inventory
/// grow past this.
pub const MAX_RESYNC_CONTAINERS: usize = MAX_CONTAINERS;

/// Maximum slots across all containers in one full resync.
pub const MAX_INVENTORY_SLOTS: usize = MAX_TOTAL_SLOTS;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ClientMessage {
    /// Handshake request with protocol version and schema hash.
    Handshake {
        /// Protocol version.
        version: u16,
        /// Schema hash for compatibility.
        schema_hash: u64,
    },

    /// Inventory mutation against the sender's own inventory.
    Inventory(InventoryRequest),

    /// Client disconnect notification.
    Disconnect {
        /// Reason for disconnect.
        reason: String,
    },
}

impl ClientMessage {
    /// Verify message limits.
    ///
    /// Called on every received message before it reaches the controller,
    /// which still revalidates the request against current state.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ClientMessage::Handshake { .. } => Ok(()),
            ClientMessage::Inventory(request) => verify_request(request),
            ClientMessage::Disconnect { reason } => verify_reason(reason),
        }
    }
}

fn verify_request(request: &InventoryRequest) -> Result<(), &'static str> {
    match request {
        InventoryRequest::AddContainer {
            size,
            container_type,
            ..
        } => {
            if container_type.len() > MAX_CONTAINER_TYPE_LEN {
                return Err("Container type too long");
            }
            if size.width > MAX_GRID_DIMENSION || size.height > MAX_GRID_DIMENSION {
                return Err("Container too large");
            }
            Ok(())
        }
        InventoryRequest::RemoveContainer { container_type } => {
            if container_type.len() > MAX_CONTAINER_TYPE_LEN {
                return Err("Container type too long");
            }
            Ok(())
        }
        InventoryRequest::DropItem { .. } | InventoryRequest::MoveItem { .. } => Ok(()),
    }
}

fn verify_reason(reason: &str) -> Result<(), &'static str> {
    if reason.len() > MAX_REASON_LEN {
        return Err("Reason too long");
    }
    Ok(())
}

fn verify_info(info: &ContainerInfo) -> Result<(), &'static str> {
    if info.container_type.len() > MAX_CONTAINER_TYPE_LEN
        || info.display_name.len() > MAX_CONTAINER_TYPE_LEN
    {
        return Err("Container name too long");
    }
    if !info.size.is_valid()
        || info.size.width > MAX_GRID_DIMENSION
        || info.size.height > MAX_GRID_DIMENSION
    {
        return Err("Invalid container size");
    }
    Ok(())
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ServerMessage {
    /// Handshake response accepting or rejecting the connection.
    HandshakeResponse {
        /// Whether the handshake was accepted.
        accepted: bool,
        /// Reason for rejection (if not accepted).
        reason: Option<String>,
        /// Player id assigned to the client.
        player_id: Option<PlayerId>,
    },

    /// A container was added to `owner`'s inventory. Only the owner receives it.
    ContainerAdded {
        /// Inventory the container belongs to.
        owner: PlayerId,
        /// The new container, all slots empty.
        info: ContainerInfo,
    },

    /// A container was removed from a watched inventory.
    ContainerRemoved {
        /// Inventory the container belonged to.
        owner: PlayerId,
        /// Removed container.
        id: ContainerId,
        /// Its type identifier.
        container_type: String,
    },

    /// Incremental slot change in a watched inventory.
    SlotUpdated {
        /// Inventory holding the slot.
        owner: PlayerId,
        /// Container and new slot contents.
        update: SlotUpdate,
    },

    /// Complete contents of `owner`'s inventory, replacing the viewer's mirror of it.
    FullResync {
        /// Inventory being resynced.
        owner: PlayerId,
        /// Every container with every slot.
        snapshot: InventorySnapshot,
    },

    /// Server disconnect notification.
    Disconnect {
        /// Reason for disconnect.
        reason: String,
    },
}

impl ServerMessage {
    /// Verify message limits.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ServerMessage::HandshakeResponse { reason, .. } => {
                reason.as_deref().map_or(Ok(()), verify_reason)
            }
            ServerMessage::ContainerAdded { info, .. } => verify_info(info),
            ServerMessage::ContainerRemoved { container_type, .. } => {
                if container_type.len() > MAX_CONTAINER_TYPE_LEN {
                    return Err("Container type too long");
                }
                Ok(())
            }
            ServerMessage::SlotUpdated { .. } => Ok(()),
            ServerMessage::FullResync { snapshot, .. } => {
                if snapshot.containers.len() > MAX_RESYNC_CONTAINERS {
                    return Err("Too many containers in resync");
                }
                let slots: usize = snapshot.containers.iter().map(|c| c.slots().len()).sum();
                if slots > MAX_INVENTORY_SLOTS {
                    return Err("Too many slots in resync");
                }
                for container in &snapshot.containers {
                    verify_info(container.info())?;
                    if !container.is_well_formed() {
                        return Err("Malformed container in resync");
                    }
                }
                Ok(())
            }
            ServerMessage::Disconnect { reason } => verify_reason(reason),
        }
    }
}

impl ServerMessage {
    /// Wire form of a controller event raised on `owner`'s inventory.
    pub fn from_event(owner: PlayerId, event: InventoryEvent) -> Self {
        match event {
            InventoryEvent::ContainerAdded(info) => ServerMessage::ContainerAdded { owner, info },
            InventoryEvent::ContainerRemoved { id, container_type } => {
                ServerMessage::ContainerRemoved {
                    owner,
                    id,
                    container_type,
                }
            }
            InventoryEvent::SlotUpdated(update) => ServerMessage::SlotUpdated { owner, update },
        }
    }

    /// Owner of the inventory a message describes; `None` for session messages.
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            ServerMessage::ContainerAdded { owner, .. }
            | ServerMessage::ContainerRemoved { owner, .. }
            | ServerMessage::SlotUpdated { owner, .. }
            | ServerMessage::FullResync { owner, .. } => Some(*owner),
            ServerMessage::HandshakeResponse { .. } | ServerMessage::Disconnect { .. } => None,
        }
    }
}
