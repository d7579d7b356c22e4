//! Typed connections: framing, channel selection and the handshake.

use crate::channel::{ChannelManager, ChannelType};
use crate::codec::{
    compute_schema_hash, decode_client_message, decode_server_message, encode_client_message,
    encode_server_message,
};
use crate::protocol::{ClientMessage, PlayerId, ServerMessage, PROTOCOL_VERSION};
use anyhow::{anyhow, bail, Result};
use std::net::SocketAddr;
use tracing::{debug, info, warn};

/// Client-side connection.
pub struct ClientConnection {
    channels: ChannelManager,
    schema_hash: u64,
}

impl ClientConnection {
    /// Wrap an established QUIC connection.
    pub fn new(connection: quinn::Connection) -> Self {
        Self {
            channels: ChannelManager::new(connection),
            schema_hash: compute_schema_hash(),
        }
    }

    /// Perform the handshake and return the player id the server assigned.
    pub async fn handshake(&self) -> Result<PlayerId> {
        info!("Starting handshake with server");

        self.send(ClientMessage::Handshake {
            version: PROTOCOL_VERSION,
            schema_hash: self.schema_hash,
        })
        .await?;

        match self.recv().await? {
            ServerMessage::HandshakeResponse {
                accepted: true,
                player_id,
                ..
            } => {
                let player_id = player_id
                    .ok_or_else(|| anyhow!("Server accepted but didn't assign a player id"))?;
                info!("Handshake successful, player id {}", player_id);
                Ok(player_id)
            }
            ServerMessage::HandshakeResponse { reason, .. } => {
                let reason = reason.unwrap_or_else(|| "Unknown reason".to_string());
                bail!("Handshake rejected: {}", reason)
            }
            msg => bail!("Expected HandshakeResponse, got {:?}", msg),
        }
    }

    /// Send a client message.
    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        let data = encode_client_message(&msg)?;
        self.channels.send(client_channel(&msg), &data).await
    }

    /// Receive and verify the next server message.
    pub async fn recv(&self) -> Result<ServerMessage> {
        let (_channel, data) = self.channels.recv().await?;
        let msg = decode_server_message(&data)?;
        msg.verify()
            .map_err(|reason| anyhow!("Rejected server message: {}", reason))?;
        Ok(msg)
    }

    /// Get the remote server address.
    pub fn remote_address(&self) -> SocketAddr {
        self.channels.remote_address()
    }

    /// Close the connection gracefully.
    pub fn close(&self, reason: &str) {
        info!("Closing connection: {}", reason);
        self.channels.close(reason);
    }
}

/// Server-side connection.
pub struct ServerConnection {
    channels: ChannelManager,
    schema_hash: u64,
}

impl ServerConnection {
    /// Wrap an accepted QUIC connection.
    pub fn new(connection: quinn::Connection) -> Self {
        Self {
            channels: ChannelManager::new(connection),
            schema_hash: compute_schema_hash(),
        }
    }

    /// Wait for and validate the client handshake.
    ///
    /// On mismatch the client is sent a rejection with a reason before the
    /// error is returned.
    pub async fn accept_handshake(&self) -> Result<()> {
        info!("Waiting for handshake from {}", self.remote_address());

        match self.recv().await? {
            ClientMessage::Handshake {
                version,
                schema_hash,
            } => {
                debug!(
                    "Received handshake: version={}, schema_hash={:016x}",
                    version, schema_hash
                );

                if version != PROTOCOL_VERSION {
                    warn!(
                        "Protocol version mismatch: client={}, server={}",
                        version, PROTOCOL_VERSION
                    );
                    self.reject(&format!(
                        "Protocol version mismatch: server uses v{}",
                        PROTOCOL_VERSION
                    ))
                    .await?;
                    bail!("Protocol version mismatch: {} != {}", version, PROTOCOL_VERSION);
                }

                if schema_hash != self.schema_hash {
                    warn!(
                        "Schema hash mismatch: client={:016x}, server={:016x}",
                        schema_hash, self.schema_hash
                    );
                    self.reject("Schema mismatch: incompatible client version")
                        .await?;
                    bail!(
                        "Schema hash mismatch: {:016x} != {:016x}",
                        schema_hash,
                        self.schema_hash
                    );
                }

                Ok(())
            }
            msg => {
                warn!("Expected Handshake, got {:?}", msg);
                self.reject("Expected handshake message").await?;
                bail!("Expected Handshake, got {:?}", msg)
            }
        }
    }

    /// Accept the handshake and tell the client its player id.
    pub async fn accept_player(&self, player_id: PlayerId) -> Result<()> {
        self.send(ServerMessage::HandshakeResponse {
            accepted: true,
            reason: None,
            player_id: Some(player_id),
        })
        .await
    }

    async fn reject(&self, reason: &str) -> Result<()> {
        self.send(ServerMessage::HandshakeResponse {
            accepted: false,
            reason: Some(reason.to_string()),
            player_id: None,
        })
        .await
    }

    /// Send a server message.
    pub async fn send(&self, msg: ServerMessage) -> Result<()> {
        let data = encode_server_message(&msg)?;
        self.channels.send(server_channel(&msg), &data).await
    }

    /// Receive and verify the next client message.
    pub async fn recv(&self) -> Result<ClientMessage> {
        let (_channel, data) = self.channels.recv().await?;
        let msg = decode_client_message(&data)?;
        msg.verify()
            .map_err(|reason| anyhow!("Rejected client message: {}", reason))?;
        Ok(msg)
    }

    /// Get the remote client address.
    pub fn remote_address(&self) -> SocketAddr {
        self.channels.remote_address()
    }

    /// Close the connection gracefully.
    pub fn close(&self, reason: &str) {
        info!("Closing connection: {}", reason);
        self.channels.close(reason);
    }
}

fn client_channel(msg: &ClientMessage) -> ChannelType {
    match msg {
        ClientMessage::Handshake { .. } | ClientMessage::Disconnect { .. } => ChannelType::Control,
        ClientMessage::Inventory(_) => ChannelType::Inventory,
    }
}

fn server_channel(msg: &ServerMessage) -> ChannelType {
    match msg {
        ServerMessage::HandshakeResponse { .. } | ServerMessage::Disconnect { .. } => {
            ChannelType::Control
        }
        ServerMessage::ContainerAdded { .. }
        | ServerMessage::ContainerRemoved { .. }
        | ServerMessage::SlotUpdated { .. }
        | ServerMessage::FullResync { .. } => ChannelType::Inventory,
    }
}
