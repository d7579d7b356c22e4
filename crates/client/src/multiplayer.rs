//! Networked viewer.
//!
//! Receiving on a stream is not cancel-safe, so a background task owns the
//! read side and forwards messages through a channel. [`MultiplayerClient::poll`]
//! only ever drains that channel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use gridstash_core::{ContainerId, SlotCoord};
use gridstash_inventory::InventoryRequest;
use gridstash_net::{ClientConnection, ClientEndpoint, ClientMessage, PlayerId, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{InventoryMirrors, InventoryView};

enum Inbound {
    Message(ServerMessage),
    Closed(String),
}

/// Client connected to a remote authoritative host.
pub struct MultiplayerClient {
    endpoint: ClientEndpoint,
    connection: Arc<ClientConnection>,
    player_id: PlayerId,
    mirrors: InventoryMirrors,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    reader: JoinHandle<()>,
    disconnect_reason: Option<String>,
}

impl MultiplayerClient {
    /// Connect to `addr` and complete the protocol handshake.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let endpoint = ClientEndpoint::new().context("Failed to create client endpoint")?;
        let connection = endpoint
            .connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {addr}"))?;
        let connection = Arc::new(ClientConnection::new(connection));
        let player_id = connection.handshake().await.context("Handshake failed")?;
        info!(player_id, %addr, "Connected to server");

        let (tx, inbound) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(connection.clone(), tx));

        Ok(Self {
            endpoint,
            connection,
            player_id,
            mirrors: InventoryMirrors::new(player_id),
            inbound,
            reader,
            disconnect_reason: None,
        })
    }

    /// Send a request to the host.
    pub async fn send_request(&self, request: InventoryRequest) -> Result<()> {
        if let Some(reason) = &self.disconnect_reason {
            bail!("Not connected: {reason}");
        }
        debug!(kind = request.kind(), "sending request");
        self.connection.send(ClientMessage::Inventory(request)).await
    }

    /// Ask the host to move the whole mirrored stack. Returns false when there
    /// was nothing to move.
    pub async fn move_stack(
        &self,
        from: ContainerId,
        from_coord: SlotCoord,
        to: ContainerId,
        to_coord: SlotCoord,
    ) -> Result<bool> {
        match self.mirrors.own().move_stack_request(from, from_coord, to, to_coord) {
            Some(request) => self.send_request(request).await.map(|()| true),
            None => Ok(false),
        }
    }

    /// Apply every message received so far without waiting. Returns how many
    /// were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(inbound) = self.inbound.try_recv() {
            self.handle(inbound);
            applied += 1;
        }
        applied
    }

    /// Wait until `done` holds for the own view, applying messages as they arrive.
    pub async fn wait_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&InventoryView) -> bool,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        self.poll();
        while !done(self.mirrors.own()) {
            if let Some(reason) = &self.disconnect_reason {
                bail!("Disconnected while waiting: {reason}");
            }
            match tokio::time::timeout_at(deadline, self.inbound.recv()).await {
                Ok(Some(inbound)) => self.handle(inbound),
                Ok(None) => bail!("Reader task ended"),
                Err(_) => bail!("Timed out after {:?}", timeout),
            }
        }
        Ok(())
    }

    fn handle(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Message(ServerMessage::Disconnect { reason }) => {
                warn!("Server disconnected: {}", reason);
                self.disconnect_reason = Some(reason);
            }
            Inbound::Message(message) => {
                self.mirrors.apply(&message);
            }
            Inbound::Closed(reason) => {
                if self.disconnect_reason.is_none() {
                    warn!("Connection closed: {}", reason);
                    self.disconnect_reason = Some(reason);
                }
            }
        }
    }

    /// Player id assigned by the host.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Mirror of the local player's inventory.
    pub fn view(&self) -> &InventoryView {
        self.mirrors.own()
    }

    /// Mirror of another player's inventory this client is watching.
    pub fn watched(&self, owner: PlayerId) -> Option<&InventoryView> {
        self.mirrors.watched(owner)
    }

    /// Whether the session is still open, as far as processed messages tell.
    pub fn is_connected(&self) -> bool {
        self.disconnect_reason.is_none()
    }

    /// Reason the session ended, once known.
    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnect_reason.as_deref()
    }

    /// Tell the host we are leaving and close the connection.
    pub async fn disconnect(mut self, reason: &str) -> Result<()> {
        if self.disconnect_reason.is_none() {
            let _ = self
                .connection
                .send(ClientMessage::Disconnect {
                    reason: reason.to_string(),
                })
                .await;
            self.disconnect_reason = Some(reason.to_string());
        }
        self.reader.abort();
        self.connection.close(reason);
        self.endpoint.close();
        info!("Disconnected from server");
        Ok(())
    }
}

async fn read_loop(connection: Arc<ClientConnection>, tx: mpsc::UnboundedSender<Inbound>) {
    loop {
        match connection.recv().await {
            Ok(message) => {
                let closing = matches!(message, ServerMessage::Disconnect { .. });
                if tx.send(Inbound::Message(message)).is_err() || closing {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send(Inbound::Closed(format!("{err:#}")));
                return;
            }
        }
    }
}
