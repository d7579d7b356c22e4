//! QUIC front end for the authoritative host.
//!
//! Connections are accepted and handshaken on background tasks. Each admitted
//! client gets a reader task that forwards its requests into one queue; the
//! tick loop drains that queue in arrival order, so the [`Server`] itself is
//! only ever touched from one task.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gridstash_core::SimTick;
use gridstash_inventory::InventoryRequest;
use gridstash_net::{ClientMessage, PlayerId, ServerConnection, ServerEndpoint, ServerMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::{Delivery, Server};

enum Inbound {
    Connected(ServerConnection),
    Request {
        player: PlayerId,
        request: InventoryRequest,
    },
    Disconnected {
        player: PlayerId,
        reason: String,
    },
}

/// Client admitted to the session.
pub struct ConnectedClient {
    connection: Arc<ServerConnection>,
    reader: JoinHandle<()>,
}

impl ConnectedClient {
    /// Remote address of the client.
    pub fn remote_address(&self) -> SocketAddr {
        self.connection.remote_address()
    }
}

/// Authoritative host reachable over QUIC.
pub struct MultiplayerServer {
    server: Server,
    endpoint: Arc<ServerEndpoint>,
    clients: HashMap<PlayerId, ConnectedClient>,
    next_player_id: PlayerId,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    acceptor: JoinHandle<()>,
}

impl MultiplayerServer {
    /// Bind to `addr` and start accepting connections.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(addr: SocketAddr, server: Server) -> Result<Self> {
        let endpoint =
            Arc::new(ServerEndpoint::bind(addr).context("Failed to bind server endpoint")?);
        info!("Multiplayer server bound to {}", endpoint.local_addr());

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let acceptor = tokio::spawn(accept_loop(endpoint.clone(), inbound_tx.clone()));

        Ok(Self {
            server,
            endpoint,
            clients: HashMap::new(),
            next_player_id: 1,
            inbound_tx,
            inbound_rx,
            acceptor,
        })
    }

    /// Run one tick: admit new clients, apply queued requests in arrival
    /// order, run the host tick, then send everything that resulted.
    #[instrument(
        skip(self),
        fields(tick = self.server.current_tick().0, client_count = self.clients.len())
    )]
    pub async fn tick(&mut self) -> Result<()> {
        let mut deliveries = Vec::new();

        while let Ok(inbound) = self.inbound_rx.try_recv() {
            match inbound {
                Inbound::Connected(connection) => {
                    deliveries.extend(self.admit(connection).await);
                }
                Inbound::Request { player, request } => {
                    if !self.clients.contains_key(&player) {
                        continue;
                    }
                    match self.server.handle_request(player, &request) {
                        Ok(applied) => deliveries.extend(applied),
                        Err(err) => debug!(player, %err, "request not applied"),
                    }
                }
                Inbound::Disconnected { player, reason } => {
                    self.drop_client(player, &reason);
                }
            }
        }

        deliveries.extend(self.server.tick());
        self.deliver(deliveries).await;
        Ok(())
    }

    /// Tick at `tick_rate_hz` until `shutdown` resolves, then disconnect everyone.
    pub async fn run(
        &mut self,
        tick_rate_hz: u32,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let period = Duration::from_secs_f64(1.0 / f64::from(tick_rate_hz.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(tick_rate_hz, "Server loop running");
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await?,
                _ = &mut shutdown => break,
            }
        }

        self.shutdown("Server shutting down").await;
        Ok(())
    }

    /// Tell every client the session is over and close the endpoint.
    pub async fn shutdown(&mut self, reason: &str) {
        let players: Vec<PlayerId> = self.clients.keys().copied().collect();
        for player in players {
            if let Some(client) = self.clients.get(&player) {
                let _ = client
                    .connection
                    .send(ServerMessage::Disconnect {
                        reason: reason.to_string(),
                    })
                    .await;
            }
            self.drop_client(player, reason);
        }
        self.acceptor.abort();
        self.endpoint.close();
    }

    async fn admit(&mut self, connection: ServerConnection) -> Vec<Delivery> {
        let player = self.next_player_id;
        self.next_player_id += 1;

        if let Err(err) = connection.accept_player(player).await {
            warn!("Failed to confirm handshake for player {}: {:#}", player, err);
            return Vec::new();
        }

        let deliveries = match self.server.join(player) {
            Ok(deliveries) => deliveries,
            Err(err) => {
                warn!(player, %err, "join failed");
                return Vec::new();
            }
        };

        let connection = Arc::new(connection);
        let reader = tokio::spawn(read_loop(
            player,
            connection.clone(),
            self.inbound_tx.clone(),
        ));
        info!(player, addr = %connection.remote_address(), "Client joined");
        self.clients
            .insert(player, ConnectedClient { connection, reader });
        deliveries
    }

    fn drop_client(&mut self, player: PlayerId, reason: &str) {
        if let Some(client) = self.clients.remove(&player) {
            info!(player, reason, "Client left");
            client.reader.abort();
            client.connection.close(reason);
        }
        self.server.leave(player);
    }

    async fn deliver(&mut self, deliveries: Vec<Delivery>) {
        let mut failed = Vec::new();
        for Delivery { viewer, message } in deliveries {
            if failed.contains(&viewer) {
                continue;
            }
            let Some(client) = self.clients.get(&viewer) else {
                continue;
            };
            if let Err(err) = client.connection.send(message).await {
                warn!("Failed to send to player {}: {:#}", viewer, err);
                failed.push(viewer);
            }
        }
        for player in failed {
            self.drop_client(player, "send failed");
        }
    }

    /// The authoritative host.
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Mutable access to the host (subscriptions, server-side item grants).
    ///
    /// Deliveries returned by host calls made here are not sent; use
    /// [`MultiplayerServer::send`] for them.
    pub fn server_mut(&mut self) -> &mut Server {
        &mut self.server
    }

    /// Send deliveries produced outside the tick loop.
    pub async fn send(&mut self, deliveries: Vec<Delivery>) {
        self.deliver(deliveries).await;
    }

    /// Current host tick.
    pub fn current_tick(&self) -> SimTick {
        self.server.current_tick()
    }

    /// Number of admitted clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Player ids of admitted clients.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.clients.keys().copied()
    }

    /// Get local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }
}

async fn accept_loop(endpoint: Arc<ServerEndpoint>, inbound: mpsc::UnboundedSender<Inbound>) {
    while let Some(incoming) = endpoint.accept().await {
        let inbound = inbound.clone();
        tokio::spawn(async move {
            let addr = incoming.remote_address();
            info!("New connection from {}", addr);

            let connection = match incoming.await {
                Ok(connection) => ServerConnection::new(connection),
                Err(err) => {
                    warn!("Failed to establish connection from {}: {}", addr, err);
                    return;
                }
            };
            if let Err(err) = connection.accept_handshake().await {
                warn!("Handshake failed for {}: {:#}", addr, err);
                return;
            }
            let _ = inbound.send(Inbound::Connected(connection));
        });
    }
}

async fn read_loop(
    player: PlayerId,
    connection: Arc<ServerConnection>,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let reason = loop {
        match connection.recv().await {
            Ok(ClientMessage::Inventory(request)) => {
                if inbound.send(Inbound::Request { player, request }).is_err() {
                    return;
                }
            }
            Ok(ClientMessage::Disconnect { reason }) => break reason,
            Ok(ClientMessage::Handshake { .. }) => {
                warn!(player, "Ignoring repeated handshake");
            }
            Err(err) => break format!("{err:#}"),
        }
    };
    let _ = inbound.send(Inbound::Disconnected { player, reason });
}
