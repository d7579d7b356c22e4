//! Ordered reliable channel over QUIC.
//!
//! Each side keeps one long-lived unidirectional stream for sending and one
//! for receiving. Frames are written back to back, so the peer reads them in
//! exactly the order they were sent.

use anyhow::{anyhow, bail, Context, Result};
use quinn::{Connection, RecvStream, SendStream};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::trace;

/// Largest frame accepted from a peer (bytes).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Channel byte plus little-endian length.
pub const FRAME_HEADER_LEN: usize = 5;

/// Channel type identifier for message routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelType {
    /// Handshake and disconnect traffic.
    Control = 0,
    /// Inventory requests and state sync.
    Inventory = 1,
}

impl TryFrom<u8> for ChannelType {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ChannelType::Control),
            1 => Ok(ChannelType::Inventory),
            _ => Err(anyhow!("Invalid channel type: {}", value)),
        }
    }
}

/// Channel manager for one QUIC connection.
pub struct ChannelManager {
    connection: Connection,
    send: Mutex<Option<SendStream>>,
    recv: Mutex<Option<RecvStream>>,
}

impl ChannelManager {
    /// Create a channel manager for the given connection.
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            send: Mutex::new(None),
            recv: Mutex::new(None),
        }
    }

    /// Send one frame. The outgoing stream is opened on first use.
    pub async fn send(&self, channel: ChannelType, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME_LEN {
            bail!("Frame of {} bytes exceeds limit", data.len());
        }

        let mut guard = self.send.lock().await;
        if guard.is_none() {
            let stream = self
                .connection
                .open_uni()
                .await
                .context("Failed to open unidirectional stream")?;
            *guard = Some(stream);
        }
        let stream = guard
            .as_mut()
            .ok_or_else(|| anyhow!("Send stream unavailable"))?;

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + data.len());
        frame.push(channel as u8);
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(data);

        stream
            .write_all(&frame)
            .await
            .context("Failed to write frame")?;

        trace!("Sent {} bytes on {:?}", data.len(), channel);
        Ok(())
    }

    /// Receive the next frame. The incoming stream is accepted on first use.
    ///
    /// Not cancel safe: dropping the future mid-frame desynchronises the
    /// stream, so callers read from a dedicated task.
    pub async fn recv(&self) -> Result<(ChannelType, Vec<u8>)> {
        let mut guard = self.recv.lock().await;
        if guard.is_none() {
            let stream = self
                .connection
                .accept_uni()
                .await
                .context("Failed to accept unidirectional stream")?;
            *guard = Some(stream);
        }
        let stream = guard
            .as_mut()
            .ok_or_else(|| anyhow!("Receive stream unavailable"))?;

        let mut header = [0u8; FRAME_HEADER_LEN];
        stream
            .read_exact(&mut header)
            .await
            .context("Failed to read frame header")?;
        let channel = ChannelType::try_from(header[0])?;
        let len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if len > MAX_FRAME_LEN {
            bail!("Peer announced {} byte frame, limit is {}", len, MAX_FRAME_LEN);
        }

        let mut data = vec![0u8; len];
        stream
            .read_exact(&mut data)
            .await
            .context("Failed to read frame body")?;

        trace!("Received {} bytes on {:?}", data.len(), channel);
        Ok((channel, data))
    }

    /// Get the remote address of this connection.
    pub fn remote_address(&self) -> std::net::SocketAddr {
        self.connection.remote_address()
    }

    /// Close the connection gracefully.
    pub fn close(&self, reason: &str) {
        self.connection.close(0u32.into(), reason.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ClientEndpoint, ServerEndpoint};

    #[test]
    fn channel_type_from_byte() {
        assert_eq!(ChannelType::try_from(1).unwrap(), ChannelType::Inventory);
        assert!(ChannelType::try_from(7).is_err());
    }

    #[tokio::test]
    async fn frames_arrive_in_send_order() {
        let server =
            ServerEndpoint::bind("127.0.0.1:0".parse().unwrap()).expect("Failed to bind server");
        let server_addr = server.local_addr();

        let server_handle = tokio::spawn(async move {
            let incoming = server.accept().await.expect("No incoming connection");
            let connection = incoming.await.expect("Failed to accept connection");
            let manager = ChannelManager::new(connection);

            let mut received = Vec::new();
            for _ in 0..50 {
                let (channel, data) = manager.recv().await.expect("Failed to receive frame");
                assert_eq!(channel, ChannelType::Inventory);
                received.push(data[0]);
            }

            manager
                .send(ChannelType::Control, b"done")
                .await
                .expect("Failed to send reply");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            received
        });

        let client = ClientEndpoint::new().expect("Failed to create client");
        let connection = client.connect(server_addr).await.expect("Failed to connect");
        let manager = ChannelManager::new(connection);

        for i in 0..50u8 {
            manager
                .send(ChannelType::Inventory, &[i])
                .await
                .expect("Failed to send frame");
        }

        let (channel, data) = manager.recv().await.expect("Failed to receive reply");
        assert_eq!(channel, ChannelType::Control);
        assert_eq!(data, b"done");

        let received = server_handle.await.expect("Server task panicked");
        assert_eq!(received, (0..50u8).collect::<Vec<_>>());
    }
}
