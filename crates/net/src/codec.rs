//! Message encoding and decoding with framing.
//!
//! Frame format: `[length: u32 LE][message_type: u8][postcard payload]`, where
//! `length` counts the tag byte plus the payload.

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_MAGIC, PROTOCOL_VERSION};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compute schema hash from protocol definitions.
///
/// Client and server refuse to talk when their hashes differ.
pub fn compute_schema_hash() -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&PROTOCOL_VERSION.to_le_bytes());
    hasher.update(PROTOCOL_MAGIC);
    hasher.update(b"ClientMessage");
    hasher.update(b"ServerMessage");
    hasher.update(b"InventoryRequest");
    hasher.update(b"InventorySnapshot");
    hasher.update(b"SlotUpdate");

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Encode a client message with length prefix.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>> {
    encode_frame(client_message_tag(msg), msg).context("Failed to serialize client message")
}

/// Encode a server message with length prefix.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>> {
    encode_frame(server_message_tag(msg), msg).context("Failed to serialize server message")
}

/// Decode a client message from frame data.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage> {
    decode_frame(data).context("Failed to deserialize client message")
}

/// Decode a server message from frame data.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage> {
    decode_frame(data).context("Failed to deserialize server message")
}

fn encode_frame<T: Serialize>(tag: u8, msg: &T) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(msg)?;

    let mut frame = Vec::with_capacity(4 + 1 + payload.len());
    let length = (1 + payload.len()) as u32;
    frame.extend_from_slice(&length.to_le_bytes());
    frame.push(tag);
    frame.extend_from_slice(&payload);

    Ok(frame)
}

fn decode_frame<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    if data.len() < 5 {
        bail!("Frame too short: {} bytes (minimum 5)", data.len());
    }

    let length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if length == 0 || data.len() < 4 + length {
        bail!(
            "Incomplete frame: expected {} bytes, got {}",
            4 + length,
            data.len()
        );
    }

    // data[4] is the message tag; postcard carries its own discriminant.
    let payload = &data[5..4 + length];
    Ok(postcard::from_bytes(payload)?)
}

fn client_message_tag(msg: &ClientMessage) -> u8 {
    match msg {
        ClientMessage::Handshake { .. } => 0,
        ClientMessage::Inventory(_) => 1,
        ClientMessage::Disconnect { .. } => 2,
    }
}

fn server_message_tag(msg: &ServerMessage) -> u8 {
    match msg {
        ServerMessage::HandshakeResponse { .. } => 0,
        ServerMessage::ContainerAdded { .. } => 1,
        ServerMessage::ContainerRemoved { .. } => 2,
        ServerMessage::SlotUpdated { .. } => 3,
        ServerMessage::FullResync { .. } => 4,
        ServerMessage::Disconnect { .. } => 5,
    }
}
