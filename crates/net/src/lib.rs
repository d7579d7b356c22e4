#![warn(missing_docs)]
//! Sync layer between the authoritative host and remote viewers.
//!
//! Messages ride a single ordered QUIC stream per direction, so a viewer sees
//! an inventory's events in the order the controller emitted them.

mod channel;
mod codec;
mod connection;
mod protocol;
mod replay;
mod transport;

pub use channel::{ChannelManager, ChannelType, MAX_FRAME_LEN};
pub use codec::{
    compute_schema_hash, decode_client_message, decode_server_message, encode_client_message,
    encode_server_message,
};
pub use connection::{ClientConnection, ServerConnection};
pub use protocol::{
    ClientMessage, PlayerId, ServerMessage, MAX_CONTAINER_TYPE_LEN, MAX_GRID_DIMENSION,
    MAX_INVENTORY_SLOTS, MAX_REASON_LEN, MAX_RESYNC_CONTAINERS, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use replay::{ReplayPlayer, RequestLogEntry, RequestLogger};
pub use transport::{ClientEndpoint, ServerEndpoint};
