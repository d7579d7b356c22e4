//! Fuzz-style property tests for the network codec
//!
//! Decoders must reject arbitrary input without panicking, and anything the
//! encoder produces must decode back to the same message.

use gridstash_core::{ContainerId, GridSize, SlotCoord};
use gridstash_inventory::{InventoryRequest, Slot, SlotUpdate};
use gridstash_net::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    ClientMessage, ServerMessage,
};
use proptest::prelude::*;

fn request() -> impl Strategy<Value = InventoryRequest> {
    prop_oneof![
        (1u32..64, 1u32..64, "[A-Za-z]{1,16}", proptest::option::of(any::<u32>())).prop_map(
            |(width, height, container_type, linked_item)| InventoryRequest::AddContainer {
                size: GridSize::new(width, height),
                container_type,
                linked_item,
            }
        ),
        "[A-Za-z]{1,16}".prop_map(|container_type| InventoryRequest::RemoveContainer {
            container_type
        }),
        (any::<u32>(), 0u32..64, 0u32..64, any::<u32>()).prop_map(|(container, x, y, amount)| {
            InventoryRequest::DropItem {
                container: ContainerId(container),
                coord: SlotCoord::new(x, y),
                amount,
            }
        }),
        (any::<u32>(), any::<u32>(), 0u32..64, 0u32..64, any::<u32>()).prop_map(
            |(from, to, x, y, amount)| InventoryRequest::MoveItem {
                from: ContainerId(from),
                from_coord: SlotCoord::new(x, y),
                to: ContainerId(to),
                to_coord: SlotCoord::new(y, x),
                amount,
            }
        ),
    ]
}

proptest! {
    /// Property: arbitrary bytes don't crash the client decoder
    #[test]
    fn arbitrary_bytes_dont_crash_client(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let _result = decode_client_message(&random_bytes);
    }

    /// Property: arbitrary bytes don't crash the server decoder
    #[test]
    fn arbitrary_bytes_dont_crash_server(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let _result = decode_server_message(&random_bytes);
    }

    /// Property: a valid frame with a corrupted payload is rejected or
    /// decodes to some message, never panics
    #[test]
    fn corrupted_payload_is_handled(
        request in request(),
        flip in any::<usize>(),
        mask in 1u8..=255,
    ) {
        let mut encoded = encode_client_message(&ClientMessage::Inventory(request)).unwrap();
        let index = 5 + flip % (encoded.len() - 5);
        encoded[index] ^= mask;
        if let Ok(msg) = decode_client_message(&encoded) {
            let _ = msg.verify();
        }
    }

    /// Property: inventory requests survive the wire
    #[test]
    fn inventory_requests_roundtrip(request in request()) {
        let msg = ClientMessage::Inventory(request);
        let encoded = encode_client_message(&msg).unwrap();
        let decoded = decode_client_message(&encoded).unwrap();
        prop_assert_eq!(msg, decoded);
    }

    /// Property: slot updates survive the wire
    #[test]
    fn slot_updates_roundtrip(
        owner in any::<u64>(),
        container in any::<u32>(),
        x in 0u32..64,
        y in 0u32..64,
        item in any::<u32>(),
        amount in 0u32..100,
    ) {
        let msg = ServerMessage::SlotUpdated {
            owner,
            update: SlotUpdate {
                container: ContainerId(container),
                slot: Slot::with_contents(SlotCoord::new(x, y), item, amount),
            },
        };
        let encoded = encode_server_message(&msg).unwrap();
        prop_assert_eq!(decode_server_message(&encoded).unwrap(), msg);
    }

    /// Property: truncated frames are always rejected
    #[test]
    fn truncated_frames_rejected(request in request(), cut in any::<usize>()) {
        let encoded = encode_client_message(&ClientMessage::Inventory(request)).unwrap();
        let keep = cut % encoded.len();
        prop_assert!(decode_client_message(&encoded[..keep]).is_err());
    }
}
