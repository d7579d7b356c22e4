#![warn(missing_docs)]
//! Server-authoritative grid inventory.
//!
//! An [`InventoryState`] is an ordered list of [`Container`]s, each a fixed
//! grid of [`Slot`]s. All mutation goes through an [`InventoryController`],
//! which validates requests against an [`ItemCatalog`](gridstash_core::ItemCatalog)
//! and records the [`InventoryEvent`]s viewers need to stay in sync.

mod container;
mod controller;
mod error;
mod event;
mod policy;
mod request;
mod slot;
mod state;

pub use container::{Container, ContainerInfo, DEFAULT_DISPLAY_NAME};
pub use controller::{AddOutcome, DropOutcome, InventoryController, MoveOutcome, RequestOutcome};
pub use error::{FailureKind, InventoryError};
pub use event::{Audience, InventoryEvent, SlotUpdate};
pub use policy::OverflowPolicy;
pub use request::InventoryRequest;
pub use slot::{Slot, SlotStack};
pub use state::{InventorySnapshot, InventoryState, MAX_CONTAINERS, MAX_TOTAL_SLOTS};
