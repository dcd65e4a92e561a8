//! Petal Arena client core
//!
//! Client side of a real-time multiplayer arena: a local mirror of the
//! authoritative world, the player's two equipment containers (hotbar and
//! inventory) kept in step with the server, and the per-frame loop that
//! moves, draws and picks things up.
//!
//! ## Architecture
//!
//! ```text
//! ArenaClient  (client.rs)        ← explicit app state + frame loop
//!   ├── Interaction  (input.rs)   ← held keys, drag/drop, selection
//!   ├── EquipmentStore  (equipment.rs)
//!   ├── WorldCache  (cache.rs)    ← latest snapshot, swapped whole
//!   ├── SyncState  (sync.rs)      ← seq gate, outbound flush, combine
//!   ├── Scene  (render.rs)        ← paints onto any Renderer
//!   └── impl Connection  (connection.rs)
//!         ├── MemoryConnection    ← headless / tests
//!         └── BridgeHandle  (bridge.rs, `net`) ← WebSocket thread
//! ```
//!
//! Everything except the bridge, the config loader and the terminal binary
//! is platform-neutral and builds without the `net` feature.

pub mod cache;
pub mod client;
pub mod connection;
pub mod equipment;
pub mod error;
pub mod events;
pub mod input;
pub mod protocol;
pub mod render;
pub mod sync;
pub mod types;

// Native transport and configuration require the `net` feature.
#[cfg(feature = "net")]
pub mod bridge;
#[cfg(feature = "net")]
pub mod config;

pub use cache::{WorldCache, WorldSnapshot};
pub use client::{ArenaClient, ConnectionStatus, TickReport};
pub use connection::{Connection, MemoryConnection};
pub use equipment::{ContainerId, EquipmentStore};
pub use error::{ActionError, ConnectionError, EquipmentError};
pub use events::ArenaEvent;
pub use input::{InputEvent, Key, SlotRef};
pub use protocol::{ClientMessage, ServerMessage};
pub use render::{DrawList, Renderer};
pub use types::{ClientConfig, ClientStats, MovementMode, Petal, PetalKind, Vec2};

#[cfg(feature = "net")]
pub use bridge::{BridgeConfig, BridgeHandle};
#[cfg(feature = "net")]
pub use error::ConfigError;
