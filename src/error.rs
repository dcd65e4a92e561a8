//! Error taxonomy.
//!
//! None of these are fatal: local validation failures become a UI notice,
//! connection failures become a status indicator, and the frame loop keeps
//! ticking either way.

use thiserror::Error;

use crate::equipment::ContainerId;

/// A rejected Equipment Store mutation.  The store is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EquipmentError {
    #[error("{container} slot {slot} is out of bounds (capacity {capacity})")]
    SlotOutOfBounds {
        container: ContainerId,
        slot: usize,
        capacity: usize,
    },
    #[error("{container} slot {slot} is already occupied")]
    SlotOccupied { container: ContainerId, slot: usize },
    #[error("{container} slot {slot} is empty")]
    EmptySource { container: ContainerId, slot: usize },
    #[error("inventory full")]
    InventoryFull,
}

/// A user action rejected before anything was sent.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("select exactly {} petals to combine (selected {selected})", crate::sync::COMBINE_COUNT)]
    CombineSelection { selected: usize },
    #[error("name cannot be empty")]
    EmptyName,
    #[error("chat message cannot be empty")]
    EmptyChat,
    #[error("not joined yet")]
    NotJoined,
    #[error(transparent)]
    Equipment(#[from] EquipmentError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Outbound send failure on the Connection Adapter.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,
    #[error("outbound queue full")]
    QueueFull,
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Startup configuration could not be loaded.
#[cfg(feature = "net")]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
