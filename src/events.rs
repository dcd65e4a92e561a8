//! Semantic events delivered from a connection to the frame loop.
//!
//! These are **processed** events: the connection adapter decodes raw text
//! frames into these before queueing them, so the client never sees JSON.
//! Unknown or malformed frames never become events.

use crate::protocol::{ServerMessage, SnapshotRecord};

/// A single inbound event, safe to pass across the thread boundary.
#[derive(Debug, Clone)]
pub enum ArenaEvent {
    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------
    /// Socket open; the client should `join`.
    Connected,
    /// Socket closed or failed.  `reason` is human-readable.
    Disconnected { reason: String },

    // ------------------------------------------------------------------
    // Server messages
    // ------------------------------------------------------------------
    /// Server assigned the local player's id.
    Welcome { player_id: String },
    /// Full world snapshot, not yet ingested.
    Snapshot(SnapshotRecord),
    Chat { from: String, message: String },
    /// The local player died.
    Respawn,
}

impl From<ServerMessage> for ArenaEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Welcome { id } => Self::Welcome { player_id: id },
            ServerMessage::Update(snapshot) => Self::Snapshot(snapshot),
            ServerMessage::Chat { from, message } => Self::Chat { from, message },
            ServerMessage::Respawn => Self::Respawn,
        }
    }
}

/// Decode a text frame into an event, logging and dropping anything the
/// protocol does not recognise.
pub fn parse_frame(text: &str) -> Option<ArenaEvent> {
    match crate::protocol::decode(text) {
        Ok(msg) => Some(msg.into()),
        Err(e) => {
            log::warn!("[events] ignoring frame: {}", e);
            None
        }
    }
}
