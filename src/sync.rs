//! Equipment synchronization with the authoritative server.
//!
//! ## Outbound
//!
//! A dirty [`EquipmentStore`] owes the server an `updateInventory` message.
//! [`flush_equipment`] is called right after a discrete user action (drop,
//! pickup), never from the per-frame path, so sends are naturally debounced.
//!
//! ## Inbound
//!
//! Snapshots are gated by sequence number.  A snapshot older than the last
//! applied one is discarded whole; anything else replaces the world cache and,
//! when it carries the local player, overwrites the equipment store
//! (server wins, no conflict error).
//!
//! ```text
//! snapshot(seq) ──► SyncState::admit ──stale──► dropped
//!                          │
//!                          ▼
//!                WorldCache::replace
//!                          │ own record present?
//!                          ▼
//!          EquipmentStore::apply_authoritative
//! ```

use std::collections::BTreeSet;

use crate::cache::{WorldCache, WorldSnapshot};
use crate::connection::Connection;
use crate::equipment::{ContainerId, EquipmentStore};
use crate::error::{ActionError, ConnectionError, EquipmentError};
use crate::protocol::{container_to_wire, ClientMessage, SnapshotRecord};

/// Number of inventory items a combine consumes.
pub const COMBINE_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Sequence gate
// ---------------------------------------------------------------------------

/// Outcome of offering a snapshot to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Apply, stamped with this sequence number.
    Apply(u64),
    /// Older than `last`; drop it.
    Stale { seq: u64, last: u64 },
}

#[derive(Debug, Default, Clone)]
pub struct SyncState {
    last_applied: Option<u64>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Decide whether a snapshot carrying `seq` may be applied.
    ///
    /// Snapshots without a sequence number are ordered by arrival and get
    /// one past the last applied.  Equal sequence numbers are re-applied.
    pub fn admit(&mut self, seq: Option<u64>) -> Admission {
        let seq = match (seq, self.last_applied) {
            (Some(seq), _) => seq,
            (None, Some(last)) => last.saturating_add(1),
            (None, None) => 0,
        };
        if let Some(last) = self.last_applied {
            if seq < last {
                return Admission::Stale { seq, last };
            }
        }
        self.last_applied = Some(seq);
        Admission::Apply(seq)
    }

    /// Forget ordering history (new session).
    pub fn reset(&mut self) {
        self.last_applied = None;
    }

    /// Gate, ingest and apply one snapshot.
    ///
    /// Returns the admission verdict; on `Apply` the cache has been replaced
    /// and, if `local_player` is in the snapshot, the store overwritten.
    pub fn ingest(
        &mut self,
        record: SnapshotRecord,
        local_player: Option<&str>,
        cache: &mut WorldCache,
        store: &mut EquipmentStore,
    ) -> Admission {
        let verdict = self.admit(record.seq);
        match verdict {
            Admission::Stale { seq, last } => {
                log::debug!("[sync] discarding stale snapshot {} (last applied {})", seq, last);
            }
            Admission::Apply(seq) => {
                let snapshot = WorldSnapshot::from_record(record, seq);
                if let Some(me) = local_player.and_then(|id| snapshot.players.get(id)) {
                    store.apply_authoritative(&me.hotbar, &me.inventory);
                }
                cache.replace(snapshot);
            }
        }
        verdict
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Build the `updateInventory` message for the store's current contents.
pub fn equipment_message(store: &EquipmentStore) -> ClientMessage {
    ClientMessage::UpdateInventory {
        hotbar: container_to_wire(store.hotbar()),
        inventory: container_to_wire(store.inventory()),
    }
}

/// Send the store if it is dirty, then mark it clean.
///
/// Returns whether a message was sent.  On send failure the store stays
/// dirty so the next action retries.
pub fn flush_equipment<C: Connection + ?Sized>(
    store: &mut EquipmentStore,
    conn: &mut C,
) -> Result<bool, ConnectionError> {
    if !store.is_dirty() {
        return Ok(false);
    }
    conn.send(&equipment_message(store))?;
    store.mark_clean();
    Ok(true)
}

/// Validate a combine selection and build the request.
///
/// The server decides the outcome and reports it only through the next
/// snapshot; nothing local changes here.
pub fn combine_request(
    selection: &BTreeSet<usize>,
    inventory_capacity: usize,
) -> Result<ClientMessage, ActionError> {
    if let Some(&slot) = selection.iter().find(|&&i| i >= inventory_capacity) {
        return Err(EquipmentError::SlotOutOfBounds {
            container: ContainerId::Inventory,
            slot,
            capacity: inventory_capacity,
        }
        .into());
    }
    let picked: Vec<usize> = selection.iter().copied().collect();
    match picked[..] {
        [a, b, c] => Ok(ClientMessage::CombinePetals { indices: [a, b, c] }),
        _ => Err(ActionError::CombineSelection {
            selected: picked.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
