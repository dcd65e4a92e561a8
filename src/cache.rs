//! `WorldCache`: local mirror of the latest authoritative world snapshot.
//!
//! The server is the only writer.  Each snapshot replaces the previous one
//! wholesale; there is no per-entity patching.  The one local mutation is the
//! optimistic removal of a ground item the player just picked up, which the
//! next snapshot confirms or reverts.

use std::collections::HashMap;

use crate::protocol::SnapshotRecord;
use crate::types::{GroundItem, Hostile, Player, Vec2};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One ingested, sequence-stamped world state.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub seq: u64,
    pub players: HashMap<String, Player>,
    pub hostiles: HashMap<String, Hostile>,
    pub ground_items: HashMap<String, GroundItem>,
}

impl WorldSnapshot {
    /// Ingest a wire snapshot, stamping it with `seq`.
    pub fn from_record(record: SnapshotRecord, seq: u64) -> Self {
        let players = record
            .players
            .into_iter()
            .map(|r| {
                let p = r.into_player();
                (p.id.clone(), p)
            })
            .collect();
        let hostiles = record
            .enemies
            .into_records()
            .into_iter()
            .map(|r| {
                let h = r.into_hostile();
                (h.id.clone(), h)
            })
            .collect();
        let ground_items = record
            .ground_items
            .into_iter()
            .map(|r| {
                let g = r.into_ground_item();
                (g.id.clone(), g)
            })
            .collect();
        Self {
            seq,
            players,
            hostiles,
            ground_items,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Local world state mirror.  Only ever touched between frames on the frame
/// loop's thread, so no locking.
#[derive(Debug, Default)]
pub struct WorldCache {
    current: WorldSnapshot,
}

impl WorldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swap in `snapshot`.  Readers see either the old maps or
    /// the new ones, never a mix.
    pub fn replace(&mut self, snapshot: WorldSnapshot) {
        self.current = snapshot;
    }

    pub fn seq(&self) -> u64 {
        self.current.seq
    }

    pub fn players(&self) -> &HashMap<String, Player> {
        &self.current.players
    }

    pub fn hostiles(&self) -> &HashMap<String, Hostile> {
        &self.current.hostiles
    }

    pub fn ground_items(&self) -> &HashMap<String, GroundItem> {
        &self.current.ground_items
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.current.players.get(id)
    }

    /// Mutable access for client-predicted movement only.
    pub fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.current.players.get_mut(id)
    }

    /// Ids of ground items within `radius` of `center`, nearest first.
    pub fn ground_items_near(&self, center: Vec2, radius: f32) -> Vec<String> {
        let mut hits: Vec<(f32, &String)> = self
            .current
            .ground_items
            .iter()
            .map(|(id, g)| (g.position.distance(center), id))
            .filter(|(d, _)| *d <= radius)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        hits.into_iter().map(|(_, id)| id.clone()).collect()
    }

    /// Optimistically drop a ground item the local player picked up.
    pub fn take_ground_item(&mut self, id: &str) -> Option<GroundItem> {
        self.current.ground_items.remove(id)
    }

    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    pub fn player_count(&self) -> usize {
        self.current.players.len()
    }
    pub fn hostile_count(&self) -> usize {
        self.current.hostiles.len()
    }
    pub fn ground_item_count(&self) -> usize {
        self.current.ground_items.len()
    }

    /// Reset all state.
    pub fn clear(&mut self) {
        self.current = WorldSnapshot::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Petal, PetalKind};
    use serde_json::json;

    fn record(v: serde_json::Value) -> SnapshotRecord {
        serde_json::from_value(v).unwrap()
    }

    fn ground(id: &str, x: f32, y: f32) -> GroundItem {
        GroundItem {
            id: id.into(),
            position: Vec2::new(x, y),
            petal: Petal::new(id, PetalKind::Basic, 1),
        }
    }

    #[test]
    fn replace_swaps_all_maps() {
        let mut c = WorldCache::new();
        c.replace(WorldSnapshot::from_record(
            record(json!({
                "players": [{"id": "a"}, {"id": "b"}],
                "enemies": [{"id": "e1"}],
                "groundItems": [{"id": "g1"}]
            })),
            1,
        ));
        assert_eq!(c.player_count(), 2);
        assert_eq!(c.hostile_count(), 1);
        assert_eq!(c.ground_item_count(), 1);

        c.replace(WorldSnapshot::from_record(
            record(json!({"players": [{"id": "c"}]})),
            2,
        ));
        assert_eq!(c.seq(), 2);
        assert_eq!(c.player_count(), 1);
        assert!(c.player("a").is_none());
        assert_eq!(c.hostile_count(), 0);
        assert_eq!(c.ground_item_count(), 0);
    }

    #[test]
    fn ground_items_near_sorts_by_distance() {
        let mut snap = WorldSnapshot::default();
        for g in [ground("far", 25.0, 0.0), ground("near", 5.0, 0.0), ground("out", 31.0, 0.0)] {
            snap.ground_items.insert(g.id.clone(), g);
        }
        let mut c = WorldCache::new();
        c.replace(snap);

        assert_eq!(c.ground_items_near(Vec2::zero(), 30.0), vec!["near", "far"]);
    }

    #[test]
    fn take_ground_item_removes_once() {
        let mut snap = WorldSnapshot::default();
        snap.ground_items.insert("g".into(), ground("g", 0.0, 0.0));
        let mut c = WorldCache::new();
        c.replace(snap);

        assert!(c.take_ground_item("g").is_some());
        assert!(c.take_ground_item("g").is_none());
        assert_eq!(c.ground_item_count(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut c = WorldCache::new();
        c.replace(WorldSnapshot::from_record(
            record(json!({"players": [{"id": "a"}]})),
            42,
        ));
        c.clear();
        assert_eq!(c.player_count(), 0);
        assert_eq!(c.seq(), 0);
    }
}
