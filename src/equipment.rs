//! `EquipmentStore`: the local player's hotbar and inventory.
//!
//! Two fixed-capacity, slot-addressed containers.  Slot indices are stable:
//! a move changes which slot holds an item, never the numbering of the
//! others.  Every successful mutation marks the store dirty; the sync layer
//! clears the flag once the new state has been sent.

use std::collections::HashMap;

use crate::error::EquipmentError;
use crate::types::{orbit_angle, Petal};

// ---------------------------------------------------------------------------
// Container identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Hotbar,
    Inventory,
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hotbar => f.write_str("hotbar"),
            Self::Inventory => f.write_str("inventory"),
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentStore {
    hotbar: Vec<Option<Petal>>,
    inventory: Vec<Option<Petal>>,
    dirty: bool,
}

impl EquipmentStore {
    pub fn new(hotbar_capacity: usize, inventory_capacity: usize) -> Self {
        Self {
            hotbar: vec![None; hotbar_capacity],
            inventory: vec![None; inventory_capacity],
            dirty: false,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn hotbar(&self) -> &[Option<Petal>] {
        &self.hotbar
    }

    pub fn inventory(&self) -> &[Option<Petal>] {
        &self.inventory
    }

    pub fn container(&self, id: ContainerId) -> &[Option<Petal>] {
        match id {
            ContainerId::Hotbar => &self.hotbar,
            ContainerId::Inventory => &self.inventory,
        }
    }

    pub fn get(&self, id: ContainerId, slot: usize) -> Option<&Petal> {
        self.container(id).get(slot).and_then(Option::as_ref)
    }

    pub fn capacity(&self, id: ContainerId) -> usize {
        self.container(id).len()
    }

    /// Items across both containers.
    pub fn item_count(&self) -> usize {
        self.hotbar
            .iter()
            .chain(self.inventory.iter())
            .filter(|s| s.is_some())
            .count()
    }

    /// Equipped (hotbar) items in slot order.
    pub fn equipped(&self) -> impl Iterator<Item = &Petal> {
        self.hotbar.iter().flatten()
    }

    pub fn first_free_inventory_slot(&self) -> Option<usize> {
        self.inventory.iter().position(Option::is_none)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Relocate the item at `(from, from_slot)` into the empty slot
    /// `(to, to_slot)`.
    ///
    /// Rejected without touching either container if an index is out of
    /// bounds, the source is empty, or the destination is occupied.
    pub fn move_item(
        &mut self,
        from: ContainerId,
        from_slot: usize,
        to: ContainerId,
        to_slot: usize,
    ) -> Result<(), EquipmentError> {
        self.check_bounds(from, from_slot)?;
        self.check_bounds(to, to_slot)?;

        if self.get(to, to_slot).is_some() {
            return Err(EquipmentError::SlotOccupied {
                container: to,
                slot: to_slot,
            });
        }
        if self.get(from, from_slot).is_none() {
            return Err(EquipmentError::EmptySource {
                container: from,
                slot: from_slot,
            });
        }

        // Both checks passed, so the take/put pair cannot half-apply.
        let item = self.slot_mut(from, from_slot).take();
        *self.slot_mut(to, to_slot) = item;
        self.dirty = true;
        Ok(())
    }

    /// Put `petal` in the lowest-index free inventory slot.
    ///
    /// Returns the slot used.
    pub fn pick_up(&mut self, petal: Petal) -> Result<usize, EquipmentError> {
        let slot = self
            .first_free_inventory_slot()
            .ok_or(EquipmentError::InventoryFull)?;
        self.inventory[slot] = Some(petal);
        self.dirty = true;
        Ok(slot)
    }

    /// Replace both containers with the server's view (server wins).
    ///
    /// Only `orbit_angle` survives, carried over by item identity.  Server
    /// data longer than the local capacity is truncated; shorter data is
    /// padded with empty slots.
    pub fn apply_authoritative(
        &mut self,
        server_hotbar: &[Option<Petal>],
        server_inventory: &[Option<Petal>],
    ) {
        let phases: HashMap<&str, f32> = self
            .hotbar
            .iter()
            .chain(self.inventory.iter())
            .flatten()
            .map(|p| (p.id.as_str(), p.orbit_angle))
            .collect();

        let hotbar = rebuild(server_hotbar, self.hotbar.len(), &phases);
        let inventory = rebuild(server_inventory, self.inventory.len(), &phases);

        if server_hotbar.len() > self.hotbar.len()
            || server_inventory.len() > self.inventory.len()
        {
            log::warn!(
                "[equipment] server sent {}/{} slots, local capacity is {}/{}; truncating",
                server_hotbar.len(),
                server_inventory.len(),
                self.hotbar.len(),
                self.inventory.len()
            );
        }

        self.hotbar = hotbar;
        self.inventory = inventory;
        self.dirty = true;
    }

    /// Spread equipped items evenly around `base_phase`.
    ///
    /// Broken items keep their place in the ring; empty slots are skipped.
    pub fn assign_orbit_phases(&mut self, base_phase: f32) {
        let active = self.hotbar.iter().filter(|s| s.is_some()).count();
        for (i, petal) in self.hotbar.iter_mut().flatten().enumerate() {
            petal.orbit_angle = orbit_angle(base_phase, i, active);
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_bounds(&self, id: ContainerId, slot: usize) -> Result<(), EquipmentError> {
        let capacity = self.capacity(id);
        if slot >= capacity {
            return Err(EquipmentError::SlotOutOfBounds {
                container: id,
                slot,
                capacity,
            });
        }
        Ok(())
    }

    fn slot_mut(&mut self, id: ContainerId, slot: usize) -> &mut Option<Petal> {
        match id {
            ContainerId::Hotbar => &mut self.hotbar[slot],
            ContainerId::Inventory => &mut self.inventory[slot],
        }
    }
}

fn rebuild(
    server: &[Option<Petal>],
    capacity: usize,
    phases: &HashMap<&str, f32>,
) -> Vec<Option<Petal>> {
    let mut out: Vec<Option<Petal>> = server
        .iter()
        .take(capacity)
        .map(|slot| {
            slot.as_ref().map(|p| {
                let mut p = p.clone();
                if let Some(angle) = phases.get(p.id.as_str()) {
                    p.orbit_angle = *angle;
                }
                p
            })
        })
        .collect();
    out.resize(capacity, None);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
