//! Interaction layer: held keys, drag/drop between containers, and slot
//! selection.
//!
//! Platform front-ends translate their pointer/keyboard callbacks into
//! [`InputEvent`]s and queue them; the client drains the queue once per
//! frame, so input never interleaves with a tick.

use std::collections::BTreeSet;

use crate::equipment::ContainerId;
use crate::types::Vec2;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Retract,
}

impl Key {
    /// Map a key name (`"w"`, `"ArrowUp"`, …) to a game key.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" | "w" => Some(Self::Up),
            "ArrowDown" | "s" => Some(Self::Down),
            "ArrowLeft" | "a" => Some(Self::Left),
            "ArrowRight" | "d" => Some(Self::Right),
            "r" => Some(Self::Retract),
            _ => None,
        }
    }
}

/// Address of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub container: ContainerId,
    pub slot: usize,
}

impl SlotRef {
    pub fn hotbar(slot: usize) -> Self {
        Self {
            container: ContainerId::Hotbar,
            slot,
        }
    }

    pub fn inventory(slot: usize) -> Self {
        Self {
            container: ContainerId::Inventory,
            slot,
        }
    }
}

/// One structured user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    DragStart(SlotRef),
    Drop(SlotRef),
    Select(SlotRef),
    Combine,
    SetName(String),
    Chat(String),
}

// ---------------------------------------------------------------------------
// Held keys
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeldKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub retract: bool,
}

impl HeldKeys {
    pub fn set(&mut self, key: Key, held: bool) {
        match key {
            Key::Up => self.up = held,
            Key::Down => self.down = held,
            Key::Left => self.left = held,
            Key::Right => self.right = held,
            Key::Retract => self.retract = held,
        }
    }

    /// Unit movement direction; zero when nothing (or opposites) is held.
    pub fn direction(&self) -> Vec2 {
        let mut v = Vec2::zero();
        if self.up {
            v.y -= 1.0;
        }
        if self.down {
            v.y += 1.0;
        }
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        v.normalized()
    }
}

// ---------------------------------------------------------------------------
// Interaction state
// ---------------------------------------------------------------------------

/// A move the store should perform after a cross-container drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: SlotRef,
    pub to: SlotRef,
}

#[derive(Debug, Default, Clone)]
pub struct Interaction {
    pub keys: HeldKeys,
    pending: Option<SlotRef>,
    selected_inventory: BTreeSet<usize>,
    selected_hotbar: Option<usize>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_start(&mut self, source: SlotRef) {
        self.pending = Some(source);
    }

    /// Finish a drag on `target`.
    ///
    /// Only a drop into the *other* container yields a transfer; same
    /// container drops and drops without a drag are ignored.  The pending
    /// source is consumed either way.
    pub fn drop_on(&mut self, target: SlotRef) -> Option<Transfer> {
        let source = self.pending.take()?;
        (source.container != target.container).then_some(Transfer {
            from: source,
            to: target,
        })
    }

    pub fn pending(&self) -> Option<SlotRef> {
        self.pending
    }

    /// Toggle inventory membership; hotbar selection is exclusive.
    pub fn select(&mut self, slot: SlotRef) {
        match slot.container {
            ContainerId::Inventory => {
                if !self.selected_inventory.remove(&slot.slot) {
                    self.selected_inventory.insert(slot.slot);
                }
            }
            ContainerId::Hotbar => {
                self.selected_hotbar = if self.selected_hotbar == Some(slot.slot) {
                    None
                } else {
                    Some(slot.slot)
                };
            }
        }
    }

    pub fn selected_inventory(&self) -> &BTreeSet<usize> {
        &self.selected_inventory
    }

    pub fn selected_hotbar(&self) -> Option<usize> {
        self.selected_hotbar
    }

    pub fn clear_inventory_selection(&mut self) {
        self.selected_inventory.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_container_drop_yields_transfer() {
        let mut i = Interaction::new();
        i.drag_start(SlotRef::inventory(2));
        assert_eq!(
            i.drop_on(SlotRef::hotbar(1)),
            Some(Transfer {
                from: SlotRef::inventory(2),
                to: SlotRef::hotbar(1)
            })
        );
        assert!(i.pending().is_none());
    }

    #[test]
    fn same_container_drop_is_ignored_and_consumes_source() {
        let mut i = Interaction::new();
        i.drag_start(SlotRef::inventory(2));
        assert!(i.drop_on(SlotRef::inventory(5)).is_none());
        assert!(i.pending().is_none());
    }

    #[test]
    fn drop_without_drag_is_ignored() {
        let mut i = Interaction::new();
        assert!(i.drop_on(SlotRef::hotbar(0)).is_none());
    }

    #[test]
    fn inventory_selection_toggles() {
        let mut i = Interaction::new();
        i.select(SlotRef::inventory(1));
        i.select(SlotRef::inventory(3));
        i.select(SlotRef::inventory(1));
        assert_eq!(i.selected_inventory().iter().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn hotbar_selection_is_exclusive() {
        let mut i = Interaction::new();
        i.select(SlotRef::hotbar(0));
        i.select(SlotRef::hotbar(2));
        assert_eq!(i.selected_hotbar(), Some(2));
        i.select(SlotRef::hotbar(2));
        assert_eq!(i.selected_hotbar(), None);
    }

    #[test]
    fn direction_is_unit_or_zero() {
        let mut k = HeldKeys::default();
        assert_eq!(k.direction(), Vec2::zero());

        k.set(Key::Up, true);
        k.set(Key::Right, true);
        let d = k.direction();
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.x > 0.0 && d.y < 0.0);

        k.set(Key::Right, false);
        k.set(Key::Down, true);
        assert_eq!(k.direction(), Vec2::zero());
    }

    #[test]
    fn key_names_map_to_game_keys() {
        assert_eq!(Key::from_name("w"), Some(Key::Up));
        assert_eq!(Key::from_name("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_name("r"), Some(Key::Retract));
        assert_eq!(Key::from_name("q"), None);
    }
}
