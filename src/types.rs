//! Core records shared across all modules.
//!
//! Everything in here is the *ingested* form of server data: optional wire
//! fields have already been defaulted by the protocol layer, so render and
//! equipment code never has to guess.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Unit-length copy; the zero vector stays zero.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::zero()
        }
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    pub fn add(self, other: Vec2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Point at `radius` along `angle` (radians) from `self`.
    pub fn polar_offset(self, radius: f32, angle: f32) -> Self {
        Self::new(self.x + radius * angle.cos(), self.y + radius * angle.sin())
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Items ("petals")
// ---------------------------------------------------------------------------

/// Enumerated item kind.  Unknown kinds from the server are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetalKind {
    #[default]
    Basic,
    Rock,
    Fire,
    Ice,
    Poison,
    Electric,
    Shield,
    #[serde(untagged)]
    Other(String),
}

impl PetalKind {
    /// Fill colour used when drawing the item.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Basic => "#fff",
            Self::Rock => "#888",
            Self::Fire => "#f55",
            Self::Ice => "#5af",
            Self::Poison => "#5f5",
            Self::Electric => "#ffea00",
            Self::Shield => "#a5a",
            Self::Other(_) => "#aaa",
        }
    }
}

/// One equip-able item.
///
/// `orbit_angle` is client-derived visual state; it is never sent to the
/// server and survives authoritative replacement by identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Petal {
    pub id: String,
    pub kind: PetalKind,
    pub tier: u32,
    /// Durability.  Zero means broken: still equipped, but inert.
    pub hp: f32,
    pub orbit_angle: f32,
}

impl Petal {
    pub fn new(id: impl Into<String>, kind: PetalKind, tier: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            tier,
            hp: 1.0,
            orbit_angle: 0.0,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.hp <= 0.0
    }

    /// Draw radius grows with tier.
    pub fn draw_radius(&self) -> f32 {
        10.0 + (self.tier.max(1) - 1) as f32 * 4.0
    }
}

/// Even angular placement of `index` among `active` orbiting items.
///
/// `active` is clamped to at least 1 so an empty hotbar never divides by zero.
pub fn orbit_angle(base_phase: f32, index: usize, active: usize) -> f32 {
    let count = active.max(1) as f32;
    base_phase + index as f32 * (TAU / count)
}

/// One player's ring phase in `[0, 2π)`.
///
/// `shared_phase` is never wrapped; scaling happens first so a fractional
/// `orbit_speed` still rotates smoothly.
pub fn ring_phase(shared_phase: f64, orbit_speed: f32) -> f32 {
    (shared_phase * f64::from(orbit_speed)).rem_euclid(std::f64::consts::TAU) as f32
}

// ---------------------------------------------------------------------------
// World records (server-owned)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: Option<String>,
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub dead: bool,
    pub retracting: bool,
    pub orbit_radius: f32,
    pub orbit_speed: f32,
    pub level: u32,
    pub xp: u64,
    pub coins: u64,
    pub petal_slots: usize,
    /// Server's view of the hotbar, slot-indexed.
    pub hotbar: Vec<Option<Petal>>,
    /// Server's view of the inventory, slot-indexed.
    pub inventory: Vec<Option<Petal>>,
}

impl Player {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("Anonymous")
    }
}

/// Hostile visual kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostileKind {
    #[default]
    Wanderer,
    Chaser,
    Spinner,
    Miniboss,
    #[serde(untagged)]
    Other(String),
}

impl HostileKind {
    pub fn color(&self) -> &'static str {
        match self {
            Self::Wanderer => "#ff0",
            Self::Chaser => "#f90",
            Self::Spinner => "#f0f",
            Self::Miniboss => "#f00",
            Self::Other(_) => "#999",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hostile {
    pub id: String,
    pub kind: HostileKind,
    pub position: Vec2,
    pub size: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub dead: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundItem {
    pub id: String,
    pub position: Vec2,
    pub petal: Petal,
}

/// Fraction of a health bar to fill, clamped to `[0, 1]`.
pub fn health_fraction(hp: f32, max_hp: f32) -> f32 {
    if max_hp <= 0.0 || !hp.is_finite() {
        return 0.0;
    }
    (hp / max_hp).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientStats {
    pub frames: u64,
    pub snapshots_applied: u64,
    pub snapshots_discarded: u64,
    pub messages_sent: u64,
    pub pickups: u64,
    pub last_seq: Option<u64>,
}

/// Who resolves the local player's position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Send a unit direction each tick; the server moves the player.
    #[default]
    Intent,
    /// Integrate position locally and report it each tick.
    Predicted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket URL of the arena server.
    pub endpoint: String,
    /// Name sent with `join`.
    pub player_name: String,
    pub hotbar_capacity: usize,
    pub inventory_capacity: usize,
    /// Ground items closer than this are picked up.
    pub pickup_radius: f32,
    pub movement_mode: MovementMode,
    /// World units per second in predicted mode.
    pub move_speed: f32,
    /// Radians per second added to the shared orbit phase.
    pub orbit_speed: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub frame_rate_hz: f32,
    pub attack_tick_interval_ms: u64,
    pub chat_history: usize,
    pub map_size: f32,
    pub safe_zone_radius: f32,
    /// Inbound events buffered before the bridge drops (back-pressure).
    pub event_buffer: usize,
    /// Outbound messages buffered before sends are refused.
    pub intent_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080".into(),
            player_name: "Anonymous".into(),
            hotbar_capacity: 5,
            inventory_capacity: 10,
            pickup_radius: 30.0,
            movement_mode: MovementMode::Intent,
            move_speed: 200.0,
            orbit_speed: 2.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            frame_rate_hz: 60.0,
            attack_tick_interval_ms: 250,
            chat_history: 50,
            map_size: 3000.0,
            safe_zone_radius: 200.0,
            event_buffer: 1024,
            intent_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_zero_and_scales_diagonals() {
        assert_eq!(Vec2::zero().normalized(), Vec2::zero());
        let d = Vec2::new(1.0, -1.0).normalized();
        assert!((d.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orbit_angles_are_evenly_spaced() {
        for n in 1..=8usize {
            let angles: Vec<f32> = (0..n).map(|i| orbit_angle(0.5, i, n)).collect();
            for w in angles.windows(2) {
                assert!((w[1] - w[0] - TAU / n as f32).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn orbit_angle_with_no_active_items_is_finite() {
        assert!(orbit_angle(1.0, 0, 0).is_finite());
        assert_eq!(orbit_angle(1.0, 0, 0), 1.0);
    }

    #[test]
    fn ring_phase_scales_before_wrapping() {
        let just_past_wrap = std::f64::consts::TAU + 0.1;
        assert!((ring_phase(just_past_wrap, 1.0) - 0.1).abs() < 1e-5);
        // 1.5 * (2π + 0.1) wraps to π + 0.15, not 1.5 * 0.1.
        let expected = std::f32::consts::PI + 0.15;
        assert!((ring_phase(just_past_wrap, 1.5) - expected).abs() < 1e-5);
        assert!((0.0..TAU).contains(&ring_phase(-1.0, 1.0)));
    }

    #[test]
    fn health_fraction_is_clamped() {
        assert_eq!(health_fraction(150.0, 100.0), 1.0);
        assert_eq!(health_fraction(-5.0, 100.0), 0.0);
        assert_eq!(health_fraction(10.0, 0.0), 0.0);
        assert!((health_fraction(25.0, 100.0) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_kinds_round_trip_verbatim() {
        let k: PetalKind = serde_json::from_str("\"laser\"").unwrap();
        assert_eq!(k, PetalKind::Other("laser".into()));
        assert_eq!(k.color(), "#aaa");
        let k: PetalKind = serde_json::from_str("\"fire\"").unwrap();
        assert_eq!(k, PetalKind::Fire);
    }

    #[test]
    fn broken_petal_and_tier_radius() {
        let mut p = Petal::new("a", PetalKind::Rock, 3);
        assert!(!p.is_broken());
        assert_eq!(p.draw_radius(), 18.0);
        p.hp = 0.0;
        assert!(p.is_broken());
    }
}
