//! Arena wire protocol.
//!
//! This module owns **every message that crosses the socket** between the
//! client and the arena server, plus the ingestion step that turns loosely
//! populated server records into the fully defaulted types in [`crate::types`].
//!
//! ## Message directions
//!
//! | `type`                            | Direction        | Payload                    |
//! |-----------------------------------|------------------|----------------------------|
//! | `join`                            | client → server  | `{name}`                   |
//! | `move` / `moveIntent`             | client → server  | `{x,y}` / `{dx,dy}`        |
//! | `updateInventory`                 | client → server  | `{hotbar, inventory}`      |
//! | `combinePetals`                   | client → server  | `{indices:[a,b,c]}`        |
//! | `setName`                         | client → server  | `{name}`                   |
//! | `chat`                            | both             | `{message}` / `{from,message}` |
//! | `attackTick`                      | client → server  | `{}`                       |
//! | `welcome` (`init`)                | server → client  | `{id}`                     |
//! | `update` (`state`)                | server → client  | full world snapshot        |
//! | `respawn`                         | server → client  | `{}`                       |
//!
//! ## Design rules
//!
//! 1. Every message is a JSON object tagged by `type`, camelCase fields.
//! 2. Optional server fields are defaulted **once**, here, at ingestion.
//! 3. Ids may arrive as strings or numbers; they are always strings locally.
//! 4. Client-derived visual state (orbit phase) never goes on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::error::ConnectionError;
use crate::types::{GroundItem, Hostile, HostileKind, Petal, PetalKind, Player, Vec2};

// ---------------------------------------------------------------------------
// Ingestion defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_HP: f32 = 100.0;
pub const DEFAULT_ORBIT_RADIUS: f32 = 60.0;
pub const DEFAULT_ORBIT_SPEED: f32 = 1.0;
pub const DEFAULT_HOSTILE_SIZE: f32 = 20.0;
pub const DEFAULT_PETAL_TIER: u32 = 1;
pub const DEFAULT_PETAL_HP: f32 = 1.0;

fn default_orbit_radius() -> f32 {
    DEFAULT_ORBIT_RADIUS
}

fn default_orbit_speed() -> f32 {
    DEFAULT_ORBIT_SPEED
}

fn default_hostile_size() -> f32 {
    DEFAULT_HOSTILE_SIZE
}

fn default_tier() -> u32 {
    DEFAULT_PETAL_TIER
}

/// `hp`/`maxHp` pair with the documented fallbacks applied.
fn health(hp: Option<f32>, max_hp: Option<f32>) -> (f32, f32) {
    let max_hp = max_hp.unwrap_or(DEFAULT_MAX_HP);
    (hp.unwrap_or(max_hp), max_hp)
}

// ---------------------------------------------------------------------------
// Id handling
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Str(String),
    Num(serde_json::Number),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Str(s) => s,
            IdRepr::Num(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    IdRepr::deserialize(d).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(d)?.map(String::from))
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Integer view of a JSON number. The server only has doubles, so `2.0` and
/// `12.5` both show up; fractions truncate. Negative, non-finite or
/// oversized values read as absent.
fn lenient_integer(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn de_count_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    Ok(Option::<serde_json::Number>::deserialize(d)?
        .as_ref()
        .and_then(lenient_integer)
        .and_then(|v| T::try_from(v).ok()))
}

fn de_count<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    Ok(de_count_opt(d)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Item record
// ---------------------------------------------------------------------------

/// An item as it appears on the wire, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetalRecord {
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: PetalKind,
    #[serde(default = "default_tier", deserialize_with = "de_count")]
    pub tier: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f32>,
    #[serde(default)]
    pub broken: bool,
}

impl Default for PetalRecord {
    fn default() -> Self {
        Self {
            id: None,
            kind: PetalKind::default(),
            tier: DEFAULT_PETAL_TIER,
            hp: None,
            broken: false,
        }
    }
}

impl PetalRecord {
    /// Ingest, using `fallback_id` when the server sent no identity.
    pub fn into_petal(self, fallback_id: impl FnOnce() -> String) -> Petal {
        let hp = if self.broken {
            0.0
        } else {
            self.hp.unwrap_or(DEFAULT_PETAL_HP)
        };
        Petal {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(fallback_id),
            kind: self.kind,
            tier: self.tier.max(1),
            hp,
            orbit_angle: 0.0,
        }
    }
}

impl From<&Petal> for PetalRecord {
    fn from(petal: &Petal) -> Self {
        Self {
            id: Some(petal.id.clone()),
            kind: petal.kind.clone(),
            tier: petal.tier,
            hp: Some(petal.hp),
            broken: petal.is_broken(),
        }
    }
}

/// Slot-indexed container for the wire: `null` marks an empty slot.
pub fn container_to_wire(slots: &[Option<Petal>]) -> Vec<Option<PetalRecord>> {
    slots.iter().map(|s| s.as_ref().map(PetalRecord::from)).collect()
}

fn container_from_wire(
    slots: Vec<Option<PetalRecord>>,
    owner: &str,
    container: &str,
) -> Vec<Option<Petal>> {
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.map(|r| r.into_petal(|| format!("{owner}:{container}:{i}"))))
        .collect()
}

// ---------------------------------------------------------------------------
// World records (server → client)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub hp: Option<f32>,
    #[serde(default)]
    pub max_hp: Option<f32>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub retracting: bool,
    #[serde(default = "default_orbit_radius")]
    pub orbit_radius: f32,
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,
    #[serde(default, deserialize_with = "de_count")]
    pub level: u32,
    #[serde(default, deserialize_with = "de_count")]
    pub xp: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub coins: u64,
    #[serde(default, deserialize_with = "de_count_opt")]
    pub petal_slots: Option<usize>,
    #[serde(default, alias = "petals")]
    pub hotbar: Vec<Option<PetalRecord>>,
    #[serde(default)]
    pub inventory: Vec<Option<PetalRecord>>,
}

impl PlayerRecord {
    pub fn into_player(self) -> Player {
        let (hp, max_hp) = health(self.hp, self.max_hp);
        let petal_slots = self.petal_slots.unwrap_or(self.hotbar.len());
        let hotbar = container_from_wire(self.hotbar, &self.id, "hotbar");
        let inventory = container_from_wire(self.inventory, &self.id, "inventory");
        Player {
            name: self.name,
            position: Vec2::new(self.x, self.y),
            hp,
            max_hp,
            dead: self.dead,
            retracting: self.retracting,
            orbit_radius: self.orbit_radius,
            orbit_speed: self.orbit_speed,
            level: self.level,
            xp: self.xp,
            coins: self.coins,
            petal_slots,
            hotbar,
            inventory,
            id: self.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostileRecord {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: HostileKind,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_hostile_size")]
    pub size: f32,
    #[serde(default)]
    pub hp: Option<f32>,
    #[serde(default)]
    pub max_hp: Option<f32>,
    #[serde(default)]
    pub dead: bool,
}

impl HostileRecord {
    pub fn into_hostile(self) -> Hostile {
        let (hp, max_hp) = health(self.hp, self.max_hp);
        Hostile {
            id: self.id,
            kind: self.kind,
            position: Vec2::new(self.x, self.y),
            size: self.size,
            hp,
            max_hp,
            dead: self.dead,
        }
    }
}

/// Hostiles arrive either as an array (`enemies`) or keyed by id (`mobs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostileList {
    List(Vec<HostileRecord>),
    Map(HashMap<String, HostileRecord>),
}

impl Default for HostileList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl HostileList {
    /// Flatten to records; map keys or list positions stand in for missing ids.
    pub fn into_records(self) -> Vec<HostileRecord> {
        match self {
            Self::List(v) => v
                .into_iter()
                .enumerate()
                .map(|(i, mut rec)| {
                    if rec.id.is_empty() {
                        rec.id = format!("hostile:{i}");
                    }
                    rec
                })
                .collect(),
            Self::Map(m) => m
                .into_iter()
                .map(|(key, mut rec)| {
                    if rec.id.is_empty() {
                        rec.id = key;
                    }
                    rec
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundItemRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, alias = "item")]
    pub petal: PetalRecord,
}

impl GroundItemRecord {
    pub fn into_ground_item(self) -> GroundItem {
        let id = self.id;
        let petal = self.petal.into_petal(|| id.clone());
        GroundItem {
            position: Vec2::new(self.x, self.y),
            petal,
            id,
        }
    }
}

/// Full world snapshot (`update` / `state`).
///
/// `seq` orders snapshots; when the server omits it the client assigns one
/// in arrival order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    #[serde(
        default,
        alias = "tick",
        deserialize_with = "de_count_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub seq: Option<u64>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default, alias = "mobs")]
    pub enemies: HostileList,
    #[serde(default)]
    pub ground_items: Vec<GroundItemRecord>,
}

// ---------------------------------------------------------------------------
// Top-level messages
// ---------------------------------------------------------------------------

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join {
        name: String,
    },
    /// Client-predicted position report.
    Move {
        x: f32,
        y: f32,
        #[serde(default)]
        retract: bool,
    },
    /// Unit direction for the server to resolve.
    MoveIntent {
        dx: f32,
        dy: f32,
        #[serde(default)]
        retract: bool,
    },
    #[serde(alias = "updatePetals")]
    UpdateInventory {
        hotbar: Vec<Option<PetalRecord>>,
        inventory: Vec<Option<PetalRecord>>,
    },
    CombinePetals {
        indices: [usize; 3],
    },
    SetName {
        name: String,
    },
    Chat {
        message: String,
    },
    AttackTick,
}

impl ClientMessage {
    /// Wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Move { .. } => "move",
            Self::MoveIntent { .. } => "moveIntent",
            Self::UpdateInventory { .. } => "updateInventory",
            Self::CombinePetals { .. } => "combinePetals",
            Self::SetName { .. } => "setName",
            Self::Chat { .. } => "chat",
            Self::AttackTick => "attackTick",
        }
    }

    /// True for the per-tick movement messages.
    pub fn is_movement(&self) -> bool {
        matches!(self, Self::Move { .. } | Self::MoveIntent { .. })
    }
}

/// Messages the server sends to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(alias = "init")]
    Welcome {
        #[serde(deserialize_with = "de_id")]
        id: String,
    },
    #[serde(alias = "state")]
    Update(SnapshotRecord),
    Chat {
        #[serde(default)]
        from: String,
        message: String,
    },
    Respawn,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

pub fn encode(msg: &ClientMessage) -> Result<String, ConnectionError> {
    Ok(serde_json::to_string(msg)?)
}

/// Decode one text frame.  Unknown `type`s and malformed JSON are errors;
/// callers log and drop them.
pub fn decode(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
