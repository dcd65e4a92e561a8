//! `ArenaClient`: the explicit application state and its frame loop.
//!
//! ## Frame contract
//!
//! ```text
//! frame(dt, renderer)
//!   ├── pump()            drain connection events (between ticks only)
//!   ├── process_inputs()  drain queued InputEvents
//!   └── tick(dt)
//!         1. movement      intent or predicted position, sent every tick
//!         2. orbit phase   shared phase += orbit_speed * dt (never wrapped)
//!         3. camera        local position - viewport / 2
//!         4. draw          Scene::paint
//!         5. pickups       ground items within pickup_radius
//!         6. attackTick    on its own interval
//! ```
//!
//! Steps 1 and 5 are skipped while the local player is absent from the cache
//! (not joined yet, or despawned).  The tick itself never fails.

use std::collections::VecDeque;

use crate::cache::WorldCache;
use crate::connection::Connection;
use crate::equipment::EquipmentStore;
use crate::error::{ActionError, ConnectionError};
use crate::events::ArenaEvent;
use crate::input::{InputEvent, Interaction};
use crate::protocol::{ClientMessage, DEFAULT_ORBIT_SPEED};
use crate::render::{camera_offset, Renderer, Scene};
use crate::sync::{combine_request, flush_equipment, Admission, SyncState};
use crate::types::{ring_phase, ClientConfig, ClientStats, MovementMode, Vec2};

pub const RESPAWN_NOTICE: &str = "You died! Respawning...";

// ---------------------------------------------------------------------------
// Status & UI state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected { reason: String },
    Error { reason: String },
}

impl ConnectionStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Disconnected { .. } => "Disconnected",
            Self::Error { .. } => "Connection error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub from: String,
    pub message: String,
}

/// What one tick did, for callers that want to log or assert on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    /// False when the local player was absent and movement/pickup were skipped.
    pub local_player_present: bool,
    pub movement_sent: bool,
    pub picked_up: Vec<String>,
    pub equipment_sent: bool,
    pub attack_sent: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ArenaClient<C: Connection> {
    config: ClientConfig,
    conn: C,
    store: EquipmentStore,
    cache: WorldCache,
    sync: SyncState,
    interaction: Interaction,
    inputs: VecDeque<InputEvent>,
    player_id: Option<String>,
    name: String,
    status: ConnectionStatus,
    chat: VecDeque<ChatLine>,
    respawn_notice: bool,
    notice: Option<String>,
    phase: f64,
    camera: Vec2,
    attack_elapsed: f32,
    stats: ClientStats,
}

impl<C: Connection> ArenaClient<C> {
    pub fn new(config: ClientConfig, conn: C) -> Self {
        let store = EquipmentStore::new(config.hotbar_capacity, config.inventory_capacity);
        let name = config.player_name.clone();
        Self {
            config,
            conn,
            store,
            cache: WorldCache::new(),
            sync: SyncState::new(),
            interaction: Interaction::new(),
            inputs: VecDeque::new(),
            player_id: None,
            name,
            status: ConnectionStatus::Connecting,
            chat: VecDeque::new(),
            respawn_notice: false,
            notice: None,
            phase: 0.0,
            camera: Vec2::zero(),
            attack_elapsed: 0.0,
            stats: ClientStats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn equipment(&self) -> &EquipmentStore {
        &self.store
    }

    pub fn world(&self) -> &WorldCache {
        &self.cache
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn chat_history(&self) -> impl Iterator<Item = &ChatLine> {
        self.chat.iter()
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    pub fn camera(&self) -> Vec2 {
        self.camera
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Latest UI feedback line (rejected action, respawn, …).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Consume the one-shot respawn flag.
    pub fn take_respawn_notice(&mut self) -> bool {
        std::mem::take(&mut self.respawn_notice)
    }

    fn viewport(&self) -> Vec2 {
        Vec2::new(self.config.viewport_width, self.config.viewport_height)
    }

    fn can_send(&self) -> bool {
        self.conn.is_open()
            && !matches!(self.status, ConnectionStatus::Disconnected { .. })
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    /// One full frame: inbound events, queued input, then the tick.
    pub fn frame<R: Renderer + ?Sized>(&mut self, dt: f32, renderer: &mut R) -> TickReport {
        self.pump();
        self.process_inputs();
        self.tick(dt, renderer)
    }

    /// Apply every event the connection has buffered since the last call.
    pub fn pump(&mut self) {
        for event in self.conn.poll() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: ArenaEvent) {
        match event {
            ArenaEvent::Connected => {
                log::info!("[client] connected, joining as '{}'", self.name);
                self.status = ConnectionStatus::Connected;
                let join = ClientMessage::Join {
                    name: self.name.clone(),
                };
                let _ = self.send(&join);
            }
            ArenaEvent::Disconnected { reason } => {
                log::info!("[client] disconnected: {}", reason);
                self.status = ConnectionStatus::Disconnected { reason };
            }
            ArenaEvent::Welcome { player_id } => {
                log::info!("[client] assigned player id {}", player_id);
                self.player_id = Some(player_id);
                self.sync.reset();
            }
            ArenaEvent::Snapshot(record) => {
                let verdict = self.sync.ingest(
                    record,
                    self.player_id.as_deref(),
                    &mut self.cache,
                    &mut self.store,
                );
                match verdict {
                    Admission::Apply(seq) => {
                        self.stats.snapshots_applied += 1;
                        self.stats.last_seq = Some(seq);
                    }
                    Admission::Stale { .. } => self.stats.snapshots_discarded += 1,
                }
            }
            ArenaEvent::Chat { from, message } => {
                self.chat.push_back(ChatLine { from, message });
                while self.chat.len() > self.config.chat_history {
                    self.chat.pop_front();
                }
            }
            ArenaEvent::Respawn => {
                self.respawn_notice = true;
                self.notice = Some(RESPAWN_NOTICE.into());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Queue an input for the next frame.
    pub fn queue_input(&mut self, event: InputEvent) {
        self.inputs.push_back(event);
    }

    /// Drain queued input.  Rejections become the UI notice.
    pub fn process_inputs(&mut self) {
        while let Some(event) = self.inputs.pop_front() {
            if let Err(e) = self.handle_input(event) {
                log::debug!("[client] action rejected: {}", e);
                self.notice = Some(e.to_string());
            }
        }
    }

    /// Apply one input immediately.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<(), ActionError> {
        match event {
            InputEvent::KeyDown(key) => self.interaction.keys.set(key, true),
            InputEvent::KeyUp(key) => self.interaction.keys.set(key, false),
            InputEvent::DragStart(slot) => self.interaction.drag_start(slot),
            InputEvent::Drop(target) => {
                if let Some(t) = self.interaction.drop_on(target) {
                    self.store
                        .move_item(t.from.container, t.from.slot, t.to.container, t.to.slot)?;
                    self.flush()?;
                }
            }
            InputEvent::Select(slot) => self.interaction.select(slot),
            InputEvent::Combine => {
                let msg = combine_request(
                    self.interaction.selected_inventory(),
                    self.config.inventory_capacity,
                )?;
                self.require_joined()?;
                self.send(&msg)?;
                self.interaction.clear_inventory_selection();
            }
            InputEvent::SetName(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ActionError::EmptyName);
                }
                self.require_joined()?;
                self.send(&ClientMessage::SetName { name: name.into() })?;
                self.name = name.into();
            }
            InputEvent::Chat(message) => {
                let message = message.trim();
                if message.is_empty() {
                    return Err(ActionError::EmptyChat);
                }
                self.require_joined()?;
                self.send(&ClientMessage::Chat {
                    message: message.into(),
                })?;
            }
        }
        Ok(())
    }

    fn require_joined(&self) -> Result<(), ActionError> {
        match self.player_id {
            Some(_) => Ok(()),
            None => Err(ActionError::NotJoined),
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    pub fn tick<R: Renderer + ?Sized>(&mut self, dt: f32, renderer: &mut R) -> TickReport {
        self.stats.frames += 1;
        let mut report = TickReport {
            frame: self.stats.frames,
            ..Default::default()
        };

        let local = self
            .player_id
            .as_deref()
            .and_then(|id| self.cache.player(id))
            // Dead counts as absent: no input is sent until the server respawns us.
            .filter(|p| !p.dead)
            .map(|p| p.position);
        report.local_player_present = local.is_some();

        let position = local.map(|pos| self.step_movement(pos, dt, &mut report));

        self.phase += f64::from(self.config.orbit_speed * dt);
        let local_speed = self
            .player_id
            .as_deref()
            .and_then(|id| self.cache.player(id))
            .map_or(DEFAULT_ORBIT_SPEED, |p| p.orbit_speed);
        self.store.assign_orbit_phases(ring_phase(self.phase, local_speed));

        if let Some(pos) = position {
            self.camera = camera_offset(pos, self.viewport());
        }

        Scene {
            cache: &self.cache,
            equipment: &self.store,
            local_player: self.player_id.as_deref(),
            camera: self.camera,
            viewport: self.viewport(),
            phase: self.phase,
            map_size: self.config.map_size,
            safe_zone_radius: self.config.safe_zone_radius,
        }
        .paint(renderer);

        if let Some(pos) = position {
            self.collect_pickups(pos, &mut report);
            self.step_attack(dt, &mut report);
        }

        report
    }

    fn step_movement(&mut self, pos: Vec2, dt: f32, report: &mut TickReport) -> Vec2 {
        let dir = self.interaction.keys.direction();
        let retract = self.interaction.keys.retract;

        let (pos, msg) = match self.config.movement_mode {
            MovementMode::Intent => (
                pos,
                ClientMessage::MoveIntent {
                    dx: dir.x,
                    dy: dir.y,
                    retract,
                },
            ),
            MovementMode::Predicted => {
                let half = self.config.map_size / 2.0;
                let next = pos.add(dir.scale(self.config.move_speed * dt));
                let next = Vec2::new(next.x.clamp(-half, half), next.y.clamp(-half, half));
                if let Some(me) = self.player_id.as_deref().and_then(|id| self.cache.player_mut(id)) {
                    me.position = next;
                    me.retracting = retract;
                }
                (
                    next,
                    ClientMessage::Move {
                        x: next.x,
                        y: next.y,
                        retract,
                    },
                )
            }
        };

        if matches!(self.status, ConnectionStatus::Connected) {
            report.movement_sent = self.send(&msg).is_ok();
        }
        pos
    }

    fn collect_pickups(&mut self, pos: Vec2, report: &mut TickReport) {
        for id in self.cache.ground_items_near(pos, self.config.pickup_radius) {
            if self.store.first_free_inventory_slot().is_none() {
                log::debug!("[client] inventory full, leaving ground item {}", id);
                break;
            }
            let Some(item) = self.cache.take_ground_item(&id) else {
                continue;
            };
            match self.store.pick_up(item.petal) {
                Ok(slot) => {
                    log::debug!("[client] picked up {} into inventory slot {}", id, slot);
                    self.stats.pickups += 1;
                    report.picked_up.push(id);
                }
                Err(e) => log::warn!("[client] pickup of {} failed: {}", id, e),
            }
        }
        if !report.picked_up.is_empty() {
            report.equipment_sent = self.flush().unwrap_or(false);
        }
    }

    fn step_attack(&mut self, dt: f32, report: &mut TickReport) {
        self.attack_elapsed += dt * 1000.0;
        let interval = self.config.attack_tick_interval_ms as f32;
        if self.attack_elapsed < interval {
            return;
        }
        self.attack_elapsed = 0.0;
        if matches!(self.status, ConnectionStatus::Connected) {
            report.attack_sent = self.send(&ClientMessage::AttackTick).is_ok();
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    fn send(&mut self, msg: &ClientMessage) -> Result<(), ConnectionError> {
        if !self.can_send() {
            return Err(ConnectionError::Closed);
        }
        match self.conn.send(msg) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.note_send_failure(msg.kind(), &e);
                Err(e)
            }
        }
    }

    /// Send the equipment store if it owes the server an update.
    fn flush(&mut self) -> Result<bool, ConnectionError> {
        if !self.can_send() {
            return Err(ConnectionError::Closed);
        }
        match flush_equipment(&mut self.store, &mut self.conn) {
            Ok(sent) => {
                if sent {
                    self.stats.messages_sent += 1;
                }
                Ok(sent)
            }
            Err(e) => {
                self.note_send_failure("updateInventory", &e);
                Err(e)
            }
        }
    }

    fn note_send_failure(&mut self, kind: &str, e: &ConnectionError) {
        log::warn!("[client] failed to send {}: {}", kind, e);
        match e {
            ConnectionError::Closed => {
                self.status = ConnectionStatus::Disconnected {
                    reason: e.to_string(),
                }
            }
            ConnectionError::Encode(_) => {
                self.status = ConnectionStatus::Error {
                    reason: e.to_string(),
                }
            }
            ConnectionError::QueueFull => {}
        }
    }

    // -----------------------------------------------------------------------
    // HUD
    // -----------------------------------------------------------------------

    /// One-line status summary for the local player, if present.
    pub fn hud_line(&self) -> Option<String> {
        let me = self.player_id.as_deref().and_then(|id| self.cache.player(id))?;
        let equipped = self.store.equipped().count();
        let slots = if me.petal_slots > 0 {
            me.petal_slots
        } else {
            self.config.hotbar_capacity
        };
        let held = self.store.inventory().iter().flatten().count();
        Some(format!(
            "HP {:.0}/{:.0} | Level {} | XP {} | Coins {} | Petals {}/{} | Inventory {}",
            me.hp, me.max_hp, me.level, me.xp, me.coins, equipped, slots, held
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
