//! Scene painting.
//!
//! The painter knows *what* to draw and in which order; a [`Renderer`]
//! knows *how*.  Platform front-ends implement `Renderer` over their canvas;
//! [`DrawList`] records commands for headless runs and tests.
//!
//! Draw order, back to front:
//!
//! 1. background, map bounds and safe zone
//! 2. ground items
//! 3. hostiles (shape by kind, health bar)
//! 4. players (self highlighted, health bar, name, their items)
//! 5. the local player's orbiting items

use crate::cache::WorldCache;
use crate::equipment::EquipmentStore;
use crate::types::{health_fraction, orbit_angle, ring_phase, HostileKind, Petal, Player, Vec2};

pub const PLAYER_RADIUS: f32 = 20.0;
pub const BAR_HEIGHT: f32 = 6.0;
pub const BROKEN_ALPHA: f32 = 0.3;
const BAR_BACK: &str = "red";
const BAR_FILL: &str = "lime";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Triangle,
    Square,
    Hexagon,
}

impl From<&HostileKind> for Shape {
    fn from(kind: &HostileKind) -> Self {
        match kind {
            HostileKind::Wanderer | HostileKind::Other(_) => Self::Circle,
            HostileKind::Chaser => Self::Triangle,
            HostileKind::Spinner => Self::Square,
            HostileKind::Miniboss => Self::Hexagon,
        }
    }
}

/// Drawing primitives in screen space.
pub trait Renderer {
    fn clear(&mut self, viewport: Vec2);
    fn shape(&mut self, shape: Shape, center: Vec2, radius: f32, color: &str, alpha: f32);
    fn ring(&mut self, center: Vec2, radius: f32, color: &str, width: f32);
    fn rect(&mut self, origin: Vec2, size: Vec2, color: &str);
    fn outline(&mut self, origin: Vec2, size: Vec2, color: &str);
    fn text(&mut self, at: Vec2, text: &str, color: &str);
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Top-left world coordinate of the viewport, centred on `focus`.
pub fn camera_offset(focus: Vec2, viewport: Vec2) -> Vec2 {
    focus.sub(viewport.scale(0.5))
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// Everything one frame needs to draw.
pub struct Scene<'a> {
    pub cache: &'a WorldCache,
    pub equipment: &'a EquipmentStore,
    pub local_player: Option<&'a str>,
    pub camera: Vec2,
    pub viewport: Vec2,
    /// Unwrapped shared orbit phase; each ring scales it by its own speed.
    pub phase: f64,
    pub map_size: f32,
    pub safe_zone_radius: f32,
}

impl Scene<'_> {
    fn to_screen(&self, world: Vec2) -> Vec2 {
        world.sub(self.camera)
    }

    pub fn paint<R: Renderer + ?Sized>(&self, r: &mut R) {
        r.clear(self.viewport);
        r.outline(
            self.to_screen(Vec2::zero()).sub(Vec2::new(self.map_size, self.map_size).scale(0.5)),
            Vec2::new(self.map_size, self.map_size),
            "#333",
        );
        r.ring(
            self.to_screen(Vec2::zero()),
            self.safe_zone_radius,
            "rgba(0, 255, 0, 0.3)",
            5.0,
        );

        self.paint_ground_items(r);
        self.paint_hostiles(r);
        self.paint_players(r);
        self.paint_local_ring(r);
    }

    fn paint_ground_items<R: Renderer + ?Sized>(&self, r: &mut R) {
        let mut items: Vec<_> = self.cache.ground_items().values().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        for g in items {
            self.paint_petal(r, &g.petal, self.to_screen(g.position));
        }
    }

    fn paint_hostiles<R: Renderer + ?Sized>(&self, r: &mut R) {
        let mut hostiles: Vec<_> = self.cache.hostiles().values().filter(|h| !h.dead).collect();
        hostiles.sort_by(|a, b| a.id.cmp(&b.id));
        for h in hostiles {
            let at = self.to_screen(h.position);
            r.shape(Shape::from(&h.kind), at, h.size, h.kind.color(), 1.0);
            health_bar(
                r,
                Vec2::new(at.x - h.size, at.y - h.size - 10.0),
                h.size * 2.0,
                health_fraction(h.hp, h.max_hp),
            );
        }
    }

    fn paint_players<R: Renderer + ?Sized>(&self, r: &mut R) {
        let mut players: Vec<_> = self.cache.players().values().filter(|p| !p.dead).collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        for p in players {
            let me = self.local_player == Some(p.id.as_str());
            let at = self.to_screen(p.position);
            r.shape(
                Shape::Circle,
                at,
                PLAYER_RADIUS,
                if me { "#fff" } else { "#888" },
                1.0,
            );
            health_bar(
                r,
                Vec2::new(at.x - PLAYER_RADIUS, at.y - PLAYER_RADIUS - 10.0),
                PLAYER_RADIUS * 2.0,
                health_fraction(p.hp, p.max_hp),
            );
            r.text(Vec2::new(at.x, at.y + 40.0), p.display_name(), "white");

            if !me {
                self.paint_remote_ring(r, p);
            }
        }
    }

    /// Remote players' items come from their server record.
    fn paint_remote_ring<R: Renderer + ?Sized>(&self, r: &mut R, p: &Player) {
        let center = self.to_screen(p.position);
        let active = p.hotbar.iter().filter(|s| s.is_some()).count();
        let base = ring_phase(self.phase, p.orbit_speed) + retract_offset(p.retracting);
        for (i, petal) in p.hotbar.iter().flatten().enumerate() {
            let angle = orbit_angle(base, i, active);
            self.paint_petal(r, petal, center.polar_offset(p.orbit_radius, angle));
        }
    }

    /// The local ring uses the store's optimistic contents and phases.
    fn paint_local_ring<R: Renderer + ?Sized>(&self, r: &mut R) {
        let Some(me) = self.local_player.and_then(|id| self.cache.player(id)) else {
            return;
        };
        if me.dead {
            return;
        }
        let center = self.to_screen(me.position);
        let offset = retract_offset(me.retracting);
        for petal in self.equipment.equipped() {
            let at = center.polar_offset(me.orbit_radius, petal.orbit_angle + offset);
            self.paint_petal(r, petal, at);
        }
    }

    fn paint_petal<R: Renderer + ?Sized>(&self, r: &mut R, petal: &Petal, at: Vec2) {
        let alpha = if petal.is_broken() { BROKEN_ALPHA } else { 1.0 };
        r.shape(Shape::Circle, at, petal.draw_radius(), petal.kind.color(), alpha);
    }
}

fn retract_offset(retracting: bool) -> f32 {
    if retracting {
        std::f32::consts::PI
    } else {
        0.0
    }
}

fn health_bar<R: Renderer + ?Sized>(r: &mut R, origin: Vec2, width: f32, fraction: f32) {
    r.rect(origin, Vec2::new(width, BAR_HEIGHT), BAR_BACK);
    r.rect(origin, Vec2::new(width * fraction, BAR_HEIGHT), BAR_FILL);
}

// ---------------------------------------------------------------------------
// Recording renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear {
        viewport: Vec2,
    },
    Shape {
        shape: Shape,
        center: Vec2,
        radius: f32,
        color: String,
        alpha: f32,
    },
    Ring {
        center: Vec2,
        radius: f32,
        color: String,
        width: f32,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        color: String,
    },
    Outline {
        origin: Vec2,
        size: Vec2,
        color: String,
    },
    Text {
        at: Vec2,
        text: String,
        color: String,
    },
}

/// Renderer that records the frame instead of drawing it.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Health-bar fill widths, in draw order.
    pub fn bar_fills(&self) -> Vec<f32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Rect { size, color, .. } if color == BAR_FILL => Some(size.x),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for DrawList {
    fn clear(&mut self, viewport: Vec2) {
        self.commands.clear();
        self.commands.push(DrawCmd::Clear { viewport });
    }

    fn shape(&mut self, shape: Shape, center: Vec2, radius: f32, color: &str, alpha: f32) {
        self.commands.push(DrawCmd::Shape {
            shape,
            center,
            radius,
            color: color.into(),
            alpha,
        });
    }

    fn ring(&mut self, center: Vec2, radius: f32, color: &str, width: f32) {
        self.commands.push(DrawCmd::Ring {
            center,
            radius,
            color: color.into(),
            width,
        });
    }

    fn rect(&mut self, origin: Vec2, size: Vec2, color: &str) {
        self.commands.push(DrawCmd::Rect {
            origin,
            size,
            color: color.into(),
        });
    }

    fn outline(&mut self, origin: Vec2, size: Vec2, color: &str) {
        self.commands.push(DrawCmd::Outline {
            origin,
            size,
            color: color.into(),
        });
    }

    fn text(&mut self, at: Vec2, text: &str, color: &str) {
        self.commands.push(DrawCmd::Text {
            at,
            text: text.into(),
            color: color.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::WorldSnapshot;
    use crate::protocol::SnapshotRecord;
    use serde_json::json;

    fn cache_from(v: serde_json::Value) -> WorldCache {
        let rec: SnapshotRecord = serde_json::from_value(v).unwrap();
        let mut c = WorldCache::new();
        c.replace(WorldSnapshot::from_record(rec, 1));
        c
    }

    fn scene<'a>(cache: &'a WorldCache, store: &'a EquipmentStore, me: Option<&'a str>) -> Scene<'a> {
        Scene {
            cache,
            equipment: store,
            local_player: me,
            camera: Vec2::zero(),
            viewport: Vec2::new(800.0, 600.0),
            phase: 0.0,
            map_size: 3000.0,
            safe_zone_radius: 200.0,
        }
    }

    #[test]
    fn camera_centres_focus() {
        let c = camera_offset(Vec2::new(500.0, 400.0), Vec2::new(800.0, 600.0));
        assert_eq!(c, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn hostile_health_bar_is_clamped() {
        let cache = cache_from(json!({
            "players": [],
            "enemies": [
                {"id": "a", "size": 10.0, "hp": 50.0, "maxHp": 25.0},
                {"id": "b", "size": 10.0, "hp": -3.0, "maxHp": 25.0},
                {"id": "c", "size": 10.0, "hp": 5.0, "maxHp": 0.0}
            ]
        }));
        let store = EquipmentStore::new(5, 10);
        let mut dl = DrawList::new();
        scene(&cache, &store, None).paint(&mut dl);
        assert_eq!(dl.bar_fills(), vec![20.0, 0.0, 0.0]);
    }

    #[test]
    fn dead_entities_are_not_drawn_and_names_default() {
        let cache = cache_from(json!({
            "players": [{"id": "p1"}, {"id": "p2", "name": "Zed", "dead": true}],
            "enemies": [{"id": "e", "dead": true}]
        }));
        let store = EquipmentStore::new(5, 10);
        let mut dl = DrawList::new();
        scene(&cache, &store, Some("p1")).paint(&mut dl);
        assert_eq!(dl.texts(), vec!["Anonymous"]);
        assert_eq!(dl.bar_fills().len(), 1);
    }

    #[test]
    fn local_ring_is_drawn_last_from_the_store() {
        let cache = cache_from(json!({
            "players": [{"id": "me", "x": 0.0, "y": 0.0, "orbitRadius": 50.0}],
            "groundItems": [{"id": "g", "x": 100.0, "y": 0.0}]
        }));
        let mut store = EquipmentStore::new(5, 10);
        store.apply_authoritative(
            &[Some(Petal::new("a", crate::types::PetalKind::Fire, 1)), None],
            &[],
        );
        store.assign_orbit_phases(0.0);

        let mut dl = DrawList::new();
        scene(&cache, &store, Some("me")).paint(&mut dl);

        match dl.commands.last().unwrap() {
            DrawCmd::Shape { center, color, .. } => {
                assert_eq!(color, "#f55");
                assert!((center.x - 50.0).abs() < 1e-4);
            }
            other => panic!("unexpected last command {other:?}"),
        }
        assert!(matches!(dl.commands[0], DrawCmd::Clear { .. }));
    }

    #[test]
    fn broken_items_are_translucent() {
        let cache = cache_from(json!({
            "players": [{"id": "me"}]
        }));
        let mut store = EquipmentStore::new(5, 10);
        let mut broken = Petal::new("b", crate::types::PetalKind::Rock, 1);
        broken.hp = 0.0;
        store.apply_authoritative(&[Some(broken)], &[]);

        let mut dl = DrawList::new();
        scene(&cache, &store, Some("me")).paint(&mut dl);
        assert!(matches!(
            dl.commands.last(),
            Some(DrawCmd::Shape { alpha, .. }) if *alpha == BROKEN_ALPHA
        ));
    }

    #[test]
    fn hostile_shape_follows_kind() {
        assert_eq!(Shape::from(&HostileKind::Chaser), Shape::Triangle);
        assert_eq!(Shape::from(&HostileKind::Other("x".into())), Shape::Circle);
    }
}
