//! Game engine collaborator surface.
//!
//! The core never simulates the world itself. Everything it needs from the
//! host (spawning particles, querying neighbours, moving entities) goes
//! through [`GameEngine`]. [`SandboxWorld`] is an in-memory implementation
//! used by tests and the simulator.

mod sandbox;

use glam::DVec3;

use enchantry_types::Tick;

pub use sandbox::{EngineCall, SandboxEntity, SandboxWorld};

/// Opaque handle to a player or entity. Never an owning reference: the
/// entity may vanish between ticks, so always re-check with
/// [`GameEngine::is_entity_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub pos: DVec3,
}

impl Location {
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self {
            world,
            pos: DVec3::new(x, y, z),
        }
    }

    pub fn offset(&self, delta: DVec3) -> Self {
        Self {
            world: self.world,
            pos: self.pos + delta,
        }
    }

    /// Integer grid cell containing this location.
    pub fn block(&self) -> BlockPos {
        let cell = self.pos.floor();
        BlockPos {
            world: self.world,
            x: cell.x as i64,
            y: cell.y as i64,
            z: cell.z as i64,
        }
    }

    /// Distance to `other`, or `None` across worlds.
    pub fn distance(&self, other: &Location) -> Option<f64> {
        (self.world == other.world).then(|| self.pos.distance(other.pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub world: WorldId,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Monster,
    Animal,
    Projectile,
    /// Transient display object owned by an effect (markers, floating blades).
    Marker,
    Other,
}

impl EntityKind {
    pub fn is_living(self) -> bool {
        matches!(self, Self::Player | Self::Monster | Self::Animal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualParams {
    pub count: u32,
    pub spread: DVec3,
    pub speed: f64,
    pub color: Option<[u8; 3]>,
}

impl Default for VisualParams {
    fn default() -> Self {
        Self {
            count: 1,
            spread: DVec3::ZERO,
            speed: 0.0,
            color: None,
        }
    }
}

impl VisualParams {
    pub fn burst(count: u32, spread: f64, speed: f64) -> Self {
        Self {
            count,
            spread: DVec3::splat(spread),
            speed,
            color: None,
        }
    }

    pub fn colored(mut self, rgb: [u8; 3]) -> Self {
        self.color = Some(rgb);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Speed,
    Slowness,
    Regeneration,
    Glowing,
}

/// Timed potion-like status applied to a living entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub duration: Tick,
    /// Zero-based strength (0 = level I).
    pub amplifier: u8,
}

pub trait GameEngine {
    // ─── Presentation ───────────────────────────────────────────────────────
    fn spawn_visual(&mut self, kind: &str, at: Location, params: &VisualParams);
    fn play_sound(&mut self, kind: &str, at: Location, volume: f32, pitch: f32);
    /// Short user-visible status line (action bar / chat).
    fn send_status(&mut self, subject: EntityId, message: &str);

    // ─── Queries ────────────────────────────────────────────────────────────
    fn is_entity_live(&self, entity: EntityId) -> bool;
    fn nearby_entities(&self, at: Location, radius: f64) -> Vec<EntityId>;
    fn location_of(&self, entity: EntityId) -> Option<Location>;
    fn velocity_of(&self, entity: EntityId) -> Option<DVec3>;
    fn kind_of(&self, entity: EntityId) -> Option<EntityKind>;
    /// `(current, max)` health of a living entity.
    fn health_of(&self, entity: EntityId) -> Option<(f64, f64)>;

    // ─── Mutation ───────────────────────────────────────────────────────────
    fn apply_damage(&mut self, entity: EntityId, amount: f64, source: Option<EntityId>);
    fn heal(&mut self, entity: EntityId, amount: f64);
    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3);
    fn teleport(&mut self, entity: EntityId, to: Location);
    fn apply_status(&mut self, entity: EntityId, status: StatusEffect);
    fn ignite(&mut self, entity: EntityId, ticks: Tick);
    fn create_explosion(
        &mut self,
        at: Location,
        power: f32,
        set_fire: bool,
        source: Option<EntityId>,
    );
    /// Spawn a transient display object and return its handle.
    fn spawn_marker(&mut self, kind: &str, at: Location) -> EntityId;
    fn remove_entity(&mut self, entity: EntityId);
}
