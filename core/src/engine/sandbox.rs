//! In-memory [`GameEngine`] that records every call.
//!
//! Entities live in a `BTreeMap` so iteration (and therefore
//! `nearby_entities`) is deterministic across runs.

use std::collections::BTreeMap;

use glam::DVec3;

use enchantry_types::Tick;

use super::{EntityId, EntityKind, GameEngine, Location, StatusEffect, VisualParams};

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxEntity {
    pub kind: EntityKind,
    pub location: Location,
    pub velocity: DVec3,
    pub health: f64,
    pub max_health: f64,
    pub fire_ticks: Tick,
    pub statuses: Vec<StatusEffect>,
}

/// One recorded call into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Visual {
        kind: String,
        at: Location,
        count: u32,
    },
    Sound {
        kind: String,
        at: Location,
    },
    Status {
        subject: EntityId,
        message: String,
    },
    Damage {
        entity: EntityId,
        amount: f64,
        source: Option<EntityId>,
    },
    Heal {
        entity: EntityId,
        amount: f64,
    },
    Velocity {
        entity: EntityId,
        velocity: DVec3,
    },
    Teleport {
        entity: EntityId,
        to: Location,
    },
    ApplyStatus {
        entity: EntityId,
        status: StatusEffect,
    },
    Ignite {
        entity: EntityId,
        ticks: Tick,
    },
    Explosion {
        at: Location,
        power: f32,
        set_fire: bool,
    },
    SpawnMarker {
        entity: EntityId,
        kind: String,
    },
    Remove {
        entity: EntityId,
    },
}

#[derive(Debug, Default)]
pub struct SandboxWorld {
    entities: BTreeMap<EntityId, SandboxEntity>,
    next_id: u64,
    calls: Vec<EngineCall>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    // ─── Scripting ──────────────────────────────────────────────────────────

    /// Spawn an entity with default health (20 for living kinds, 1 otherwise).
    pub fn spawn(&mut self, kind: EntityKind, location: Location) -> EntityId {
        let max_health = if kind.is_living() { 20.0 } else { 1.0 };
        self.spawn_with_health(kind, location, max_health)
    }

    pub fn spawn_with_health(
        &mut self,
        kind: EntityKind,
        location: Location,
        max_health: f64,
    ) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.entities.insert(
            id,
            SandboxEntity {
                kind,
                location,
                velocity: DVec3::ZERO,
                health: max_health,
                max_health,
                fire_ticks: 0,
                statuses: Vec::new(),
            },
        );
        id
    }

    /// Remove an entity without recording a call (engine-side despawn).
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.entities.remove(&entity).is_some()
    }

    pub fn move_entity(&mut self, entity: EntityId, to: Location) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.location = to;
        }
    }

    pub fn set_health(&mut self, entity: EntityId, health: f64) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.health = health.min(e.max_health);
        }
    }

    /// Integrate positions by one tick of velocity. Only non-living kinds
    /// move; living entities are driven by `move_entity`.
    pub fn advance_physics(&mut self) {
        for e in self.entities.values_mut() {
            if !e.kind.is_living() {
                e.location.pos += e.velocity;
            }
        }
    }

    // ─── Inspection ─────────────────────────────────────────────────────────

    pub fn entity(&self, entity: EntityId) -> Option<&SandboxEntity> {
        self.entities.get(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn messages_for(&self, subject: EntityId) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Status { subject: s, message } if *s == subject => {
                    Some(message.as_str())
                }
                _ => None,
            })
            .collect()
    }

    pub fn visual_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EngineCall::Visual { .. }))
            .count()
    }
}

impl GameEngine for SandboxWorld {
    fn spawn_visual(&mut self, kind: &str, at: Location, params: &VisualParams) {
        self.calls.push(EngineCall::Visual {
            kind: kind.to_string(),
            at,
            count: params.count,
        });
    }

    fn play_sound(&mut self, kind: &str, at: Location, _volume: f32, _pitch: f32) {
        self.calls.push(EngineCall::Sound {
            kind: kind.to_string(),
            at,
        });
    }

    fn send_status(&mut self, subject: EntityId, message: &str) {
        self.calls.push(EngineCall::Status {
            subject,
            message: message.to_string(),
        });
    }

    fn is_entity_live(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|e| !e.kind.is_living() || e.health > 0.0)
    }

    fn nearby_entities(&self, at: Location, radius: f64) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| {
                e.location
                    .distance(&at)
                    .is_some_and(|d| d <= radius)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn location_of(&self, entity: EntityId) -> Option<Location> {
        self.entities.get(&entity).map(|e| e.location)
    }

    fn velocity_of(&self, entity: EntityId) -> Option<DVec3> {
        self.entities.get(&entity).map(|e| e.velocity)
    }

    fn kind_of(&self, entity: EntityId) -> Option<EntityKind> {
        self.entities.get(&entity).map(|e| e.kind)
    }

    fn health_of(&self, entity: EntityId) -> Option<(f64, f64)> {
        self.entities
            .get(&entity)
            .filter(|e| e.kind.is_living())
            .map(|e| (e.health, e.max_health))
    }

    fn apply_damage(&mut self, entity: EntityId, amount: f64, source: Option<EntityId>) {
        self.calls.push(EngineCall::Damage {
            entity,
            amount,
            source,
        });
        let dead = match self.entities.get_mut(&entity) {
            Some(e) if e.kind.is_living() => {
                e.health -= amount;
                e.health <= 0.0
            }
            _ => false,
        };
        if dead {
            self.entities.remove(&entity);
        }
    }

    fn heal(&mut self, entity: EntityId, amount: f64) {
        self.calls.push(EngineCall::Heal { entity, amount });
        if let Some(e) = self.entities.get_mut(&entity) {
            e.health = (e.health + amount).min(e.max_health);
        }
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3) {
        self.calls.push(EngineCall::Velocity { entity, velocity });
        if let Some(e) = self.entities.get_mut(&entity) {
            e.velocity = velocity;
        }
    }

    fn teleport(&mut self, entity: EntityId, to: Location) {
        self.calls.push(EngineCall::Teleport { entity, to });
        self.move_entity(entity, to);
    }

    fn apply_status(&mut self, entity: EntityId, status: StatusEffect) {
        self.calls.push(EngineCall::ApplyStatus { entity, status });
        if let Some(e) = self.entities.get_mut(&entity) {
            e.statuses.retain(|s| s.kind != status.kind);
            e.statuses.push(status);
        }
    }

    fn ignite(&mut self, entity: EntityId, ticks: Tick) {
        self.calls.push(EngineCall::Ignite { entity, ticks });
        if let Some(e) = self.entities.get_mut(&entity) {
            e.fire_ticks = e.fire_ticks.max(ticks);
        }
    }

    fn create_explosion(
        &mut self,
        at: Location,
        power: f32,
        set_fire: bool,
        _source: Option<EntityId>,
    ) {
        self.calls.push(EngineCall::Explosion {
            at,
            power,
            set_fire,
        });
    }

    fn spawn_marker(&mut self, kind: &str, at: Location) -> EntityId {
        let id = self.spawn(EntityKind::Marker, at);
        self.calls.push(EngineCall::SpawnMarker {
            entity: id,
            kind: kind.to_string(),
        });
        id
    }

    fn remove_entity(&mut self, entity: EntityId) {
        self.calls.push(EngineCall::Remove { entity });
        self.entities.remove(&entity);
    }
}
