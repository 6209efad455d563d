//! Phases as data.
//!
//! A phase is a record of actions plus an exit predicate. Behavior that
//! cannot be expressed as data goes in a [`SequenceDriver`](super::SequenceDriver).

use glam::DVec3;

use enchantry_types::Tick;

use super::target::TargetRef;
use crate::engine::{EntityId, EntityKind, GameEngine, Location, VisualParams};

/// When a phase is finished.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseExit {
    /// After this many ticks of the phase. `After(0)` completes on entry.
    After(Tick),
    /// When the bound target is within `radius` of `of`.
    Near { of: TargetRef, radius: f64 },
    /// When the named signal has been delivered to the sequence.
    Signal(String),
    /// Only when the driver reports completion.
    Driver,
}

/// One engine call, anchored at the sequence's bound target.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectAction {
    Visual {
        kind: String,
        offset: DVec3,
        params: VisualParams,
    },
    Sound {
        kind: String,
        volume: f32,
        pitch: f32,
    },
    /// Damage living entities within `radius`, sourced from the owner.
    Damage { amount: f64, radius: f64 },
    /// Push living entities within `radius` away from the anchor. Negative
    /// strength pulls them in.
    Push { strength: f64, radius: f64 },
    /// Status line sent to the owner.
    Message(String),
}

impl EffectAction {
    pub fn visual(kind: impl Into<String>, params: VisualParams) -> Self {
        Self::Visual {
            kind: kind.into(),
            offset: DVec3::ZERO,
            params,
        }
    }

    pub fn sound(kind: impl Into<String>, volume: f32, pitch: f32) -> Self {
        Self::Sound {
            kind: kind.into(),
            volume,
            pitch,
        }
    }

    pub(crate) fn run(
        &self,
        engine: &mut dyn GameEngine,
        anchor: Location,
        owner: Option<EntityId>,
        pvp_enabled: bool,
    ) {
        match self {
            Self::Visual {
                kind,
                offset,
                params,
            } => engine.spawn_visual(kind, anchor.offset(*offset), params),
            Self::Sound {
                kind,
                volume,
                pitch,
            } => engine.play_sound(kind, anchor, *volume, *pitch),
            Self::Damage { amount, radius } => {
                for victim in affected(engine, anchor, *radius, owner, pvp_enabled) {
                    engine.apply_damage(victim, *amount, owner);
                }
            }
            Self::Push { strength, radius } => {
                for victim in affected(engine, anchor, *radius, owner, pvp_enabled) {
                    let Some(at) = engine.location_of(victim) else {
                        continue;
                    };
                    let away = (at.pos - anchor.pos).normalize_or_zero();
                    engine.set_velocity(victim, away * *strength);
                }
            }
            Self::Message(text) => {
                if let Some(owner) = owner {
                    engine.send_status(owner, text);
                }
            }
        }
    }
}

/// Living entities an area action may touch: never the owner, and players
/// only when PvP is enabled.
pub(crate) fn affected(
    engine: &dyn GameEngine,
    anchor: Location,
    radius: f64,
    owner: Option<EntityId>,
    pvp_enabled: bool,
) -> Vec<EntityId> {
    engine
        .nearby_entities(anchor, radius)
        .into_iter()
        .filter(|e| Some(*e) != owner)
        .filter(|e| match engine.kind_of(*e) {
            Some(EntityKind::Player) => pvp_enabled,
            Some(kind) => kind.is_living(),
            None => false,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String,
    pub exit: PhaseExit,
    pub on_enter: Vec<EffectAction>,
    pub on_tick: Vec<EffectAction>,
    pub on_exit: Vec<EffectAction>,
}

impl Phase {
    pub fn new(name: impl Into<String>, exit: PhaseExit) -> Self {
        Self {
            name: name.into(),
            exit,
            on_enter: Vec::new(),
            on_tick: Vec::new(),
            on_exit: Vec::new(),
        }
    }

    /// Fixed-length phase.
    pub fn timed(name: impl Into<String>, ticks: Tick) -> Self {
        Self::new(name, PhaseExit::After(ticks))
    }

    pub fn on_enter(mut self, action: EffectAction) -> Self {
        self.on_enter.push(action);
        self
    }

    pub fn on_tick(mut self, action: EffectAction) -> Self {
        self.on_tick.push(action);
        self
    }

    pub fn on_exit(mut self, action: EffectAction) -> Self {
        self.on_exit.push(action);
        self
    }

    /// Nominal length, for fixed-length phases.
    pub fn duration(&self) -> Option<Tick> {
        match self.exit {
            PhaseExit::After(n) => Some(n),
            _ => None,
        }
    }
}

/// `ticks / duration` clamped to `[0, 1]`. Zero-length phases are complete.
pub fn progress(ticks_in_phase: Tick, duration: Tick) -> f64 {
    if duration == 0 {
        return 1.0;
    }
    (ticks_in_phase as f64 / duration as f64).clamp(0.0, 1.0)
}
