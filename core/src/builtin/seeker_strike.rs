//! Homing trident.
//!
//! The thrown trident is the sequence target, so the sequence ends on its
//! own when the trident despawns.
//!
//! ```text
//!   arming ──▶ acquire ──▶ ascend ──▶ dive ──▶ track
//!   (delay)    (search)    10 ticks   15 ticks  (until hit)
//! ```
//!
//! A hit in any guided phase detonates and finishes the sequence.

use std::sync::Arc;

use glam::DVec3;

use enchantry_types::{ItemKind, Tick};

use crate::codec::Item;
use crate::dispatch::{ActionCategory, RangedLaunch};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{EntityId, EntityKind, Location, VisualParams};
use crate::scheduler::{
    DriverStatus, EffectAction, EffectSequence, Phase, PhaseExit, SequenceContext,
    SequenceDriver, TargetRef,
};

const DETECTION_RANGE: f64 = 15.0;
const TRACKING_TICKS: Tick = 200;
const ASCEND_TICKS: Tick = 10;
const DIVE_TICKS: Tick = 15;
const HIT_DISTANCE_SQ: f64 = 3.0;
const BASE_DAMAGE: f64 = 8.0;
const BASE_RADIUS: f64 = 3.0;
const BASE_KNOCKBACK: f64 = 1.2;

const ARMING: usize = 0;
const ACQUIRE: usize = 1;
const ASCEND: usize = 2;
const DIVE: usize = 3;

#[derive(Debug)]
pub struct SeekerStrike {
    definition: Arc<EnchantmentDefinition>,
}

impl SeekerStrike {
    pub const NAME: &'static str = "SeekerStrike";

    pub fn new() -> Self {
        let definition = EnchantmentDefinition::new(Self::NAME, 3, [ItemKind::Trident])
            .with_conflicts(ConflictRule::NameContains(vec![
                "seeker".into(),
                "homing".into(),
                "missile".into(),
                "tracking".into(),
            ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    pub fn detection_range(level: u32) -> f64 {
        DETECTION_RANGE + f64::from(level) * 2.0
    }

    /// Ticks of straight flight before the trident starts searching.
    pub fn turn_delay(level: u32) -> Tick {
        15u64.saturating_sub(Tick::from(level) * 5).max(5)
    }

    fn sequence(projectile: EntityId, shooter: EntityId, level: u32) -> EffectSequence {
        let trail = EffectAction::visual("enchant", VisualParams::burst(2, 0.05, 0.0));
        EffectSequence::new("seeker_strike", TargetRef::Entity(projectile))
            .owner(shooter)
            .budget(TRACKING_TICKS)
            .phase(Phase::timed("arming", Self::turn_delay(level)).on_tick(trail.clone()))
            .phase(Phase::new("acquire", PhaseExit::Driver).on_tick(trail.clone()))
            .phase(
                Phase::timed("ascend", ASCEND_TICKS)
                    .on_enter(EffectAction::sound("note_block_pling", 0.5, 2.0))
                    .on_tick(trail.clone()),
            )
            .phase(
                Phase::timed("dive", DIVE_TICKS)
                    .on_enter(EffectAction::sound("ender_dragon_flap", 0.8, 1.2))
                    .on_tick(trail.clone()),
            )
            .phase(Phase::new("track", PhaseExit::Driver).on_tick(trail))
            .driver(SeekerDriver::new(level))
    }
}

impl Default for SeekerStrike {
    fn default() -> Self {
        Self::new()
    }
}

impl EnchantmentHandler for SeekerStrike {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::RangedLaunch]
    }

    fn on_ranged_launch(
        &mut self,
        cx: &mut DispatchContext<'_>,
        launch: &RangedLaunch,
        _: &Item,
        level: u32,
    ) {
        if cx.engine.kind_of(launch.projectile) != Some(EntityKind::Projectile) {
            return;
        }
        let id = cx
            .effects
            .start(Self::sequence(launch.projectile, launch.shooter, level));

        if let Some(at) = cx.engine.location_of(launch.projectile) {
            cx.engine
                .spawn_visual("enchant", at, &VisualParams::burst(20 + 10 * level, 0.3, 0.1));
            cx.engine.play_sound("ghast_shoot", at, 0.5, 1.5);
        }
        cx.engine.send_status(launch.shooter, "Seeker Strike activated!");
        tracing::debug!(sequence = %id, level, "Seeker strike launched");
    }
}

// ─── Guidance ───────────────────────────────────────────────────────────────

struct SeekerDriver {
    level: u32,
    range: f64,
    turn_strength: f64,
    target: Option<EntityId>,
}

impl SeekerDriver {
    fn new(level: u32) -> Self {
        Self {
            level,
            range: SeekerStrike::detection_range(level),
            turn_strength: 0.1 + f64::from(level) * 0.05,
            target: None,
        }
    }

    /// Closest monster (or player, with PvP on) within detection range.
    fn nearest(&self, cx: &SequenceContext<'_>, at: Location) -> Option<EntityId> {
        let mut candidates: Vec<(f64, EntityId)> = cx
            .affected(at, self.range)
            .into_iter()
            .filter(|e| {
                matches!(
                    cx.engine.kind_of(*e),
                    Some(EntityKind::Monster | EntityKind::Player)
                )
            })
            .filter_map(|e| {
                let loc = cx.engine.location_of(e)?;
                Some((loc.pos.distance_squared(at.pos), e))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.first().map(|(_, e)| *e)
    }

    /// Current target's location, re-acquiring once if it was lost.
    fn target_location(&mut self, cx: &SequenceContext<'_>, at: Location) -> Option<Location> {
        let limit_sq = DETECTION_RANGE * DETECTION_RANGE * 1.5;
        let still_valid = self.target.and_then(|t| {
            if !cx.engine.is_entity_live(t) {
                return None;
            }
            let loc = cx.engine.location_of(t)?;
            (loc.world == at.world && loc.pos.distance_squared(at.pos) <= limit_sq).then_some(loc)
        });
        if still_valid.is_some() {
            return still_valid;
        }
        self.target = self.nearest(cx, at);
        self.target.and_then(|t| cx.engine.location_of(t))
    }

    fn steer(&self, phase: usize, position: DVec3, velocity: DVec3, target: DVec3) -> DVec3 {
        let aim = target + DVec3::Y;
        match phase {
            ASCEND => {
                let toward = (target - position).normalize_or_zero();
                DVec3::new(toward.x * 0.2, 0.8, toward.z * 0.2).normalize() * velocity.length()
            }
            DIVE => {
                let speed = velocity.length().max(1.5);
                let mut path = (aim - position).normalize_or_zero();
                path.y -= 0.3;
                path.normalize_or_zero() * speed
            }
            _ => {
                let speed = velocity.length();
                let desired = (aim - position).normalize_or_zero() * (speed + 0.1);
                let blended =
                    velocity * (1.0 - self.turn_strength) + desired * self.turn_strength;
                blended.normalize_or_zero() * speed
            }
        }
    }

    fn detonate(&self, cx: &mut SequenceContext<'_>, at: Location) {
        let level = f64::from(self.level);
        let radius = BASE_RADIUS + level * 0.5;
        let damage = BASE_DAMAGE + level * 2.0;
        let knockback = BASE_KNOCKBACK + level * 0.2;

        cx.engine
            .spawn_visual("explosion", at, &VisualParams::burst(3 + self.level, 0.5, 0.0));
        cx.engine.play_sound("generic_explode", at, 1.0, 1.2);

        for victim in cx.affected(at, radius) {
            let Some(loc) = cx.engine.location_of(victim) else {
                continue;
            };
            let falloff = (1.0 - loc.pos.distance(at.pos) / radius).max(0.0);
            cx.engine
                .apply_damage(victim, damage * falloff.max(0.3), cx.owner);
            let away = (loc.pos - at.pos).normalize_or_zero() * knockback * falloff;
            let velocity = cx.engine.velocity_of(victim).unwrap_or(DVec3::ZERO);
            cx.engine.set_velocity(victim, velocity + away);
        }

        if let Some(projectile) = cx.target.entity() {
            cx.engine.remove_entity(projectile);
        }
        tracing::debug!(sequence = %cx.id, level = self.level, "Seeker strike detonated");
    }
}

impl SequenceDriver for SeekerDriver {
    fn tick(&mut self, cx: &mut SequenceContext<'_>, phase: usize) -> DriverStatus {
        if cx.elapsed >= TRACKING_TICKS {
            return DriverStatus::Finish;
        }
        let (Some(projectile), Some(at)) = (cx.target.entity(), cx.anchor()) else {
            return DriverStatus::Continue;
        };

        match phase {
            ARMING => DriverStatus::Continue,
            ACQUIRE => match self.nearest(cx, at) {
                Some(found) => {
                    self.target = Some(found);
                    cx.engine.spawn_visual("target_lock", at, &VisualParams::burst(10, 0.2, 0.0));
                    DriverStatus::Complete
                }
                None => DriverStatus::Continue,
            },
            _ => {
                let Some(target) = self.target_location(cx, at) else {
                    return DriverStatus::Continue;
                };
                if at.pos.distance_squared(target.pos) < HIT_DISTANCE_SQ {
                    self.detonate(cx, at);
                    return DriverStatus::Finish;
                }
                let velocity = cx.engine.velocity_of(projectile).unwrap_or(DVec3::ZERO);
                let steered = self.steer(phase, at.pos, velocity, target.pos);
                cx.engine.set_velocity(projectile, steered);
                DriverStatus::Continue
            }
        }
    }
}
