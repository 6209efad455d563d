//! Gravitational collapse: a short-lived black hole at the victim.
//!
//! | Phase     | Ticks | Effect                                   |
//! |-----------|-------|------------------------------------------|
//! | highlight | 20    | marker appears, particles                |
//! | collapse  | 60    | nearby mobs pulled in, harder over time  |
//! | hold      | 20    | mobs held at the core, then burst        |

use std::sync::Arc;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use enchantry_types::{CooldownSettings, ItemKind, TICKS_PER_SECOND, Tick};

use crate::codec::Item;
use crate::cooldown::CooldownTracker;
use crate::dispatch::{ActionCategory, MeleeHit};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{EntityId, Location, VisualParams};
use crate::scheduler::{
    DriverStatus, EffectAction, EffectSequence, Phase, SequenceContext, SequenceDriver, TargetRef,
};

const COOLDOWN: Tick = 20 * TICKS_PER_SECOND;
const HIGHLIGHT_TICKS: Tick = 20;
const COLLAPSE_TICKS: Tick = 60;
const HOLD_TICKS: Tick = 20;
const CORE_OFFSET_Y: f64 = 1.5;

const COLLAPSE: usize = 1;
const HOLD: usize = 2;

#[derive(Debug)]
pub struct GravitationalCollapse {
    definition: Arc<EnchantmentDefinition>,
    cooldowns: CooldownTracker,
    rng: StdRng,
    fixed_chance: Option<f64>,
}

impl GravitationalCollapse {
    pub const NAME: &'static str = "GravitationalCollapse";

    pub fn new(settings: &CooldownSettings) -> Self {
        Self::with_parts(CooldownTracker::new(settings), StdRng::from_os_rng())
    }

    pub fn seeded(settings: &CooldownSettings, seed: u64) -> Self {
        Self::with_parts(
            CooldownTracker::seeded(settings, seed),
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_parts(cooldowns: CooldownTracker, rng: StdRng) -> Self {
        let definition =
            EnchantmentDefinition::new(Self::NAME, 3, ItemKind::SWORDS.iter().copied())
                .with_conflicts(ConflictRule::Named(vec![
                    "SingularityVortex".into(),
                    "DimensionalRift".into(),
                    "GravityWell".into(),
                ]));
        Self {
            definition: Arc::new(definition),
            cooldowns,
            rng,
            fixed_chance: None,
        }
    }

    /// Use `chance` for every level instead of the level curve.
    pub fn with_proc_chance(mut self, chance: f64) -> Self {
        self.fixed_chance = Some(chance);
        self
    }

    pub fn proc_chance(level: u32) -> f64 {
        0.15 + f64::from(level) * 0.05
    }

    pub fn radius(level: u32) -> f64 {
        3.0 + f64::from(level)
    }

    fn sequence(core: Location, owner: EntityId, level: u32) -> EffectSequence {
        let radius = Self::radius(level);
        EffectSequence::new("gravitational_collapse", TargetRef::Location(core))
            .owner(owner)
            .budget(HIGHLIGHT_TICKS + COLLAPSE_TICKS + HOLD_TICKS + TICKS_PER_SECOND)
            .phase(
                Phase::timed("highlight", HIGHLIGHT_TICKS)
                    .on_enter(EffectAction::sound("beacon_activate", 1.0, 0.5))
                    .on_tick(EffectAction::visual(
                        "portal",
                        VisualParams::burst(6, radius / 2.0, 0.1),
                    )),
            )
            .phase(
                Phase::timed("collapse", COLLAPSE_TICKS)
                    .on_tick(EffectAction::visual(
                        "reverse_portal",
                        VisualParams::burst(12, 0.5, 0.0),
                    )),
            )
            .phase(
                Phase::timed("hold", HOLD_TICKS)
                    .on_exit(EffectAction::Damage {
                        amount: 8.0 + f64::from(level) * 4.0,
                        radius,
                    })
                    .on_exit(EffectAction::Push {
                        strength: 1.0 + f64::from(level) * 0.25,
                        radius,
                    })
                    .on_exit(EffectAction::visual("explosion", VisualParams::burst(3, 1.0, 0.0)))
                    .on_exit(EffectAction::sound("generic_explode", 1.0, 0.6)),
            )
            .driver(CollapseDriver { radius })
    }
}

impl EnchantmentHandler for GravitationalCollapse {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::MeleeHit]
    }

    fn on_melee_hit(&mut self, cx: &mut DispatchContext<'_>, hit: &MeleeHit, _: &Item, level: u32) {
        let living = cx.engine.kind_of(hit.victim).is_some_and(|k| k.is_living());
        if !living || self.cooldowns.remaining(hit.attacker, COOLDOWN, cx.now) > 0 {
            return;
        }
        let chance = self
            .fixed_chance
            .unwrap_or_else(|| Self::proc_chance(level))
            .clamp(0.0, 1.0);
        if !self.rng.random_bool(chance) {
            return;
        }
        let Some(at) = cx.engine.location_of(hit.victim) else {
            return;
        };
        self.cooldowns.try_fire(hit.attacker, COOLDOWN, cx.now);

        let core = at.offset(DVec3::new(0.0, CORE_OFFSET_Y, 0.0));
        let id = cx.effects.start(Self::sequence(core, hit.attacker, level));
        cx.engine.send_status(hit.attacker, "Gravitational Collapse activated!");
        tracing::debug!(
            sequence = %id,
            attacker = hit.attacker.0,
            level,
            "Gravitational collapse triggered"
        );
    }
}

// ─── Pull ───────────────────────────────────────────────────────────────────

struct CollapseDriver {
    radius: f64,
}

impl SequenceDriver for CollapseDriver {
    fn enter(&mut self, cx: &mut SequenceContext<'_>, phase: usize) {
        if phase == 0
            && let Some(core) = cx.anchor()
        {
            cx.spawn_transient("black_hole", core);
        }
    }

    fn tick(&mut self, cx: &mut SequenceContext<'_>, phase: usize) -> DriverStatus {
        let Some(core) = cx.anchor() else {
            return DriverStatus::Continue;
        };
        // Pull strength ramps up across the collapse, then pins mobs.
        let strength = match phase {
            COLLAPSE => 0.2 + 0.4 * cx.progress(),
            HOLD => 0.0,
            _ => return DriverStatus::Continue,
        };
        for victim in cx.affected(core, self.radius) {
            let Some(loc) = cx.engine.location_of(victim) else {
                continue;
            };
            let inward = (core.pos - loc.pos).normalize_or_zero();
            cx.engine.set_velocity(victim, inward * strength);
        }
        DriverStatus::Continue
    }
}
