use std::sync::Arc;

use glam::DVec3;

use enchantry_types::{ItemKind, Tick};

use crate::codec::Item;
use crate::dispatch::{ActionCategory, MeleeHit};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{StatusEffect, StatusKind, VisualParams};

/// Slows melee victims. Cannot share a blade with fire enchantments.
#[derive(Debug)]
pub struct Frostbite {
    definition: Arc<EnchantmentDefinition>,
}

impl Frostbite {
    pub const NAME: &'static str = "Frostbite";

    pub fn new() -> Self {
        let definition = EnchantmentDefinition::new(Self::NAME, 3, ItemKind::SWORDS.iter().copied())
            .with_conflicts(ConflictRule::NameContains(vec![
                "inferno".into(),
                "fire".into(),
                "flame".into(),
            ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    pub fn slowness(level: u32) -> StatusEffect {
        StatusEffect {
            kind: StatusKind::Slowness,
            duration: 40 + Tick::from(level) * 20,
            amplifier: amplifier(level),
        }
    }
}

impl Default for Frostbite {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-based status strength for an enchantment level.
pub(super) fn amplifier(level: u32) -> u8 {
    u8::try_from(level.saturating_sub(1)).unwrap_or(u8::MAX)
}

impl EnchantmentHandler for Frostbite {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::MeleeHit]
    }

    fn on_melee_hit(&mut self, cx: &mut DispatchContext<'_>, hit: &MeleeHit, _: &Item, level: u32) {
        let living = cx.engine.kind_of(hit.victim).is_some_and(|k| k.is_living());
        if !living || !cx.engine.is_entity_live(hit.victim) {
            return;
        }
        cx.engine.apply_status(hit.victim, Self::slowness(level));
        if let Some(at) = cx.engine.location_of(hit.victim) {
            cx.engine.spawn_visual(
                "snowflake",
                at.offset(DVec3::Y),
                &VisualParams::burst(10 + 5 * level, 0.4, 0.01),
            );
        }
    }
}
