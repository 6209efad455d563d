use std::sync::Arc;

use glam::DVec3;

use enchantry_types::{ItemKind, Tick};

use crate::codec::Item;
use crate::dispatch::{ActionCategory, MeleeHit};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::VisualParams;

/// Sets melee victims on fire for one second per level.
#[derive(Debug)]
pub struct Inferno {
    definition: Arc<EnchantmentDefinition>,
}

impl Inferno {
    pub const NAME: &'static str = "Inferno";

    pub fn new() -> Self {
        let definition = EnchantmentDefinition::new(Self::NAME, 3, ItemKind::SWORDS.iter().copied())
            .with_conflicts(ConflictRule::NameContains(vec![
                "fire".into(),
                "flame".into(),
                "burn".into(),
            ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    pub fn burn_ticks(level: u32) -> Tick {
        Tick::from(level) * 20
    }
}

impl Default for Inferno {
    fn default() -> Self {
        Self::new()
    }
}

impl EnchantmentHandler for Inferno {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::MeleeHit]
    }

    fn on_melee_hit(&mut self, cx: &mut DispatchContext<'_>, hit: &MeleeHit, _: &Item, level: u32) {
        if !cx.engine.is_entity_live(hit.victim) {
            return;
        }
        cx.engine.ignite(hit.victim, Self::burn_ticks(level));
        if let Some(at) = cx.engine.location_of(hit.victim) {
            cx.engine
                .spawn_visual("flame", at.offset(DVec3::Y), &VisualParams::burst(8, 0.3, 0.02));
        }
    }
}
