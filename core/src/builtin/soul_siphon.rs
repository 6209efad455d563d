use std::sync::Arc;

use glam::DVec3;

use enchantry_types::ItemKind;

use crate::codec::Item;
use crate::dispatch::{ActionCategory, MeleeHit};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::VisualParams;

const MAX_HEAL: f64 = 6.0;

/// Heals the attacker for a share of the melee damage dealt.
#[derive(Debug)]
pub struct SoulSiphon {
    definition: Arc<EnchantmentDefinition>,
}

impl SoulSiphon {
    pub const NAME: &'static str = "SoulSiphon";

    pub fn new() -> Self {
        let definition =
            EnchantmentDefinition::new(Self::NAME, 3, ItemKind::WEAPONS.iter().copied())
                .with_conflicts(ConflictRule::NameContains(vec![
                    "siphon".into(),
                    "leech".into(),
                    "vampir".into(),
                    "drain".into(),
                ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    /// 10% of the damage at level I, 5% more per level, never above 6.
    pub fn heal_amount(damage: f64, level: u32) -> f64 {
        let share = 0.05 + f64::from(level) * 0.05;
        (damage.max(0.0) * share).min(MAX_HEAL)
    }
}

impl Default for SoulSiphon {
    fn default() -> Self {
        Self::new()
    }
}

impl EnchantmentHandler for SoulSiphon {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::MeleeHit]
    }

    fn on_melee_hit(&mut self, cx: &mut DispatchContext<'_>, hit: &MeleeHit, _: &Item, level: u32) {
        let living = cx.engine.kind_of(hit.victim).is_some_and(|k| k.is_living());
        let amount = Self::heal_amount(hit.damage, level);
        if !living || amount <= 0.0 {
            return;
        }
        cx.engine.heal(hit.attacker, amount);

        if let Some(at) = cx.engine.location_of(hit.attacker) {
            cx.engine.spawn_visual(
                "soul",
                at.offset(DVec3::Y),
                &VisualParams::burst(5 + 3 * level, 0.3, 0.05).colored([90, 0, 120]),
            );
            cx.engine.play_sound("soul_escape", at, 0.5, 1.2);
        }
        tracing::debug!(
            attacker = hit.attacker.0,
            amount,
            level,
            "Soul siphon healed attacker"
        );
    }
}
