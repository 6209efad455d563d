use std::sync::Arc;

use enchantry_types::ItemKind;

use crate::codec::Item;
use crate::dispatch::{ActionCategory, RangedImpact, RangedLaunch};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{StatusEffect, StatusKind};

/// Arrows from an explosive launcher blow up where they land.
///
/// No per-projectile state is kept here: the router hands the launcher
/// stored at launch time back on impact.
#[derive(Debug)]
pub struct Explosive {
    definition: Arc<EnchantmentDefinition>,
}

impl Explosive {
    pub const NAME: &'static str = "Explosive";

    pub fn new() -> Self {
        let definition =
            EnchantmentDefinition::new(Self::NAME, 3, ItemKind::LAUNCHERS.iter().copied())
                .with_conflicts(ConflictRule::NameContains(vec![
                    "explo".into(),
                    "blast".into(),
                    "bomb".into(),
                ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    pub fn power(level: u32) -> f32 {
        0.5 + level as f32 * 0.5
    }
}

impl Default for Explosive {
    fn default() -> Self {
        Self::new()
    }
}

impl EnchantmentHandler for Explosive {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::RangedLaunch, ActionCategory::RangedImpact]
    }

    fn on_ranged_launch(
        &mut self,
        cx: &mut DispatchContext<'_>,
        launch: &RangedLaunch,
        _: &Item,
        _level: u32,
    ) {
        // Visible cue that the shot is armed.
        cx.engine.apply_status(
            launch.projectile,
            StatusEffect {
                kind: StatusKind::Glowing,
                duration: 200,
                amplifier: 0,
            },
        );
        cx.engine.ignite(launch.projectile, 200);
    }

    fn on_ranged_impact(
        &mut self,
        cx: &mut DispatchContext<'_>,
        impact: &RangedImpact,
        _: &Item,
        level: u32,
    ) {
        cx.engine.create_explosion(
            impact.location,
            Self::power(level),
            level >= 3,
            Some(impact.shooter),
        );
        if cx.engine.is_entity_live(impact.projectile) {
            cx.engine.remove_entity(impact.projectile);
        }
        tracing::debug!(
            shooter = impact.shooter.0,
            level,
            "Explosive projectile detonated"
        );
    }
}
