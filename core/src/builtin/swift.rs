use std::sync::Arc;

use glam::DVec3;

use enchantry_types::{ItemKind, Tick};

use super::frostbite::amplifier;
use crate::codec::Item;
use crate::dispatch::{ActionCategory, MoveCell};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{StatusEffect, StatusKind, VisualParams};

/// Refreshed on every grid cell the wearer crosses.
const SPEED_TICKS: Tick = 40;

/// Boots that keep the wearer at speed while moving.
#[derive(Debug)]
pub struct Swift {
    definition: Arc<EnchantmentDefinition>,
}

impl Swift {
    pub const NAME: &'static str = "Swift";

    pub fn new() -> Self {
        let definition = EnchantmentDefinition::new(Self::NAME, 3, [ItemKind::Boots])
            .with_conflicts(ConflictRule::NameContains(vec![
                "speed".into(),
                "swift".into(),
                "quick".into(),
            ]));
        Self {
            definition: Arc::new(definition),
        }
    }

    fn trail_color(level: u32) -> [u8; 3] {
        match level {
            1 => [0, 255, 255],
            2 => [0, 0, 255],
            3 => [128, 0, 128],
            _ => [255, 255, 255],
        }
    }
}

impl Default for Swift {
    fn default() -> Self {
        Self::new()
    }
}

impl EnchantmentHandler for Swift {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::MoveCell]
    }

    fn on_move_cell(
        &mut self,
        cx: &mut DispatchContext<'_>,
        movement: &MoveCell,
        _: &Item,
        level: u32,
    ) {
        cx.engine.apply_status(
            movement.subject,
            StatusEffect {
                kind: StatusKind::Speed,
                duration: SPEED_TICKS,
                amplifier: amplifier(level),
            },
        );
        if movement.sprinting {
            cx.engine.spawn_visual(
                "dust",
                movement.to.offset(DVec3::new(0.0, 0.1, 0.0)),
                &VisualParams::burst(5, 0.1, 0.0).colored(Self::trail_color(level)),
            );
        }
    }
}
