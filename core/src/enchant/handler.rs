//! Per-enchantment behavior.
//!
//! Each enchantment is one [`EnchantmentHandler`] implementation that owns
//! its own state (cooldowns, tracked targets). The router calls only the
//! methods for categories the handler declares; every method defaults to
//! a no-op.

use std::sync::Arc;

use enchantry_types::{EngineSettings, Tick};

use super::EnchantmentDefinition;
use crate::codec::Item;
use crate::dispatch::{
    ActionCategory, BlockBreak, Interact, MeleeHit, MoveCell, RangedImpact, RangedLaunch,
};
use crate::engine::GameEngine;
use crate::scheduler::EffectRegistry;

/// Everything a handler may touch while reacting to one action.
pub struct DispatchContext<'a> {
    pub engine: &'a mut dyn GameEngine,
    pub effects: &'a mut EffectRegistry,
    pub settings: &'a EngineSettings,
    pub now: Tick,
}

pub trait EnchantmentHandler: Send {
    fn definition(&self) -> &Arc<EnchantmentDefinition>;

    /// Categories this handler reacts to. Read once at registration.
    fn categories(&self) -> &[ActionCategory] {
        &ActionCategory::ALL
    }

    fn on_melee_hit(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _hit: &MeleeHit,
        _item: &Item,
        _level: u32,
    ) {
    }

    fn on_ranged_launch(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _launch: &RangedLaunch,
        _item: &Item,
        _level: u32,
    ) {
    }

    /// `item` is the launcher recorded when the projectile was fired.
    fn on_ranged_impact(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _impact: &RangedImpact,
        _item: &Item,
        _level: u32,
    ) {
    }

    fn on_interact(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _interact: &Interact,
        _item: &Item,
        _level: u32,
    ) {
    }

    /// `item` is the armor piece carrying the highest level of this
    /// enchantment.
    fn on_move_cell(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _movement: &MoveCell,
        _item: &Item,
        _level: u32,
    ) {
    }

    fn on_block_break(
        &mut self,
        _cx: &mut DispatchContext<'_>,
        _block: &BlockBreak,
        _item: &Item,
        _level: u32,
    ) {
    }
}

/// Handler for an enchantment that only exists as lore (no behavior).
pub struct InertHandler {
    definition: Arc<EnchantmentDefinition>,
}

impl InertHandler {
    pub fn new(definition: EnchantmentDefinition) -> Self {
        Self {
            definition: Arc::new(definition),
        }
    }
}

impl EnchantmentHandler for InertHandler {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[]
    }
}
