//! Action → handler routing.
//!
//! For every action the router resolves the relevant item, decodes its
//! enchantments and calls each listening handler exactly once.
//!
//! | Category      | Item                                  |
//! |---------------|---------------------------------------|
//! | melee hit     | attacker's main hand                  |
//! | ranged launch | the bow / crossbow / trident          |
//! | ranged impact | launcher stored when the shot fired   |
//! | interact      | item in hand                          |
//! | move cell     | worn armor, highest level per name    |
//! | block break   | main hand                             |

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashMap;

use super::action::GameAction;
use crate::codec::{Item, LineScan, LoreCodec};
use crate::enchant::{DispatchContext, EnchantmentDefinition, EnchantmentRegistry};
use crate::engine::{EntityId, GameEngine};

/// Running totals since the router was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub actions: u64,
    pub invocations: u64,
    /// Movement inside a single grid cell, dropped without decoding.
    pub coalesced_moves: u64,
    pub malformed_lines: u64,
}

#[derive(Debug, Default)]
pub struct DispatchRouter {
    codec: LoreCodec,
    launched: HashMap<EntityId, Item>,
    stats: DispatchStats,
}

impl DispatchRouter {
    pub fn new(codec: LoreCodec) -> Self {
        Self {
            codec,
            launched: HashMap::new(),
            stats: DispatchStats::default(),
        }
    }

    pub fn codec(&self) -> &LoreCodec {
        &self.codec
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Projectiles whose launcher is being remembered for their impact.
    pub fn tracked_projectiles(&self) -> usize {
        self.launched.len()
    }

    /// Route one action. Returns the number of handler invocations.
    pub fn dispatch(
        &mut self,
        action: &GameAction,
        registry: &mut EnchantmentRegistry,
        cx: &mut DispatchContext<'_>,
    ) -> usize {
        self.stats.actions += 1;
        let category = action.category();
        let subject = action.subject();

        let targets: Vec<(String, u32, Item)> = match action {
            GameAction::MeleeHit(hit) => {
                self.resolve_item(hit.main_hand.as_ref(), subject, registry)
            }
            GameAction::RangedLaunch(launch) => {
                let targets = self.resolve_item(launch.launcher.as_ref(), subject, registry);
                if let Some(launcher) = launch.launcher.as_ref().filter(|_| !targets.is_empty()) {
                    self.launched.insert(launch.projectile, launcher.clone());
                }
                targets
            }
            GameAction::RangedImpact(impact) => {
                let launcher = self.launched.remove(&impact.projectile);
                self.resolve_item(launcher.as_ref(), subject, registry)
            }
            GameAction::Interact(interact) => {
                self.resolve_item(interact.item.as_ref(), subject, registry)
            }
            GameAction::MoveCell(movement) => {
                if movement.from.block() == movement.to.block() {
                    self.stats.coalesced_moves += 1;
                    return 0;
                }
                self.resolve_armor(&movement.armor, subject, registry)
            }
            GameAction::BlockBreak(block) => {
                self.resolve_item(block.main_hand.as_ref(), subject, registry)
            }
        };

        let mut fired = 0;
        for (key, level, item) in targets {
            if !registry.listens(&key, category) {
                continue;
            }
            let Some(handler) = registry.handler_mut(&key) else {
                tracing::error!(
                    enchantment = %key,
                    "BUG: listener index names an unregistered enchantment"
                );
                continue;
            };
            tracing::debug!(
                enchantment = %key,
                level,
                category = category.label(),
                subject = subject.0,
                "Dispatching"
            );
            match action {
                GameAction::MeleeHit(a) => handler.on_melee_hit(cx, a, &item, level),
                GameAction::RangedLaunch(a) => handler.on_ranged_launch(cx, a, &item, level),
                GameAction::RangedImpact(a) => handler.on_ranged_impact(cx, a, &item, level),
                GameAction::Interact(a) => handler.on_interact(cx, a, &item, level),
                GameAction::MoveCell(a) => handler.on_move_cell(cx, a, &item, level),
                GameAction::BlockBreak(a) => handler.on_block_break(cx, a, &item, level),
            }
            fired += 1;
        }
        self.stats.invocations += fired as u64;
        fired
    }

    /// Forget launchers of projectiles that no longer exist.
    pub fn prune_launches(&mut self, engine: &dyn GameEngine) -> usize {
        let before = self.launched.len();
        self.launched
            .retain(|projectile, _| engine.is_entity_live(*projectile));
        before - self.launched.len()
    }

    // ─── Resolution ─────────────────────────────────────────────────────────

    /// Decode one item, skipping (and logging) malformed lines. Later lines
    /// win over earlier ones for the same enchantment.
    fn active(
        &mut self,
        item: &Item,
        subject: EntityId,
        registry: &EnchantmentRegistry,
    ) -> Vec<(Arc<EnchantmentDefinition>, u32)> {
        let mut out: Vec<(Arc<EnchantmentDefinition>, u32)> = Vec::new();
        for scan in self.codec.scan(item, registry) {
            match scan {
                LineScan::Malformed(e) => {
                    self.stats.malformed_lines += 1;
                    tracing::warn!(
                        error = %e,
                        subject = subject.0,
                        "Skipping malformed enchantment line"
                    );
                }
                LineScan::Enchantment { definition, level } => {
                    match out.iter_mut().find(|(d, _)| d.key() == definition.key()) {
                        Some(slot) => slot.1 = level,
                        None => out.push((definition, level)),
                    }
                }
                LineScan::Foreign | LineScan::Unknown { .. } => {}
            }
        }
        out
    }

    fn resolve_item(
        &mut self,
        item: Option<&Item>,
        subject: EntityId,
        registry: &EnchantmentRegistry,
    ) -> Vec<(String, u32, Item)> {
        let Some(item) = item else {
            return Vec::new();
        };
        self.active(item, subject, registry)
            .into_iter()
            .map(|(def, level)| (def.key().to_string(), level, item.clone()))
            .collect()
    }

    /// One entry per enchantment across all pieces, at its highest level.
    fn resolve_armor(
        &mut self,
        armor: &[Item],
        subject: EntityId,
        registry: &EnchantmentRegistry,
    ) -> Vec<(String, u32, Item)> {
        let mut best: BTreeMap<String, (u32, &Item)> = BTreeMap::new();
        for piece in armor {
            for (def, level) in self.active(piece, subject, registry) {
                let slot = best.entry(def.key().to_string()).or_insert((level, piece));
                if level > slot.0 {
                    *slot = (level, piece);
                }
            }
        }
        best.into_iter()
            .map(|(key, (level, piece))| (key, level, piece.clone()))
            .collect()
    }
}
