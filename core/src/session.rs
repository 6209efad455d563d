//! Engine-facing session.
//!
//! Owns the registry, router and effect registry for one running game and
//! is the single entry point the host calls: actions in through
//! [`handle_action`](EnchantSession::handle_action), time in through
//! [`tick`](EnchantSession::tick).

use enchantry_types::{EngineSettings, Tick};

use crate::codec::{DecodedEnchantments, Item, LoreCodec};
use crate::dispatch::{DispatchRouter, DispatchStats, GameAction};
use crate::enchant::{DispatchContext, EnchantmentHandler, EnchantmentRegistry};
use crate::engine::GameEngine;
use crate::error::RejectReason;
use crate::scheduler::{EffectRegistry, TickReport};

#[derive(Debug)]
pub struct EnchantSession {
    settings: EngineSettings,
    registry: EnchantmentRegistry,
    router: DispatchRouter,
    effects: EffectRegistry,
    now: Tick,
}

impl Default for EnchantSession {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl EnchantSession {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            router: DispatchRouter::new(LoreCodec::from_settings(&settings)),
            effects: EffectRegistry::from_settings(&settings),
            registry: EnchantmentRegistry::new(),
            settings,
            now: 0,
        }
    }

    /// Register one enchantment. Returns false if the name is taken.
    pub fn install(&mut self, handler: Box<dyn EnchantmentHandler>) -> bool {
        self.registry.register(handler)
    }

    // ─── Engine entry points ────────────────────────────────────────────────

    /// Route one game action. Returns the number of handler invocations.
    pub fn handle_action(&mut self, engine: &mut dyn GameEngine, action: &GameAction) -> usize {
        let mut cx = DispatchContext {
            engine,
            effects: &mut self.effects,
            settings: &self.settings,
            now: self.now,
        };
        self.router.dispatch(action, &mut self.registry, &mut cx)
    }

    /// Advance game time by one tick.
    pub fn tick(&mut self, engine: &mut dyn GameEngine) -> TickReport {
        self.now += 1;
        let report = self.effects.tick(engine, self.now);
        let pruned = self.router.prune_launches(&*engine);
        if pruned > 0 {
            tracing::debug!(pruned, "Forgot launchers of despawned projectiles");
        }
        report
    }

    /// Cancel every running effect. Returns the number cancelled.
    pub fn shutdown(&mut self, engine: &mut dyn GameEngine) -> usize {
        let cancelled = self.effects.cancel_all(engine);
        let stats = self.router.stats();
        tracing::info!(
            cancelled,
            enchantments = self.registry.len(),
            actions = stats.actions,
            invocations = stats.invocations,
            "Enchantment session shut down"
        );
        cancelled
    }

    // ─── Item operations ────────────────────────────────────────────────────

    /// Apply `name` at `level` to a copy of `item`.
    pub fn apply(&self, item: &Item, name: &str, level: u32) -> Result<Item, RejectReason> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| RejectReason::UnknownEnchantment(name.to_string()))?;
        self.codec().apply(item, definition, level, &self.registry)
    }

    /// Copy of `item` without `name`, or `None` if it was not present.
    pub fn remove(&self, item: &Item, name: &str) -> Option<Item> {
        let definition = self.registry.get(name)?;
        self.codec().remove(item, definition)
    }

    pub fn decode(&self, item: &Item) -> DecodedEnchantments {
        self.codec().decode(item, &self.registry)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn codec(&self) -> &LoreCodec {
        self.router.codec()
    }

    pub fn registry(&self) -> &EnchantmentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EnchantmentRegistry {
        &mut self.registry
    }

    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.router.stats()
    }
}

#[cfg(test)]
mod tests {
    use enchantry_types::ItemKind;

    use super::*;
    use crate::enchant::{EnchantmentDefinition, InertHandler};
    use crate::engine::{EntityKind, Location, SandboxWorld, WorldId};
    use crate::scheduler::{EffectSequence, Phase, TargetRef};

    fn make_session() -> EnchantSession {
        let mut session = EnchantSession::default();
        let keen = EnchantmentDefinition::new("Keen", 3, [ItemKind::Sword, ItemKind::Axe]);
        assert!(session.install(Box::new(InertHandler::new(keen))));
        session
    }

    #[test]
    fn test_install_rejects_duplicate_names() {
        let mut session = make_session();
        let again = EnchantmentDefinition::new("KEEN", 1, [ItemKind::Bow]);
        assert!(!session.install(Box::new(InertHandler::new(again))));
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn test_apply_unknown_enchantment() {
        let session = make_session();
        assert_eq!(
            session.apply(&Item::new(ItemKind::Sword), "Sharpness", 1),
            Err(RejectReason::UnknownEnchantment("Sharpness".into()))
        );
    }

    #[test]
    fn test_apply_decode_remove() {
        let session = make_session();
        let item = session.apply(&Item::new(ItemKind::Axe), "keen", 2).unwrap();
        assert_eq!(session.decode(&item).levels(), vec![("Keen".to_string(), 2)]);

        let bare = session.remove(&item, "Keen").unwrap();
        assert!(session.decode(&bare).is_empty());
        assert!(session.remove(&bare, "Keen").is_none());
        assert!(session.remove(&item, "Sharpness").is_none());
    }

    #[test]
    fn test_tick_advances_clock_and_effects() {
        let mut session = make_session();
        let mut world = SandboxWorld::new();
        let spot = Location::new(WorldId(0), 0.0, 64.0, 0.0);
        let pulse =
            EffectSequence::new("pulse", TargetRef::Location(spot)).phase(Phase::timed("a", 2));
        session.effects_mut().start(pulse);

        assert_eq!(session.tick(&mut world).completed(), 0);
        assert_eq!(session.tick(&mut world).completed(), 1);
        assert_eq!(session.now(), 2);
        assert!(session.effects().is_empty());
    }

    #[test]
    fn test_shutdown_cancels_running_effects() {
        let mut session = make_session();
        let mut world = SandboxWorld::new();
        let zombie = world.spawn(EntityKind::Monster, Location::new(WorldId(0), 0.0, 64.0, 0.0));
        for name in ["a", "b"] {
            session.effects_mut().start(
                EffectSequence::new(name, TargetRef::Entity(zombie)).phase(Phase::timed("a", 100)),
            );
        }
        session.tick(&mut world);

        assert_eq!(session.shutdown(&mut world), 2);
        assert!(session.effects().is_empty());
        assert_eq!(session.shutdown(&mut world), 0);
    }
}
