//! Recall to a saved home.
//!
//! Left-click with the pearl saves the holder's position. Right-click starts
//! a short channel bound to the holder; moving away or dying cancels it,
//! otherwise the holder is teleported home when it ends.
//!
//! Homes are kept in memory per holder, not on the item, so they do not
//! survive a restart.
//!
//! | Level | Range                        |
//! |-------|------------------------------|
//! | I     | 1000 blocks, same world      |
//! | II    | 5000 blocks, same world      |
//! | III   | anywhere, across worlds      |

use std::sync::Arc;

use hashbrown::HashMap;

use enchantry_types::{CooldownSettings, ItemKind, TICKS_PER_SECOND, Tick};

use crate::codec::Item;
use crate::cooldown::CooldownTracker;
use crate::dispatch::{ActionCategory, Interact, InteractKind};
use crate::enchant::{ConflictRule, DispatchContext, EnchantmentDefinition, EnchantmentHandler};
use crate::engine::{EntityId, Location, VisualParams};
use crate::scheduler::{
    DriverStatus, EffectAction, EffectSequence, Phase, SequenceContext, SequenceDriver,
    SequenceEnd, SequenceId, TargetRef,
};

pub const COOLDOWN_SECS: Tick = 300;
const COOLDOWN: Tick = COOLDOWN_SECS * TICKS_PER_SECOND;
const CHANNEL_TICKS: Tick = 40;
/// How far the holder may drift while channelling.
const CHANNEL_LEASH: f64 = 1.0;

#[derive(Debug)]
pub struct MagicMirror {
    definition: Arc<EnchantmentDefinition>,
    /// Held in memory only: homes are lost when the handler is rebuilt.
    homes: HashMap<EntityId, Location>,
    /// Channels started by this handler that may still be running.
    channels: HashMap<EntityId, SequenceId>,
    cooldowns: CooldownTracker,
}

impl MagicMirror {
    pub const NAME: &'static str = "MagicMirror";

    pub fn new(settings: &CooldownSettings) -> Self {
        Self::with_tracker(CooldownTracker::new(settings))
    }

    pub fn seeded(settings: &CooldownSettings, seed: u64) -> Self {
        Self::with_tracker(CooldownTracker::seeded(settings, seed))
    }

    fn with_tracker(cooldowns: CooldownTracker) -> Self {
        let definition = EnchantmentDefinition::new(Self::NAME, 3, [ItemKind::EnderPearl])
            .with_conflicts(ConflictRule::Named(vec![
                "EnderMastery".into(),
                "VoidWalker".into(),
                "SpatialDistortion".into(),
            ]));
        Self {
            definition: Arc::new(definition),
            homes: HashMap::new(),
            channels: HashMap::new(),
            cooldowns,
        }
    }

    pub fn home_of(&self, subject: EntityId) -> Option<Location> {
        self.homes.get(&subject).copied()
    }

    /// Holders with a recall channel that had not ended at the last
    /// interaction.
    pub fn active_channels(&self) -> usize {
        self.channels.len()
    }

    /// Maximum same-world distance for a level, `None` when unlimited.
    pub fn max_distance(level: u32) -> Option<f64> {
        match level {
            0 | 1 => Some(1000.0),
            2 => Some(5000.0),
            _ => None,
        }
    }

    fn set_home(&mut self, cx: &mut DispatchContext<'_>, subject: EntityId, at: Location) {
        self.homes.insert(subject, at);
        cx.engine.send_status(
            subject,
            &format!(
                "Home location set to {:.0}, {:.0}, {:.0}",
                at.pos.x, at.pos.y, at.pos.z
            ),
        );
        cx.engine.play_sound("enchantment_table_use", at, 1.0, 1.0);
        cx.engine.spawn_visual("portal", at, &VisualParams::burst(30, 0.5, 0.1));
    }

    /// Why the holder cannot recall from `from`, if they cannot.
    fn range_refusal(level: u32, from: Location, home: Location) -> Option<String> {
        match from.distance(&home) {
            None if level < 3 => Some(format!(
                "Your Magic Mirror (Level {level}) cannot teleport across dimensions!"
            )),
            None => None,
            Some(distance) => {
                let limit = Self::max_distance(level)?;
                (distance > limit).then(|| {
                    format!(
                        "Your Magic Mirror (Level {level}) cannot teleport from distances \
                         greater than {limit:.0} blocks! Current distance: {distance:.0} blocks."
                    )
                })
            }
        }
    }

    fn recall(&mut self, cx: &mut DispatchContext<'_>, subject: EntityId, level: u32) {
        if self.channels.contains_key(&subject) {
            return;
        }
        let secs = self.cooldowns.remaining_secs(subject, COOLDOWN, cx.now);
        if secs > 0 {
            cx.engine.send_status(
                subject,
                &format!("Magic Mirror is on cooldown! {secs} seconds remaining."),
            );
            return;
        }
        let Some(home) = self.home_of(subject) else {
            cx.engine.send_status(
                subject,
                "You haven't set a home location yet! Left-click to set one.",
            );
            return;
        };
        let Some(from) = cx.engine.location_of(subject) else {
            return;
        };
        if let Some(refusal) = Self::range_refusal(level, from, home) {
            cx.engine.send_status(subject, &refusal);
            return;
        }
        self.cooldowns.try_fire(subject, COOLDOWN, cx.now);

        let channel = EffectSequence::new("magic_mirror", TargetRef::Entity(subject))
            .owner(subject)
            .phase(
                Phase::timed("channel", CHANNEL_TICKS)
                    .on_enter(EffectAction::sound("portal_trigger", 0.5, 1.5))
                    .on_tick(EffectAction::visual(
                        "portal",
                        VisualParams::burst(8, 0.5, 0.2).colored([170, 0, 255]),
                    )),
            )
            .driver(RecallDriver { origin: from, home });
        let id = cx.effects.start(channel);
        self.channels.insert(subject, id);
        tracing::debug!(
            sequence = %id,
            subject = subject.0,
            level,
            "Magic mirror channel started"
        );
    }
}

impl EnchantmentHandler for MagicMirror {
    fn definition(&self) -> &Arc<EnchantmentDefinition> {
        &self.definition
    }

    fn categories(&self) -> &[ActionCategory] {
        &[ActionCategory::Interact]
    }

    fn on_interact(
        &mut self,
        cx: &mut DispatchContext<'_>,
        interact: &Interact,
        _: &Item,
        level: u32,
    ) {
        self.channels.retain(|_, id| cx.effects.is_running(*id));
        match interact.kind {
            InteractKind::LeftClick => {
                let at = cx
                    .engine
                    .location_of(interact.subject)
                    .unwrap_or(interact.location);
                self.set_home(cx, interact.subject, at);
            }
            InteractKind::RightClick => self.recall(cx, interact.subject, level),
        }
    }
}

// ─── Channel ────────────────────────────────────────────────────────────────

struct RecallDriver {
    origin: Location,
    home: Location,
}

impl SequenceDriver for RecallDriver {
    fn tick(&mut self, cx: &mut SequenceContext<'_>, _phase: usize) -> DriverStatus {
        let drifted = cx
            .anchor()
            .and_then(|at| at.distance(&self.origin))
            .is_none_or(|d| d > CHANNEL_LEASH);
        if drifted {
            if let Some(owner) = cx.owner {
                cx.engine.send_status(owner, "Teleport interrupted.");
            }
            return DriverStatus::Abort;
        }
        DriverStatus::Continue
    }

    fn cleanup(&mut self, cx: &mut SequenceContext<'_>, end: &SequenceEnd) {
        if *end != SequenceEnd::Completed {
            return;
        }
        let Some(subject) = cx.target.entity() else {
            return;
        };
        cx.engine.teleport(subject, self.home);
        cx.engine.play_sound("enderman_teleport", self.home, 1.0, 1.0);
        cx.engine.spawn_visual("portal", self.home, &VisualParams::burst(50, 0.5, 0.5));
        cx.engine.send_status(
            subject,
            &format!("Teleported to home location! Cooldown: {COOLDOWN_SECS} seconds."),
        );
    }
}
