//! Per-subject cooldown map with lazy, probabilistic eviction.
//!
//! Each enchantment owns its own tracker. Stale entries are swept with a
//! small probability on each `try_fire` call instead of on a timer, so
//! memory stays bounded in the long run without a dedicated task.

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use enchantry_types::{CooldownSettings, TICKS_PER_SECOND, Tick};

use crate::engine::EntityId;

#[derive(Debug)]
pub struct CooldownTracker {
    last_fire: HashMap<EntityId, Tick>,
    sweep_chance: f64,
    ttl_multiplier: u64,
    rng: StdRng,
}

impl CooldownTracker {
    pub fn new(settings: &CooldownSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Deterministic tracker for tests and replays.
    pub fn seeded(settings: &CooldownSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(settings: &CooldownSettings, rng: StdRng) -> Self {
        let sweep_chance = if settings.sweep_chance.is_finite() {
            settings.sweep_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            last_fire: HashMap::new(),
            sweep_chance,
            ttl_multiplier: settings.ttl_multiplier.max(1),
            rng,
        }
    }

    /// Record a proc for `subject` at `now` if it is off cooldown.
    ///
    /// Succeeds when there is no prior record or `now - last >= cooldown`.
    /// On failure the stored time is left untouched.
    pub fn try_fire(&mut self, subject: EntityId, cooldown: Tick, now: Tick) -> bool {
        if self.sweep_chance > 0.0 && self.rng.random_bool(self.sweep_chance) {
            let max_age = cooldown.saturating_mul(self.ttl_multiplier);
            self.sweep(now, max_age);
        }

        match self.last_fire.get(&subject) {
            Some(&last) if now.saturating_sub(last) < cooldown => false,
            _ => {
                self.last_fire.insert(subject, now);
                true
            }
        }
    }

    /// Ticks until `subject` may fire again, 0 if ready.
    pub fn remaining(&self, subject: EntityId, cooldown: Tick, now: Tick) -> Tick {
        self.last_fire
            .get(&subject)
            .map(|&last| cooldown.saturating_sub(now.saturating_sub(last)))
            .unwrap_or(0)
    }

    /// Whole seconds until ready, rounded up, for status messages.
    pub fn remaining_secs(&self, subject: EntityId, cooldown: Tick, now: Tick) -> u64 {
        self.remaining(subject, cooldown, now).div_ceil(TICKS_PER_SECOND)
    }

    /// Drop entries whose last fire is older than `max_age`. Returns the
    /// number removed.
    pub fn sweep(&mut self, now: Tick, max_age: Tick) -> usize {
        let before = self.last_fire.len();
        self.last_fire
            .retain(|_, last| now.saturating_sub(*last) <= max_age);
        let removed = before - self.last_fire.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.last_fire.len(), "Swept stale cooldowns");
        }
        removed
    }

    pub fn last_fire(&self, subject: EntityId) -> Option<Tick> {
        self.last_fire.get(&subject).copied()
    }

    pub fn len(&self) -> usize {
        self.last_fire.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fire.is_empty()
    }
}
