//! Tunable engine settings.
//!
//! Every field has a default so a partial (or missing) settings file is
//! always valid.

use serde::{Deserialize, Serialize};

use crate::Tick;

/// Prefix placed in front of every enchantment lore line (`§7`, gray).
pub const DEFAULT_TAG_PREFIX: &str = "\u{a7}7";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub scheduler: SchedulerSettings,
    pub cooldowns: CooldownSettings,
    pub dispatch: DispatchSettings,
    pub lore: LoreSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Hard ceiling on the lifetime of any effect sequence, in ticks.
    /// Sequences may ask for a tighter budget but never a looser one.
    pub max_sequence_ticks: Tick,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_sequence_ticks: 1200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    /// Probability that a `try_fire` call also sweeps stale entries.
    pub sweep_chance: f64,
    /// Entries older than `cooldown * ttl_multiplier` are stale.
    pub ttl_multiplier: u64,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            sweep_chance: 0.1,
            ttl_multiplier: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Whether homing and area effects may select players as targets.
    pub pvp_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoreSettings {
    pub tag_prefix: String,
}

impl Default for LoreSettings {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}
