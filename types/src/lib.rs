//! Shared types for the enchantry workspace.
//!
//! Kept free of engine and runtime concerns so front-ends (command handlers,
//! config editors) can depend on it without pulling in the core.

mod item;
pub mod numerals;
mod settings;

pub use item::ItemKind;
pub use numerals::{NumeralError, from_roman, to_roman};
pub use settings::{
    CooldownSettings, DEFAULT_TAG_PREFIX, DispatchSettings, EngineSettings, LoreSettings,
    SchedulerSettings,
};

/// Game time, counted in engine ticks.
pub type Tick = u64;

/// Engine tick rate used to convert ticks to wall-clock seconds in messages.
pub const TICKS_PER_SECOND: Tick = 20;
