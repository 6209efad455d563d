pub mod builtin;
pub mod codec;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod enchant;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod session;

// Re-exports for convenience
pub use builtin::{builtin_handlers, install_all};
pub use codec::{DecodedEnchantments, Item, LoreCodec};
pub use config::{default_settings_path, load_settings, save_settings};
pub use cooldown::CooldownTracker;
pub use dispatch::{DispatchRouter, GameAction};
pub use enchant::{EnchantmentDefinition, EnchantmentHandler, EnchantmentRegistry};
pub use engine::{EntityId, GameEngine, Location, SandboxWorld};
pub use error::{CancelReason, ConfigError, DecodeError, RegistryError, RejectReason};
pub use scheduler::{EffectRegistry, EffectSequence, SequenceId};
pub use session::EnchantSession;
