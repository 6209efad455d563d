//! Enchantment definitions, behavior and the registry that owns them.

mod definition;
mod handler;
mod registry;

pub use definition::{ConflictRule, EnchantmentDefinition};
pub use handler::{DispatchContext, EnchantmentHandler, InertHandler};
pub use registry::EnchantmentRegistry;
