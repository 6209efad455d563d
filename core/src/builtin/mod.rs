//! Built-in content enchantments.
//!
//! | Name                  | Items           | Reacts to              | Exercises                    |
//! |-----------------------|-----------------|------------------------|------------------------------|
//! | Inferno               | swords          | melee hit              | conflicts by name fragment   |
//! | Frostbite             | swords          | melee hit              | conflicts with Inferno       |
//! | Swift                 | boots           | move cell              | armor aggregation            |
//! | SoulSiphon            | weapons         | melee hit              | healing cap                  |
//! | Explosive             | bow, crossbow   | ranged launch / impact | stored launcher              |
//! | SeekerStrike          | trident         | ranged launch          | driver-guided sequence       |
//! | GravitationalCollapse | swords          | melee hit              | cooldown, proc, transients   |
//! | MagicMirror           | ender pearl     | interact               | cooldown message, channel    |
//!
//! The list is explicit: adding an enchantment means adding it to
//! [`builtin_handlers`].

mod collapse;
mod explosive;
mod frostbite;
mod inferno;
mod magic_mirror;
mod seeker_strike;
mod soul_siphon;
mod swift;


pub use collapse::GravitationalCollapse;
pub use explosive::Explosive;
pub use frostbite::Frostbite;
pub use inferno::Inferno;
pub use magic_mirror::MagicMirror;
pub use seeker_strike::SeekerStrike;
pub use soul_siphon::SoulSiphon;
pub use swift::Swift;

use enchantry_types::EngineSettings;

use crate::enchant::EnchantmentHandler;
use crate::session::EnchantSession;

/// Fresh handlers for every built-in enchantment.
pub fn builtin_handlers(settings: &EngineSettings) -> Vec<Box<dyn EnchantmentHandler>> {
    vec![
        Box::new(Inferno::new()),
        Box::new(Frostbite::new()),
        Box::new(Swift::new()),
        Box::new(SoulSiphon::new()),
        Box::new(Explosive::new()),
        Box::new(SeekerStrike::new()),
        Box::new(GravitationalCollapse::new(&settings.cooldowns)),
        Box::new(MagicMirror::new(&settings.cooldowns)),
    ]
}

/// Register every built-in enchantment. Returns the number installed;
/// names already taken are skipped.
pub fn install_all(session: &mut EnchantSession) -> usize {
    let handlers = builtin_handlers(session.settings());
    let offered = handlers.len();
    let installed = handlers
        .into_iter()
        .map(|handler| session.install(handler))
        .filter(|ok| *ok)
        .count();
    tracing::info!(installed, offered, "Installed built-in enchantments");
    installed
}
