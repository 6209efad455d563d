//! Item kind tags.
//!
//! Enchantments declare the set of kinds they may be applied to. The engine
//! maps its own materials onto these tags.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    // ─── Melee ──────────────────────────────────────────────────────────────
    Sword,
    Axe,
    Trident,

    // ─── Ranged ─────────────────────────────────────────────────────────────
    Bow,
    Crossbow,

    // ─── Tools ──────────────────────────────────────────────────────────────
    Pickaxe,
    Shovel,
    Hoe,

    // ─── Armor ──────────────────────────────────────────────────────────────
    Helmet,
    Chestplate,
    Leggings,
    Boots,

    // ─── Misc ───────────────────────────────────────────────────────────────
    EnderPearl,
    Other,
}

impl ItemKind {
    pub const SWORDS: &'static [ItemKind] = &[ItemKind::Sword];

    /// Everything that can deal a melee or ranged hit.
    pub const WEAPONS: &'static [ItemKind] = &[
        ItemKind::Sword,
        ItemKind::Axe,
        ItemKind::Trident,
        ItemKind::Bow,
        ItemKind::Crossbow,
    ];

    pub const LAUNCHERS: &'static [ItemKind] = &[ItemKind::Bow, ItemKind::Crossbow];

    pub const ARMOR: &'static [ItemKind] = &[
        ItemKind::Helmet,
        ItemKind::Chestplate,
        ItemKind::Leggings,
        ItemKind::Boots,
    ];

    pub fn is_armor(self) -> bool {
        Self::ARMOR.contains(&self)
    }

    /// Kinds that fire projectiles on a ranged launch.
    pub fn is_launcher(self) -> bool {
        matches!(self, Self::Bow | Self::Crossbow | Self::Trident)
    }
}
