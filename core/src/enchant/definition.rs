//! Immutable enchantment definitions and conflict rules.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use enchantry_types::{ItemKind, to_roman};

/// Conflict predicate expressed as data.
///
/// Rules are not required to be symmetric. Callers that need to know
/// whether two enchantments can coexist must check both directions.
#[derive(Clone, Default)]
pub enum ConflictRule {
    #[default]
    None,
    /// Conflicts with any enchantment whose lowercased name contains one of
    /// these fragments.
    NameContains(Vec<String>),
    /// Conflicts with the listed enchantments (case-insensitive).
    Named(Vec<String>),
    Custom(fn(&EnchantmentDefinition, &EnchantmentDefinition) -> bool),
}

impl fmt::Debug for ConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::NameContains(parts) => f.debug_tuple("NameContains").field(parts).finish(),
            Self::Named(names) => f.debug_tuple("Named").field(names).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnchantmentDefinition {
    name: String,
    key: String,
    max_level: u32,
    domain: BTreeSet<ItemKind>,
    conflicts: ConflictRule,
}

impl EnchantmentDefinition {
    /// `max_level` is raised to at least 1.
    pub fn new(
        name: impl Into<String>,
        max_level: u32,
        domain: impl IntoIterator<Item = ItemKind>,
    ) -> Self {
        let name = name.into().trim().to_string();
        Self {
            key: name.to_lowercase(),
            name,
            max_level: max_level.max(1),
            domain: domain.into_iter().collect(),
            conflicts: ConflictRule::None,
        }
    }

    pub fn with_conflicts(mut self, rule: ConflictRule) -> Self {
        self.conflicts = rule;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased registry key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn domain(&self) -> &BTreeSet<ItemKind> {
        &self.domain
    }

    pub fn conflict_rule(&self) -> &ConflictRule {
        &self.conflicts
    }

    pub fn can_apply_to(&self, kind: ItemKind) -> bool {
        self.domain.contains(&kind)
    }

    pub fn is_valid_level(&self, level: u32) -> bool {
        (1..=self.max_level).contains(&level)
    }

    /// One direction of the conflict relation. An enchantment never
    /// conflicts with itself.
    pub fn conflicts_with(&self, other: &EnchantmentDefinition) -> bool {
        if self.key == other.key {
            return false;
        }
        match &self.conflicts {
            ConflictRule::None => false,
            ConflictRule::NameContains(parts) => parts
                .iter()
                .any(|p| other.key.contains(p.to_lowercase().as_str())),
            ConflictRule::Named(names) => names.iter().any(|n| n.eq_ignore_ascii_case(&other.key)),
            ConflictRule::Custom(f) => f(self, other),
        }
    }

    /// Both directions of the conflict relation.
    pub fn incompatible_with(&self, other: &EnchantmentDefinition) -> bool {
        self.conflicts_with(other) || other.conflicts_with(self)
    }

    /// Rendered lore line, `<prefix><Name> <Numeral>`. Levels outside the
    /// numeral range fall back to arabic digits.
    pub fn display_name(&self, prefix: &str, level: u32) -> String {
        match to_roman(level) {
            Ok(numeral) => format!("{prefix}{} {numeral}", self.name),
            Err(_) => format!("{prefix}{} {level}", self.name),
        }
    }
}

impl PartialEq for EnchantmentDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EnchantmentDefinition {}

impl Hash for EnchantmentDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_sword() -> EnchantmentDefinition {
        EnchantmentDefinition::new("Inferno", 3, ItemKind::SWORDS.iter().copied())
    }

    #[test]
    fn test_name_contains_is_one_directional() {
        let frost = EnchantmentDefinition::new("Frostbite", 2, [ItemKind::Sword])
            .with_conflicts(ConflictRule::NameContains(vec!["inferno".into()]));
        let inferno = fire_sword();

        assert!(frost.conflicts_with(&inferno));
        assert!(!inferno.conflicts_with(&frost));
        assert!(inferno.incompatible_with(&frost));
    }

    #[test]
    fn test_never_conflicts_with_self() {
        let greedy = EnchantmentDefinition::new("Burn Everything", 1, [ItemKind::Axe])
            .with_conflicts(ConflictRule::NameContains(vec!["burn".into()]));
        assert!(!greedy.conflicts_with(&greedy.clone()));
    }

    #[test]
    fn test_named_rule_ignores_case() {
        let a = EnchantmentDefinition::new("Swift", 3, [ItemKind::Boots])
            .with_conflicts(ConflictRule::Named(vec!["SLOWPOKE".into()]));
        let b = EnchantmentDefinition::new("Slowpoke", 1, [ItemKind::Boots]);
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn test_custom_rule() {
        fn same_domain(a: &EnchantmentDefinition, b: &EnchantmentDefinition) -> bool {
            a.domain() == b.domain()
        }
        let a = EnchantmentDefinition::new("A", 1, [ItemKind::Bow])
            .with_conflicts(ConflictRule::Custom(same_domain));
        let b = EnchantmentDefinition::new("B", 1, [ItemKind::Bow]);
        let c = EnchantmentDefinition::new("C", 1, [ItemKind::Sword]);
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&c));
    }

    #[test]
    fn test_max_level_floor_and_display() {
        let def = EnchantmentDefinition::new("  Soul Siphon ", 0, [ItemKind::Sword]);
        assert_eq!(def.max_level(), 1);
        assert_eq!(def.key(), "soul siphon");
        assert_eq!(def.display_name("\u{a7}7", 1), "\u{a7}7Soul Siphon I");
        assert!(def.is_valid_level(1));
        assert!(!def.is_valid_level(0));
        assert!(!def.is_valid_level(2));
    }
}
