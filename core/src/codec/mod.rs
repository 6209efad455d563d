//! Persistence codec: enchantments stored as lore lines on an item.
//!
//! ```text
//!   Item.lore
//!   ┌──────────────────────────┐
//!   │ §7Inferno II             │  ← tag lines, sorted, always on top
//!   │ §7Swift I                │
//!   │ A blade of legend        │  ← foreign lines, original order
//!   │ Forged in the deep       │
//!   └──────────────────────────┘
//! ```
//!
//! Every operation is copy-on-write: the input item is never mutated.

mod item;
mod lore;

use std::sync::Arc;

use enchantry_types::{DEFAULT_TAG_PREFIX, EngineSettings};

pub use item::Item;
pub(crate) use lore::is_valid_name;

use crate::enchant::{EnchantmentDefinition, EnchantmentRegistry};
use crate::error::{DecodeError, RejectReason};

/// Decoded `(definition, level)` pairs in lore order, at most one per
/// enchantment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedEnchantments(Vec<(Arc<EnchantmentDefinition>, u32)>);

impl DecodedEnchantments {
    /// Level for `name` (case-insensitive), if present.
    pub fn get(&self, name: &str) -> Option<u32> {
        let key = name.trim().to_lowercase();
        self.0
            .iter()
            .find(|(d, _)| d.key() == key)
            .map(|(_, level)| *level)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<EnchantmentDefinition>, u32)> {
        self.0.iter().map(|(d, l)| (d, *l))
    }

    /// `(display name, level)` pairs, convenient for assertions and status
    /// output.
    pub fn levels(&self) -> Vec<(String, u32)> {
        self.0
            .iter()
            .map(|(d, l)| (d.name().to_string(), *l))
            .collect()
    }

    fn upsert(&mut self, definition: Arc<EnchantmentDefinition>, level: u32) {
        match self.0.iter_mut().find(|(d, _)| d.key() == definition.key()) {
            Some(slot) => slot.1 = level,
            None => self.0.push((definition, level)),
        }
    }
}

/// Outcome of reading one lore line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineScan {
    /// Not a tag; text the codec does not own.
    Foreign,
    /// Tag-shaped but naming no registered enchantment.
    Unknown { name: String },
    /// Registered name followed by a numeral that does not decode.
    Malformed(DecodeError),
    Enchantment {
        definition: Arc<EnchantmentDefinition>,
        level: u32,
    },
}

#[derive(Debug, Clone)]
pub struct LoreCodec {
    prefix: String,
}

impl Default for LoreCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}

impl LoreCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.lore.tag_prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // ─── Encode ─────────────────────────────────────────────────────────────

    /// Return a copy of `item` carrying `definition` at `level`, replacing
    /// any previous level.
    ///
    /// Rejected when the level is out of range, the item kind is outside the
    /// definition's domain, or an enchantment already on the item conflicts
    /// with it in either direction.
    pub fn apply(
        &self,
        item: &Item,
        definition: &EnchantmentDefinition,
        level: u32,
        registry: &EnchantmentRegistry,
    ) -> Result<Item, RejectReason> {
        if !definition.is_valid_level(level) {
            return Err(RejectReason::InvalidLevel {
                name: definition.name().to_string(),
                level,
                max: definition.max_level(),
            });
        }
        if !definition.can_apply_to(item.kind) {
            return Err(RejectReason::WrongItemKind {
                name: definition.name().to_string(),
                kind: item.kind,
            });
        }
        for (existing, _) in self.decode(item, registry).iter() {
            if existing.key() != definition.key() && existing.incompatible_with(definition) {
                return Err(RejectReason::Conflict {
                    with: existing.name().to_string(),
                });
            }
        }

        let mut lore = self.strip(&item.lore, definition);
        lore.push(definition.display_name(&self.prefix, level));
        Ok(Item {
            kind: item.kind,
            lore: lore::sort_lore(&self.prefix, lore),
        })
    }

    /// Like [`apply`](Self::apply), but hands back an unchanged clone on
    /// rejection.
    pub fn apply_or_keep(
        &self,
        item: &Item,
        definition: &EnchantmentDefinition,
        level: u32,
        registry: &EnchantmentRegistry,
    ) -> Item {
        self.apply(item, definition, level, registry)
            .unwrap_or_else(|_| item.clone())
    }

    /// Copy of `item` without any tag line for `definition`, or `None` if
    /// there was nothing to remove.
    pub fn remove(&self, item: &Item, definition: &EnchantmentDefinition) -> Option<Item> {
        let lore = self.strip(&item.lore, definition);
        (lore.len() != item.lore.len()).then(|| Item {
            kind: item.kind,
            lore,
        })
    }

    pub fn remove_or_keep(&self, item: &Item, definition: &EnchantmentDefinition) -> Item {
        self.remove(item, definition)
            .unwrap_or_else(|| item.clone())
    }

    fn strip(&self, lore: &[String], definition: &EnchantmentDefinition) -> Vec<String> {
        lore.iter()
            .filter(|line| !self.is_tag_for(line, definition))
            .cloned()
            .collect()
    }

    fn is_tag_for(&self, line: &str, definition: &EnchantmentDefinition) -> bool {
        lore::match_tag(&self.prefix, line)
            .is_some_and(|(name, _)| name.eq_ignore_ascii_case(definition.name()))
    }

    // ─── Decode ─────────────────────────────────────────────────────────────

    /// Classify every lore line, in order.
    pub fn scan(&self, item: &Item, registry: &EnchantmentRegistry) -> Vec<LineScan> {
        item.lore
            .iter()
            .map(|line| {
                let Some((name, numeral)) = lore::match_tag(&self.prefix, line) else {
                    return LineScan::Foreign;
                };
                let Some(definition) = registry.get(name) else {
                    return LineScan::Unknown {
                        name: name.to_string(),
                    };
                };
                match lore::parse_level(line, numeral) {
                    Ok(level) => LineScan::Enchantment {
                        definition: Arc::clone(definition),
                        level,
                    },
                    Err(e) => LineScan::Malformed(e),
                }
            })
            .collect()
    }

    /// Registered enchantments on `item`. Unknown names and malformed lines
    /// are skipped. If a name appears twice the later line wins.
    pub fn decode(&self, item: &Item, registry: &EnchantmentRegistry) -> DecodedEnchantments {
        let mut out = DecodedEnchantments::default();
        for scan in self.scan(item, registry) {
            if let LineScan::Enchantment { definition, level } = scan {
                out.upsert(definition, level);
            }
        }
        out
    }

    /// Level of `definition` on `item`, 0 when absent.
    pub fn level_of(
        &self,
        item: &Item,
        definition: &EnchantmentDefinition,
        registry: &EnchantmentRegistry,
    ) -> u32 {
        self.decode(item, registry)
            .get(definition.key())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod codec_tests;
