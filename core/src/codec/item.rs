use serde::{Deserialize, Serialize};

use enchantry_types::ItemKind;

/// Value-semantics view of a game item: its kind tag and its ordered lore
/// lines. Codec operations never mutate an `Item` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    #[serde(default)]
    pub lore: Vec<String>,
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            lore: Vec::new(),
        }
    }

    pub fn with_lore<I, S>(kind: ItemKind, lore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            lore: lore.into_iter().map(Into::into).collect(),
        }
    }
}
