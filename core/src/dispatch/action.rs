//! Game actions routed into the core.
//!
//! The host translates its own events into these records. Items are passed
//! by value because the host's item may change (or vanish) after the
//! action is delivered.

use crate::codec::Item;
use crate::engine::{BlockPos, EntityId, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionCategory {
    MeleeHit,
    RangedLaunch,
    RangedImpact,
    Interact,
    MoveCell,
    BlockBreak,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 6] = [
        ActionCategory::MeleeHit,
        ActionCategory::RangedLaunch,
        ActionCategory::RangedImpact,
        ActionCategory::Interact,
        ActionCategory::MoveCell,
        ActionCategory::BlockBreak,
    ];

    /// Short lowercase label for logs and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::MeleeHit => "melee_hit",
            Self::RangedLaunch => "ranged_launch",
            Self::RangedImpact => "ranged_impact",
            Self::Interact => "interact",
            Self::MoveCell => "move_cell",
            Self::BlockBreak => "block_break",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeleeHit {
    pub attacker: EntityId,
    pub victim: EntityId,
    /// Final damage of the hit, before any enchantment reacts to it.
    pub damage: f64,
    pub main_hand: Option<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangedLaunch {
    pub shooter: EntityId,
    pub projectile: EntityId,
    pub launcher: Option<Item>,
}

/// The launcher item is not part of the impact: the router resolves it
/// from what it stored at launch time.
#[derive(Debug, Clone, PartialEq)]
pub struct RangedImpact {
    pub shooter: EntityId,
    pub projectile: EntityId,
    pub hit_entity: Option<EntityId>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractKind {
    LeftClick,
    RightClick,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interact {
    pub subject: EntityId,
    pub kind: InteractKind,
    pub item: Option<Item>,
    pub location: Location,
}

/// Raw movement. The router drops it unless `from` and `to` are in
/// different grid cells.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCell {
    pub subject: EntityId,
    pub from: Location,
    pub to: Location,
    /// Worn armor pieces, any order.
    pub armor: Vec<Item>,
    pub sprinting: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockBreak {
    pub subject: EntityId,
    pub block: BlockPos,
    pub main_hand: Option<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    MeleeHit(MeleeHit),
    RangedLaunch(RangedLaunch),
    RangedImpact(RangedImpact),
    Interact(Interact),
    MoveCell(MoveCell),
    BlockBreak(BlockBreak),
}

impl GameAction {
    pub fn category(&self) -> ActionCategory {
        match self {
            Self::MeleeHit(_) => ActionCategory::MeleeHit,
            Self::RangedLaunch(_) => ActionCategory::RangedLaunch,
            Self::RangedImpact(_) => ActionCategory::RangedImpact,
            Self::Interact(_) => ActionCategory::Interact,
            Self::MoveCell(_) => ActionCategory::MoveCell,
            Self::BlockBreak(_) => ActionCategory::BlockBreak,
        }
    }

    /// The player or entity whose action this is.
    pub fn subject(&self) -> EntityId {
        match self {
            Self::MeleeHit(a) => a.attacker,
            Self::RangedLaunch(a) => a.shooter,
            Self::RangedImpact(a) => a.shooter,
            Self::Interact(a) => a.subject,
            Self::MoveCell(a) => a.subject,
            Self::BlockBreak(a) => a.subject,
        }
    }
}
