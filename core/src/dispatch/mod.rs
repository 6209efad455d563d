//! Event dispatch: game actions in, handler invocations out.

mod action;
mod router;


pub use action::{
    ActionCategory, BlockBreak, GameAction, Interact, InteractKind, MeleeHit, MoveCell,
    RangedImpact, RangedLaunch,
};
pub use router::{DispatchRouter, DispatchStats};
