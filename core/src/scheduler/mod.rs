//! Phased effect scheduler.
//!
//! Abilities describe multi-step effects as an [`EffectSequence`]: an
//! ordered list of [`Phase`] records bound to a [`TargetRef`], optionally
//! with a [`SequenceDriver`] for logic that is not plain data. The
//! [`EffectRegistry`] advances every live sequence once per game tick.

mod phase;
mod registry;
mod sequence;
mod target;

#[cfg(test)]
mod scheduler_tests;

pub use phase::{EffectAction, Phase, PhaseExit, progress};
pub use registry::{EffectRegistry, TickReport};
pub use sequence::{
    DriverStatus, EffectSequence, SequenceContext, SequenceDriver, SequenceEnd, SequenceId,
    SequenceState,
};
pub use target::TargetRef;
