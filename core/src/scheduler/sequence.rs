//! A single running effect sequence and its per-tick state machine.
//!
//! ```text
//!   Pending ──first tick──▶ Running(0) ──exit──▶ Running(1) ─ … ─▶ Completed
//!                              │                    │
//!                              └──── target gone / abort / cancel ──▶ Cancelled
//!                              └──── elapsed > budget ──────────────▶ TimedOut
//! ```
//!
//! Every tick: liveness check, budget check, then phase logic. Exit and
//! entry actions of a transition run in the same tick.

use std::fmt;

use enchantry_types::Tick;

use super::phase::{EffectAction, Phase, PhaseExit, affected, progress};
use super::target::TargetRef;
use crate::engine::{EntityId, GameEngine, Location};
use crate::error::CancelReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(pub u64);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEnd {
    Completed,
    Cancelled(CancelReason),
    /// Scheduler overrun: the sequence ran past its tick budget.
    TimedOut { budget: Tick },
}

impl SequenceEnd {
    /// Cancelled or timed out. Linked children follow their parent only on
    /// abnormal ends.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, Self::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Pending,
    Running { phase: usize },
    Ended(SequenceEnd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Continue,
    /// End the current phase now, whatever its exit predicate says.
    Complete,
    /// Leave the current phase and complete the sequence, skipping any
    /// phases after it.
    Finish,
    /// Cancel the whole sequence.
    Abort,
}

/// Custom per-phase logic for sequences that cannot be described as data
/// alone (homing, target acquisition). All methods default to no-ops.
pub trait SequenceDriver: Send {
    fn enter(&mut self, _cx: &mut SequenceContext<'_>, _phase: usize) {}

    fn tick(&mut self, _cx: &mut SequenceContext<'_>, _phase: usize) -> DriverStatus {
        DriverStatus::Continue
    }

    fn exit(&mut self, _cx: &mut SequenceContext<'_>, _phase: usize) {}

    /// Runs once when the sequence ends, however it ends.
    fn cleanup(&mut self, _cx: &mut SequenceContext<'_>, _end: &SequenceEnd) {}
}

/// Requests a sequence makes of the registry, applied at the end of the
/// tick.
#[derive(Default)]
pub(crate) struct Outbox {
    pub children: Vec<EffectSequence>,
    pub cancels: Vec<SequenceId>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TickParams {
    pub now: Tick,
    pub ceiling: Tick,
    pub pvp_enabled: bool,
}

/// View handed to a [`SequenceDriver`].
pub struct SequenceContext<'a> {
    pub engine: &'a mut dyn GameEngine,
    pub id: SequenceId,
    pub owner: Option<EntityId>,
    pub target: TargetRef,
    pub now: Tick,
    /// Ticks since the sequence started.
    pub elapsed: Tick,
    pub ticks_in_phase: Tick,
    pub pvp_enabled: bool,
    phase_duration: Option<Tick>,
    transients: &'a mut Vec<EntityId>,
    outbox: &'a mut Outbox,
}

impl SequenceContext<'_> {
    /// Current location of the bound target.
    pub fn anchor(&self) -> Option<Location> {
        self.target.location(&*self.engine)
    }

    /// Fraction of a fixed-length phase done, in `[0, 1]`. Phases without
    /// a fixed length report 0.
    pub fn progress(&self) -> f64 {
        self.phase_duration
            .map(|d| progress(self.ticks_in_phase, d))
            .unwrap_or(0.0)
    }

    /// Run an action at the anchor.
    pub fn run(&mut self, action: &EffectAction) {
        if let Some(anchor) = self.anchor() {
            action.run(&mut *self.engine, anchor, self.owner, self.pvp_enabled);
        }
    }

    /// Living entities near `at` that area effects may hit.
    pub fn affected(&self, at: Location, radius: f64) -> Vec<EntityId> {
        affected(&*self.engine, at, radius, self.owner, self.pvp_enabled)
    }

    /// Spawn a display object that is removed when the sequence ends.
    pub fn spawn_transient(&mut self, kind: &str, at: Location) -> EntityId {
        let id = self.engine.spawn_marker(kind, at);
        self.transients.push(id);
        id
    }

    pub fn release_transient(&mut self, id: EntityId) {
        self.transients.retain(|t| *t != id);
        if self.engine.is_entity_live(id) {
            self.engine.remove_entity(id);
        }
    }

    /// Register an independent child sequence at the end of this tick.
    pub fn spawn_child(&mut self, child: EffectSequence) {
        self.outbox.children.push(child);
    }

    /// Like [`spawn_child`](Self::spawn_child), but the child is cancelled
    /// if this sequence is cancelled or times out.
    pub fn spawn_linked_child(&mut self, child: EffectSequence) {
        self.outbox.children.push(child.linked_to(self.id));
    }

    /// Cancel another sequence at the next tick boundary.
    pub fn request_cancel(&mut self, id: SequenceId) {
        self.outbox.cancels.push(id);
    }
}

pub struct EffectSequence {
    id: SequenceId,
    label: String,
    owner: Option<EntityId>,
    target: TargetRef,
    phases: Vec<Phase>,
    driver: Option<Box<dyn SequenceDriver>>,
    budget: Option<Tick>,
    linked_to: Option<SequenceId>,
    state: SequenceState,
    elapsed: Tick,
    ticks_in_phase: Tick,
    signals: Vec<String>,
    transients: Vec<EntityId>,
}

impl fmt::Debug for EffectSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectSequence")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("target", &self.target)
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("phases", &self.phases.len())
            .finish_non_exhaustive()
    }
}

impl EffectSequence {
    pub fn new(label: impl Into<String>, target: TargetRef) -> Self {
        Self {
            id: SequenceId(0),
            label: label.into(),
            owner: None,
            target,
            phases: Vec::new(),
            driver: None,
            budget: None,
            linked_to: None,
            state: SequenceState::Pending,
            elapsed: 0,
            ticks_in_phase: 0,
            signals: Vec::new(),
            transients: Vec::new(),
        }
    }

    // ─── Builder ────────────────────────────────────────────────────────────

    pub fn owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn driver(mut self, driver: impl SequenceDriver + 'static) -> Self {
        self.driver = Some(Box::new(driver));
        self
    }

    /// Tick budget. Clamped to the registry's ceiling when advanced.
    pub fn budget(mut self, ticks: Tick) -> Self {
        self.budget = Some(ticks);
        self
    }

    pub fn linked_to(mut self, parent: SequenceId) -> Self {
        self.linked_to = Some(parent);
        self
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn target(&self) -> TargetRef {
        self.target
    }

    pub fn elapsed(&self) -> Tick {
        self.elapsed
    }

    pub fn parent(&self) -> Option<SequenceId> {
        self.linked_to
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        match self.state {
            SequenceState::Running { phase } => self.phases.get(phase),
            _ => None,
        }
    }

    pub fn end(&self) -> Option<SequenceEnd> {
        match self.state {
            SequenceState::Ended(end) => Some(end),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SequenceState::Ended(_))
    }

    pub(crate) fn assign_id(&mut self, id: SequenceId) {
        self.id = id;
    }

    pub(crate) fn deliver_signal(&mut self, name: &str) {
        if !self.is_finished() && !self.signals.iter().any(|s| s == name) {
            self.signals.push(name.to_string());
        }
    }

    // ─── Tick ───────────────────────────────────────────────────────────────

    pub(crate) fn advance(
        &mut self,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
    ) {
        if self.is_finished() {
            return;
        }

        if !self.target.is_live(&*engine) {
            self.finish(
                engine,
                params,
                outbox,
                SequenceEnd::Cancelled(CancelReason::TargetInvalidated),
            );
            return;
        }

        self.elapsed += 1;
        let budget = self.budget.map_or(params.ceiling, |b| b.min(params.ceiling));
        if self.elapsed > budget {
            tracing::warn!(
                sequence = %self.id,
                label = %self.label,
                budget,
                "Effect sequence overran its tick budget"
            );
            self.finish(engine, params, outbox, SequenceEnd::TimedOut { budget });
            return;
        }

        if self.state == SequenceState::Pending {
            if self.phases.is_empty() {
                self.finish(engine, params, outbox, SequenceEnd::Completed);
                return;
            }
            self.enter_phase(0, engine, params, outbox);
        }

        // Phases whose exit already holds (zero length, pending signal) are
        // passed through without running their tick actions.
        while let SequenceState::Running { phase } = self.state {
            if !self.exit_satisfied(phase, &*engine) {
                break;
            }
            self.transition(phase, engine, params, outbox);
        }
        let SequenceState::Running { phase } = self.state else {
            return;
        };

        if let Some(anchor) = self.target.location(&*engine) {
            for action in &self.phases[phase].on_tick {
                action.run(engine, anchor, self.owner, params.pvp_enabled);
            }
        }
        let status = self
            .with_driver(engine, params, outbox, |driver, cx| driver.tick(cx, phase))
            .unwrap_or(DriverStatus::Continue);
        self.ticks_in_phase += 1;

        match status {
            DriverStatus::Abort => {
                self.finish(
                    engine,
                    params,
                    outbox,
                    SequenceEnd::Cancelled(CancelReason::Aborted),
                );
            }
            DriverStatus::Complete => self.transition(phase, engine, params, outbox),
            DriverStatus::Finish => {
                self.leave_phase(phase, engine, params, outbox);
                self.finish(engine, params, outbox, SequenceEnd::Completed);
            }
            DriverStatus::Continue => {
                if self.exit_satisfied(phase, &*engine) {
                    self.transition(phase, engine, params, outbox);
                }
            }
        }
    }

    /// Stop the sequence now. No-op if it has already ended.
    pub(crate) fn cancel(
        &mut self,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
        reason: CancelReason,
    ) {
        if !self.is_finished() {
            self.finish(engine, params, outbox, SequenceEnd::Cancelled(reason));
        }
    }

    fn exit_satisfied(&self, phase: usize, engine: &dyn GameEngine) -> bool {
        let Some(current) = self.phases.get(phase) else {
            return true;
        };
        match &current.exit {
            PhaseExit::After(ticks) => self.ticks_in_phase >= *ticks,
            PhaseExit::Near { of, radius } => {
                match (self.target.location(engine), of.location(engine)) {
                    (Some(a), Some(b)) => a.distance(&b).is_some_and(|d| d <= *radius),
                    _ => false,
                }
            }
            PhaseExit::Signal(name) => self.signals.iter().any(|s| s == name),
            PhaseExit::Driver => false,
        }
    }

    fn enter_phase(
        &mut self,
        phase: usize,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
    ) {
        self.state = SequenceState::Running { phase };
        self.ticks_in_phase = 0;
        tracing::debug!(
            sequence = %self.id,
            phase = %self.phases[phase].name,
            "Entered phase"
        );
        if let Some(anchor) = self.target.location(&*engine) {
            for action in &self.phases[phase].on_enter {
                action.run(engine, anchor, self.owner, params.pvp_enabled);
            }
        }
        self.with_driver(engine, params, outbox, |driver, cx| driver.enter(cx, phase));
    }

    /// Exit `phase` and enter the next one, or complete after the last.
    fn transition(
        &mut self,
        phase: usize,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
    ) {
        self.leave_phase(phase, engine, params, outbox);
        if phase + 1 < self.phases.len() {
            self.enter_phase(phase + 1, engine, params, outbox);
        } else {
            self.finish(engine, params, outbox, SequenceEnd::Completed);
        }
    }

    fn leave_phase(
        &mut self,
        phase: usize,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
    ) {
        if let Some(anchor) = self.target.location(&*engine) {
            for action in &self.phases[phase].on_exit {
                action.run(engine, anchor, self.owner, params.pvp_enabled);
            }
        }
        self.with_driver(engine, params, outbox, |driver, cx| driver.exit(cx, phase));
        if let PhaseExit::Signal(name) = &self.phases[phase].exit {
            self.signals.retain(|s| s != name);
        }
    }

    fn finish(
        &mut self,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
        end: SequenceEnd,
    ) {
        self.state = SequenceState::Ended(end);
        self.with_driver(engine, params, outbox, |driver, cx| driver.cleanup(cx, &end));

        for id in self.transients.drain(..) {
            if engine.is_entity_live(id) {
                engine.remove_entity(id);
            }
        }
        if let TargetRef::Transient(id) = self.target {
            if engine.is_entity_live(id) {
                engine.remove_entity(id);
            }
        }

        tracing::debug!(
            sequence = %self.id,
            label = %self.label,
            elapsed = self.elapsed,
            ?end,
            "Effect sequence ended"
        );
    }

    fn with_driver<R>(
        &mut self,
        engine: &mut dyn GameEngine,
        params: TickParams,
        outbox: &mut Outbox,
        f: impl FnOnce(&mut dyn SequenceDriver, &mut SequenceContext<'_>) -> R,
    ) -> Option<R> {
        let phase_duration = self.current_phase().and_then(Phase::duration);
        let driver = self.driver.as_mut()?;
        let mut cx = SequenceContext {
            engine,
            id: self.id,
            owner: self.owner,
            target: self.target,
            now: params.now,
            elapsed: self.elapsed,
            ticks_in_phase: self.ticks_in_phase,
            pvp_enabled: params.pvp_enabled,
            phase_duration,
            transients: &mut self.transients,
            outbox,
        };
        Some(f(&mut **driver, &mut cx))
    }
}
