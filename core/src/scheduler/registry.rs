//! Live sequence table.
//!
//! The registry is the only authority on whether a sequence is running.
//! Every mutation takes `&mut self`, so cancellation can never interleave
//! with a tick in progress: it always lands on a tick boundary.

use std::collections::BTreeMap;

use enchantry_types::{EngineSettings, Tick};

use super::sequence::{
    EffectSequence, Outbox, SequenceEnd, SequenceId, SequenceState, TickParams,
};
use crate::engine::GameEngine;
use crate::error::CancelReason;

/// What happened during one [`EffectRegistry::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Sequences advanced this tick.
    pub advanced: usize,
    /// Sequences started by other sequences this tick.
    pub started: usize,
    /// Sequences that ended and were removed, in removal order.
    pub ended: Vec<(SequenceId, SequenceEnd)>,
}

impl TickReport {
    pub fn completed(&self) -> usize {
        self.count(|e| matches!(e, SequenceEnd::Completed))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|e| matches!(e, SequenceEnd::Cancelled(_)))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|e| matches!(e, SequenceEnd::TimedOut { .. }))
    }

    fn count(&self, pred: impl Fn(&SequenceEnd) -> bool) -> usize {
        self.ended.iter().filter(|(_, e)| pred(e)).count()
    }
}

#[derive(Debug)]
pub struct EffectRegistry {
    sequences: BTreeMap<SequenceId, EffectSequence>,
    next_id: u64,
    ceiling: Tick,
    pvp_enabled: bool,
    now: Tick,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl EffectRegistry {
    /// `ceiling` is the hard upper bound on any sequence's lifetime.
    pub fn new(ceiling: Tick) -> Self {
        Self {
            sequences: BTreeMap::new(),
            next_id: 1,
            ceiling: ceiling.max(1),
            pvp_enabled: false,
            now: 0,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        let mut registry = Self::new(settings.scheduler.max_sequence_ticks);
        registry.pvp_enabled = settings.dispatch.pvp_enabled;
        registry
    }

    fn params(&self) -> TickParams {
        TickParams {
            now: self.now,
            ceiling: self.ceiling,
            pvp_enabled: self.pvp_enabled,
        }
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Register a sequence. It is first advanced on the next [`tick`](Self::tick).
    pub fn start(&mut self, mut sequence: EffectSequence) -> SequenceId {
        let id = SequenceId(self.next_id);
        self.next_id += 1;
        sequence.assign_id(id);
        tracing::debug!(sequence = %id, label = %sequence.label(), "Started effect sequence");
        self.sequences.insert(id, sequence);
        id
    }

    /// Cancel a sequence and any children linked to it. Returns false if
    /// `id` is not running.
    pub fn cancel(&mut self, id: SequenceId, engine: &mut dyn GameEngine) -> bool {
        let mut outbox = Outbox::default();
        let mut ended = Vec::new();
        let found = self.cancel_cascade(
            id,
            CancelReason::Requested,
            engine,
            &mut outbox,
            &mut ended,
        );
        let mut started = 0;
        self.drain_outbox(&mut outbox, engine, &mut ended, &mut started);
        found
    }

    /// Cancel everything. Used at shutdown. Children spawned by cleanup
    /// actions are discarded.
    pub fn cancel_all(&mut self, engine: &mut dyn GameEngine) -> usize {
        let params = self.params();
        let mut outbox = Outbox::default();
        let sequences = std::mem::take(&mut self.sequences);
        let count = sequences.len();
        for (_, mut sequence) in sequences {
            sequence.cancel(engine, params, &mut outbox, CancelReason::Shutdown);
        }
        if !outbox.children.is_empty() {
            tracing::debug!(
                discarded = outbox.children.len(),
                "Discarded sequences spawned during shutdown"
            );
        }
        if count > 0 {
            tracing::info!(cancelled = count, "Cancelled all effect sequences");
        }
        count
    }

    /// Deliver a named signal; consumed by a `PhaseExit::Signal` phase.
    pub fn signal(&mut self, id: SequenceId, name: &str) -> bool {
        match self.sequences.get_mut(&id) {
            Some(sequence) if !sequence.is_finished() => {
                sequence.deliver_signal(name);
                true
            }
            _ => false,
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn is_running(&self, id: SequenceId) -> bool {
        self.sequences.get(&id).is_some_and(|s| !s.is_finished())
    }

    pub fn get(&self, id: SequenceId) -> Option<&EffectSequence> {
        self.sequences.get(&id)
    }

    pub fn state(&self, id: SequenceId) -> Option<SequenceState> {
        self.sequences.get(&id).map(EffectSequence::state)
    }

    pub fn ids(&self) -> Vec<SequenceId> {
        self.sequences.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Time of the last tick.
    pub fn now(&self) -> Tick {
        self.now
    }

    // ─── Tick ───────────────────────────────────────────────────────────────

    /// Advance every registered sequence by one tick, in id order, then
    /// remove the ones that ended and apply their requests.
    pub fn tick(&mut self, engine: &mut dyn GameEngine, now: Tick) -> TickReport {
        self.now = now;
        let params = self.params();
        let mut outbox = Outbox::default();
        let mut report = TickReport::default();

        let ids = self.ids();
        for id in ids {
            if let Some(sequence) = self.sequences.get_mut(&id) {
                sequence.advance(engine, params, &mut outbox);
                report.advanced += 1;
            }
        }

        let finished: Vec<SequenceId> = self
            .sequences
            .iter()
            .filter(|(_, s)| s.is_finished())
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            let Some(sequence) = self.sequences.remove(&id) else {
                continue;
            };
            let Some(end) = sequence.end() else {
                tracing::error!(sequence = %id, "BUG: finished sequence has no end state");
                continue;
            };
            report.ended.push((id, end));
            if end.is_abnormal() {
                for child in self.linked_children(id) {
                    self.cancel_cascade(
                        child,
                        CancelReason::ParentCancelled,
                        engine,
                        &mut outbox,
                        &mut report.ended,
                    );
                }
            }
        }

        self.drain_outbox(&mut outbox, engine, &mut report.ended, &mut report.started);
        report
    }

    fn linked_children(&self, parent: SequenceId) -> Vec<SequenceId> {
        self.sequences
            .iter()
            .filter(|(_, s)| s.parent() == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    fn cancel_cascade(
        &mut self,
        id: SequenceId,
        reason: CancelReason,
        engine: &mut dyn GameEngine,
        outbox: &mut Outbox,
        ended: &mut Vec<(SequenceId, SequenceEnd)>,
    ) -> bool {
        let params = self.params();
        let found = self.sequences.contains_key(&id);
        let mut work = vec![(id, reason)];
        while let Some((id, reason)) = work.pop() {
            let Some(mut sequence) = self.sequences.remove(&id) else {
                continue;
            };
            sequence.cancel(engine, params, outbox, reason);
            ended.push((id, sequence.end().unwrap_or(SequenceEnd::Cancelled(reason))));
            work.extend(
                self.linked_children(id)
                    .into_iter()
                    .map(|child| (child, CancelReason::ParentCancelled)),
            );
        }
        found
    }

    fn drain_outbox(
        &mut self,
        outbox: &mut Outbox,
        engine: &mut dyn GameEngine,
        ended: &mut Vec<(SequenceId, SequenceEnd)>,
        started: &mut usize,
    ) {
        loop {
            let children = std::mem::take(&mut outbox.children);
            let cancels = std::mem::take(&mut outbox.cancels);
            if children.is_empty() && cancels.is_empty() {
                break;
            }
            for child in children {
                // A linked child whose parent already failed never starts.
                let orphaned = child.parent().is_some_and(|parent| {
                    ended
                        .iter()
                        .any(|(id, end)| *id == parent && end.is_abnormal())
                });
                if orphaned {
                    tracing::debug!(label = %child.label(), "Dropped child of cancelled sequence");
                    continue;
                }
                self.start(child);
                *started += 1;
            }
            for id in cancels {
                self.cancel_cascade(id, CancelReason::Requested, engine, outbox, ended);
            }
        }
    }
}
