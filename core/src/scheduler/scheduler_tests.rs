//! Tests for the phased effect scheduler
//!
//! Verifies phase ordering, same-tick transitions, liveness cancellation,
//! budgets and linked-child cascades against the sandbox engine.

use std::sync::{Arc, Mutex};

use glam::DVec3;

use super::*;
use crate::engine::{
    EntityId, EntityKind, GameEngine, Location, SandboxWorld, VisualParams, WorldId,
};
use crate::error::CancelReason;

fn origin() -> Location {
    Location::new(WorldId(0), 0.0, 64.0, 0.0)
}

fn make_world() -> (SandboxWorld, EntityId) {
    let mut world = SandboxWorld::new();
    let owner = world.spawn(EntityKind::Player, origin());
    (world, owner)
}

/// Phase that reports enter/tick/exit to the owner as status messages.
fn make_phase(name: &str, exit: PhaseExit) -> Phase {
    Phase::new(name, exit)
        .on_enter(EffectAction::Message(format!("enter {name}")))
        .on_tick(EffectAction::Message(format!("tick {name}")))
        .on_exit(EffectAction::Message(format!("exit {name}")))
}

fn run_ticks(registry: &mut EffectRegistry, world: &mut SandboxWorld, from: u64, to: u64) {
    for now in from..=to {
        registry.tick(world, now);
    }
}

/// Driver that records calls and can be scripted to finish or abort.
#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
    complete_at: Option<u64>,
    finish_at: Option<u64>,
    abort_at: Option<u64>,
}

impl Recorder {
    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl SequenceDriver for Recorder {
    fn enter(&mut self, _cx: &mut SequenceContext<'_>, phase: usize) {
        self.push(format!("enter {phase}"));
    }

    fn tick(&mut self, cx: &mut SequenceContext<'_>, phase: usize) -> DriverStatus {
        self.push(format!("tick {phase} p={:.2}", cx.progress()));
        if self.abort_at == Some(cx.elapsed) {
            DriverStatus::Abort
        } else if self.complete_at == Some(cx.elapsed) {
            DriverStatus::Complete
        } else if self.finish_at == Some(cx.elapsed) {
            DriverStatus::Finish
        } else {
            DriverStatus::Continue
        }
    }

    fn cleanup(&mut self, _cx: &mut SequenceContext<'_>, end: &SequenceEnd) {
        self.push(format!("cleanup {end:?}"));
    }
}

// ─── Phase flow ─────────────────────────────────────────────────────────────

#[test]
fn test_transition_runs_exit_and_entry_in_same_tick() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let id = registry.start(
        EffectSequence::new("flow", TargetRef::Entity(owner))
            .owner(owner)
            .phase(make_phase("A", PhaseExit::After(2)))
            .phase(make_phase("B", PhaseExit::After(1))),
    );

    registry.tick(&mut world, 1);
    registry.tick(&mut world, 2);
    assert!(matches!(
        registry.state(id),
        Some(SequenceState::Running { phase: 1 })
    ));
    let report = registry.tick(&mut world, 3);

    assert_eq!(report.ended, vec![(id, SequenceEnd::Completed)]);
    assert!(!registry.is_running(id));
    assert_eq!(
        world.messages_for(owner),
        vec!["enter A", "tick A", "tick A", "exit A", "enter B", "tick B", "exit B"]
    );
}

#[test]
fn test_zero_length_phase_completes_on_first_tick() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let id = registry.start(
        EffectSequence::new("flash", TargetRef::Entity(owner))
            .owner(owner)
            .phase(make_phase("Z", PhaseExit::After(0)))
            .phase(make_phase("N", PhaseExit::After(1))),
    );

    let report = registry.tick(&mut world, 1);

    assert_eq!(report.ended, vec![(id, SequenceEnd::Completed)]);
    assert_eq!(
        world.messages_for(owner),
        vec!["enter Z", "exit Z", "enter N", "tick N", "exit N"]
    );
}

#[test]
fn test_empty_sequence_completes() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let id = registry.start(EffectSequence::new("nothing", TargetRef::Entity(owner)));
    let report = registry.tick(&mut world, 1);
    assert_eq!(report.ended, vec![(id, SequenceEnd::Completed)]);
    assert!(registry.is_empty());
}

#[test]
fn test_progress_fraction_per_tick() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let recorder = Recorder::default();
    registry.start(
        EffectSequence::new("charge", TargetRef::Entity(owner))
            .phase(Phase::timed("charge", 4))
            .driver(recorder.clone()),
    );

    run_ticks(&mut registry, &mut world, 1, 4);

    assert_eq!(
        recorder.entries(),
        vec![
            "enter 0",
            "tick 0 p=0.00",
            "tick 0 p=0.25",
            "tick 0 p=0.50",
            "tick 0 p=0.75",
            "cleanup Completed",
        ]
    );
}

#[test]
fn test_driver_complete_ends_driver_phase() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let recorder = Recorder {
        complete_at: Some(3),
        ..Recorder::default()
    };
    let id = registry.start(
        EffectSequence::new("homing", TargetRef::Entity(owner))
            .phase(Phase::new("track", PhaseExit::Driver))
            .driver(recorder.clone()),
    );

    run_ticks(&mut registry, &mut world, 1, 2);
    assert!(registry.is_running(id));
    let report = registry.tick(&mut world, 3);
    assert_eq!(report.completed(), 1);
}

#[test]
fn test_driver_abort_cancels() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let recorder = Recorder {
        abort_at: Some(2),
        ..Recorder::default()
    };
    let id = registry.start(
        EffectSequence::new("fizzle", TargetRef::Entity(owner))
            .phase(Phase::timed("wait", 10))
            .driver(recorder.clone()),
    );

    registry.tick(&mut world, 1);
    let report = registry.tick(&mut world, 2);

    assert_eq!(
        report.ended,
        vec![(id, SequenceEnd::Cancelled(CancelReason::Aborted))]
    );
    assert_eq!(
        recorder.entries().last().map(String::as_str),
        Some("cleanup Cancelled(Aborted)")
    );
}

#[test]
fn test_driver_finish_skips_remaining_phases() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let recorder = Recorder {
        finish_at: Some(2),
        ..Recorder::default()
    };
    let id = registry.start(
        EffectSequence::new("early-out", TargetRef::Entity(owner))
            .owner(owner)
            .phase(make_phase("a", PhaseExit::After(10)))
            .phase(make_phase("b", PhaseExit::After(10)))
            .driver(recorder.clone()),
    );

    registry.tick(&mut world, 1);
    let report = registry.tick(&mut world, 2);

    assert_eq!(report.ended, vec![(id, SequenceEnd::Completed)]);
    assert_eq!(
        world.messages_for(owner),
        vec!["enter a", "tick a", "tick a", "exit a"]
    );
    assert_eq!(
        recorder.entries().last().map(String::as_str),
        Some("cleanup Completed")
    );
}

// ─── Exit predicates ────────────────────────────────────────────────────────

#[test]
fn test_signal_exit_consumed_on_transition() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let id = registry.start(
        EffectSequence::new("wait-for-hit", TargetRef::Entity(owner))
            .owner(owner)
            .phase(make_phase("wait", PhaseExit::Signal("hit".into())))
            .phase(make_phase("again", PhaseExit::Signal("hit".into()))),
    );

    run_ticks(&mut registry, &mut world, 1, 3);
    assert!(registry.signal(id, "hit"));
    registry.tick(&mut world, 4);
    assert!(matches!(
        registry.state(id),
        Some(SequenceState::Running { phase: 1 })
    ));

    // The first signal was consumed; the second phase needs its own.
    registry.tick(&mut world, 5);
    assert!(registry.is_running(id));
    registry.signal(id, "hit");
    let report = registry.tick(&mut world, 6);
    assert_eq!(report.completed(), 1);
    assert!(!registry.signal(id, "hit"));
}

#[test]
fn test_near_exit_on_moving_projectile() {
    let (mut world, owner) = make_world();
    let arrow = world.spawn(EntityKind::Projectile, origin());
    world.set_velocity(arrow, DVec3::X);
    let goal = TargetRef::Location(origin().offset(DVec3::X * 5.0));

    let mut registry = EffectRegistry::new(100);
    let id = registry.start(
        EffectSequence::new("arrive", TargetRef::Entity(arrow))
            .owner(owner)
            .phase(Phase::new(
                "fly",
                PhaseExit::Near {
                    of: goal,
                    radius: 1.0,
                },
            )),
    );

    let mut completed_at = None;
    for now in 1..=10 {
        world.advance_physics();
        if registry.tick(&mut world, now).completed() == 1 {
            completed_at = Some(now);
            break;
        }
    }
    assert_eq!(completed_at, Some(4));
    assert!(!registry.is_running(id));
}

// ─── Cancellation ───────────────────────────────────────────────────────────

#[test]
fn test_target_removed_cancels_before_tick_logic() {
    let (mut world, owner) = make_world();
    let zombie = world.spawn(EntityKind::Monster, origin().offset(DVec3::Z * 3.0));
    let mut registry = EffectRegistry::new(100);
    let recorder = Recorder::default();
    let id = registry.start(
        EffectSequence::new("burn", TargetRef::Entity(zombie))
            .owner(owner)
            .phase(
                Phase::timed("burn", 20)
                    .on_tick(EffectAction::visual("flame", VisualParams::default())),
            )
            .driver(recorder.clone()),
    );

    run_ticks(&mut registry, &mut world, 1, 4);
    assert_eq!(world.visual_count(), 4);

    // Removed by the engine between tick 4 and tick 5.
    world.despawn(zombie);
    world.take_calls();
    let report = registry.tick(&mut world, 5);

    assert_eq!(
        report.ended,
        vec![(id, SequenceEnd::Cancelled(CancelReason::TargetInvalidated))]
    );
    assert_eq!(world.visual_count(), 0);
    assert!(registry.get(id).is_none());
    assert_eq!(
        recorder.entries().last().map(String::as_str),
        Some("cleanup Cancelled(TargetInvalidated)")
    );

    let report = registry.tick(&mut world, 6);
    assert_eq!(report.advanced, 0);
    assert_eq!(world.visual_count(), 0);
}

#[test]
fn test_location_target_always_live() {
    let (mut world, _) = make_world();
    let mut registry = EffectRegistry::new(100);
    let id = registry.start(
        EffectSequence::new("ground", TargetRef::Location(origin())).phase(Phase::timed("glow", 3)),
    );
    run_ticks(&mut registry, &mut world, 1, 2);
    assert!(registry.is_running(id));
    assert_eq!(registry.tick(&mut world, 3).completed(), 1);
}

#[test]
fn test_explicit_cancel_runs_cleanup_and_removes_transients() {
    struct Spawner;
    impl SequenceDriver for Spawner {
        fn enter(&mut self, cx: &mut SequenceContext<'_>, _phase: usize) {
            if let Some(at) = cx.anchor() {
                cx.spawn_transient("blade", at);
            }
        }
    }

    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let marker = world.spawn_marker("core", origin());
    let id = registry.start(
        EffectSequence::new("blades", TargetRef::Transient(marker))
            .owner(owner)
            .phase(Phase::timed("spin", 50))
            .driver(Spawner),
    );

    registry.tick(&mut world, 1);
    // owner, core marker, spawned blade
    assert_eq!(world.entity_count(), 3);

    assert!(registry.cancel(id, &mut world));
    assert!(!registry.cancel(id, &mut world));
    assert_eq!(world.entity_count(), 1);
    assert!(!world.is_entity_live(marker));
}

#[test]
fn test_timeout_uses_tighter_of_budget_and_ceiling() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(3);
    let loose = registry.start(
        EffectSequence::new("stuck", TargetRef::Entity(owner))
            .phase(Phase::new("never", PhaseExit::Driver))
            .budget(100),
    );
    let tight = registry.start(
        EffectSequence::new("short", TargetRef::Entity(owner))
            .phase(Phase::new("never", PhaseExit::Driver))
            .budget(2),
    );

    run_ticks(&mut registry, &mut world, 1, 2);
    let report = registry.tick(&mut world, 3);
    assert_eq!(
        report.ended,
        vec![(tight, SequenceEnd::TimedOut { budget: 2 })]
    );
    let report = registry.tick(&mut world, 4);
    assert_eq!(
        report.ended,
        vec![(loose, SequenceEnd::TimedOut { budget: 3 })]
    );
    assert_eq!(report.timed_out(), 1);
}

#[test]
fn test_cancel_all_on_shutdown() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    for i in 0..5 {
        registry.start(
            EffectSequence::new(format!("s{i}"), TargetRef::Entity(owner))
                .phase(Phase::timed("wait", 50)),
        );
    }
    registry.tick(&mut world, 1);
    assert_eq!(registry.cancel_all(&mut world), 5);
    assert!(registry.is_empty());
    assert_eq!(registry.cancel_all(&mut world), 0);
}

// ─── Children ───────────────────────────────────────────────────────────────

struct Forker {
    target: EntityId,
}

impl SequenceDriver for Forker {
    fn enter(&mut self, cx: &mut SequenceContext<'_>, _phase: usize) {
        let child = || {
            EffectSequence::new("child", TargetRef::Entity(self.target))
                .phase(Phase::timed("wait", 50))
        };
        cx.spawn_linked_child(child());
        cx.spawn_child(child());
    }
}

#[test]
fn test_children_start_after_parent_tick() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    registry.start(
        EffectSequence::new("parent", TargetRef::Entity(owner))
            .phase(Phase::timed("wait", 50))
            .driver(Forker { target: owner }),
    );

    let report = registry.tick(&mut world, 1);

    assert_eq!(report.started, 2);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_parent_cancel_cascades_only_to_linked_children() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let parent = registry.start(
        EffectSequence::new("parent", TargetRef::Entity(owner))
            .phase(Phase::timed("wait", 50))
            .driver(Forker { target: owner }),
    );
    registry.tick(&mut world, 1);
    let children: Vec<SequenceId> = registry
        .ids()
        .into_iter()
        .filter(|id| *id != parent)
        .collect();
    let linked = children
        .iter()
        .copied()
        .find(|id| registry.get(*id).and_then(EffectSequence::parent) == Some(parent))
        .unwrap();

    assert!(registry.cancel(parent, &mut world));

    assert!(!registry.is_running(linked));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_parent_timeout_cascades_to_linked_children() {
    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let parent = registry.start(
        EffectSequence::new("parent", TargetRef::Entity(owner))
            .phase(Phase::timed("wait", 50))
            .driver(Forker { target: owner })
            .budget(2),
    );
    run_ticks(&mut registry, &mut world, 1, 2);
    let report = registry.tick(&mut world, 3);

    assert_eq!(report.ended[0], (parent, SequenceEnd::TimedOut { budget: 2 }));
    assert_eq!(
        report.ended[1].1,
        SequenceEnd::Cancelled(CancelReason::ParentCancelled)
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_request_cancel_applies_at_tick_boundary() {
    struct Killer {
        victim: SequenceId,
    }
    impl SequenceDriver for Killer {
        fn enter(&mut self, cx: &mut SequenceContext<'_>, _phase: usize) {
            cx.request_cancel(self.victim);
        }
    }

    let (mut world, owner) = make_world();
    let mut registry = EffectRegistry::new(100);
    let victim = registry.start(
        EffectSequence::new("victim", TargetRef::Entity(owner))
            .owner(owner)
            .phase(make_phase("v", PhaseExit::After(50))),
    );
    registry.start(
        EffectSequence::new("killer", TargetRef::Entity(owner))
            .phase(Phase::timed("wait", 50))
            .driver(Killer { victim }),
    );

    let report = registry.tick(&mut world, 1);

    assert!(report.ended.contains(&(victim, SequenceEnd::Cancelled(CancelReason::Requested))));
    // The victim had already run its tick before the request landed.
    assert_eq!(world.messages_for(owner), vec!["enter v", "tick v"]);
    assert!(!registry.is_running(victim));
}
