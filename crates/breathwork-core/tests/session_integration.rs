//! Integration tests for the session state machine.
//!
//! These drive a full session through the public API on a manual clock
//! and check the timing properties a presentation layer relies on.

use std::sync::Arc;

use breathwork_core::cue::{CueKind, CueLog};
use breathwork_core::pattern::{builtin_patterns, PatternBody, PatternOrigin};
use breathwork_core::session::{Clock, ManualClock, SessionOutcome};
use breathwork_core::{CueDispatcher, Event, Pattern, Phase, SessionEngine, SessionState, Step};
use proptest::prelude::*;

fn engine() -> (SessionEngine<ManualClock>, CueLog) {
    let log = CueLog::new();
    let engine = SessionEngine::new(ManualClock::new(), CueDispatcher::new().with_sink(log.clone()));
    (engine, log)
}

fn custom(steps: &[(Phase, u32)]) -> Arc<Pattern> {
    let steps: Vec<Step> = steps.iter().map(|&(p, d)| Step::new(p, d)).collect();
    let total_duration = steps.iter().map(|s| s.duration).sum();
    Arc::new(Pattern::from_body(
        "custom-test",
        PatternBody {
            name: "Test".into(),
            description: String::new(),
            steps,
            total_duration,
            default_sets: 1,
        },
        PatternOrigin::Custom,
        None,
    ))
}

/// Deliver one tick from the live arming. Returns what the engine emitted.
fn tick(engine: &mut SessionEngine<ManualClock>) -> Option<Event> {
    let live = engine.clock().current()?;
    engine.on_tick(live)
}

#[test]
fn box_breathing_single_set_finishes_on_sixteenth_tick() {
    let (mut engine, log) = engine();
    engine.select_pattern(Arc::new(builtin_patterns().remove(0))).unwrap();
    engine.set_target_sets(1);
    engine.start().unwrap();

    for index in 0..15 {
        assert!(
            !matches!(tick(&mut engine), Some(Event::SessionCompleted { .. })),
            "tick {index} must not finish the session"
        );
        assert_eq!(engine.state(), SessionState::Active);
    }
    assert!(matches!(tick(&mut engine), Some(Event::SessionCompleted { sets: 1, .. })));
    assert_eq!(engine.state(), SessionState::Finished);
    assert_eq!(engine.last_outcome(), Some(SessionOutcome::Finished));
    assert!(!engine.clock().is_armed());
    assert_eq!(log.kinds().last(), Some(&CueKind::SessionCompleted));
}

#[test]
fn two_step_pattern_wraps_into_second_set() {
    let (mut engine, _) = engine();
    engine.select_pattern(custom(&[(Phase::Inhale, 4), (Phase::Exhale, 4)])).unwrap();
    engine.set_target_sets(2);
    engine.start();

    for _ in 0..4 {
        tick(&mut engine);
    }
    assert_eq!(engine.session().unwrap().current_step_index, 1);
    assert_eq!(engine.session().unwrap().current_set, 1);

    for _ in 0..3 {
        tick(&mut engine);
    }
    assert!(matches!(
        tick(&mut engine),
        Some(Event::PhaseAdvanced {
            set: 2,
            step_index: 0,
            set_started: true,
            ..
        })
    ));
    assert_eq!(engine.session().unwrap().current_set, 2);

    for _ in 0..7 {
        tick(&mut engine);
    }
    assert_eq!(engine.state(), SessionState::Active);
    tick(&mut engine);
    assert_eq!(engine.state(), SessionState::Finished);
}

#[test]
fn restart_resets_progress() {
    let (mut engine, _) = engine();
    engine.select_pattern(custom(&[(Phase::Inhale, 3), (Phase::Hold, 2)])).unwrap();
    engine.set_target_sets(3);
    engine.start();
    for _ in 0..7 {
        tick(&mut engine);
    }
    engine.toggle_pause();
    let stale = engine.live_tick();
    assert!(stale.is_none());

    assert!(matches!(engine.restart(), Some(Event::SessionRestarted { total_secs: 15, .. })));
    let session = engine.session().unwrap();
    assert_eq!(session.current_set, 1);
    assert_eq!(session.current_step_index, 0);
    assert_eq!(session.step_countdown, 3);
    assert_eq!(session.total_time_remaining, 15);
    assert!(session.playing);
    assert_eq!(engine.state(), SessionState::Active);
}

#[test]
fn stale_tick_after_restart_is_ignored() {
    let (mut engine, _) = engine();
    engine.select_pattern(custom(&[(Phase::Inhale, 3)])).unwrap();
    engine.start();
    let old = engine.live_tick().unwrap();
    engine.restart();
    assert_eq!(engine.on_tick(old), None);
    assert_eq!(engine.session().unwrap().step_countdown, 3);
}

#[test]
fn exit_mid_session_cancels_without_completion() {
    let (mut engine, log) = engine();
    engine.select_pattern(Arc::new(builtin_patterns().remove(1))).unwrap();
    engine.start();
    for _ in 0..10 {
        tick(&mut engine);
    }
    let stale = engine.live_tick().unwrap();
    engine.exit();

    assert_eq!(engine.state(), SessionState::Selecting);
    assert!(engine.session().is_none());
    assert!(engine.pattern().is_none());
    for _ in 0..50 {
        assert_eq!(engine.on_tick(stale), None);
    }
    assert!(!log.kinds().contains(&CueKind::SessionCompleted));
    assert_eq!(engine.snapshot().last_outcome, Some(SessionOutcome::Cancelled));
}

#[test]
fn phase_cues_follow_the_pattern() {
    let (mut engine, log) = engine();
    engine.select_pattern(Arc::new(builtin_patterns().remove(0))).unwrap();
    engine.set_target_sets(1);
    engine.start();
    while tick(&mut engine).is_some() || engine.state() == SessionState::Active {}

    let phases: Vec<Phase> = log
        .cues()
        .iter()
        .filter(|c| c.kind == CueKind::PhaseEntered)
        .filter_map(|c| c.phase)
        .collect();
    assert_eq!(phases, vec![Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::HoldEmpty]);
}

fn arb_steps() -> impl Strategy<Value = Vec<(Phase, u32)>> {
    let phase = prop_oneof![
        Just(Phase::Inhale),
        Just(Phase::Hold),
        Just(Phase::Exhale),
        Just(Phase::HoldEmpty),
    ];
    prop::collection::vec((phase, 1u32..=8), 1..=4)
}

proptest! {
    #[test]
    fn exact_tick_count_finishes_session(steps in arb_steps(), sets in 1u32..=4) {
        let (mut engine, _) = engine();
        let pattern = custom(&steps);
        let expected = sets * pattern.total_duration;
        engine.select_pattern(pattern).unwrap();
        engine.set_target_sets(sets as i64);
        engine.start();

        let live = engine.live_tick().unwrap();
        for n in 1..=expected {
            engine.on_tick(live);
            if n < expected {
                prop_assert_eq!(engine.state(), SessionState::Active);
                prop_assert_eq!(engine.session().unwrap().total_time_remaining, expected - n);
            }
        }
        prop_assert_eq!(engine.state(), SessionState::Finished);
        prop_assert_eq!(engine.on_tick(live), None);
        prop_assert_eq!(engine.state(), SessionState::Finished);
    }

    #[test]
    fn pause_resume_never_drifts(steps in arb_steps(), before in 0u32..20, paused_ticks in 0usize..20) {
        let (mut engine, _) = engine();
        let pattern = custom(&steps);
        engine.select_pattern(pattern.clone()).unwrap();
        engine.set_target_sets(3);
        engine.start();
        let total = 3 * pattern.total_duration;
        let before = before.min(total - 1);
        for _ in 0..before {
            tick(&mut engine);
        }
        let frozen = engine.session().unwrap().clone();
        let stale = engine.live_tick().unwrap();

        engine.toggle_pause();
        for _ in 0..paused_ticks {
            engine.on_tick(stale);
        }
        engine.toggle_pause();

        let resumed = engine.session().unwrap();
        prop_assert_eq!(resumed.step_countdown, frozen.step_countdown);
        prop_assert_eq!(resumed.total_time_remaining, frozen.total_time_remaining);
        prop_assert_eq!(resumed.current_step_index, frozen.current_step_index);
        prop_assert_eq!(resumed.current_set, frozen.current_set);
    }
}
