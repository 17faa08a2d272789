//! Deterministic session preview.
//!
//! Drives a [`SessionEngine`] on a [`ManualClock`] from start to finish and
//! records when each phase begins, without waiting in real time.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::clock::ManualClock;
use super::engine::SessionEngine;
use crate::cue::CueDispatcher;
use crate::error::SessionError;
use crate::events::Event;
use crate::pattern::{Pattern, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Seconds since the session started.
    pub at_secs: u32,
    pub set: u32,
    pub step_index: usize,
    pub phase: Phase,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub pattern_id: String,
    pub target_sets: u32,
    pub entries: Vec<TimelineEntry>,
    /// Tick count at which the session finished.
    pub finished_at_secs: u32,
}

/// Run `pattern` for `sets` (clamped, or the pattern default) and record every phase entry.
pub fn preview(pattern: Arc<Pattern>, sets: Option<i64>) -> Result<Timeline, SessionError> {
    let mut engine = SessionEngine::new(ManualClock::new(), CueDispatcher::new());
    engine.select_pattern(Arc::clone(&pattern))?;
    if let Some(sets) = sets {
        engine.set_target_sets(sets);
    }
    let target_sets = engine.target_sets();
    engine.start();

    let mut entries = Vec::new();
    if let Some(first) = pattern.steps.first() {
        entries.push(TimelineEntry {
            at_secs: 0,
            set: 1,
            step_index: 0,
            phase: first.phase,
            duration_secs: first.duration,
        });
    }

    let mut elapsed = 0u32;
    while let Some(tick) = engine.clock().current() {
        elapsed += 1;
        match engine.on_tick(tick) {
            Some(Event::PhaseAdvanced {
                set,
                step_index,
                phase,
                duration_secs,
                ..
            }) => entries.push(TimelineEntry {
                at_secs: elapsed,
                set,
                step_index,
                phase,
                duration_secs,
            }),
            Some(Event::SessionCompleted { .. }) => break,
            _ => {}
        }
    }

    Ok(Timeline {
        pattern_id: pattern.id.clone(),
        target_sets,
        entries,
        finished_at_secs: elapsed,
    })
}
