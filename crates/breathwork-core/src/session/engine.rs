//! Session state machine.
//!
//! The engine owns the clock, the cue dispatcher and at most one live
//! [`Session`]. Every command and every tick runs to completion before the
//! next one is admitted; the caller serializes them (see the driver).
//!
//! ## State Transitions
//!
//! ```text
//! Selecting -> Ready -> Active <-> Paused -> Finished
//!                 \________\__________\______> Selecting (exit)
//! ```
//!
//! ## Tick boundary
//!
//! A tick decrements first and then checks. When the step countdown hits
//! zero the engine advances within the same tick, so a 4 second step is
//! left on the 4th tick and no zero-second state is ever published.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::clock::{Clock, Tick};
use crate::cue::{Cue, CueDispatcher};
use crate::error::SessionError;
use crate::events::Event;
use crate::pattern::{clamp_sets, Pattern, Phase, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No pattern chosen.
    Selecting,
    /// Pattern chosen, sets configurable, not running.
    Ready,
    /// Clock armed, counting down.
    Active,
    /// Clock disarmed, countdowns frozen.
    Paused,
    /// All sets completed.
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Selecting => "selecting",
            SessionState::Ready => "ready",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Finished => "finished",
        })
    }
}

/// How the most recently discarded session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Finished,
    Cancelled,
}

/// Live countdown state of one guided exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub target_sets: u32,
    pub current_set: u32,
    pub current_step_index: usize,
    pub step_countdown: u32,
    pub total_time_remaining: u32,
    pub playing: bool,
}

/// Read-only view re-published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub pattern_id: Option<String>,
    pub pattern_name: Option<String>,
    pub current_set: u32,
    pub target_sets: u32,
    pub current_step_index: usize,
    pub phase: Option<Phase>,
    pub step_countdown: u32,
    pub total_time_remaining: u32,
    pub playing: bool,
    pub last_outcome: Option<SessionOutcome>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            state: SessionState::Selecting,
            pattern_id: None,
            pattern_name: None,
            current_set: 0,
            target_sets: 0,
            current_step_index: 0,
            phase: None,
            step_countdown: 0,
            total_time_remaining: 0,
            playing: false,
            last_outcome: None,
        }
    }
}

enum TickOutcome {
    Counting,
    Advanced { step: Step, set: u32, index: usize, set_started: bool },
    Completed,
}

pub struct SessionEngine<C: Clock> {
    clock: C,
    cues: CueDispatcher,
    state: SessionState,
    pattern: Option<Arc<Pattern>>,
    target_sets: u32,
    session: Option<Session>,
    /// Tick of the arming this engine is listening to.
    live_tick: Option<Tick>,
    last_outcome: Option<SessionOutcome>,
}

impl<C: Clock> SessionEngine<C> {
    pub fn new(clock: C, cues: CueDispatcher) -> Self {
        Self {
            clock,
            cues,
            state: SessionState::Selecting,
            pattern: None,
            target_sets: 0,
            session: None,
            live_tick: None,
            last_outcome: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pattern(&self) -> Option<&Arc<Pattern>> {
        self.pattern.as_ref()
    }

    pub fn target_sets(&self) -> u32 {
        self.target_sets
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn live_tick(&self) -> Option<Tick> {
        self.live_tick
    }

    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.last_outcome
    }

    pub fn current_step(&self) -> Option<Step> {
        let pattern = self.pattern.as_ref()?;
        let index = self.session.as_ref().map(|s| s.current_step_index).unwrap_or(0);
        pattern.steps.get(index).copied()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snap = SessionSnapshot::idle();
        snap.state = self.state;
        snap.last_outcome = self.last_outcome;
        let Some(pattern) = self.pattern.as_ref() else {
            return snap;
        };
        snap.pattern_id = Some(pattern.id.clone());
        snap.pattern_name = Some(pattern.name.clone());
        snap.target_sets = self.target_sets;

        match (&self.session, self.state) {
            (Some(session), _) => {
                snap.current_set = session.current_set;
                snap.target_sets = session.target_sets;
                snap.current_step_index = session.current_step_index;
                snap.phase = pattern.steps.get(session.current_step_index).map(|s| s.phase);
                snap.step_countdown = session.step_countdown;
                snap.total_time_remaining = session.total_time_remaining;
                snap.playing = session.playing;
            }
            (None, SessionState::Ready) => {
                // Preview of what start() would seed.
                snap.current_set = 1;
                snap.phase = pattern.steps.first().map(|s| s.phase);
                snap.step_countdown = pattern.steps.first().map(|s| s.duration).unwrap_or(0);
                snap.total_time_remaining = self.target_sets.saturating_mul(pattern.total_duration);
            }
            (None, _) => {}
        }
        snap
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Choose the pattern for the next session and reset target sets to its default.
    pub fn select_pattern(&mut self, pattern: Arc<Pattern>) -> Result<Event, SessionError> {
        match self.state {
            SessionState::Selecting | SessionState::Ready | SessionState::Finished => {}
            state => {
                return Err(SessionError::InvalidTransition {
                    state,
                    action: "select a pattern",
                })
            }
        }
        pattern.validate().map_err(|source| SessionError::InvalidPattern {
            id: pattern.id.clone(),
            source,
        })?;

        self.target_sets = clamp_sets(pattern.default_sets as i64);
        self.state = SessionState::Ready;
        tracing::info!(pattern = %pattern.id, target_sets = self.target_sets, "Pattern selected");
        let event = Event::PatternSelected {
            pattern_id: pattern.id.clone(),
            target_sets: self.target_sets,
            at: Utc::now(),
        };
        self.pattern = Some(pattern);
        Ok(event)
    }

    /// Only honored in `Ready`. Returns the clamped value that was applied.
    pub fn set_target_sets(&mut self, sets: i64) -> Option<u32> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.target_sets = clamp_sets(sets);
        Some(self.target_sets)
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.state != SessionState::Ready {
            return None;
        }
        let pattern = self.begin()?;
        tracing::info!(pattern = %pattern.id, target_sets = self.target_sets, "Session started");
        Some(Event::SessionStarted {
            pattern_id: pattern.id.clone(),
            target_sets: self.target_sets,
            total_secs: self.target_sets.saturating_mul(pattern.total_duration),
            at: Utc::now(),
        })
    }

    /// Start over on the selected pattern, whatever the current progress.
    pub fn restart(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Ready | SessionState::Active | SessionState::Paused | SessionState::Finished => {}
            SessionState::Selecting => return None,
        }
        let pattern = self.begin()?;
        tracing::info!(pattern = %pattern.id, target_sets = self.target_sets, "Session restarted");
        Some(Event::SessionRestarted {
            pattern_id: pattern.id.clone(),
            target_sets: self.target_sets,
            total_secs: self.target_sets.saturating_mul(pattern.total_duration),
            at: Utc::now(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        let phase = self.current_step()?.phase;
        let session = self.session.as_mut()?;
        match self.state {
            SessionState::Active => {
                self.clock.disarm();
                self.live_tick = None;
                session.playing = false;
                self.state = SessionState::Paused;
                let event = Event::SessionPaused {
                    step_countdown: session.step_countdown,
                    total_time_remaining: session.total_time_remaining,
                    at: Utc::now(),
                };
                tracing::info!(remaining = session.total_time_remaining, "Session paused");
                self.cues.dispatch(Cue::animation_frozen(phase));
                Some(event)
            }
            SessionState::Paused => {
                session.playing = true;
                let remaining = session.step_countdown;
                let event = Event::SessionResumed {
                    step_countdown: session.step_countdown,
                    total_time_remaining: session.total_time_remaining,
                    at: Utc::now(),
                };
                tracing::info!(remaining = session.total_time_remaining, "Session resumed");
                self.state = SessionState::Active;
                self.live_tick = Some(self.clock.arm());
                self.cues.dispatch(Cue::phase_resumed(phase, remaining));
                Some(event)
            }
            _ => None,
        }
    }

    /// Leave to `Selecting`. Never fires a completion cue.
    ///
    /// Leaving `Finished` only clears the selection; the session already
    /// reported its completion, so no cancellation event is emitted.
    pub fn exit(&mut self) -> Option<Event> {
        if self.state == SessionState::Selecting {
            return None;
        }
        let after_finish = self.state == SessionState::Finished;
        self.clock.disarm();
        self.live_tick = None;
        let was_running = self.session.take().is_some();
        if was_running {
            self.last_outcome = Some(SessionOutcome::Cancelled);
        }
        let pattern_id = self.pattern.take().map(|p| p.id.clone());
        self.state = SessionState::Selecting;
        self.target_sets = 0;
        tracing::info!(pattern = ?pattern_id, was_running, "Session exited");
        if after_finish {
            return None;
        }
        Some(Event::SessionCancelled {
            pattern_id,
            was_running,
            at: Utc::now(),
        })
    }

    /// Handle one clock tick.
    ///
    /// Ticks outside `Active`, or from an arming other than the live one,
    /// are ignored.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Event> {
        if self.state != SessionState::Active || self.live_tick != Some(tick) {
            tracing::trace!(generation = tick.generation(), state = %self.state, "Ignoring stale tick");
            return None;
        }
        let pattern = Arc::clone(self.pattern.as_ref()?);
        let outcome = {
            let session = self.session.as_mut()?;
            session.step_countdown = session.step_countdown.saturating_sub(1);
            session.total_time_remaining = session.total_time_remaining.saturating_sub(1);
            tracing::trace!(
                countdown = session.step_countdown,
                remaining = session.total_time_remaining,
                "Tick"
            );

            if session.step_countdown > 0 {
                TickOutcome::Counting
            } else {
                let next = (session.current_step_index + 1) % pattern.steps.len();
                let wrapped = next == 0;
                if wrapped && session.current_set >= session.target_sets {
                    TickOutcome::Completed
                } else {
                    if wrapped {
                        session.current_set += 1;
                    }
                    let step = pattern.steps[next];
                    session.current_step_index = next;
                    session.step_countdown = step.duration;
                    TickOutcome::Advanced {
                        step,
                        set: session.current_set,
                        index: next,
                        set_started: wrapped,
                    }
                }
            }
        };

        match outcome {
            TickOutcome::Counting => None,
            TickOutcome::Completed => Some(self.finish(&pattern)),
            TickOutcome::Advanced {
                step,
                set,
                index,
                set_started,
            } => {
                tracing::debug!(set, step_index = index, phase = %step.phase, "Phase advanced");
                self.cues.dispatch(Cue::phase_entered(&step));
                Some(Event::PhaseAdvanced {
                    set,
                    step_index: index,
                    phase: step.phase,
                    duration_secs: step.duration,
                    set_started,
                    at: Utc::now(),
                })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Seed a fresh session on the selected pattern and arm the clock.
    fn begin(&mut self) -> Option<Arc<Pattern>> {
        let pattern = Arc::clone(self.pattern.as_ref()?);
        let first = *pattern.steps.first()?;
        self.clock.disarm();
        self.session = Some(Session {
            target_sets: self.target_sets,
            current_set: 1,
            current_step_index: 0,
            step_countdown: first.duration,
            total_time_remaining: self.target_sets.saturating_mul(pattern.total_duration),
            playing: true,
        });
        self.state = SessionState::Active;
        self.live_tick = Some(self.clock.arm());
        self.cues.dispatch(Cue::session_started());
        self.cues.dispatch(Cue::phase_entered(&first));
        Some(pattern)
    }

    fn finish(&mut self, pattern: &Pattern) -> Event {
        self.clock.disarm();
        self.live_tick = None;
        let sets = self.session.take().map(|s| s.target_sets).unwrap_or(self.target_sets);
        self.state = SessionState::Finished;
        self.last_outcome = Some(SessionOutcome::Finished);
        tracing::info!(pattern = %pattern.id, sets, "Session finished");
        self.cues.dispatch(Cue::session_completed());
        Event::SessionCompleted {
            pattern_id: pattern.id.clone(),
            sets,
            at: Utc::now(),
        }
    }
}
