use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pattern::Phase;

/// Every session state change produces an Event.
/// The driver broadcasts them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PatternSelected {
        pattern_id: String,
        target_sets: u32,
        at: DateTime<Utc>,
    },
    SessionStarted {
        pattern_id: String,
        target_sets: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    SessionRestarted {
        pattern_id: String,
        target_sets: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        set: u32,
        step_index: usize,
        phase: Phase,
        duration_secs: u32,
        /// True when this advance wrapped into a new set.
        set_started: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        step_countdown: u32,
        total_time_remaining: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        step_countdown: u32,
        total_time_remaining: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        pattern_id: String,
        sets: u32,
        at: DateTime<Utc>,
    },
    /// User left. `was_running` is false when no session had started yet.
    SessionCancelled {
        pattern_id: Option<String>,
        was_running: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PatternSelected { .. } => "pattern_selected",
            Event::SessionStarted { .. } => "session_started",
            Event::SessionRestarted { .. } => "session_restarted",
            Event::PhaseAdvanced { .. } => "phase_advanced",
            Event::SessionPaused { .. } => "session_paused",
            Event::SessionResumed { .. } => "session_resumed",
            Event::SessionCompleted { .. } => "session_completed",
            Event::SessionCancelled { .. } => "session_cancelled",
        }
    }
}
