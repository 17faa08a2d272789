//! Cue dispatching: what the presentation and haptics layers are told.
//!
//! The mapping from phases and transitions to cues is pure. Delivery goes
//! through [`CueSink`]s owned by a [`CueDispatcher`]; a sink that fails is
//! logged and skipped, and nothing it does can reach session state.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::error::CueError;
use crate::pattern::{Phase, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationTarget {
    Expanded,
    Contracted,
}

/// Where the breathing visual should head, and over how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationCue {
    pub target: AnimationTarget,
    /// True for hold phases: the visual stays at `target` instead of moving.
    pub held: bool,
    pub duration_secs: u32,
}

pub fn animation_target_for(phase: Phase) -> (AnimationTarget, bool) {
    match phase {
        Phase::Inhale => (AnimationTarget::Expanded, false),
        Phase::Hold => (AnimationTarget::Expanded, true),
        Phase::Exhale => (AnimationTarget::Contracted, false),
        Phase::HoldEmpty => (AnimationTarget::Contracted, true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticIntent {
    LightPulse,
    Success,
}

impl HapticIntent {
    /// Vibration pattern in milliseconds, alternating on/off.
    pub fn pulse_pattern_ms(&self) -> &'static [u32] {
        match self {
            HapticIntent::LightPulse => &[100],
            HapticIntent::Success => &[100, 50, 100, 50, 100],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    SessionStarted,
    PhaseEntered,
    SessionCompleted,
    /// Session paused: stop the visual where it is.
    AnimationFrozen,
    /// Session resumed: continue toward the current phase's target.
    PhaseResumed,
}

pub fn haptic_for(kind: CueKind) -> Option<HapticIntent> {
    match kind {
        CueKind::PhaseEntered => Some(HapticIntent::LightPulse),
        CueKind::SessionStarted | CueKind::SessionCompleted => Some(HapticIntent::Success),
        CueKind::AnimationFrozen | CueKind::PhaseResumed => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    pub kind: CueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationCue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<HapticIntent>,
}

impl Cue {
    fn bare(kind: CueKind) -> Self {
        Self {
            kind,
            phase: None,
            animation: None,
            haptic: haptic_for(kind),
        }
    }

    fn for_phase(kind: CueKind, phase: Phase, duration_secs: u32) -> Self {
        let (target, held) = animation_target_for(phase);
        Self {
            kind,
            phase: Some(phase),
            animation: Some(AnimationCue {
                target,
                held,
                duration_secs,
            }),
            haptic: haptic_for(kind),
        }
    }

    pub fn session_started() -> Self {
        Self::bare(CueKind::SessionStarted)
    }

    pub fn session_completed() -> Self {
        Self::bare(CueKind::SessionCompleted)
    }

    pub fn phase_entered(step: &Step) -> Self {
        Self::for_phase(CueKind::PhaseEntered, step.phase, step.duration)
    }

    pub fn animation_frozen(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::bare(CueKind::AnimationFrozen)
        }
    }

    /// Re-issue `phase`'s target over what is left of the countdown.
    pub fn phase_resumed(phase: Phase, remaining_secs: u32) -> Self {
        Self::for_phase(CueKind::PhaseResumed, phase, remaining_secs)
    }
}

pub trait CueSink: Send {
    fn name(&self) -> &str;
    fn deliver(&mut self, cue: &Cue) -> Result<(), CueError>;
}

/// Platform vibration capability.
pub trait HapticDevice: Send {
    fn vibrate(&mut self, pattern_ms: &[u32]) -> Result<(), CueError>;
}

/// Forwards haptic intents to a [`HapticDevice`].
pub struct HapticSink<D: HapticDevice> {
    device: D,
    enabled: bool,
}

impl<D: HapticDevice> HapticSink<D> {
    pub fn new(device: D, enabled: bool) -> Self {
        Self { device, enabled }
    }
}

impl<D: HapticDevice> CueSink for HapticSink<D> {
    fn name(&self) -> &str {
        "haptics"
    }

    fn deliver(&mut self, cue: &Cue) -> Result<(), CueError> {
        match cue.haptic {
            Some(intent) if self.enabled => self.device.vibrate(intent.pulse_pattern_ms()),
            _ => Ok(()),
        }
    }
}

/// Keeps every delivered cue. Clones share the same log.
#[derive(Clone, Default)]
pub struct CueLog {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<CueKind> {
        self.cues().iter().map(|c| c.kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.clear();
        }
    }
}

impl CueSink for CueLog {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&mut self, cue: &Cue) -> Result<(), CueError> {
        self.cues
            .lock()
            .map_err(|_| CueError::Delivery("cue log lock poisoned".into()))?
            .push(cue.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct CueDispatcher {
    sinks: Vec<Box<dyn CueSink>>,
}

impl CueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl CueSink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&mut self, sink: impl CueSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Best effort: every sink sees the cue, failures are only logged.
    pub fn dispatch(&mut self, cue: Cue) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.deliver(&cue) {
                tracing::warn!(sink = sink.name(), kind = ?cue.kind, error = %err, "Cue delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_targets_per_phase() {
        assert_eq!(animation_target_for(Phase::Inhale), (AnimationTarget::Expanded, false));
        assert_eq!(animation_target_for(Phase::Hold), (AnimationTarget::Expanded, true));
        assert_eq!(animation_target_for(Phase::Exhale), (AnimationTarget::Contracted, false));
        assert_eq!(animation_target_for(Phase::HoldEmpty), (AnimationTarget::Contracted, true));
    }

    #[test]
    fn haptics_per_kind() {
        assert_eq!(haptic_for(CueKind::PhaseEntered), Some(HapticIntent::LightPulse));
        assert_eq!(haptic_for(CueKind::SessionStarted), Some(HapticIntent::Success));
        assert_eq!(haptic_for(CueKind::SessionCompleted), Some(HapticIntent::Success));
        assert_eq!(haptic_for(CueKind::AnimationFrozen), None);
        assert_eq!(HapticIntent::Success.pulse_pattern_ms().len(), 5);
    }

    #[test]
    fn phase_entered_carries_duration() {
        let cue = Cue::phase_entered(&Step::new(Phase::Exhale, 8));
        assert_eq!(cue.phase, Some(Phase::Exhale));
        assert_eq!(
            cue.animation,
            Some(AnimationCue {
                target: AnimationTarget::Contracted,
                held: false,
                duration_secs: 8
            })
        );
        assert_eq!(cue.haptic, Some(HapticIntent::LightPulse));
    }

    struct BrokenDevice;

    impl HapticDevice for BrokenDevice {
        fn vibrate(&mut self, _: &[u32]) -> Result<(), CueError> {
            Err(CueError::DeviceUnavailable("no motor".into()))
        }
    }

    #[test]
    fn failing_sink_does_not_stop_others() {
        let log = CueLog::new();
        let mut dispatcher = CueDispatcher::new()
            .with_sink(HapticSink::new(BrokenDevice, true))
            .with_sink(log.clone());
        dispatcher.dispatch(Cue::session_started());
        assert_eq!(log.kinds(), vec![CueKind::SessionStarted]);
    }

    #[derive(Clone, Default)]
    struct CountingDevice(Arc<Mutex<Vec<Vec<u32>>>>);

    impl HapticDevice for CountingDevice {
        fn vibrate(&mut self, pattern_ms: &[u32]) -> Result<(), CueError> {
            self.0.lock().unwrap().push(pattern_ms.to_vec());
            Ok(())
        }
    }

    #[test]
    fn haptic_sink_respects_enabled_flag() {
        let device = CountingDevice::default();
        let mut on = HapticSink::new(device.clone(), true);
        let mut off = HapticSink::new(device.clone(), false);
        on.deliver(&Cue::phase_entered(&Step::new(Phase::Inhale, 4))).unwrap();
        off.deliver(&Cue::session_completed()).unwrap();
        on.deliver(&Cue::animation_frozen(Phase::Inhale)).unwrap();
        assert_eq!(*device.0.lock().unwrap(), vec![vec![100]]);
    }
}
