//! Validation and normalization of user-authored patterns.
//!
//! A [`PatternDraft`] holds raw form input. [`PatternDraft::build`] clamps
//! every number into range, drops omitted phases and returns a
//! [`PatternBody`]; the catalog then gives it an identity.

use serde::{Deserialize, Serialize};

use super::types::{Pattern, PatternBody, Phase, Step, MAX_SETS, MAX_STEP_SECS, MIN_SETS};
use crate::error::PatternError;

pub const DEFAULT_SETS: u32 = 10;
/// Seconds every phase of a fresh form starts at.
pub const DEFAULT_STEP_SECS: i64 = 4;
pub const DEFAULT_DESCRIPTION: &str = "A custom breathing pattern.";

/// Clamp a raw phase duration into `0..=60` seconds.
pub fn clamp_step_duration(raw: i64) -> u32 {
    raw.clamp(0, MAX_STEP_SECS as i64) as u32
}

/// Clamp a raw set count into `1..=300`.
pub fn clamp_sets(raw: i64) -> u32 {
    raw.clamp(MIN_SETS as i64, MAX_SETS as i64) as u32
}

/// Raw, unvalidated pattern input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inhale: Option<i64>,
    #[serde(default)]
    pub hold: Option<i64>,
    #[serde(default)]
    pub exhale: Option<i64>,
    #[serde(default)]
    pub hold_empty: Option<i64>,
    #[serde(default)]
    pub default_sets: Option<i64>,
}

impl PatternDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A new-pattern form: every phase at 4 seconds, 10 sets.
    pub fn starter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inhale: Some(DEFAULT_STEP_SECS),
            hold: Some(DEFAULT_STEP_SECS),
            exhale: Some(DEFAULT_STEP_SECS),
            hold_empty: Some(DEFAULT_STEP_SECS),
            default_sets: Some(DEFAULT_SETS as i64),
        }
    }

    /// Seed a draft from an existing pattern, for editing.
    pub fn from_pattern(pattern: &Pattern) -> Self {
        let duration_of = |phase: Phase| {
            pattern
                .steps
                .iter()
                .find(|s| s.phase == phase)
                .map(|s| s.duration as i64)
        };
        Self {
            name: pattern.name.clone(),
            description: Some(pattern.description.clone()),
            inhale: duration_of(Phase::Inhale),
            hold: duration_of(Phase::Hold),
            exhale: duration_of(Phase::Exhale),
            hold_empty: duration_of(Phase::HoldEmpty),
            default_sets: Some(pattern.default_sets as i64),
        }
    }

    pub fn duration(&self, phase: Phase) -> Option<i64> {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold => self.hold,
            Phase::Exhale => self.exhale,
            Phase::HoldEmpty => self.hold_empty,
        }
    }

    pub fn set_duration(&mut self, phase: Phase, secs: i64) {
        let slot = match phase {
            Phase::Inhale => &mut self.inhale,
            Phase::Hold => &mut self.hold,
            Phase::Exhale => &mut self.exhale,
            Phase::HoldEmpty => &mut self.hold_empty,
        };
        *slot = Some(secs);
    }

    pub fn with_duration(mut self, phase: Phase, secs: i64) -> Self {
        self.set_duration(phase, secs);
        self
    }

    pub fn with_sets(mut self, sets: i64) -> Self {
        self.default_sets = Some(sets);
        self
    }

    pub fn build(&self) -> Result<PatternBody, PatternError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PatternError::MissingName);
        }

        let steps: Vec<Step> = Phase::ALL
            .iter()
            .map(|&phase| Step::new(phase, clamp_step_duration(self.duration(phase).unwrap_or(0))))
            .filter(|step| step.duration > 0)
            .collect();
        if steps.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let total_duration = steps.iter().map(|s| s.duration).sum();
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        Ok(PatternBody {
            name: name.to_string(),
            description,
            steps,
            total_duration,
            default_sets: self.default_sets.map(clamp_sets).unwrap_or(DEFAULT_SETS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_clamped() {
        let body = PatternDraft::new("Clamp")
            .with_duration(Phase::Inhale, 70)
            .with_duration(Phase::Hold, -5)
            .with_duration(Phase::Exhale, 8)
            .build()
            .unwrap();
        assert_eq!(
            body.steps,
            vec![Step::new(Phase::Inhale, 60), Step::new(Phase::Exhale, 8)]
        );
        assert_eq!(body.total_duration, 68);
    }

    #[test]
    fn starter_is_four_square_breathing() {
        let body = PatternDraft::starter("Fresh").build().unwrap();
        assert_eq!(body.steps.len(), 4);
        assert!(body.steps.iter().all(|s| s.duration == 4));
        assert_eq!(body.total_duration, 16);
        assert_eq!(body.default_sets, 10);

        let trimmed = PatternDraft::starter("Fresh")
            .with_duration(Phase::Hold, 0)
            .build()
            .unwrap();
        assert_eq!(trimmed.total_duration, 12);
    }

    #[test]
    fn all_zero_is_empty_pattern() {
        let draft = PatternDraft::new("Nothing")
            .with_duration(Phase::Inhale, 0)
            .with_duration(Phase::Hold, 0)
            .with_duration(Phase::Exhale, 0)
            .with_duration(Phase::HoldEmpty, 0);
        assert_eq!(draft.build(), Err(PatternError::EmptyPattern));
    }

    #[test]
    fn blank_name_is_missing_name() {
        let draft = PatternDraft::new("   ").with_duration(Phase::Inhale, 4);
        assert_eq!(draft.build(), Err(PatternError::MissingName));
    }

    #[test]
    fn name_is_checked_before_steps() {
        assert_eq!(PatternDraft::default().build(), Err(PatternError::MissingName));
    }

    #[test]
    fn sets_clamp_and_default() {
        let draft = PatternDraft::new(" Calm ").with_duration(Phase::Exhale, 6);
        let body = draft.build().unwrap();
        assert_eq!(body.name, "Calm");
        assert_eq!(body.default_sets, DEFAULT_SETS);
        assert_eq!(body.description, DEFAULT_DESCRIPTION);

        assert_eq!(draft.clone().with_sets(0).build().unwrap().default_sets, 1);
        assert_eq!(draft.with_sets(1000).build().unwrap().default_sets, 300);
    }

    #[test]
    fn steps_keep_authoring_order() {
        let body = PatternDraft::new("Order")
            .with_duration(Phase::HoldEmpty, 2)
            .with_duration(Phase::Inhale, 3)
            .build()
            .unwrap();
        let phases: Vec<Phase> = body.steps.iter().map(|s| s.phase).collect();
        assert_eq!(phases, vec![Phase::Inhale, Phase::HoldEmpty]);
    }

    #[test]
    fn from_pattern_round_trips_through_build() {
        let pattern = crate::pattern::builtin_patterns().remove(1);
        let body = PatternDraft::from_pattern(&pattern).build().unwrap();
        assert_eq!(body.steps, pattern.steps);
        assert_eq!(body.default_sets, pattern.default_sets);
        assert_eq!(body.description, pattern.description);
    }
}
