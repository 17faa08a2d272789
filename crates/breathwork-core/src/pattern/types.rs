use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PatternError;

/// Longest allowed phase, in seconds.
pub const MAX_STEP_SECS: u32 = 60;
/// Bounds for the number of sets in a session.
pub const MIN_SETS: u32 = 1;
pub const MAX_SETS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    HoldEmpty,
}

impl Phase {
    /// Fixed authoring order used by the builder.
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::HoldEmpty];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Hold => "Hold",
            Phase::Exhale => "Exhale",
            Phase::HoldEmpty => "Hold Empty",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Inhale => "inhale",
            Phase::Hold => "hold",
            Phase::Exhale => "exhale",
            Phase::HoldEmpty => "hold-empty",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub phase: Phase,
    /// Duration in seconds.
    pub duration: u32,
}

impl Step {
    pub fn new(phase: Phase, duration: u32) -> Self {
        Self { phase, duration }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternOrigin {
    Builtin,
    Custom,
}

/// Everything a pattern carries apart from its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternBody {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    /// Sum of step durations in seconds.
    pub total_duration: u32,
    pub default_sets: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
    pub total_duration: u32,
    pub default_sets: u32,
    pub origin: PatternOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Pattern {
    pub fn from_body(
        id: impl Into<String>,
        body: PatternBody,
        origin: PatternOrigin,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: body.name,
            description: body.description,
            steps: body.steps,
            total_duration: body.total_duration,
            default_sets: body.default_sets,
            origin,
            created_at,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.origin == PatternOrigin::Custom
    }

    /// Sum of the step durations, independent of the stored total.
    pub fn cycle_secs(&self) -> u32 {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Checks the invariants a session relies on.
    ///
    /// A pattern must have at least one step, every step must last between
    /// 1 and 60 seconds, and the stored total must equal the step sum.
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.name.trim().is_empty() {
            return Err(PatternError::MissingName);
        }
        if self.steps.is_empty() {
            return Err(PatternError::NoSteps(self.id.clone()));
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.duration == 0 || step.duration > MAX_STEP_SECS {
                return Err(PatternError::InvalidStep {
                    id: self.id.clone(),
                    index,
                    duration: step.duration,
                });
            }
        }
        let actual = self.cycle_secs();
        if actual != self.total_duration {
            return Err(PatternError::TotalMismatch {
                id: self.id.clone(),
                declared: self.total_duration,
                actual,
            });
        }
        Ok(())
    }
}
