//! Patterns that ship with the app.

use super::types::{Pattern, PatternOrigin, Phase, Step};

fn builtin(id: &str, name: &str, description: &str, steps: Vec<Step>, default_sets: u32) -> Pattern {
    let total_duration = steps.iter().map(|s| s.duration).sum();
    Pattern {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        steps,
        total_duration,
        default_sets,
        origin: PatternOrigin::Builtin,
        created_at: None,
    }
}

pub fn builtin_patterns() -> Vec<Pattern> {
    vec![
        builtin(
            "box-breathing",
            "Box Breathing",
            "Equal duration for inhale, hold, exhale, and hold. Great for reducing stress.",
            vec![
                Step::new(Phase::Inhale, 4),
                Step::new(Phase::Hold, 4),
                Step::new(Phase::Exhale, 4),
                Step::new(Phase::HoldEmpty, 4),
            ],
            10,
        ),
        builtin(
            "4-7-8",
            "4-7-8 Breathing",
            "Inhale for 4, hold for 7, exhale for 8. Helps with sleep and anxiety.",
            vec![
                Step::new(Phase::Inhale, 4),
                Step::new(Phase::Hold, 7),
                Step::new(Phase::Exhale, 8),
            ],
            8,
        ),
        builtin(
            "equal-breathing",
            "Equal Breathing",
            "Breathe in for 4 seconds, and out for 4 seconds. A simple way to find calm.",
            vec![Step::new(Phase::Inhale, 4), Step::new(Phase::Exhale, 4)],
            15,
        ),
    ]
}
