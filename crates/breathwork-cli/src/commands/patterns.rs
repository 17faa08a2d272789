//! Pattern management commands for CLI.

use clap::{Args, Subcommand};
use breathwork_core::pattern::{PatternCatalog, PatternDraft, TomlPatternStore};
use breathwork_core::{CatalogError, Pattern, Phase};

#[derive(Subcommand)]
pub enum PatternAction {
    /// List built-in and custom patterns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern as JSON
    Show {
        /// Pattern ID
        id: String,
    },
    /// Create a custom pattern; omitted phases start at 4 seconds, sets at 10
    Add {
        #[command(flatten)]
        fields: PatternFields,
    },
    /// Edit a custom pattern; omitted fields keep their current value
    Edit {
        /// Pattern ID
        id: String,
        #[command(flatten)]
        fields: PatternFields,
    },
    /// Delete a custom pattern
    Delete {
        /// Pattern ID
        id: String,
    },
}

#[derive(Args)]
pub struct PatternFields {
    /// Pattern name
    #[arg(long)]
    name: Option<String>,
    /// Pattern description
    #[arg(long)]
    description: Option<String>,
    /// Inhale seconds (0-60, 0 leaves the phase out)
    #[arg(long, allow_negative_numbers = true)]
    inhale: Option<i64>,
    /// Hold seconds after inhaling (0-60)
    #[arg(long, allow_negative_numbers = true)]
    hold: Option<i64>,
    /// Exhale seconds (0-60)
    #[arg(long, allow_negative_numbers = true)]
    exhale: Option<i64>,
    /// Hold seconds after exhaling (0-60)
    #[arg(long, allow_negative_numbers = true)]
    hold_empty: Option<i64>,
    /// Default number of sets (1-300)
    #[arg(long, allow_negative_numbers = true)]
    sets: Option<i64>,
}

impl PatternFields {
    /// Overlay the given fields on `draft`.
    fn apply(self, mut draft: PatternDraft) -> PatternDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if self.description.is_some() {
            draft.description = self.description;
        }
        let durations = [
            (Phase::Inhale, self.inhale),
            (Phase::Hold, self.hold),
            (Phase::Exhale, self.exhale),
            (Phase::HoldEmpty, self.hold_empty),
        ];
        for (phase, secs) in durations {
            if let Some(secs) = secs {
                draft.set_duration(phase, secs);
            }
        }
        if self.sets.is_some() {
            draft.default_sets = self.sets;
        }
        draft
    }
}

pub(crate) fn open_catalog() -> Result<PatternCatalog<TomlPatternStore>, CatalogError> {
    PatternCatalog::open(TomlPatternStore::open()?)
}

fn describe_steps(pattern: &Pattern) -> String {
    pattern
        .steps
        .iter()
        .map(|s| format!("{} {}s", s.phase, s.duration))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = open_catalog()?;

    match action {
        PatternAction::List { json } => {
            let patterns = catalog.list_patterns();
            if json {
                let plain: Vec<&Pattern> = patterns.iter().map(|p| p.as_ref()).collect();
                println!("{}", serde_json::to_string_pretty(&plain)?);
            } else {
                for p in &patterns {
                    let origin = if p.is_custom() { "custom" } else { "built-in" };
                    println!(
                        "{:<44} {:<24} {:>3}s x{:<3} [{origin}]  {}",
                        p.id,
                        p.name,
                        p.total_duration,
                        p.default_sets,
                        describe_steps(p)
                    );
                }
            }
        }
        PatternAction::Show { id } => {
            let pattern = catalog.get(&id).ok_or(CatalogError::NotFound(id))?;
            println!("{}", serde_json::to_string_pretty(pattern.as_ref())?);
        }
        PatternAction::Add { fields } => {
            let draft = fields.apply(PatternDraft::starter(""));
            let pattern = catalog.add_pattern(&draft)?;
            println!("Pattern created: {}", pattern.id);
        }
        PatternAction::Edit { id, fields } => {
            let existing = catalog.get(&id).ok_or_else(|| CatalogError::NotFound(id.clone()))?;
            let draft = fields.apply(PatternDraft::from_pattern(&existing));
            let pattern = catalog.update_pattern(&id, &draft)?;
            println!("Pattern updated: {} ({})", pattern.id, describe_steps(&pattern));
        }
        PatternAction::Delete { id } => {
            catalog.delete_pattern(&id)?;
            println!("Pattern deleted: {id}");
        }
    }
    Ok(())
}
