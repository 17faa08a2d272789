mod builder;
mod builtin;
mod catalog;
mod store;
mod types;

pub use builder::{
    clamp_sets, clamp_step_duration, PatternDraft, DEFAULT_DESCRIPTION, DEFAULT_SETS, DEFAULT_STEP_SECS,
};
pub use builtin::builtin_patterns;
pub use catalog::{PatternCatalog, CUSTOM_ID_PREFIX};
pub use store::{MemoryPatternStore, PatternStore, TomlPatternStore};
pub use types::{
    Pattern, PatternBody, PatternOrigin, Phase, Step, MAX_SETS, MAX_STEP_SECS, MIN_SETS,
};
