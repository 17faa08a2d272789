//! # Breathwork Core Library
//!
//! This library provides the core logic for Breathwork guided-breathing
//! sessions. All operations are available through the standalone CLI
//! binary; any GUI is meant to be a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Pattern Catalog**: built-in and custom breathing patterns, persisted
//!   through a pluggable store
//! - **Session Clock**: a 1 Hz tick source that can be armed and disarmed
//! - **Session Engine**: the state machine that turns ticks into phase and
//!   set transitions
//! - **Cue Dispatcher**: maps transitions to animation targets and haptic
//!   intents for the presentation layer
//! - **Session Driver**: a tokio task that serializes commands and ticks
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`PatternCatalog`]: Pattern storage and CRUD
//! - [`PatternDraft`]: Validation of user-authored patterns
//! - [`SessionDriver`]: Real-time driver for an engine
//! - [`Config`]: Application configuration management

pub mod cue;
pub mod error;
pub mod events;
pub mod pattern;
pub mod session;
pub mod storage;

pub use cue::{Cue, CueDispatcher, CueKind, CueSink, HapticDevice, HapticIntent, HapticSink};
pub use error::{CatalogError, ConfigError, CoreError, CueError, PatternError, SessionError, StorageError};
pub use events::Event;
pub use pattern::{Pattern, PatternCatalog, PatternDraft, PatternStore, Phase, Step, TomlPatternStore};
pub use session::{
    SessionDriver, SessionEngine, SessionHandle, SessionSnapshot, SessionState, TokioClock,
};
pub use storage::Config;
