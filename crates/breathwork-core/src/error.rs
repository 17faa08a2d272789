//! Core error types for breathwork-core.
//!
//! Every fallible operation in the library reports one of the enums below.
//! Out-of-range numeric input (durations, sets) is never an error: it is
//! clamped to the nearest bound before it reaches any of these paths.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

/// Core error type for breathwork-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Pattern validation errors
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session driver task has stopped
    #[error("Session driver is no longer running")]
    DriverStopped,
}

/// Errors raised while building or validating a pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Name is empty after trimming
    #[error("Pattern name is required")]
    MissingName,

    /// No phase has a positive duration
    #[error("At least one breathing phase must have a duration greater than 0")]
    EmptyPattern,

    /// Pattern carries no steps at all
    #[error("Pattern '{0}' has no steps")]
    NoSteps(String),

    /// A step duration falls outside 1..=60 seconds
    #[error("Step {index} of pattern '{id}' has invalid duration {duration}s")]
    InvalidStep { id: String, index: usize, duration: u32 },

    /// Stored total does not match the sum of the steps
    #[error("Pattern '{id}' declares {declared}s total but its steps sum to {actual}s")]
    TotalMismatch { id: String, declared: u32, actual: u32 },
}

/// Errors raised by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The pattern cannot drive a session
    #[error("Invalid pattern '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: PatternError,
    },

    /// The command is not allowed in the current state
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
}

/// Errors raised by the pattern catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Pattern '{0}' not found")]
    NotFound(String),

    #[error("Built-in pattern '{0}' cannot be modified")]
    BuiltinImmutable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while reading or writing persisted data.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read/write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by a cue sink. Never escapes the cue dispatcher.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("Haptic device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Cue delivery failed: {0}")]
    Delivery(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_state() {
        let err = SessionError::InvalidTransition {
            state: SessionState::Active,
            action: "select a pattern",
        };
        assert_eq!(err.to_string(), "Cannot select a pattern while active");
    }

    #[test]
    fn pattern_error_converts_into_core_error() {
        let err: CoreError = PatternError::EmptyPattern.into();
        assert!(matches!(err, CoreError::Pattern(PatternError::EmptyPattern)));
    }
}
