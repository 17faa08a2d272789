//! Custom pattern persistence.
//!
//! The catalog only needs "load everything" and "save everything"; the
//! medium behind that is up to the [`PatternStore`] implementation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::types::Pattern;
use crate::error::StorageError;
use crate::storage::data_dir;

pub trait PatternStore {
    fn load_all(&self) -> Result<Vec<Pattern>, StorageError>;
    fn save_all(&self, patterns: &[Pattern]) -> Result<(), StorageError>;
}

/// Wrapper for serializing patterns to TOML
#[derive(Serialize, Deserialize)]
struct PatternsFile {
    #[serde(default)]
    patterns: Vec<Pattern>,
}

/// Stores custom patterns in `patterns.toml` under the data directory.
pub struct TomlPatternStore {
    path: PathBuf,
}

impl TomlPatternStore {
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir()?;
        Ok(Self {
            path: dir.join("patterns.toml"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternStore for TomlPatternStore {
    fn load_all(&self) -> Result<Vec<Pattern>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: PatternsFile = toml::from_str(&content)?;
        Ok(file.patterns)
    }

    fn save_all(&self, patterns: &[Pattern]) -> Result<(), StorageError> {
        let file = PatternsFile {
            patterns: patterns.to_vec(),
        };
        let content = toml::to_string_pretty(&file)?;
        std::fs::write(&self.path, content).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store, for tests and embedding without a filesystem.
#[derive(Default)]
pub struct MemoryPatternStore {
    patterns: Mutex<Vec<Pattern>>,
}

impl MemoryPatternStore {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns: Mutex::new(patterns),
        }
    }

    pub fn snapshot(&self) -> Vec<Pattern> {
        self.patterns.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl PatternStore for MemoryPatternStore {
    fn load_all(&self) -> Result<Vec<Pattern>, StorageError> {
        Ok(self.snapshot())
    }

    fn save_all(&self, patterns: &[Pattern]) -> Result<(), StorageError> {
        let mut guard = self
            .patterns
            .lock()
            .map_err(|_| StorageError::DataDir("pattern store lock poisoned".into()))?;
        *guard = patterns.to_vec();
        Ok(())
    }
}
