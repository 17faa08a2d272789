//! Pattern catalog: built-in patterns plus user-defined ones.
//!
//! The catalog owns every [`Pattern`] behind an `Arc`; sessions hold clones
//! of that `Arc` and never mutate it. Only custom patterns are written back
//! to the [`PatternStore`].

use chrono::Utc;
use std::sync::Arc;

use super::builder::PatternDraft;
use super::builtin::builtin_patterns;
use super::store::PatternStore;
use super::types::{Pattern, PatternOrigin};
use crate::error::CatalogError;

pub const CUSTOM_ID_PREFIX: &str = "custom-";

pub struct PatternCatalog<S: PatternStore> {
    builtins: Vec<Arc<Pattern>>,
    custom: Vec<Arc<Pattern>>,
    store: S,
}

impl<S: PatternStore> PatternCatalog<S> {
    /// Load custom patterns from `store` next to the built-ins.
    ///
    /// Stored entries that no longer validate, or that claim a built-in id,
    /// are skipped with a warning rather than failing the whole catalog.
    pub fn open(store: S) -> Result<Self, CatalogError> {
        let builtins: Vec<Arc<Pattern>> = builtin_patterns().into_iter().map(Arc::new).collect();
        let mut custom = Vec::new();
        for mut pattern in store.load_all()? {
            if builtins.iter().any(|b| b.id == pattern.id) {
                tracing::warn!(id = %pattern.id, "Skipping stored pattern that shadows a built-in");
                continue;
            }
            if let Err(err) = pattern.validate() {
                tracing::warn!(id = %pattern.id, error = %err, "Skipping invalid stored pattern");
                continue;
            }
            pattern.origin = PatternOrigin::Custom;
            custom.push(Arc::new(pattern));
        }
        tracing::debug!(builtin = builtins.len(), custom = custom.len(), "Pattern catalog loaded");
        Ok(Self {
            builtins,
            custom,
            store,
        })
    }

    /// Built-ins first, then custom patterns in creation order.
    pub fn list_patterns(&self) -> Vec<Arc<Pattern>> {
        self.builtins.iter().chain(self.custom.iter()).cloned().collect()
    }

    pub fn custom_patterns(&self) -> &[Arc<Pattern>] {
        &self.custom
    }

    pub fn get(&self, id: &str) -> Option<Arc<Pattern>> {
        self.builtins
            .iter()
            .chain(self.custom.iter())
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn add_pattern(&mut self, draft: &PatternDraft) -> Result<Arc<Pattern>, CatalogError> {
        let body = draft.build()?;
        let id = self.fresh_id();
        let pattern = Arc::new(Pattern::from_body(id, body, PatternOrigin::Custom, Some(Utc::now())));

        let mut next = self.custom.clone();
        next.push(Arc::clone(&pattern));
        self.persist(next)?;
        tracing::debug!(id = %pattern.id, name = %pattern.name, "Custom pattern added");
        Ok(pattern)
    }

    /// Replace a custom pattern's content, keeping its id and creation time.
    pub fn update_pattern(&mut self, id: &str, draft: &PatternDraft) -> Result<Arc<Pattern>, CatalogError> {
        let index = self.custom_index(id)?;
        let body = draft.build()?;
        let existing = &self.custom[index];
        let pattern = Arc::new(Pattern::from_body(
            existing.id.clone(),
            body,
            PatternOrigin::Custom,
            existing.created_at,
        ));

        let mut next = self.custom.clone();
        next[index] = Arc::clone(&pattern);
        self.persist(next)?;
        tracing::debug!(id = %pattern.id, "Custom pattern updated");
        Ok(pattern)
    }

    pub fn delete_pattern(&mut self, id: &str) -> Result<(), CatalogError> {
        let index = self.custom_index(id)?;
        let mut next = self.custom.clone();
        next.remove(index);
        self.persist(next)?;
        tracing::debug!(id, "Custom pattern deleted");
        Ok(())
    }

    fn custom_index(&self, id: &str) -> Result<usize, CatalogError> {
        if self.builtins.iter().any(|p| p.id == id) {
            return Err(CatalogError::BuiltinImmutable(id.to_string()));
        }
        self.custom
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Write first, then swap in memory, so a failed save leaves the catalog untouched.
    fn persist(&mut self, next: Vec<Arc<Pattern>>) -> Result<(), CatalogError> {
        let plain: Vec<Pattern> = next.iter().map(|p| Pattern::clone(p)).collect();
        self.store.save_all(&plain)?;
        self.custom = next;
        Ok(())
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = format!("{CUSTOM_ID_PREFIX}{}", uuid::Uuid::new_v4());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
