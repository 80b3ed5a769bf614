//! In-memory pattern store
//!
//! Append-mostly storage for mined patterns. Updates go through a closure
//! under the write lock and bump the version counter; there is no
//! optimistic-concurrency conflict detection across concurrent updates to
//! the same pattern. Persistence technology is a collaborator concern.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::miner::similarity;
use super::pattern::Pattern;
use crate::command::CommandSequence;
use crate::{Error, Result};

/// Shared in-memory pattern storage
#[derive(Default)]
pub struct PatternStore {
    patterns: RwLock<HashMap<Uuid, Pattern>>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a pattern by id
    pub fn insert(&self, pattern: Pattern) {
        self.patterns.write().insert(pattern.id, pattern);
    }

    /// Fetch a pattern by id
    pub fn get(&self, id: Uuid) -> Result<Pattern> {
        self.patterns
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("pattern {id}")))
    }

    /// All patterns, ordered by descending frequency then canonical key
    pub fn list(&self) -> Vec<Pattern> {
        let mut patterns: Vec<Pattern> = self.patterns.read().values().cloned().collect();
        patterns.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.canonical_key().cmp(&b.canonical_key()))
        });
        patterns
    }

    /// Number of stored patterns
    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }

    /// Apply an edit to a pattern; bumps version and updated_at
    pub fn update<F>(&self, id: Uuid, edit: F) -> Result<Pattern>
    where
        F: FnOnce(&mut Pattern),
    {
        let mut patterns = self.patterns.write();
        let pattern = patterns
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("pattern {id}")))?;
        edit(pattern);
        pattern.version += 1;
        pattern.updated_at = Utc::now();
        Ok(pattern.clone())
    }

    /// Record one application of the pattern and fold the outcome into the
    /// running success rate
    pub fn record_usage(&self, id: Uuid, success: bool) -> Result<Pattern> {
        self.update(id, |pattern| {
            let meta = &mut pattern.metadata;
            let uses = meta.times_used as f64 + 1.0;
            let outcome = if success { 1.0 } else { 0.0 };
            meta.success_rate = (meta.success_rate * (uses - 1.0) + outcome) / uses;
            meta.times_used += 1;
        })
    }

    /// Delete a pattern explicitly
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.patterns
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("pattern {id}")))
    }

    /// Patterns at or above a positional-similarity threshold against the
    /// given sequence, sorted descending by similarity
    pub fn find_similar(&self, sequence: &CommandSequence, threshold: f64) -> Vec<(Pattern, f64)> {
        let mut scored: Vec<(Pattern, f64)> = self
            .patterns
            .read()
            .values()
            .map(|p| (p.clone(), similarity(&p.commands, sequence)))
            .filter(|(_, score)| *score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}
