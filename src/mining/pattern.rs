//! Pattern entities
//!
//! A pattern is a recurring command subsequence with occurrence statistics.
//! The command sequence is stored verbatim (not canonicalized) so a pattern
//! can be replayed with its original timing payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::command::CommandSequence;

/// Usage and timing statistics attached to a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMetadata {
    /// Mean of the delay values within the pattern's sequence, in ms
    pub average_duration: f64,
    /// Population standard deviation of those delay values
    pub variation_std_dev: f64,
    /// How many times the pattern has been applied
    pub times_used: u64,
    /// Running success fraction across recorded uses
    pub success_rate: f64,
}

impl Default for PatternMetadata {
    fn default() -> Self {
        Self {
            average_duration: 0.0,
            variation_std_dev: 0.0,
            times_used: 0,
            success_rate: 0.0,
        }
    }
}

/// A persisted mined pattern.
///
/// Lifecycle: created by mining, mutated by usage-recording or edits
/// (each mutation increments `version`), deleted explicitly. Patterns never
/// auto-expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    /// Stable identifier
    pub id: Uuid,
    /// Optional human-readable name
    pub name: Option<String>,
    /// The literal command subsequence, verbatim from its first occurrence
    pub commands: CommandSequence,
    /// Occurrence count across the mined recordings
    pub frequency: u64,
    /// Mining confidence in [0, 1]
    pub confidence: f64,
    /// Identifiers of the recordings the pattern was observed in
    pub source_file_ids: BTreeSet<String>,
    /// Usage and timing statistics
    pub metadata: PatternMetadata,
    /// Incremented on every update
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    /// Create a fresh pattern at version 1
    pub fn new(
        name: Option<String>,
        commands: CommandSequence,
        frequency: u64,
        confidence: f64,
        source_file_ids: BTreeSet<String>,
        metadata: PatternMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            commands,
            frequency,
            confidence,
            source_file_ids,
            metadata,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical key of the whole subsequence, used for grouping and ranking
    pub fn canonical_key(&self) -> String {
        self.commands
            .iter()
            .map(|c| c.canonical_key())
            .collect::<Vec<_>>()
            .join("|")
    }
}
