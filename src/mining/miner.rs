//! Frequent-subsequence miner
//!
//! For every recording, every contiguous window from the minimum length up
//! to [`MAX_WINDOW_LEN`] becomes a candidate. Candidates group by the joined
//! canonical keys of their commands; groups below the frequency cutoff are
//! dropped, the rest are ranked by descending frequency and capped at
//! [`MAX_PATTERNS`]. Ranking ties break on the canonical key so mining the
//! same inputs always yields the same ordered result.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::pattern::{Pattern, PatternMetadata};
use crate::command::{Command, CommandSequence, CommandType};

/// Longest candidate window considered
pub const MAX_WINDOW_LEN: usize = 15;

/// At most this many patterns survive one mining run
pub const MAX_PATTERNS: usize = 100;

/// Truncation length for generated pattern names
const NAME_KEY_CHARS: usize = 30;

struct CandidateGroup {
    /// (source id, starting offset) of every occurrence
    occurrences: Vec<(String, usize)>,
    sources: BTreeSet<String>,
    /// Literal commands from the first occurrence, kept verbatim
    literal: Vec<Command>,
}

impl CandidateGroup {
    fn frequency(&self) -> u64 {
        self.occurrences.len() as u64
    }
}

/// Windowed frequent-subsequence miner
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMiner;

impl PatternMiner {
    pub fn new() -> Self {
        Self
    }

    /// Mine ranked patterns from labeled sequences.
    ///
    /// Fewer than two sequences yield no patterns; sequences shorter than
    /// `min_length` contribute no candidates. Both are normal outcomes, not
    /// errors.
    pub fn mine(
        &self,
        sequences: &[(String, CommandSequence)],
        min_length: usize,
        min_frequency: u64,
    ) -> Vec<Pattern> {
        if sequences.len() < 2 || min_length == 0 {
            return Vec::new();
        }

        let mut groups: HashMap<String, CandidateGroup> = HashMap::new();
        for (source_id, sequence) in sequences {
            let commands = &sequence.commands;
            if commands.len() < min_length {
                continue;
            }
            let longest = commands.len().min(MAX_WINDOW_LEN);
            for window_len in min_length..=longest {
                for start in 0..=(commands.len() - window_len) {
                    let window = &commands[start..start + window_len];
                    let key = window
                        .iter()
                        .map(|c| c.canonical_key())
                        .collect::<Vec<_>>()
                        .join("|");
                    let group = groups.entry(key).or_insert_with(|| CandidateGroup {
                        occurrences: Vec::new(),
                        sources: BTreeSet::new(),
                        literal: window.to_vec(),
                    });
                    group.occurrences.push((source_id.clone(), start));
                    group.sources.insert(source_id.clone());
                }
            }
        }

        let mut ranked: Vec<(String, CandidateGroup)> = groups
            .into_iter()
            .filter(|(_, group)| group.frequency() >= min_frequency)
            .collect();
        ranked.sort_by(|a, b| {
            b.1.frequency()
                .cmp(&a.1.frequency())
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(MAX_PATTERNS);

        debug!(
            "mined {} patterns from {} sequences (min_length={min_length}, min_frequency={min_frequency})",
            ranked.len(),
            sequences.len()
        );

        let source_count = sequences.len() as f64;
        ranked
            .into_iter()
            .map(|(_, group)| {
                let frequency = group.frequency();
                let confidence = (frequency as f64 / (source_count * 2.0)).min(1.0);
                let (average_duration, variation_std_dev) = delay_stats(&group.literal);
                Pattern::new(
                    Some(generate_name(&group.literal)),
                    CommandSequence::new(group.literal),
                    frequency,
                    confidence,
                    group.sources,
                    PatternMetadata {
                        average_duration,
                        variation_std_dev,
                        ..PatternMetadata::default()
                    },
                )
            })
            .collect()
    }
}

/// Mean and population standard deviation of the delay values in a window.
/// Fewer than two delay values leave the deviation at zero.
fn delay_stats(commands: &[Command]) -> (f64, f64) {
    let delays: Vec<f64> = commands
        .iter()
        .filter(|c| c.command_type == CommandType::Delay)
        .filter_map(|c| c.delay)
        .map(|d| d as f64)
        .collect();
    if delays.is_empty() {
        return (0.0, 0.0);
    }
    let mean = delays.iter().sum::<f64>() / delays.len() as f64;
    if delays.len() < 2 {
        return (mean, 0.0);
    }
    let variance = delays.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / delays.len() as f64;
    (mean, variance.sqrt())
}

/// Derive a readable name from the window's keyboard keys
fn generate_name(commands: &[Command]) -> String {
    let keys: Vec<&str> = commands
        .iter()
        .filter(|c| c.command_type == CommandType::Keyboard)
        .filter_map(|c| c.key.as_deref())
        .collect();
    if keys.is_empty() {
        return format!("Pattern: {} commands", commands.len());
    }
    let joined: String = keys.join("-").chars().take(NAME_KEY_CHARS).collect();
    format!("Pattern: {joined}")
}

/// Positional similarity of two sequences.
///
/// Canonically-equal positions are counted up to the shorter length and
/// normalized by the longer length, so a long sequence never scores high
/// against a short prefix of itself.
pub fn similarity(a: &CommandSequence, b: &CommandSequence) -> f64 {
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 0.0;
    }
    let matches = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.canonically_equal(y))
        .count();
    matches as f64 / longer as f64
}
