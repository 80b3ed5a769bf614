//! Transition table construction and prediction

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::command::{Command, CommandSequence};

/// First-order transition counts between command states.
///
/// Both map levels are ordered, which pins prediction tie-breaks to
/// lexicographic key order: among successors with equal counts the smallest
/// key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed transition between two commands
    pub fn observe(&mut self, from: &Command, to: &Command) {
        self.record(from.state_key(), to.state_key());
    }

    /// Record one observed transition between two state keys
    pub fn record(&mut self, from: String, to: String) {
        *self
            .counts
            .entry(from)
            .or_default()
            .entry(to)
            .or_insert(0) += 1;
    }

    /// Fold every adjacent pair of one sequence into the table
    pub fn absorb(&mut self, sequence: &CommandSequence) {
        for pair in sequence.commands.windows(2) {
            self.observe(&pair[0], &pair[1]);
        }
    }

    /// Outgoing edge counts for a state, if any were observed
    pub fn outgoing(&self, state: &str) -> Option<&BTreeMap<String, u64>> {
        self.counts.get(state)
    }

    /// Most likely next state after the given command.
    ///
    /// Returns `None` when the command's state has no outgoing edges.
    pub fn predict_next(&self, prior: &Command) -> Option<String> {
        let edges = self.counts.get(&prior.state_key())?;
        let mut best: Option<(&String, u64)> = None;
        for (state, &count) in edges {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((state, count));
            }
        }
        best.map(|(state, _)| state.clone())
    }

    /// Predict the state following the last command of a history.
    ///
    /// Returns `None` for an empty history.
    pub fn predict_from_history(&self, history: &CommandSequence) -> Option<String> {
        history.commands.last().and_then(|last| self.predict_next(last))
    }

    /// Number of observed source states
    pub fn state_count(&self) -> usize {
        self.counts.len()
    }

    /// Total number of observed transitions
    pub fn transition_count(&self) -> u64 {
        self.counts.values().flat_map(|edges| edges.values()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Build a transition table from one or more sequences.
///
/// Adjacent pairs are counted within each sequence only; the last command
/// of one sequence never transitions into the first command of the next.
pub fn analyze_transitions(sequences: &[CommandSequence]) -> TransitionTable {
    let mut table = TransitionTable::new();
    for sequence in sequences {
        table.absorb(sequence);
    }
    table
}
