//! Command sequences
//!
//! Ordered lists of commands with JSON (de)serialization. Order is
//! semantically significant: it is the execution order of the macro.

use serde::{Deserialize, Serialize};

use super::types::{Command, CommandType};
use crate::{Error, Result};

/// An ordered macro command sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    /// Commands in execution order
    pub commands: Vec<Command>,
}

impl CommandSequence {
    /// Create a sequence from commands
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Parse a sequence from raw recording bytes (a JSON command array).
    ///
    /// Malformed input aborts the single operation with a parse error and
    /// has no side effects on caches or stored patterns.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Parse(format!("invalid recording: {e}")))
    }

    /// Serialize the sequence back to recording bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over commands in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Sum of explicit delay commands, in milliseconds
    pub fn total_delay_ms(&self) -> u64 {
        self.commands
            .iter()
            .filter(|c| c.command_type == CommandType::Delay)
            .filter_map(|c| c.delay)
            .sum()
    }

    /// Count commands of a given type
    pub fn count_of_type(&self, command_type: CommandType) -> usize {
        self.commands
            .iter()
            .filter(|c| c.command_type == command_type)
            .count()
    }
}

impl From<Vec<Command>> for CommandSequence {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl IntoIterator for CommandSequence {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
