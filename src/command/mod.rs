//! Command Model
//!
//! Canonical in-memory representation of a macro command and an ordered
//! sequence of commands. Everything downstream (mining, transition analysis,
//! humanization) operates on these types.

pub mod sequence;
pub mod types;

pub use sequence::CommandSequence;
pub use types::{Command, CommandType};
