//! Transition Model
//!
//! First-order Markov chain over command states, rebuilt per analysis
//! request. States project a command to `type:(key or action)`; counts
//! accumulate over adjacent pairs within each sequence, never across
//! sequence boundaries.

pub mod transition;

pub use transition::{analyze_transitions, TransitionTable};
