//! Pattern Mining
//!
//! Extracts frequent contiguous command subsequences across multiple
//! recordings, scores them, and persists them as reusable patterns.
//! Matching is driven by canonical keys, so recordings of the same gesture
//! group together despite differing delays and coordinates.

pub mod miner;
pub mod pattern;
pub mod store;

pub use miner::{similarity, PatternMiner, MAX_PATTERNS, MAX_WINDOW_LEN};
pub use pattern::{Pattern, PatternMetadata};
pub use store::PatternStore;
