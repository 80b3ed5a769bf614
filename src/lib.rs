//! # Macro Humanizer
//!
//! An analysis and transformation engine for recorded input-device macros.
//! It ingests command sequences captured across many recordings, learns their
//! recurring substructure and transition statistics, and produces humanized
//! variants that preserve intent while varying timing and minor content.
//!
//! ## Quick Start
//!
//! ```no_run
//! use macro_humanizer::cache::{CacheHandle, MemoryCache};
//! use macro_humanizer::command::CommandSequence;
//! use macro_humanizer::humanize::HumanizationSettings;
//! use macro_humanizer::Engine;
//! use std::sync::Arc;
//!
//! let engine = Engine::new(CacheHandle::new(Arc::new(MemoryCache::new())));
//!
//! let bytes = std::fs::read("recording.json").expect("read recording");
//! let sequence = CommandSequence::from_json_bytes(&bytes).expect("parse recording");
//!
//! let varied = engine
//!     .humanize_with_settings(&sequence, &HumanizationSettings::default())
//!     .expect("humanize");
//! println!("{} commands", varied.len());
//! ```
//!
//! ## Architecture
//!
//! The system is organized into the following modules:
//!
//! - [`command`]: Canonical command model and recording (de)serialization
//! - [`cache`]: Content-addressed, fail-open result cache
//! - [`mining`]: Frequent-subsequence pattern mining and pattern storage
//! - [`markov`]: First-order transition model over command states
//! - [`humanize`]: Profile-driven humanization transform
//! - [`synthesis`]: Command synthesis from classified UI elements
//! - [`scheduler`]: Priority job queues with retry and backoff
//! - [`engine`]: Composition root wiring the services together
//! - [`app`]: CLI and configuration management
//!
//! ## Data Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────────┐
//! │  Raw bytes  │───▶│   Command   │───▶│  Miner / Markov model / │
//! │ (recording) │    │    model    │    │  Humanizer (cached)     │
//! └─────────────┘    └─────────────┘    └─────────────────────────┘
//!                                                   │
//!                                                   ▼
//!                    ┌─────────────┐    ┌─────────────────────────┐
//!                    │  Serialized │◀───│      Command model      │
//!                    │   output    │    │                         │
//!                    └─────────────┘    └─────────────────────────┘
//! ```
//!
//! The [`scheduler`] wraps any of these operations as asynchronous jobs with
//! per-queue concurrency, priority ordering and retry policy.

pub mod app;
pub mod cache;
pub mod command;
pub mod engine;
pub mod humanize;
pub mod markov;
pub mod mining;
pub mod scheduler;
pub mod synthesis;

// Re-export commonly used types
pub use command::{Command, CommandSequence, CommandType};
pub use engine::Engine;
pub use humanize::{HumanizationProfile, HumanizationSettings};
pub use markov::TransitionTable;
pub use mining::{Pattern, PatternMiner};

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job error: {0}")]
    Job(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
