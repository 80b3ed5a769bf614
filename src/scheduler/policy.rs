//! Queue configuration and retry policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a failed job waits before re-entering its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffPolicy {
    /// Retry immediately
    None,
    /// Constant wait between attempts
    Fixed { delay_ms: u64 },
    /// Wait doubles with every failed attempt
    Exponential { base_ms: u64 },
}

impl BackoffPolicy {
    /// Delay before the retry following the given failed attempt (1-based)
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        match self {
            BackoffPolicy::None => Duration::ZERO,
            BackoffPolicy::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            BackoffPolicy::Exponential { base_ms } => {
                let doublings = attempt.saturating_sub(1).min(16);
                Duration::from_millis(base_ms.saturating_mul(1u64 << doublings))
            }
        }
    }
}

/// Per-queue limits and retry policy
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue name used for enqueue routing and event reporting
    pub name: String,
    /// Bounded number of concurrently executing workers
    pub concurrency: usize,
    /// Total attempts a job may consume before failing terminally
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl QueueConfig {
    /// Reference defaults for the processing queue
    pub fn processing() -> Self {
        Self {
            name: super::PROCESSING_QUEUE.to_string(),
            concurrency: 3,
            max_attempts: 3,
            backoff: BackoffPolicy::Exponential { base_ms: 2000 },
        }
    }

    /// Reference defaults for the image-analysis queue
    pub fn image_analysis() -> Self {
        Self {
            name: super::IMAGE_QUEUE.to_string(),
            concurrency: 2,
            max_attempts: 3,
            backoff: BackoffPolicy::Fixed { delay_ms: 3000 },
        }
    }

    /// Reference defaults for the pattern-mining queue
    pub fn pattern_mining() -> Self {
        Self {
            name: super::MINING_QUEUE.to_string(),
            concurrency: 1,
            max_attempts: 1,
            backoff: BackoffPolicy::None,
        }
    }
}

/// Per-job overrides supplied at enqueue time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnqueueOptions {
    /// Lower values are serviced first
    pub priority: u8,
    /// Override of the queue's attempt budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Override of the queue's backoff policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffPolicy>,
}

impl EnqueueOptions {
    /// Default options at the given priority
    pub fn with_priority(priority: u8) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }
}
