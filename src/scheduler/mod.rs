//! Job Scheduler
//!
//! Three independent queues (processing, image-analysis, pattern-mining),
//! each with bounded worker concurrency, priority ordering with FIFO
//! tie-break, and a retry/backoff policy. Jobs are fire-and-forget from the
//! caller's perspective: completion and failure are reported through an
//! injected notification sink, never thrown back at the caller.

pub mod notify;
pub mod policy;
pub mod queue;

pub use notify::{JobEvent, JobState, NotificationSink, NullSink, TracingSink};
pub use policy::{BackoffPolicy, EnqueueOptions, QueueConfig};
pub use queue::{JobHandler, JobQueue, JobRecord, Scheduler};

/// Queue for general processing jobs (parse + humanize)
pub const PROCESSING_QUEUE: &str = "processing";
/// Queue for image-analysis jobs (element classification results)
pub const IMAGE_QUEUE: &str = "image-analysis";
/// Queue for pattern-mining jobs
pub const MINING_QUEUE: &str = "pattern-mining";
