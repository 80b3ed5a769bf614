//! Queue machinery
//!
//! Each queue owns a priority heap, a bounded worker semaphore and a
//! dispatcher task. Dequeue order is priority (lower value first) then FIFO
//! within equal priority; completion order is not guaranteed because job
//! durations vary. Pausing stops new dequeues only; in-flight jobs always
//! run to completion.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tracing::debug;
use uuid::Uuid;

use super::notify::{JobEvent, JobState, NotificationSink};
use super::policy::{BackoffPolicy, EnqueueOptions, QueueConfig};
use crate::{Error, Result};

/// Future returned by a job handler
pub type JobFuture = Pin<Box<dyn Future<Output = crate::Result<()>> + Send>>;

/// Job execution callback registered per queue
pub type JobHandler = Arc<dyn Fn(Value) -> JobFuture + Send + Sync>;

/// Bookkeeping view of one job
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub queue: String,
    pub state: JobState,
    pub priority: u8,
    /// Attempts consumed so far
    pub attempts_made: u32,
    /// Most recent failure, kept through retries and terminal failure
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

struct QueuedJob {
    id: Uuid,
    priority: u8,
    /// Monotonic enqueue sequence, the FIFO tie-break
    seq: u64,
    payload: Value,
    attempt: u32,
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    // Max-heap: "greater" means dequeued sooner, so lower priority value and
    // lower sequence win
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueInner {
    config: QueueConfig,
    handler: JobHandler,
    sink: Arc<dyn NotificationSink>,
    heap: Mutex<BinaryHeap<QueuedJob>>,
    records: RwLock<HashMap<Uuid, JobRecord>>,
    paused: AtomicBool,
    shutdown: AtomicBool,
    wakeup: Notify,
    workers: Arc<Semaphore>,
    next_seq: AtomicU64,
}

impl QueueInner {
    fn emit(&self, job_id: Uuid, state: JobState, progress: Option<f32>, error: Option<String>) {
        self.sink.notify(JobEvent {
            job_id,
            queue: self.config.name.clone(),
            state,
            progress,
            error,
        });
    }

    fn set_state(&self, job_id: Uuid, state: JobState, attempts: u32, error: Option<String>) {
        let mut records = self.records.write();
        if let Some(record) = records.get_mut(&job_id) {
            record.state = state;
            record.attempts_made = attempts;
            if error.is_some() {
                record.last_error = error;
            }
        }
    }
}

/// One priority job queue with its dispatcher and workers
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl JobQueue {
    /// Create the queue and start its dispatcher.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(config: QueueConfig, handler: JobHandler, sink: Arc<dyn NotificationSink>) -> Self {
        let workers = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let inner = Arc::new(QueueInner {
            config,
            handler,
            sink,
            heap: Mutex::new(BinaryHeap::new()),
            records: RwLock::new(HashMap::new()),
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            wakeup: Notify::new(),
            workers,
            next_seq: AtomicU64::new(0),
        });
        tokio::spawn(Self::dispatch(inner.clone()));
        Self { inner }
    }

    async fn dispatch(inner: Arc<QueueInner>) {
        loop {
            let permit = match inner.workers.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let job = loop {
                if inner.shutdown.load(AtomicOrdering::Relaxed) {
                    return;
                }
                if !inner.paused.load(AtomicOrdering::Relaxed) {
                    let popped = inner.heap.lock().pop();
                    if let Some(job) = popped {
                        break job;
                    }
                }
                inner.wakeup.notified().await;
            };
            let worker = inner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::run(worker, job).await;
            });
        }
    }

    async fn run(inner: Arc<QueueInner>, mut job: QueuedJob) {
        job.attempt += 1;
        inner.set_state(job.id, JobState::Active, job.attempt, None);
        inner.emit(job.id, JobState::Active, Some(0.0), None);

        match (inner.handler)(job.payload.clone()).await {
            Ok(()) => {
                inner.set_state(job.id, JobState::Completed, job.attempt, None);
                inner.emit(job.id, JobState::Completed, Some(1.0), None);
            }
            Err(e) => {
                let message = e.to_string();
                if job.attempt < job.max_attempts {
                    let delay = job.backoff.delay_after_attempt(job.attempt);
                    debug!(
                        "job {} on {} failed attempt {}/{}, retrying in {:?}: {}",
                        job.id, inner.config.name, job.attempt, job.max_attempts, delay, message
                    );
                    inner.set_state(job.id, JobState::Queued, job.attempt, Some(message.clone()));
                    inner.emit(job.id, JobState::Queued, None, Some(message));
                    let requeue = inner.clone();
                    tokio::spawn(async move {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        requeue.heap.lock().push(job);
                        requeue.wakeup.notify_one();
                    });
                } else {
                    inner.set_state(job.id, JobState::Failed, job.attempt, Some(message.clone()));
                    inner.emit(job.id, JobState::Failed, None, Some(message));
                }
            }
        }
    }

    /// Add a job; returns its id immediately. The outcome is reported only
    /// through the notification sink.
    pub fn enqueue(&self, payload: Value, options: EnqueueOptions) -> Uuid {
        let inner = &self.inner;
        let id = Uuid::new_v4();
        let job = QueuedJob {
            id,
            priority: options.priority,
            seq: inner.next_seq.fetch_add(1, AtomicOrdering::Relaxed),
            payload,
            attempt: 0,
            max_attempts: options.attempts.unwrap_or(inner.config.max_attempts).max(1),
            backoff: options.backoff.unwrap_or(inner.config.backoff),
        };
        inner.records.write().insert(
            id,
            JobRecord {
                id,
                queue: inner.config.name.clone(),
                state: JobState::Queued,
                priority: options.priority,
                attempts_made: 0,
                last_error: None,
                enqueued_at: Utc::now(),
            },
        );
        inner.heap.lock().push(job);
        inner.emit(id, JobState::Queued, None, None);
        inner.wakeup.notify_one();
        id
    }

    /// Stop dequeuing; in-flight jobs keep running
    pub fn pause(&self) {
        self.inner.paused.store(true, AtomicOrdering::Relaxed);
    }

    /// Re-enable dequeuing
    pub fn resume(&self) {
        self.inner.paused.store(false, AtomicOrdering::Relaxed);
        self.inner.wakeup.notify_one();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(AtomicOrdering::Relaxed)
    }

    /// Drop bookkeeping for jobs in terminal states
    pub fn clear_finished(&self) -> usize {
        let mut records = self.inner.records.write();
        let before = records.len();
        records.retain(|_, record| !record.state.is_terminal());
        before - records.len()
    }

    /// Bookkeeping view of one job
    pub fn job(&self, id: Uuid) -> Option<JobRecord> {
        self.inner.records.read().get(&id).cloned()
    }

    /// All tracked jobs
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.inner.records.read().values().cloned().collect()
    }

    /// Jobs waiting in the heap
    pub fn pending_count(&self) -> usize {
        self.inner.heap.lock().len()
    }

    /// Queue name
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.inner.shutdown.store(true, AtomicOrdering::Relaxed);
        self.inner.workers.close();
        self.inner.wakeup.notify_waiters();
    }
}

/// Named collection of independent job queues
#[derive(Default)]
pub struct Scheduler {
    queues: HashMap<String, JobQueue>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queue under its configured name
    pub fn register_queue(
        &mut self,
        config: QueueConfig,
        handler: JobHandler,
        sink: Arc<dyn NotificationSink>,
    ) {
        let name = config.name.clone();
        self.queues.insert(name, JobQueue::new(config, handler, sink));
    }

    /// Look up a queue by name
    pub fn queue(&self, name: &str) -> Result<&JobQueue> {
        self.queues
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("queue {name:?}")))
    }

    /// Enqueue onto a named queue
    pub fn enqueue(&self, name: &str, payload: Value, options: EnqueueOptions) -> Result<Uuid> {
        Ok(self.queue(name)?.enqueue(payload, options))
    }

    pub fn pause(&self, name: &str) -> Result<()> {
        self.queue(name)?.pause();
        Ok(())
    }

    pub fn resume(&self, name: &str) -> Result<()> {
        self.queue(name)?.resume();
        Ok(())
    }

    pub fn clear_finished(&self, name: &str) -> Result<usize> {
        Ok(self.queue(name)?.clear_finished())
    }

    /// Bookkeeping view of a job on a named queue
    pub fn job(&self, name: &str, id: Uuid) -> Result<Option<JobRecord>> {
        Ok(self.queue(name)?.job(id))
    }

    /// Registered queue names
    pub fn queue_names(&self) -> Vec<&str> {
        self.queues.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    struct RecordingSink {
        events: Mutex<Vec<JobEvent>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn states_for(&self, id: Uuid) -> Vec<JobState> {
            self.events
                .lock()
                .iter()
                .filter(|e| e.job_id == id)
                .map(|e| e.state)
                .collect()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, event: JobEvent) {
            self.events.lock().push(event);
        }
    }

    fn succeeding_handler() -> JobHandler {
        Arc::new(|_payload| Box::pin(async { Ok(()) }))
    }

    fn test_config(name: &str, concurrency: usize, max_attempts: u32) -> QueueConfig {
        QueueConfig {
            name: name.to_string(),
            concurrency,
            max_attempts,
            backoff: BackoffPolicy::Fixed { delay_ms: 10 },
        }
    }

    async fn wait_for_state(queue: &JobQueue, id: Uuid, state: JobState) {
        tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                if queue.job(id).map(|r| r.state) == Some(state) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {state:?}"));
    }

    #[tokio::test]
    async fn lifecycle_runs_queued_active_completed() {
        let sink = RecordingSink::new();
        let queue = JobQueue::new(
            test_config("t", 1, 1),
            succeeding_handler(),
            sink.clone(),
        );
        let id = queue.enqueue(json!({"n": 1}), EnqueueOptions::default());
        wait_for_state(&queue, id, JobState::Completed).await;

        assert_eq!(
            sink.states_for(id),
            vec![JobState::Queued, JobState::Active, JobState::Completed]
        );
        let record = queue.job(id).unwrap();
        assert_eq!(record.attempts_made, 1);
        assert_eq!(record.last_error, None);
    }

    #[tokio::test]
    async fn priority_then_fifo_orders_dequeues() {
        let order: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = order.clone();
        let handler: JobHandler = Arc::new(move |payload| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.lock().push(payload["n"].as_i64().unwrap_or(-1));
                Ok(())
            })
        });
        let queue = JobQueue::new(test_config("t", 1, 1), handler, Arc::new(super::super::NullSink));

        // Nothing dequeues while paused, so ordering is decided by the heap
        queue.pause();
        let mut lowest_priority_job = Uuid::nil();
        for (n, priority) in [(1i64, 5u8), (2, 1), (3, 3), (4, 1)] {
            let id = queue.enqueue(json!({ "n": n }), EnqueueOptions::with_priority(priority));
            if priority == 5 {
                lowest_priority_job = id;
            }
        }
        assert_eq!(queue.pending_count(), 4);
        queue.resume();
        // The priority-5 job dequeues last; with one worker it also
        // completes last
        wait_for_state(&queue, lowest_priority_job, JobState::Completed).await;

        // Priority 1 jobs first in FIFO order, then 3, then 5
        assert_eq!(*order.lock(), vec![2, 4, 3, 1]);
    }

    #[tokio::test]
    async fn failed_jobs_retry_until_the_budget_runs_out() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let handler: JobHandler = Arc::new(move |_payload| {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, AtomicOrdering::SeqCst) + 1;
                if n < 3 {
                    Err(Error::Job(format!("transient failure {n}")))
                } else {
                    Ok(())
                }
            })
        });
        let sink = RecordingSink::new();
        let queue = JobQueue::new(test_config("t", 1, 3), handler, sink.clone());
        let id = queue.enqueue(json!({}), EnqueueOptions::default());
        wait_for_state(&queue, id, JobState::Completed).await;

        let record = queue.job(id).unwrap();
        assert_eq!(record.attempts_made, 3);
        // The last transient error stays on the record
        assert_eq!(
            record.last_error.as_deref(),
            Some("Job error: transient failure 2")
        );
        // Two failed attempts re-entered the queue before completing
        let states = sink.states_for(id);
        let requeues = states.iter().filter(|s| **s == JobState::Queued).count();
        assert_eq!(requeues, 3); // initial enqueue + two retries
        assert_eq!(*states.last().unwrap(), JobState::Completed);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_terminally_through_the_sink() {
        let handler: JobHandler =
            Arc::new(|_payload| Box::pin(async { Err(Error::Job("always broken".into())) }));
        let sink = RecordingSink::new();
        let queue = JobQueue::new(test_config("t", 1, 2), handler, sink.clone());

        // Enqueue never surfaces the failure to the caller
        let id = queue.enqueue(json!({}), EnqueueOptions::default());
        wait_for_state(&queue, id, JobState::Failed).await;

        let record = queue.job(id).unwrap();
        assert_eq!(record.attempts_made, 2);
        assert_eq!(record.last_error.as_deref(), Some("Job error: always broken"));

        let final_event = sink
            .events
            .lock()
            .iter()
            .rev()
            .find(|e| e.job_id == id)
            .cloned()
            .unwrap();
        assert_eq!(final_event.state, JobState::Failed);
        assert!(final_event.error.is_some());
    }

    #[tokio::test]
    async fn pause_blocks_dequeues_without_cancelling_in_flight() {
        let handler: JobHandler = Arc::new(|_payload| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(())
            })
        });
        let queue = JobQueue::new(test_config("t", 1, 1), handler, Arc::new(super::super::NullSink));

        let first = queue.enqueue(json!({"n": 1}), EnqueueOptions::default());
        wait_for_state(&queue, first, JobState::Active).await;
        queue.pause();
        let second = queue.enqueue(json!({"n": 2}), EnqueueOptions::default());

        // The in-flight job finishes despite the pause
        wait_for_state(&queue, first, JobState::Completed).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(queue.job(second).unwrap().state, JobState::Queued);

        queue.resume();
        wait_for_state(&queue, second, JobState::Completed).await;
    }

    #[tokio::test]
    async fn clear_finished_drops_terminal_records_only() {
        let sink = RecordingSink::new();
        let queue = JobQueue::new(test_config("t", 1, 1), succeeding_handler(), sink);
        let done = queue.enqueue(json!({}), EnqueueOptions::default());
        wait_for_state(&queue, done, JobState::Completed).await;

        queue.pause();
        let waiting = queue.enqueue(json!({}), EnqueueOptions::default());

        let removed = queue.clear_finished();
        assert_eq!(removed, 1);
        assert!(queue.job(done).is_none());
        assert!(queue.job(waiting).is_some());
    }

    #[tokio::test]
    async fn scheduler_routes_by_queue_name() {
        let mut scheduler = Scheduler::new();
        scheduler.register_queue(
            test_config("alpha", 1, 1),
            succeeding_handler(),
            Arc::new(super::super::NullSink),
        );

        let id = scheduler
            .enqueue("alpha", json!({}), EnqueueOptions::default())
            .unwrap();
        assert!(scheduler.job("alpha", id).unwrap().is_some());

        let missing = scheduler.enqueue("beta", json!({}), EnqueueOptions::default());
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
