//! Progress notification
//!
//! The scheduler reports every job state transition through an injected
//! sink so progress can be observed without coupling to any transport.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Job lifecycle states: queued → active → {completed | failed}, with
/// failed re-entering queued while retry budget remains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobState {
    /// Terminal states are never left
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One observed job state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: Uuid,
    pub queue: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// External collaborator receiving job progress events
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: JobEvent);
}

/// Sink that drops every event
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: JobEvent) {}
}

/// Sink that logs transitions through `tracing`
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: JobEvent) {
        match event.state {
            JobState::Failed => warn!(
                "job {} on {} failed: {}",
                event.job_id,
                event.queue,
                event.error.as_deref().unwrap_or("unknown error")
            ),
            state => info!("job {} on {} is {:?}", event.job_id, event.queue, state),
        }
    }
}
