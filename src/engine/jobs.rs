//! Typed job payloads and handlers
//!
//! Scheduler payloads travel as JSON values; these structs give each queue
//! an explicit schema. Handlers report failure by returning an error, which
//! the owning queue retries per its policy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::Engine;
use crate::cache::keys;
use crate::command::CommandSequence;
use crate::synthesis::ClassifiedElement;
use crate::{Error, Result};

/// Payload for the processing queue: humanize one recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    /// Stable identifier of the source file
    pub file_id: String,
    pub commands: CommandSequence,
    /// Profile name; the store default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Payload for the image-analysis queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysisJob {
    pub entity_id: String,
    pub elements: Vec<ClassifiedElement>,
}

/// One labeled sequence inside a mining job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningSource {
    pub id: String,
    pub commands: CommandSequence,
}

/// Payload for the pattern-mining queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningJob {
    pub sources: Vec<MiningSource>,
    pub min_length: usize,
    pub min_frequency: u64,
}

fn decode<T: serde::de::DeserializeOwned>(queue: &str, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| Error::Job(format!("invalid {queue} payload: {e}")))
}

/// Humanize the job's commands and cache the output under the source
/// content hash
pub(crate) async fn run_processing_job(engine: &Engine, payload: Value) -> Result<()> {
    let job: ProcessingJob = decode("processing", payload)?;
    let humanized = engine.humanize(&job.commands, job.profile.as_deref())?;
    let source_bytes = job.commands.to_json_bytes()?;
    let key = keys::humanized_key(&keys::content_hash(&source_bytes));
    engine.cache().set(&key, &humanized, None).await;
    info!(
        "processed {}: {} commands in, {} out",
        job.file_id,
        job.commands.len(),
        humanized.len()
    );
    Ok(())
}

/// Synthesize and cache the command sequence for a classified image
pub(crate) async fn run_image_analysis_job(engine: &Engine, payload: Value) -> Result<()> {
    let job: ImageAnalysisJob = decode("image-analysis", payload)?;
    let sequence = engine.analyze_image(&job.entity_id, &job.elements).await;
    info!(
        "synthesized {} commands for image {}",
        sequence.len(),
        job.entity_id
    );
    Ok(())
}

/// Mine the job's sources into the pattern store
pub(crate) async fn run_mining_job(engine: &Engine, payload: Value) -> Result<()> {
    let job: MiningJob = decode("pattern-mining", payload)?;
    let sources: Vec<(String, CommandSequence)> = job
        .sources
        .into_iter()
        .map(|source| (source.id, source.commands))
        .collect();
    let patterns = engine
        .mine_patterns(&sources, job.min_length, job.min_frequency)
        .await?;
    info!("mining job stored {} patterns", patterns.len());
    Ok(())
}
