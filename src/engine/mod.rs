//! Composition Root
//!
//! [`Engine`] owns explicitly constructed service objects (cache handle,
//! pattern store, profile store, miner) and exposes the operations
//! collaborators call. There is no hidden global state: everything the
//! engine uses is injected at construction and passed by reference.

pub mod jobs;

use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{keys, CacheHandle};
use crate::command::CommandSequence;
use crate::humanize::{HumanizationProfile, HumanizationSettings, Humanizer, ProfileStore};
use crate::markov::{analyze_transitions, TransitionTable};
use crate::mining::{Pattern, PatternMiner, PatternStore};
use crate::scheduler::{JobHandler, NotificationSink, QueueConfig, Scheduler};
use crate::synthesis::{synthesize_sequence, ClassifiedElement};
use crate::{Error, Result};

/// The analysis/transformation engine
#[derive(Clone)]
pub struct Engine {
    cache: CacheHandle,
    patterns: Arc<PatternStore>,
    profiles: Arc<ProfileStore>,
    miner: PatternMiner,
}

impl Engine {
    /// Build an engine over the given cache handle
    pub fn new(cache: CacheHandle) -> Self {
        Self {
            cache,
            patterns: Arc::new(PatternStore::new()),
            profiles: Arc::new(ProfileStore::new()),
            miner: PatternMiner::new(),
        }
    }

    /// The fail-open cache
    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    /// Mined pattern storage
    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    /// Humanization profile storage
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Parse raw recording bytes, consulting the per-file cache first
    pub async fn parse_recording(&self, bytes: &[u8]) -> Result<CommandSequence> {
        let key = keys::parsed_commands_key(&keys::content_hash(bytes));
        if let Some(cached) = self.cache.get::<CommandSequence>(&key).await {
            return Ok(cached);
        }
        let sequence = CommandSequence::from_json_bytes(bytes)?;
        self.cache.set(&key, &sequence, None).await;
        Ok(sequence)
    }

    /// Mine ranked patterns across labeled sequences and persist them.
    ///
    /// Requires at least two sequences. Results are cached under a hash of
    /// the sorted per-sequence content hashes, so repeating the same file
    /// set with a warm cache yields the identical ranked list.
    pub async fn mine_patterns(
        &self,
        sources: &[(String, CommandSequence)],
        min_length: usize,
        min_frequency: u64,
    ) -> Result<Vec<Pattern>> {
        if sources.len() < 2 {
            return Err(Error::Validation(format!(
                "pattern mining requires at least 2 sequences, got {}",
                sources.len()
            )));
        }
        if min_length < 2 {
            return Err(Error::Validation(format!(
                "minimum subsequence length must be at least 2, got {min_length}"
            )));
        }

        let mut hashes = Vec::with_capacity(sources.len());
        for (_, sequence) in sources {
            hashes.push(keys::content_hash(&sequence.to_json_bytes()?));
        }
        let key = keys::pattern_analysis_key(&hashes);

        if let Some(cached) = self.cache.get::<Vec<Pattern>>(&key).await {
            for pattern in &cached {
                self.patterns.insert(pattern.clone());
            }
            return Ok(cached);
        }

        let mined = self.miner.mine(sources, min_length, min_frequency);
        for pattern in &mined {
            self.patterns.insert(pattern.clone());
        }
        self.cache.set(&key, &mined, None).await;
        info!("mined and stored {} patterns", mined.len());
        Ok(mined)
    }

    /// Parse and mine a batch of raw files.
    ///
    /// Unreadable files are skipped with a warning; the rest of the batch
    /// proceeds. Validation then applies to the surviving sequences.
    pub async fn mine_recordings(
        &self,
        files: &[(String, Vec<u8>)],
        min_length: usize,
        min_frequency: u64,
    ) -> Result<Vec<Pattern>> {
        let mut sources = Vec::with_capacity(files.len());
        for (file_id, bytes) in files {
            match self.parse_recording(bytes).await {
                Ok(sequence) => sources.push((file_id.clone(), sequence)),
                Err(e) => warn!("skipping unreadable recording {file_id}: {e}"),
            }
        }
        self.mine_patterns(&sources, min_length, min_frequency).await
    }

    /// Build a transition table over the given sequences
    pub fn analyze_transitions(&self, sequences: &[CommandSequence]) -> TransitionTable {
        analyze_transitions(sequences)
    }

    /// Humanize a sequence under a named profile, or under the store's
    /// default profile (falling back to default settings) when no name is
    /// given
    pub fn humanize(
        &self,
        sequence: &CommandSequence,
        profile_name: Option<&str>,
    ) -> Result<CommandSequence> {
        let settings = match profile_name {
            Some(name) => self.profiles.get(name)?.resolved_settings(),
            None => self
                .profiles
                .default_profile()
                .map(|p| p.resolved_settings())
                .unwrap_or_default(),
        };
        let mut rng = rand::thread_rng();
        Ok(Humanizer::new(settings).apply(sequence, &mut rng))
    }

    /// Humanize with explicit settings, validated at this boundary
    pub fn humanize_with_settings(
        &self,
        sequence: &CommandSequence,
        settings: &HumanizationSettings,
    ) -> Result<CommandSequence> {
        let mut rng = rand::thread_rng();
        self.humanize_with_rng(sequence, settings, &mut rng)
    }

    /// Humanize with explicit settings and an injected random source, for
    /// reproducible output
    pub fn humanize_with_rng<R: Rng>(
        &self,
        sequence: &CommandSequence,
        settings: &HumanizationSettings,
        rng: &mut R,
    ) -> Result<CommandSequence> {
        settings.validate()?;
        Ok(Humanizer::new(settings.clone()).apply(sequence, rng))
    }

    /// Create or update a humanization profile
    pub fn upsert_profile(&self, profile: HumanizationProfile) -> Result<()> {
        self.profiles.upsert(profile)
    }

    /// Synthesize a command sequence from classified UI elements, cached
    /// per entity id
    pub async fn analyze_image(
        &self,
        entity_id: &str,
        elements: &[ClassifiedElement],
    ) -> CommandSequence {
        let key = keys::image_analysis_key(entity_id);
        if let Some(cached) = self.cache.get::<CommandSequence>(&key).await {
            return cached;
        }
        let sequence = {
            let mut rng = rand::thread_rng();
            synthesize_sequence(elements, &mut rng)
        };
        self.cache.set(&key, &sequence, None).await;
        sequence
    }

    /// Record one application of a pattern; the authoritative count lives
    /// on the pattern record, with a best-effort cache tally alongside
    pub async fn record_pattern_usage(&self, id: Uuid, success: bool) -> Result<Pattern> {
        let updated = self.patterns.record_usage(id, success)?;
        self.cache.increment_pattern_usage(&id.to_string()).await;
        Ok(updated)
    }

    /// Stored patterns at or above a similarity threshold
    pub fn find_similar_patterns(
        &self,
        sequence: &CommandSequence,
        threshold: f64,
    ) -> Vec<(Pattern, f64)> {
        self.patterns.find_similar(sequence, threshold)
    }

    /// Start the three reference queues, wiring their handlers to this
    /// engine. Must be called within a tokio runtime.
    pub fn spawn_scheduler(&self, sink: Arc<dyn NotificationSink>) -> Scheduler {
        let mut scheduler = Scheduler::new();

        let engine = self.clone();
        let processing: JobHandler = Arc::new(move |payload| {
            let engine = engine.clone();
            Box::pin(async move { jobs::run_processing_job(&engine, payload).await })
        });
        scheduler.register_queue(QueueConfig::processing(), processing, sink.clone());

        let engine = self.clone();
        let image_analysis: JobHandler = Arc::new(move |payload| {
            let engine = engine.clone();
            Box::pin(async move { jobs::run_image_analysis_job(&engine, payload).await })
        });
        scheduler.register_queue(QueueConfig::image_analysis(), image_analysis, sink.clone());

        let engine = self.clone();
        let mining: JobHandler = Arc::new(move |payload| {
            let engine = engine.clone();
            Box::pin(async move { jobs::run_mining_job(&engine, payload).await })
        });
        scheduler.register_queue(QueueConfig::pattern_mining(), mining, sink);

        scheduler
    }
}
